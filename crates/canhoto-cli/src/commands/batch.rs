//! Batch command - categorize every receipt in a directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use canhoto_core::models::receipt::ExpenseRecord;
use canhoto_core::ocr::is_receipt_image;
use canhoto_core::{
    Aggregator, BatchObserver, BatchProcessor, Categorizer, DocumentResult, ReceiptParser,
    ReportRenderer,
};

use super::{Gateway, PipelineArgs, Recognizer, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory with receipt images (default from config: "canhotos")
    input_dir: Option<PathBuf>,

    /// Report file (default from config: "relatorio_fiscal.txt")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write one CSV row per receipt
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Leave the per-receipt details out of the report
    #[arg(long)]
    no_details: bool,

    /// Stop starting new receipts after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Progress bar fed by the batch loop.
struct ProgressObserver {
    bar: ProgressBar,
}

impl BatchObserver for ProgressObserver {
    fn on_document_start(&mut self, _index: usize, _total: usize, path: &Path) {
        if let Some(name) = path.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }

    fn on_document_done(&mut self, result: &DocumentResult) {
        if let Some(failure) = &result.failure {
            self.bar.println(format!(
                "{} {} ({}): {}",
                style("✗").red(),
                failure.document_id,
                failure.stage,
                failure.message
            ));
        }
        self.bar.inc(1);
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration, flags override the file
    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);
    if let Some(ref input_dir) = args.input_dir {
        config.batch.input_dir = input_dir.clone();
    }
    if let Some(ref output) = args.output {
        config.report.output_path = output.clone();
    }
    if args.no_details {
        config.report.include_details = false;
    }
    if args.timeout.is_some() {
        config.batch.timeout_secs = args.timeout;
    }
    config.validate()?;

    let input_dir = &config.batch.input_dir;
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", input_dir.display());
    }

    let files = discover_receipts(input_dir)?;
    if files.is_empty() {
        eprintln!(
            "{} No receipt images found in {}",
            style("ℹ").blue(),
            input_dir.display()
        );
    } else {
        eprintln!(
            "{} Found {} receipts to process",
            style("ℹ").blue(),
            files.len()
        );
    }

    // Fatal setup errors surface here, before any receipt is touched
    let recognizer = Recognizer::from_config(&config)?;
    let gateway = Gateway::from_config(&config)?;

    let parser = ReceiptParser::from_config(&config.extraction);
    let interrupt = Arc::new(AtomicBool::new(false));
    let mut processor = BatchProcessor::new(&recognizer, &gateway, parser, Categorizer::new())
        .with_interrupt(interrupt.clone());
    if let Some(secs) = config.batch.timeout_secs {
        processor = processor.with_deadline(start + Duration::from_secs(secs));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.store(true, Ordering::SeqCst);
        }
    });

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let mut observer = ProgressObserver { bar };

    let outcome = processor.run(&files, Aggregator::new(), &mut observer).await;
    observer.bar.finish_and_clear();

    // Console and file get the same text
    let renderer = ReportRenderer::from_config(&config.report);
    let report = renderer.render_batch(&outcome);
    print!("{}", report);

    fs::write(&config.report.output_path, &report)?;
    debug!("Wrote report to {}", config.report.output_path.display());

    if let Some(ref csv_path) = args.csv {
        write_csv(csv_path, outcome.aggregator.records())?;
        eprintln!(
            "{} Per-receipt CSV written to {}",
            style("✓").green(),
            csv_path.display()
        );
    }

    if outcome.interrupted {
        warn!("Run stopped early; {} receipts skipped", outcome.skipped);
    }

    eprintln!();
    eprintln!(
        "{} Processed {} receipts in {:?}",
        style("✓").green(),
        outcome.aggregator.processed(),
        start.elapsed()
    );
    eprintln!(
        "   {} failed, report saved to {}",
        style(outcome.failures.len()).red(),
        config.report.output_path.display()
    );

    Ok(())
}

/// Receipt images directly inside `dir`, in sorted path order.
fn discover_receipts(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));

    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_receipt_image(p))
        .collect();
    files.sort();

    Ok(files)
}

fn write_csv(path: &Path, records: &[ExpenseRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "arquivo",
        "cnpj",
        "empresa",
        "valor",
        "categoria",
        "atividade",
        "pendencias",
    ])?;

    for record in records {
        let issues: Vec<&str> = record.issues.iter().map(|i| i.description()).collect();
        wtr.write_record([
            record.document_id.as_str(),
            record.cnpj.as_ref().map(|c| c.as_str()).unwrap_or(""),
            record.company_name.as_deref().unwrap_or(""),
            &record.amount.map(|a| a.to_string()).unwrap_or_default(),
            record.category.label(),
            record.activity_description.as_deref().unwrap_or(""),
            &issues.join("; "),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_receipts_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.tiff", "scan.pdf"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let files = discover_receipts(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.tiff"]);
    }
}
