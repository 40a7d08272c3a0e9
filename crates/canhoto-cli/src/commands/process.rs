//! Process command - categorize a single receipt image.

use std::path::PathBuf;

use clap::Args;
use console::style;

use canhoto_core::models::receipt::ExpenseRecord;
use canhoto_core::receipt::rules::format_brl_amount;
use canhoto_core::{BatchProcessor, Categorizer, ReceiptParser};

use super::{Gateway, PipelineArgs, Recognizer, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Receipt image
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.pipeline.apply(&mut config);
    config.validate()?;

    // Check input file exists
    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let recognizer = Recognizer::from_config(&config)?;
    let gateway = Gateway::from_config(&config)?;
    let processor = BatchProcessor::new(
        &recognizer,
        &gateway,
        ReceiptParser::from_config(&config.extraction),
        Categorizer::new(),
    );

    let result = processor.process_document(&args.input).await;

    if let Some(failure) = &result.failure {
        eprintln!(
            "{} {} failed: {}",
            style("⚠").yellow(),
            failure.stage,
            failure.message
        );
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.record)?),
        OutputFormat::Text => print!("{}", format_record_text(&result.record)),
    }

    Ok(())
}

fn format_record_text(record: &ExpenseRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Canhoto: {}\n", record.document_id));
    output.push_str(&format!(
        "CNPJ: {}\n",
        record
            .cnpj
            .as_ref()
            .map(|c| c.formatted())
            .unwrap_or_else(|| "Não encontrado".to_string())
    ));
    output.push_str(&format!("Empresa: {}\n", record.display_company()));
    match record.amount {
        Some(amount) => output.push_str(&format!("Valor: R$ {}\n", format_brl_amount(amount))),
        None => output.push_str("Valor: Não encontrado\n"),
    }
    output.push_str(&format!("Categoria: {}\n", record.category));
    if let Some(activity) = &record.activity_description {
        output.push_str(&format!("Atividade: {}\n", activity));
    }

    for issue in &record.issues {
        output.push_str(&format!("  - {}\n", issue.description()));
    }

    output
}
