//! Sequential batch pipeline: recognize, extract, look up, categorize, aggregate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::category::Categorizer;
use crate::lookup::EnrichmentGateway;
use crate::models::receipt::{CompanyInfo, ExpenseRecord, RawDocument, RecordIssue};
use crate::ocr::TextRecognizer;
use crate::receipt::ReceiptParser;

/// Pipeline stage that failed for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Ocr,
    Lookup,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ocr => write!(f, "OCR"),
            Self::Lookup => write!(f, "consulta CNPJ"),
        }
    }
}

/// A per-document failure. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub document_id: String,
    pub stage: FailureStage,
    pub message: String,
}

/// Outcome of one document.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub record: ExpenseRecord,
    pub failure: Option<DocumentFailure>,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub aggregator: Aggregator,
    pub failures: Vec<DocumentFailure>,
    /// The run stopped early on interrupt or deadline.
    pub interrupted: bool,
    /// Documents never started because the run stopped early.
    pub skipped: usize,
}

/// Progress hooks. Every method defaults to a no-op.
pub trait BatchObserver {
    fn on_document_start(&mut self, _index: usize, _total: usize, _path: &Path) {}

    fn on_document_done(&mut self, _result: &DocumentResult) {}
}

impl BatchObserver for () {}

/// Runs documents through the pipeline one at a time.
pub struct BatchProcessor<'a, R, G> {
    recognizer: &'a R,
    gateway: &'a G,
    parser: ReceiptParser,
    categorizer: Categorizer,
    deadline: Option<Instant>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a, R: TextRecognizer, G: EnrichmentGateway> BatchProcessor<'a, R, G> {
    pub fn new(
        recognizer: &'a R,
        gateway: &'a G,
        parser: ReceiptParser,
        categorizer: Categorizer,
    ) -> Self {
        Self {
            recognizer,
            gateway,
            parser,
            categorizer,
            deadline: None,
            interrupt: None,
        }
    }

    /// Stop starting new documents once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop starting new documents once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn should_stop(&self) -> bool {
        let interrupted = self
            .interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst));
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        interrupted || expired
    }

    /// Process one image into a record. Never fails: problems become record
    /// issues and, for OCR or lookup errors, a [`DocumentFailure`].
    pub async fn process_document(&self, path: &Path) -> DocumentResult {
        let document_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let lines = match self.recognizer.recognize(path) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("OCR failed for {}: {}", document_id, err);
                return DocumentResult {
                    failure: Some(DocumentFailure {
                        document_id: document_id.clone(),
                        stage: FailureStage::Ocr,
                        message: err.to_string(),
                    }),
                    record: ExpenseRecord::failed(document_id),
                };
            }
        };

        let document = RawDocument::new(document_id, lines);
        let fields = self.parser.parse(&document);

        let mut issues = Vec::new();
        if document.is_blank() {
            issues.push(RecordIssue::NoText);
        }
        if fields.cnpj.is_none() {
            issues.push(RecordIssue::MissingCnpj);
        }
        if fields.amount.is_none() {
            issues.push(RecordIssue::MissingAmount);
        }

        let mut company: Option<CompanyInfo> = None;
        let mut failure = None;

        if let Some(cnpj) = fields.cnpj.as_ref().filter(|_| self.gateway.is_enabled()) {
            match self.gateway.lookup(cnpj).await {
                Ok(Some(info)) => company = Some(info),
                Ok(None) => issues.push(RecordIssue::CompanyNotFound),
                Err(err) => {
                    warn!("Lookup failed for {} ({}): {}", document.id, cnpj, err);
                    issues.push(RecordIssue::LookupFailed);
                    failure = Some(DocumentFailure {
                        document_id: document.id.clone(),
                        stage: FailureStage::Lookup,
                        message: err.to_string(),
                    });
                }
            }
        }

        let (company_name, activity_description) = match company {
            Some(info) => (info.legal_name.or(info.trade_name), info.activity_description),
            None => (None, None),
        };
        let category = self.categorizer.categorize(activity_description.as_deref());

        debug!(
            "{}: cnpj={:?} amount={:?} category={}",
            document.id, fields.cnpj, fields.amount, category
        );

        DocumentResult {
            record: ExpenseRecord {
                document_id: document.id,
                cnpj: fields.cnpj,
                amount: fields.amount,
                category,
                company_name,
                activity_description,
                issues,
            },
            failure,
        }
    }

    /// Process `paths` in order, threading `aggregator` through the run.
    pub async fn run<O: BatchObserver>(
        &self,
        paths: &[PathBuf],
        mut aggregator: Aggregator,
        observer: &mut O,
    ) -> BatchOutcome {
        let total = paths.len();
        let mut failures = Vec::new();
        let mut interrupted = false;
        let mut skipped = 0;

        info!("Processing {} receipts", total);

        for (index, path) in paths.iter().enumerate() {
            if self.should_stop() {
                interrupted = true;
                skipped = total - index;
                warn!("Stopping early, {} receipts not processed", skipped);
                break;
            }

            observer.on_document_start(index, total, path);
            let result = self.process_document(path).await;
            observer.on_document_done(&result);

            if let Some(failure) = result.failure {
                failures.push(failure);
            }
            aggregator = aggregator.absorb(result.record);
        }

        info!(
            "Processed {} receipts, {} failures, total {}",
            aggregator.processed(),
            failures.len(),
            aggregator.grand_total()
        );

        BatchOutcome {
            aggregator,
            failures,
            interrupted,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::error::{LookupError, OcrError};
    use crate::models::receipt::Cnpj;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::atomic::AtomicUsize;

    /// Recognizer answering from a table keyed by file name.
    struct FakeOcr(HashMap<&'static str, Vec<&'static str>>);

    impl TextRecognizer for FakeOcr {
        fn recognize(&self, image: &Path) -> Result<Vec<String>, OcrError> {
            let name = image.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            self.0
                .get(name)
                .map(|lines| lines.iter().map(|l| l.to_string()).collect())
                .ok_or_else(|| OcrError::Unreadable(format!("{name}: corrupt")))
        }
    }

    #[derive(Default)]
    struct FakeRegistry {
        companies: HashMap<&'static str, &'static str>,
        failing: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl EnrichmentGateway for FakeRegistry {
        async fn lookup(&self, cnpj: &Cnpj) -> Result<Option<CompanyInfo>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|c| *c == cnpj.as_str()) {
                return Err(LookupError::Transport("timed out".to_string()));
            }
            Ok(self.companies.get(cnpj.as_str()).map(|activity| CompanyInfo {
                legal_name: Some(format!("EMPRESA {}", cnpj.as_str())),
                activity_description: Some(activity.to_string()),
                ..CompanyInfo::default()
            }))
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("canhotos").join(n)).collect()
    }

    fn ocr() -> FakeOcr {
        FakeOcr(HashMap::from([
            ("a.png", vec!["RESTAURANTE BOM", "CNPJ 11.111.111/0001-11", "TOTAL R$ 78,90"]),
            ("b.png", vec!["AUTO POSTO", "CNPJ: 22.222.222/0001-22", "Valor 44,55"]),
            ("c.png", vec!["RECIBO SEM DADOS"]),
        ]))
    }

    fn registry() -> FakeRegistry {
        FakeRegistry {
            companies: HashMap::from([
                ("11111111000111", "Restaurantes e similares"),
                ("22222222000122", "Comércio varejista de combustíveis"),
            ]),
            ..FakeRegistry::default()
        }
    }

    #[tokio::test]
    async fn test_run_categorizes_and_aggregates() {
        let (ocr, registry) = (ocr(), registry());
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new());

        let outcome = processor
            .run(&paths(&["a.png", "b.png"]), Aggregator::new(), &mut ())
            .await;

        let aggregator = &outcome.aggregator;
        assert_eq!(aggregator.grand_total(), dec("123.45"));
        assert_eq!(aggregator.totals().get(Category::Alimentacao), Some(dec("78.90")));
        assert_eq!(aggregator.totals().get(Category::Transporte), Some(dec("44.55")));
        assert!(outcome.failures.is_empty());
        assert!(!outcome.interrupted);

        let first = &aggregator.records()[0];
        assert_eq!(first.document_id, "a.png");
        assert_eq!(first.company_name.as_deref(), Some("EMPRESA 11111111000111"));
        assert!(first.issues.is_empty());
    }

    #[tokio::test]
    async fn test_ocr_failure_does_not_abort() {
        let (ocr, registry) = (ocr(), registry());
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new());

        let outcome = processor
            .run(&paths(&["a.png", "broken.png"]), Aggregator::new(), &mut ())
            .await;

        assert_eq!(outcome.aggregator.processed(), 2);
        assert_eq!(outcome.aggregator.grand_total(), dec("78.90"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].document_id, "broken.png");
        assert_eq!(outcome.failures[0].stage, FailureStage::Ocr);

        let failed = &outcome.aggregator.records()[1];
        assert_eq!(failed.category, Category::Outros);
        assert!(failed.has_issue(RecordIssue::OcrFailed));
    }

    #[tokio::test]
    async fn test_lookup_failure_keeps_amount() {
        let ocr = ocr();
        let registry = FakeRegistry {
            failing: vec!["11111111000111"],
            ..registry()
        };
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new());

        let result = processor.process_document(Path::new("a.png")).await;

        assert_eq!(result.record.amount, Some(dec("78.90")));
        assert_eq!(result.record.category, Category::Outros);
        assert!(result.record.has_issue(RecordIssue::LookupFailed));
        assert_eq!(result.failure.map(|f| f.stage), Some(FailureStage::Lookup));
    }

    #[tokio::test]
    async fn test_missing_fields_skip_lookup() {
        let (ocr, registry) = (ocr(), registry());
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new());

        let result = processor.process_document(Path::new("c.png")).await;

        assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            result.record.issues,
            vec![RecordIssue::MissingCnpj, RecordIssue::MissingAmount]
        );
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_unknown_company_is_not_a_failure() {
        let ocr = ocr();
        let registry = FakeRegistry::default();
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new());

        let result = processor.process_document(Path::new("b.png")).await;

        assert!(result.record.has_issue(RecordIssue::CompanyNotFound));
        assert_eq!(result.record.category, Category::Outros);
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_disabled_gateway_is_not_called() {
        let ocr = ocr();
        let processor = BatchProcessor::new(
            &ocr,
            &crate::lookup::NoLookup,
            ReceiptParser::new(),
            Categorizer::new(),
        );

        let result = processor.process_document(Path::new("a.png")).await;

        assert!(result.record.issues.is_empty());
        assert_eq!(result.record.display_company(), "Não consultada");
    }

    #[tokio::test]
    async fn test_interrupt_stops_before_next_document() {
        let (ocr, registry) = (ocr(), registry());
        let flag = Arc::new(AtomicBool::new(false));
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new())
            .with_interrupt(flag.clone());

        struct StopAfterFirst(Arc<AtomicBool>);
        impl BatchObserver for StopAfterFirst {
            fn on_document_done(&mut self, _result: &DocumentResult) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let outcome = processor
            .run(
                &paths(&["a.png", "b.png", "c.png"]),
                Aggregator::new(),
                &mut StopAfterFirst(flag),
            )
            .await;

        assert!(outcome.interrupted);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.aggregator.processed(), 1);
        assert_eq!(outcome.aggregator.grand_total(), dec("78.90"));
    }

    #[tokio::test]
    async fn test_expired_deadline_processes_nothing() {
        let (ocr, registry) = (ocr(), registry());
        let processor = BatchProcessor::new(&ocr, &registry, ReceiptParser::new(), Categorizer::new())
            .with_deadline(Instant::now());

        let outcome = processor
            .run(&paths(&["a.png", "b.png"]), Aggregator::new(), &mut ())
            .await;

        assert!(outcome.interrupted);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.aggregator.processed(), 0);
    }
}
