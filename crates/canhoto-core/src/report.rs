//! Proportional category report.
//!
//! Rendering is pure: the same totals always give byte-identical text, so the
//! console and the report file can share one rendering.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::aggregate::{Aggregator, CategoryTotals};
use crate::batch::BatchOutcome;
use crate::category::Category;
use crate::models::config::{MAX_BAR_WIDTH, ReportConfig};
use crate::receipt::rules::format_brl_amount;

/// Width of the label column, the length of "Material de Escritório".
const LABEL_WIDTH: usize = 22;
const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "----------------------------------------";
const BAR_CHAR: &str = "█";

/// One category line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub category: Category,
    pub total: Decimal,
    /// Share of the grand total, one decimal place. Shares are apportioned by
    /// largest remainder, so each is within 0,1 of the exact share and the
    /// rows add up to 100,0% (three equal rows show 33,4 / 33,3 / 33,3).
    pub percentage: Decimal,
    pub bar_len: usize,
}

/// Category totals ordered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub grand_total: Decimal,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Build the report rows.
    ///
    /// Rows are sorted by descending total, ties by category order.
    /// Percentages are apportioned in tenths by largest remainder so the
    /// displayed values add up to exactly 100,0%.
    pub fn from_totals(totals: &CategoryTotals, grand_total: Decimal, bar_width: usize) -> Self {
        let mut rows: Vec<ReportRow> = totals
            .iter()
            .map(|(category, total)| ReportRow {
                category,
                total,
                percentage: Decimal::ZERO,
                bar_len: 0,
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));

        let tenths = apportion_tenths(&rows, grand_total);
        for (row, tenths) in rows.iter_mut().zip(tenths) {
            row.percentage = Decimal::new(tenths as i64, 1);
            row.bar_len = bar_length(tenths, bar_width);
        }

        Self { grand_total, rows }
    }

    pub fn from_aggregator(aggregator: &Aggregator, bar_width: usize) -> Self {
        Self::from_totals(aggregator.totals(), aggregator.grand_total(), bar_width)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the displayed percentages.
    pub fn percentage_sum(&self) -> Decimal {
        self.rows.iter().map(|r| r.percentage).sum()
    }
}

/// Shares of `grand_total` in tenths of a percent, summing to 1000.
fn apportion_tenths(rows: &[ReportRow], grand_total: Decimal) -> Vec<u64> {
    if grand_total <= Decimal::ZERO {
        return vec![0; rows.len()];
    }

    let exact: Vec<Decimal> = rows
        .iter()
        .map(|r| r.total * Decimal::ONE_THOUSAND / grand_total)
        .collect();
    let mut tenths: Vec<u64> = exact
        .iter()
        .map(|e| e.floor().to_u64().unwrap_or(0))
        .collect();

    let assigned: u64 = tenths.iter().sum();
    let deficit = 1000u64.saturating_sub(assigned) as usize;

    // Stable sort keeps row order among equal remainders
    let mut by_remainder: Vec<usize> = (0..rows.len()).collect();
    let remainder = |i: usize| exact[i] - exact[i].floor();
    by_remainder.sort_by(|&a, &b| remainder(b).cmp(&remainder(a)));
    for index in by_remainder.into_iter().take(deficit) {
        tenths[index] += 1;
    }

    tenths
}

/// `round(percentage / 100 * bar_width)`, half away from zero.
fn bar_length(tenths: u64, bar_width: usize) -> usize {
    let scaled = tenths * bar_width as u64;
    ((scaled * 2 + 1000) / 2000) as usize
}

/// `63,9` for 63.9.
fn format_percentage(percentage: Decimal) -> String {
    format!("{:.1}", percentage).replace('.', ",")
}

fn format_money(amount: Decimal) -> String {
    format!("R$ {}", format_brl_amount(amount))
}

/// Renders reports as plain UTF-8 text.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    bar_width: usize,
    include_details: bool,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            bar_width: MAX_BAR_WIDTH,
            include_details: true,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            bar_width: config.bar_width,
            include_details: config.include_details,
        }
    }

    pub fn with_bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width;
        self
    }

    pub fn with_details(mut self, include_details: bool) -> Self {
        self.include_details = include_details;
        self
    }

    pub fn bar_width(&self) -> usize {
        self.bar_width
    }

    /// Report for the aggregator's current totals.
    pub fn report(&self, aggregator: &Aggregator) -> Report {
        Report::from_aggregator(aggregator, self.bar_width)
    }

    /// Category section: header, grand total, one row and bar per category.
    pub fn render(&self, report: &Report) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", HEAVY_RULE));
        output.push_str("RELATÓRIO DE GASTOS POR CATEGORIA\n");
        output.push_str(&format!("{}\n\n", HEAVY_RULE));
        output.push_str(&format!("TOTAL GERAL: {}\n\n", format_money(report.grand_total)));

        if report.is_empty() {
            output.push_str("Nenhum gasto categorizado encontrado.\n");
            return output;
        }

        output.push_str("GASTOS POR CATEGORIA:\n");
        output.push_str(&format!("{}\n", LIGHT_RULE));
        for row in &report.rows {
            output.push_str(&format!(
                "{:<width$} {:>16} ({:>5}%)\n",
                row.category,
                format_money(row.total),
                format_percentage(row.percentage),
                width = LABEL_WIDTH
            ));
            if row.bar_len > 0 {
                output.push_str(&format!(
                    "{:width$} {}\n",
                    "",
                    BAR_CHAR.repeat(row.bar_len),
                    width = LABEL_WIDTH
                ));
            }
        }
        output.push_str(&format!("{}\n", HEAVY_RULE));

        output
    }

    /// Full batch report: categories, per-receipt details and run summary.
    pub fn render_batch(&self, outcome: &BatchOutcome) -> String {
        let aggregator = &outcome.aggregator;
        let mut output = self.render(&self.report(aggregator));

        if self.include_details && aggregator.processed() > 0 {
            output.push_str("\nDETALHES POR CANHOTO:\n");
            output.push_str(&format!("{}\n", LIGHT_RULE));
            for (i, record) in aggregator.records().iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, record.document_id));
                output.push_str(&format!(
                    "   CNPJ: {}\n",
                    record
                        .cnpj
                        .as_ref()
                        .map(|c| c.formatted())
                        .unwrap_or_else(|| "Não encontrado".to_string())
                ));
                output.push_str(&format!("   Empresa: {}\n", record.display_company()));
                output.push_str(&format!(
                    "   Valor: {}\n",
                    record
                        .amount
                        .map(format_money)
                        .unwrap_or_else(|| "Não encontrado".to_string())
                ));
                output.push_str(&format!("   Categoria: {}\n", record.category));
                output.push_str(&format!(
                    "   Atividade: {}\n",
                    record.activity_description.as_deref().unwrap_or("Não identificada")
                ));
                if !record.issues.is_empty() {
                    let issues: Vec<&str> = record.issues.iter().map(|i| i.description()).collect();
                    output.push_str(&format!("   Pendências: {}\n", issues.join(", ")));
                }
            }
        }

        output.push_str("\nRESUMO DO PROCESSAMENTO:\n");
        output.push_str(&format!("{}\n", LIGHT_RULE));
        output.push_str(&format!("Canhotos processados: {}\n", aggregator.processed()));
        output.push_str(&format!("Sem valor identificado: {}\n", aggregator.without_amount()));
        output.push_str(&format!("Falhas: {}\n", outcome.failures.len()));
        for failure in &outcome.failures {
            output.push_str(&format!(
                "  - {} ({}): {}\n",
                failure.document_id, failure.stage, failure.message
            ));
        }
        if outcome.interrupted {
            output.push_str(&format!(
                "Processamento interrompido: {} canhotos não processados\n",
                outcome.skipped
            ));
        }

        output
    }
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{DocumentFailure, FailureStage};
    use crate::models::receipt::{Cnpj, ExpenseRecord, RecordIssue};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn totals(entries: &[(Category, &str)]) -> CategoryTotals {
        entries.iter().map(|(c, a)| (*c, dec(a))).collect()
    }

    #[test]
    fn test_two_category_scenario() {
        let totals = totals(&[(Category::Transporte, "44.55"), (Category::Alimentacao, "78.90")]);
        let report = Report::from_totals(&totals, dec("123.45"), 30);

        assert_eq!(report.rows[0].category, Category::Alimentacao);
        assert_eq!(report.rows[0].percentage, dec("63.9"));
        assert_eq!(report.rows[0].bar_len, 19);
        assert_eq!(report.rows[1].category, Category::Transporte);
        assert_eq!(report.rows[1].percentage, dec("36.1"));
        assert_eq!(report.rows[1].bar_len, 11);
    }

    #[test]
    fn test_render_layout() {
        let totals = totals(&[(Category::Alimentacao, "78.90"), (Category::Transporte, "44.55")]);
        let report = Report::from_totals(&totals, dec("123.45"), 30);
        let text = ReportRenderer::new().render(&report);

        let expected = [
            HEAVY_RULE,
            "RELATÓRIO DE GASTOS POR CATEGORIA",
            HEAVY_RULE,
            "",
            "TOTAL GERAL: R$ 123,45",
            "",
            "GASTOS POR CATEGORIA:",
            LIGHT_RULE,
            "Alimentação                    R$ 78,90 ( 63,9%)",
            "                       ███████████████████",
            "Transporte                     R$ 44,55 ( 36,1%)",
            "                       ███████████",
            HEAVY_RULE,
        ]
        .join("\n")
            + "\n";

        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_is_idempotent() {
        let totals = totals(&[
            (Category::Saude, "10.00"),
            (Category::Outros, "20.00"),
            (Category::Educacao, "1234.56"),
        ]);
        let renderer = ReportRenderer::new();
        let first = renderer.render(&Report::from_totals(&totals, totals.sum(), 30));
        let second = renderer.render(&Report::from_totals(&totals, totals.sum(), 30));
        assert_eq!(first, second);
    }

    #[test]
    fn test_percentages_sum_to_one_hundred() {
        // Three equal shares of 33,33...% each
        let totals = totals(&[
            (Category::Saude, "10.00"),
            (Category::Transporte, "10.00"),
            (Category::Hospedagem, "10.00"),
        ]);
        let report = Report::from_totals(&totals, totals.sum(), 30);
        assert_eq!(report.percentage_sum(), dec("100.0"));

        let percentages: Vec<Decimal> = report.rows.iter().map(|r| r.percentage).collect();
        assert_eq!(percentages, vec![dec("33.4"), dec("33.3"), dec("33.3")]);

        let many: CategoryTotals = Category::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, Decimal::new(137 * (i as i64 + 1) + 1, 2)))
            .collect();
        let report = Report::from_totals(&many, many.sum(), 30);
        assert_eq!(report.percentage_sum(), dec("100.0"));
    }

    #[test]
    fn test_half_tenth_shares_do_not_overshoot() {
        // Ten shares of exactly 9,05% and one of 9,50%
        let many: CategoryTotals = Category::ALL
            .iter()
            .map(|c| {
                let amount = if *c == Category::Outros { "9.50" } else { "9.05" };
                (*c, dec(amount))
            })
            .collect();
        let report = Report::from_totals(&many, dec("100.00"), 30);

        assert_eq!(report.percentage_sum(), dec("100.0"));
        assert_eq!(report.rows[0].category, Category::Outros);
        assert_eq!(report.rows[0].percentage, dec("9.5"));
        for row in &report.rows {
            let exact = row.total;
            assert!((row.percentage - exact).abs() <= dec("0.1"), "{:?}", row);
        }
        let rounded_up = report.rows.iter().filter(|r| r.percentage == dec("9.1")).count();
        assert_eq!(rounded_up, 5);
    }

    #[test]
    fn test_ties_follow_category_order() {
        let totals = totals(&[(Category::Outros, "5.00"), (Category::Saude, "5.00")]);
        let report = Report::from_totals(&totals, dec("10.00"), 30);

        let order: Vec<Category> = report.rows.iter().map(|r| r.category).collect();
        assert_eq!(order, vec![Category::Saude, Category::Outros]);
        assert_eq!(report.rows[0].bar_len, 15);
    }

    #[test]
    fn test_empty_report() {
        let text = ReportRenderer::new().render(&Report::from_totals(
            &CategoryTotals::new(),
            Decimal::ZERO,
            30,
        ));
        assert!(text.contains("TOTAL GERAL: R$ 0,00"));
        assert!(text.ends_with("Nenhum gasto categorizado encontrado.\n"));
    }

    #[test]
    fn test_large_amounts_use_thousand_separators() {
        let totals = totals(&[(Category::Tecnologia, "12345.60")]);
        let report = Report::from_totals(&totals, dec("12345.60"), 30);
        let text = ReportRenderer::new().render(&report);

        assert!(text.contains("TOTAL GERAL: R$ 12.345,60"));
        assert!(text.contains("R$ 12.345,60 (100,0%)"));
        assert!(text.contains(&BAR_CHAR.repeat(30)));
    }

    #[test]
    fn test_render_batch_sections() {
        let mut found = ExpenseRecord::failed("a.png");
        found.issues.clear();
        found.cnpj = Cnpj::parse("12345678000195");
        found.amount = Some(dec("45.90"));
        found.category = Category::Alimentacao;
        found.company_name = Some("LOJA X LTDA".to_string());
        found.activity_description = Some("Restaurantes e similares".to_string());

        let aggregator = Aggregator::new()
            .absorb(found)
            .absorb(ExpenseRecord::failed("b.png"));
        let outcome = BatchOutcome {
            aggregator,
            failures: vec![DocumentFailure {
                document_id: "b.png".to_string(),
                stage: FailureStage::Ocr,
                message: "unreadable input: b.png".to_string(),
            }],
            interrupted: false,
            skipped: 0,
        };

        let text = ReportRenderer::new().render_batch(&outcome);

        assert!(text.contains("1. a.png\n   CNPJ: 12.345.678/0001-95\n   Empresa: LOJA X LTDA\n"));
        assert!(text.contains("   Valor: R$ 45,90\n   Categoria: Alimentação\n"));
        assert!(text.contains("2. b.png\n   CNPJ: Não encontrado\n   Empresa: Erro no processamento\n"));
        assert!(text.contains(&format!("   Pendências: {}\n", RecordIssue::OcrFailed.description())));
        assert!(text.contains("Canhotos processados: 2\n"));
        assert!(text.contains("Sem valor identificado: 1\n"));
        assert!(text.contains("Falhas: 1\n  - b.png (OCR): unreadable input: b.png\n"));
        assert!(!text.contains("interrompido"));

        let summary_only = ReportRenderer::new().with_details(false).render_batch(&outcome);
        assert!(!summary_only.contains("DETALHES POR CANHOTO"));
        assert!(summary_only.contains("Falhas: 1"));
    }
}
