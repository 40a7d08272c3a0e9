//! Running per-category totals for a batch.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::category::Category;
use crate::models::receipt::ExpenseRecord;

/// Accumulated amount per category, in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    buckets: Vec<(Category, Decimal)>,
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the bucket of `category`, creating it on first use.
    pub fn add(&mut self, category: Category, amount: Decimal) {
        match self.buckets.iter_mut().find(|(c, _)| *c == category) {
            Some((_, total)) => *total += amount,
            None => self.buckets.push((category, amount)),
        }
    }

    pub fn get(&self, category: Category) -> Option<Decimal> {
        self.buckets
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, total)| *total)
    }

    /// Buckets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        self.buckets.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of every bucket.
    pub fn sum(&self) -> Decimal {
        self.buckets.iter().map(|(_, total)| *total).sum()
    }
}

impl FromIterator<(Category, Decimal)> for CategoryTotals {
    fn from_iter<I: IntoIterator<Item = (Category, Decimal)>>(iter: I) -> Self {
        let mut totals = Self::new();
        for (category, amount) in iter {
            totals.add(category, amount);
        }
        totals
    }
}

/// Owns the processed records and the running totals of a batch.
///
/// The batch loop threads it by value through [`Aggregator::absorb`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregator {
    totals: CategoryTotals,
    grand_total: Decimal,
    records: Vec<ExpenseRecord>,
    without_amount: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a record and account for its amount.
    pub fn absorb(mut self, record: ExpenseRecord) -> Self {
        match record.amount {
            Some(amount) => {
                self.totals.add(record.category, amount);
                self.grand_total += amount;
            }
            None => self.without_amount += 1,
        }
        self.records.push(record);
        self
    }

    pub fn totals(&self) -> &CategoryTotals {
        &self.totals
    }

    /// Sum of all category totals.
    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    /// Every record, in processing order.
    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    /// Number of records absorbed.
    pub fn processed(&self) -> usize {
        self.records.len()
    }

    /// Records processed without an amount.
    pub fn without_amount(&self) -> usize {
        self.without_amount
    }

    pub fn incomplete_records(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.iter().filter(|r| r.is_incomplete())
    }
}

impl Extend<ExpenseRecord> for Aggregator {
    fn extend<I: IntoIterator<Item = ExpenseRecord>>(&mut self, iter: I) {
        for record in iter {
            *self = std::mem::take(self).absorb(record);
        }
    }
}
