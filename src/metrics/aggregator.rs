use crate::domain::health::ProcessorName;
use crate::domain::money;
use crate::domain::payment::{LedgerEntry, PaymentStatus};
use crate::domain::summary::{PaymentsSummary, ProcessorTotals};
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Tally {
    requests: u64,
    amount_cents: i128,
}

impl Tally {
    fn into_totals(self) -> ProcessorTotals {
        ProcessorTotals {
            total_requests: self.requests,
            total_amount: money::total_to_float(self.amount_cents),
        }
    }
}

/// Rolls ledger lines up into per-processor totals.
///
/// A payment is written to the ledger on every state change, so only
/// `success` lines with a processor count, and each correlation id counts
/// once. Lines that do not parse are skipped.
#[derive(Debug, Default)]
pub struct SummaryAggregator {
    seen: HashSet<String>,
    default: Tally,
    fallback: Tally,
    skipped: u64,
}

impl SummaryAggregator {
    pub fn ingest_raw(&mut self, raw: &str) {
        match serde_json::from_str::<LedgerEntry>(raw) {
            Ok(entry) => self.ingest(&entry),
            Err(e) => {
                self.skipped += 1;
                tracing::debug!("skipping unreadable ledger entry: {}", e);
            }
        }
    }

    pub fn ingest(&mut self, entry: &LedgerEntry) {
        if entry.status != PaymentStatus::Success {
            return;
        }
        let Some(processor) = entry.processor else {
            return;
        };
        if !self.seen.insert(entry.correlation_id.clone()) {
            return;
        }

        let tally = match processor {
            ProcessorName::Default => &mut self.default,
            ProcessorName::Fallback => &mut self.fallback,
        };
        tally.requests += 1;
        tally.amount_cents += i128::from(entry.amount);
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn finish(self) -> PaymentsSummary {
        PaymentsSummary {
            default: self.default.into_totals(),
            fallback: self.fallback.into_totals(),
        }
    }
}

pub fn summarize<I, S>(entries: I) -> PaymentsSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut agg = SummaryAggregator::default();
    for raw in entries {
        agg.ingest_raw(raw.as_ref());
    }
    if agg.skipped() > 0 {
        tracing::warn!("summary skipped {} unreadable ledger entries", agg.skipped());
    }
    agg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, cents: i64, processor: Option<ProcessorName>, status: PaymentStatus) -> String {
        serde_json::to_string(&LedgerEntry {
            correlation_id: id.to_string(),
            amount: cents,
            processor,
            status,
            started_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn counts_successful_payments_per_processor() {
        let lines = vec![
            entry("a", 1_990, None, PaymentStatus::Pending),
            entry("a", 1_990, Some(ProcessorName::Default), PaymentStatus::Success),
            entry("b", 1_000, Some(ProcessorName::Fallback), PaymentStatus::Success),
            entry("c", 10, Some(ProcessorName::Default), PaymentStatus::Success),
        ];

        let summary = summarize(&lines);
        assert_eq!(summary.default.total_requests, 2);
        assert!((summary.default.total_amount - 20.00).abs() < 1e-9);
        assert_eq!(summary.fallback.total_requests, 1);
        assert!((summary.fallback.total_amount - 10.00).abs() < 1e-9);
    }

    #[test]
    fn retried_payment_is_counted_once() {
        let lines = vec![
            entry("a", 500, Some(ProcessorName::Default), PaymentStatus::Failed),
            entry("a", 500, Some(ProcessorName::Fallback), PaymentStatus::Success),
            entry("a", 500, Some(ProcessorName::Fallback), PaymentStatus::Success),
        ];

        let summary = summarize(&lines);
        assert_eq!(summary.default, ProcessorTotals::default());
        assert_eq!(summary.fallback.total_requests, 1);
        assert!((summary.fallback.total_amount - 5.00).abs() < 1e-9);
    }

    #[test]
    fn sums_in_cents_without_drift() {
        let lines: Vec<String> = (0..1_000)
            .map(|i| entry(&format!("p{i}"), 10, Some(ProcessorName::Default), PaymentStatus::Success))
            .collect();

        let summary = summarize(&lines);
        assert_eq!(summary.default.total_requests, 1_000);
        assert_eq!(summary.default.total_amount, 100.0);
    }

    #[test]
    fn huge_stored_amounts_do_not_overflow_the_total() {
        let lines = vec![
            entry("big-1", i64::MAX, Some(ProcessorName::Default), PaymentStatus::Success),
            entry("big-2", i64::MAX, Some(ProcessorName::Default), PaymentStatus::Success),
        ];

        let summary = summarize(&lines);
        assert_eq!(summary.default.total_requests, 2);
        assert!(summary.default.total_amount.is_finite());
        assert!(summary.default.total_amount > i64::MAX as f64 / 100.0);
    }

    #[test]
    fn unreadable_lines_are_skipped() {
        let mut agg = SummaryAggregator::default();
        agg.ingest_raw("not json");
        agg.ingest_raw(&entry("a", 100, Some(ProcessorName::Default), PaymentStatus::Success));
        assert_eq!(agg.skipped(), 1);
        assert_eq!(agg.finish().default.total_requests, 1);
    }
}
