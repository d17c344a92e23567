//! One collection cycle across every configured source.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, SubsecRound};
use log::{error, info};
use uuid::Uuid;

use crate::exchange_rate::{Bank, QuoteRecord, Rates, Status};
use crate::normalize::{normalize_date, normalize_number_as};
use crate::source::{QuoteSource, RawQuote};

/// Outcome counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    pub elapsed: Duration,
}

impl CollectionStats {
    pub fn tally(records: &[QuoteRecord], elapsed: Duration) -> Self {
        let success = records.iter().filter(|r| r.is_success()).count();
        Self {
            total: records.len(),
            success,
            errors: records.len() - success,
            elapsed,
        }
    }

    pub fn log_summary(&self, cycle: &Uuid) {
        let seconds = self.elapsed.as_secs_f64();
        if self.success > 0 {
            info!(
                "=== Cycle {cycle} completed with {}/{} successful collections in {seconds:.2} seconds ===",
                self.success, self.total
            );
        } else {
            error!("=== Cycle {cycle}: all {} collections failed after {seconds:.2} seconds ===", self.total);
        }
    }
}

pub struct Collector {
    sources: Vec<Arc<dyn QuoteSource>>,
}

impl Collector {
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        Self { sources }
    }

    /// Runs every source once, in order, and returns one record per source.
    ///
    /// A failing or panicking source yields a failure record; it never stops
    /// the remaining sources from running.
    pub async fn collect(&self) -> Vec<QuoteRecord> {
        let cycle = Uuid::new_v4();
        let started = Instant::now();
        info!("=== Starting exchange rate collection {cycle} ===");

        let mut records = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            records.push(collect_one(Arc::clone(source)).await);
        }

        CollectionStats::tally(&records, started.elapsed()).log_summary(&cycle);
        records
    }
}

async fn collect_one(source: Arc<dyn QuoteSource>) -> QuoteRecord {
    let bank = source.bank();
    // Own task so a panic inside the source surfaces as a JoinError.
    let outcome = tokio::spawn(async move { source.fetch().await }).await;
    let collected_at = Local::now().naive_local().trunc_subsecs(0);

    match outcome {
        Ok(Ok(raw)) => to_record(bank, collected_at, raw),
        Ok(Err(e)) => {
            error!("{bank} collection failed: {e}");
            QuoteRecord::failure(bank, collected_at, e.status())
        }
        Err(e) => {
            error!("Critical error in {bank} execution: {e}");
            QuoteRecord::failure(bank, collected_at, Status::CriticalError(e.to_string()))
        }
    }
}

fn to_record(bank: Bank, collected_at: NaiveDateTime, raw: RawQuote) -> QuoteRecord {
    info!(
        "Successfully obtained {bank} rates: Buy={}, Sell={} (Date: {})",
        raw.buy, raw.sell, raw.quote_date
    );
    let rates = Rates {
        buy: normalize_number_as(&raw.buy, raw.notation),
        sell: normalize_number_as(&raw.sell, raw.notation),
    };
    QuoteRecord::success(bank, collected_at, normalize_date(&raw.quote_date), rates)
}
