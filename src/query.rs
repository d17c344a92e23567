//! Latest-quote lookups over the store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::warn;

use crate::error::StoreError;
use crate::exchange_rate::{Bank, QuoteRecord};
use crate::normalize::{CANONICAL_DATE, parse_date};
use crate::store::QuoteStore;

/// Which sources a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The latest record of one bank.
    Bank(Bank),
    /// The latest record of every bank ("TODOS").
    Every,
    /// No bank named: the single latest record of any bank.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCommand {
    pub scope: Scope,
    pub date: Option<NaiveDate>,
}

impl QueryCommand {
    pub const ALL_KEYWORD: &'static str = "TODOS";

    /// Parses `<BANK|TODOS> [YYYY-MM-DD]` in any case and word order.
    ///
    /// Returns `None` when the text names neither a bank nor a date. Unknown
    /// words are ignored; when several banks are named the last one wins.
    pub fn parse(text: &str) -> Option<Self> {
        let mut scope = None;
        let mut date = None;

        for word in text.split_whitespace() {
            if word.eq_ignore_ascii_case(Self::ALL_KEYWORD) {
                scope = Some(Scope::Every);
            } else if let Some(bank) = Bank::from_keyword(word) {
                scope = Some(Scope::Bank(bank));
            } else if let Ok(day) = NaiveDate::parse_from_str(word, CANONICAL_DATE) {
                date = Some(day);
            }
        }

        if scope.is_none() && date.is_none() {
            return None;
        }
        Some(Self {
            scope: scope.unwrap_or(Scope::Any),
            date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoData {
    StoreUnavailable,
    NoMatches,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Found(Vec<QuoteRecord>),
    NoData(NoData),
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store: QuoteStore,
}

impl QueryService {
    pub fn new(store: QuoteStore) -> Self {
        Self { store }
    }

    /// A missing store is reported as [`NoData::StoreUnavailable`]; only
    /// unreadable stores are errors.
    pub fn query(&self, command: &QueryCommand) -> Result<QueryResult, StoreError> {
        match self.store.load() {
            Ok(records) => Ok(select(records, command)),
            Err(StoreError::Unavailable(path)) => {
                warn!("Quote store {} does not exist yet", path.display());
                Ok(QueryResult::NoData(NoData::StoreUnavailable))
            }
            Err(e) => Err(e),
        }
    }
}

/// Applies a command to records in file order. Ties on `collected_at` go to
/// the record appended last.
pub fn select(records: Vec<QuoteRecord>, command: &QueryCommand) -> QueryResult {
    let matching = records
        .into_iter()
        .enumerate()
        .filter(|(_, record)| {
            command
                .date
                .is_none_or(|day| parse_date(record.quote_date()) == Some(day))
        })
        .filter(|(_, record)| match command.scope {
            Scope::Bank(bank) => record.source() == bank,
            Scope::Every | Scope::Any => true,
        });

    let found: Vec<QuoteRecord> = match command.scope {
        Scope::Every => {
            let mut latest: BTreeMap<&'static str, (usize, QuoteRecord)> = BTreeMap::new();
            for (index, record) in matching {
                let name = record.source().name();
                let newer = latest.get(name).is_none_or(|(seen_index, seen)| {
                    (record.collected_at(), index) >= (seen.collected_at(), *seen_index)
                });
                if newer {
                    latest.insert(name, (index, record));
                }
            }
            latest.into_values().map(|(_, record)| record).collect()
        }
        Scope::Bank(_) | Scope::Any => matching
            .max_by_key(|(index, record)| (record.collected_at(), *index))
            .map(|(_, record)| record)
            .into_iter()
            .collect(),
    };

    if found.is_empty() {
        QueryResult::NoData(NoData::NoMatches)
    } else {
        QueryResult::Found(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange_rate::{RateValue, Rates, Status};
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use temp_dir::TempDir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn ok(bank: Bank, collected_at: NaiveDateTime, date: &str, buy: i64) -> QuoteRecord {
        QuoteRecord::success(
            bank,
            collected_at,
            date,
            Rates {
                buy: RateValue::Number(Decimal::from(buy)),
                sell: RateValue::Number(Decimal::from(buy + 50)),
            },
        )
    }

    fn command(text: &str) -> QueryCommand {
        QueryCommand::parse(text).unwrap()
    }

    fn found(result: QueryResult) -> Vec<QuoteRecord> {
        match result {
            QueryResult::Found(records) => records,
            QueryResult::NoData(reason) => panic!("expected records, got {reason:?}"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            QueryCommand::parse("bna 2025-04-25"),
            Some(QueryCommand {
                scope: Scope::Bank(Bank::Bna),
                date: NaiveDate::from_ymd_opt(2025, 4, 25),
            })
        );
        assert_eq!(command("2025-04-25 Todos").scope, Scope::Every);
        assert_eq!(command("  PROVINCIA ").scope, Scope::Bank(Bank::Provincia));
        assert_eq!(command("2025-04-25").scope, Scope::Any);
        assert_eq!(QueryCommand::parse("hola"), None);
        assert_eq!(QueryCommand::parse(""), None);
        assert_eq!(QueryCommand::parse("bna 25/04/2025").unwrap().date, None);
    }

    #[test]
    fn test_bank_returns_latest_record() {
        let records = vec![
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1100),
            ok(Bank::Bna, at(25, 11), "2025-04-25", 1300),
            ok(Bank::Bbva, at(25, 12), "2025-04-25", 1400),
            ok(Bank::Bna, at(25, 10), "2025-04-25", 1200),
        ];

        let result = found(select(records, &command("BNA")));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].collected_at(), at(25, 11));
    }

    #[test]
    fn test_latest_failure_is_returned_as_is() {
        let records = vec![
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1100),
            QuoteRecord::failure(Bank::Bna, at(25, 10), Status::Error("down".to_string())),
        ];
        let result = found(select(records, &command("BNA")));
        assert!(!result[0].is_success());
    }

    #[test]
    fn test_todos_returns_latest_per_source_for_date() {
        let records = vec![
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1100),
            ok(Bank::Bbva, at(25, 9), "2025-04-25", 1150),
            ok(Bank::Bna, at(25, 15), "2025-04-25", 1120),
            ok(Bank::Bbva, at(25, 16), "2025-04-25", 1160),
            ok(Bank::Bna, at(26, 9), "2025-04-26", 1130),
            ok(Bank::Ciudad, at(24, 9), "24/04/2025", 1090),
        ];

        let result = found(select(records, &command("TODOS 2025-04-25")));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].source(), Bank::Bbva);
        assert_eq!(result[0].collected_at(), at(25, 16));
        assert_eq!(result[1].source(), Bank::Bna);
        assert_eq!(result[1].collected_at(), at(25, 15));
    }

    #[test]
    fn test_todos_sorted_by_source_name() {
        let records = vec![
            ok(Bank::Provincia, at(25, 9), "2025-04-25", 1),
            ok(Bank::Ciudad, at(25, 9), "2025-04-25", 1),
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1),
            ok(Bank::Bbva, at(25, 9), "2025-04-25", 1),
        ];
        let names: Vec<&str> = found(select(records, &command("todos")))
            .iter()
            .map(|r| r.source().name())
            .collect();
        assert_eq!(names, vec!["BBVA", "BNA", "Banco Ciudad", "Banco Provincia"]);
    }

    #[test]
    fn test_date_only_matches_legacy_date_format() {
        let records = vec![ok(Bank::Ciudad, at(24, 9), "24/04/2025", 1090)];
        let result = found(select(records, &command("2025-04-24")));
        assert_eq!(result[0].source(), Bank::Ciudad);
    }

    #[test]
    fn test_equal_times_prefer_last_appended() {
        let records = vec![
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1100),
            ok(Bank::Bna, at(25, 9), "2025-04-25", 1111),
        ];
        let result = found(select(records, &command("bna")));
        assert_eq!(
            result[0].rates().unwrap().buy,
            RateValue::Number(Decimal::from(1111))
        );
    }

    #[test]
    fn test_no_matches() {
        let records = vec![ok(Bank::Bna, at(25, 9), "2025-04-25", 1100)];
        assert_eq!(
            select(records, &command("CIUDAD")),
            QueryResult::NoData(NoData::NoMatches)
        );
        assert_eq!(
            select(Vec::new(), &command("TODOS")),
            QueryResult::NoData(NoData::NoMatches)
        );
    }

    #[test]
    fn test_missing_or_empty_store_is_no_data() {
        let dir = TempDir::new().unwrap();
        let store = QuoteStore::new(dir.path().join("quotes.csv"));
        let service = QueryService::new(store.clone());

        assert_eq!(
            service.query(&command("PROVINCIA")).unwrap(),
            QueryResult::NoData(NoData::StoreUnavailable)
        );

        store.append(&[]).unwrap();
        assert_eq!(
            service.query(&command("PROVINCIA")).unwrap(),
            QueryResult::NoData(NoData::NoMatches)
        );
    }
}
