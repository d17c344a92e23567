//! Append-only CSV store of quote records.
//!
//! Columns are matched by header name both ways: readers look fields up by
//! name, and appends follow the column order of the header already on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::exchange_rate::{Bank, COLLECTED_AT_FORMAT, QuoteRecord, Rates, Status};
use crate::normalize::normalize_number;

pub const HEADER: [&str; 6] = [
    "collected_at",
    "quote_date",
    "buy_rate",
    "sell_rate",
    "source",
    "status",
];

/// A record as it appears in the file and in JSON answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub collected_at: String,
    #[serde(default)]
    pub quote_date: String,
    #[serde(default)]
    pub buy_rate: String,
    #[serde(default)]
    pub sell_rate: String,
    pub source: String,
    pub status: String,
}

impl From<&QuoteRecord> for QuoteRow {
    fn from(record: &QuoteRecord) -> Self {
        let (buy_rate, sell_rate) = match record.rates() {
            Some(rates) => (rates.buy.to_string(), rates.sell.to_string()),
            None => (String::new(), String::new()),
        };
        Self {
            collected_at: record.collected_at().format(COLLECTED_AT_FORMAT).to_string(),
            quote_date: record.quote_date().to_string(),
            buy_rate,
            sell_rate,
            source: record.source().name().to_string(),
            status: record.status().to_string(),
        }
    }
}

impl QuoteRow {
    /// Field values in [`HEADER`] order.
    fn into_fields(self) -> [String; 6] {
        [
            self.collected_at,
            self.quote_date,
            self.buy_rate,
            self.sell_rate,
            self.source,
            self.status,
        ]
    }
}

impl TryFrom<QuoteRow> for QuoteRecord {
    type Error = String;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        let collected_at = NaiveDateTime::parse_from_str(&row.collected_at, COLLECTED_AT_FORMAT)
            .map_err(|e| format!("bad collected_at {:?}: {e}", row.collected_at))?;
        let source: Bank = row.source.parse()?;
        let status: Status = row.status.parse()?;

        if !status.is_success() {
            return Ok(QuoteRecord::failure(source, collected_at, status));
        }
        if row.buy_rate.trim().is_empty() || row.sell_rate.trim().is_empty() {
            return Err("successful row without both rates".to_string());
        }
        let rates = Rates {
            buy: normalize_number(&row.buy_rate),
            sell: normalize_number(&row.sell_rate),
        };
        Ok(QuoteRecord::success(source, collected_at, row.quote_date, rates))
    }
}

#[derive(Debug, Clone)]
pub struct QuoteStore {
    path: PathBuf,
}

impl QuoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a batch, writing the header first when the file is new or
    /// empty. Existing rows are never rewritten.
    ///
    /// Rows follow the column order of an existing header. A header that lacks
    /// any of [`HEADER`] fails with [`StoreError::IncompatibleHeader`] before
    /// anything is written.
    pub fn append(&self, records: &[QuoteRecord]) -> Result<usize, StoreError> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let existing = match fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => Some(self.column_order()?),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;
        if !is_new && !ends_with_newline(&mut file)? {
            // An earlier write was cut short; keep its partial row separate.
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let order = match existing {
            Some(order) if !is_new => order,
            _ => {
                writer.write_record(HEADER)?;
                (0..HEADER.len()).map(Some).collect()
            }
        };
        for record in records {
            let fields = QuoteRow::from(record).into_fields();
            writer.write_record(order.iter().map(|column| match column {
                Some(index) => fields[*index].as_str(),
                None => "",
            }))?;
        }
        writer.flush()?;

        Ok(records.len())
    }

    /// Reads every readable record in file order. Rows that cannot be parsed,
    /// such as a partially written last row, are skipped with a warning.
    pub fn load(&self) -> Result<Vec<QuoteRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Unavailable(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<QuoteRow>().enumerate() {
            match row.map_err(|e| e.to_string()).and_then(QuoteRecord::try_from) {
                Ok(record) => records.push(record),
                Err(reason) => warn!(
                    "Skipping row {} of {}: {reason}",
                    index + 2,
                    self.path.display()
                ),
            }
        }
        Ok(records)
    }
}

impl QuoteStore {
    /// Position in [`HEADER`] of each column of the header on disk; `None`
    /// for columns this store does not write.
    fn column_order(&self) -> Result<Vec<Option<usize>>, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let found = reader.headers()?.clone();

        let missing: Vec<&str> = HEADER
            .iter()
            .copied()
            .filter(|name| !found.iter().any(|column| column == *name))
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::IncompatibleHeader {
                path: self.path.clone(),
                missing: missing.join(", "),
            });
        }

        Ok(found
            .iter()
            .map(|column| HEADER.iter().position(|name| *name == column))
            .collect())
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
