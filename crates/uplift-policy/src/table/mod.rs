mod contacts;

pub use contacts::{read_contacts, write_contacts, write_contacts_to_path, CONTACT_COLUMNS};

use crate::scoring::{IndividualId, InputError};
use std::io::Read;
use std::path::Path;

/// Raw input table: trimmed string cells keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

/// Where the identifiers for a table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    Column(String),
    Synthesized,
}

impl FeatureTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InputError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            rows.push(record?);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row].get(column).unwrap_or("")
    }

    /// Fail fast when any of `columns` is absent, listing every missing one.
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), InputError> {
        let missing: Vec<String> = columns
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputError::MissingColumns(missing))
        }
    }

    /// Identifiers from `preferred`, else `fallback`, else a dense `0..N-1` sequence.
    pub fn identifiers(
        &self,
        preferred: Option<&str>,
        fallback: &str,
    ) -> (Vec<IndividualId>, IdentifierSource) {
        let column = preferred
            .and_then(|name| self.column_index(name).map(|index| (name, index)))
            .or_else(|| self.column_index(fallback).map(|index| (fallback, index)));

        match column {
            Some((name, index)) => {
                let ids = (0..self.len())
                    .map(|row| IndividualId::new(self.cell(row, index)))
                    .collect();
                (ids, IdentifierSource::Column(name.to_string()))
            }
            None => (IndividualId::sequence(self.len()), IdentifierSource::Synthesized),
        }
    }
}

fn normalize_header(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(csv: &str) -> FeatureTable {
        FeatureTable::from_reader(Cursor::new(csv)).expect("table parses")
    }

    #[test]
    fn reads_headers_and_trims_cells() {
        let table = table("\u{feff}customer_id , recency\n c-1 , 3 \n");
        assert_eq!(table.headers(), &["customer_id", "recency"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 0), "c-1");
        assert_eq!(table.cell(0, 1), "3");
    }

    #[test]
    fn ragged_rows_are_malformed_input() {
        let error = FeatureTable::from_reader(Cursor::new("a,b\n1,2\n3\n")).expect_err("ragged");
        assert!(matches!(error, InputError::Csv(_)));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let error = FeatureTable::from_path("./does-not-exist.csv").expect_err("no file");
        assert!(matches!(error, InputError::Io(_)));
    }

    #[test]
    fn require_columns_lists_all_missing() {
        let table = table("recency,spend\n1,2\n");
        assert!(table.require_columns(&["recency"]).is_ok());
        match table.require_columns(&["recency", "channel", "tenure"]) {
            Err(InputError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["channel", "tenure"])
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn identifiers_prefer_named_column_then_fallback_then_sequence() {
        let table = table("customer_id,row_id,recency\nc-9,r-1,1\nc-4,r-2,2\n");

        let (ids, source) = table.identifiers(Some("customer_id"), "row_id");
        assert_eq!(ids, vec![IndividualId::from("c-9"), IndividualId::from("c-4")]);
        assert_eq!(source, IdentifierSource::Column("customer_id".into()));

        let (ids, source) = table.identifiers(Some("absent"), "row_id");
        assert_eq!(ids[1].as_str(), "r-2");
        assert_eq!(source, IdentifierSource::Column("row_id".into()));

        let (ids, source) = table.identifiers(None, "member_id");
        assert_eq!(ids, IndividualId::sequence(2));
        assert_eq!(source, IdentifierSource::Synthesized);
    }
}
