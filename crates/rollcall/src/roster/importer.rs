//! Spreadsheet ingestion with header inference.
//!
//! The importer accepts a generic grid of cells, whatever file format it
//! came from, locates the header row and the columns it needs, and turns the
//! remaining rows into [`UserRecord`]s. It either returns the complete batch
//! or an [`ImportError`]; nothing is emitted partially.

use std::collections::HashSet;

use serde_json::{Number, Value};
use tracing::{debug, info, trace};

use super::keywords::{field_keywords, normalize};
use super::{RosterField, UserRecord};
use crate::error::ImportError;

/// A single spreadsheet cell. Cells arrive untyped: strings, numbers,
/// booleans and blanks all occur.
pub type Cell = Value;

/// Default number of leading rows searched for the header.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 3;

/// Importer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// How many leading rows may hold the header.
    pub header_scan_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    identifier: usize,
    name: usize,
    passport: Option<usize>,
    nationality: Option<usize>,
}

impl ColumnMap {
    fn is_mapped(&self, idx: usize) -> bool {
        idx == self.identifier
            || idx == self.name
            || self.passport == Some(idx)
            || self.nationality == Some(idx)
    }
}

/// Parses roster grids into validated user records.
#[derive(Debug, Clone, Default)]
pub struct RosterImporter {
    config: ImportConfig,
}

impl RosterImporter {
    /// Create an importer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an importer with custom configuration.
    #[must_use]
    pub fn with_config(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Parse a grid into user records.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingColumn`] when the identifier or name
    /// column cannot be found, [`ImportError::DuplicateIdentifier`] when an
    /// identifier repeats, and [`ImportError::EmptyResult`] when no row
    /// yields a record.
    pub fn import(&self, rows: &[Vec<Cell>]) -> Result<Vec<UserRecord>, ImportError> {
        let header_row = self.find_header_row(rows);
        let headers: Vec<String> = rows
            .get(header_row)
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        debug!(header_row, ?headers, "Located roster header");

        let columns = resolve_columns(&headers, header_row)?;
        let records = extract_records(&rows[(header_row + 1).min(rows.len())..], &headers, columns);

        check_duplicates(&records)?;
        if records.is_empty() {
            return Err(ImportError::EmptyResult);
        }

        info!(count = records.len(), "Roster parsed");
        Ok(records)
    }

    /// Find the header row within the scan window.
    ///
    /// The first row holding a cell that matches any field keyword wins;
    /// row 0 is assumed when none does.
    #[must_use]
    pub fn find_header_row(&self, rows: &[Vec<Cell>]) -> usize {
        rows.iter()
            .take(self.config.header_scan_rows)
            .position(|row| {
                row.iter().any(|cell| {
                    let Value::String(text) = cell else {
                        return false;
                    };
                    let text = normalize(text);
                    RosterField::ALL
                        .iter()
                        .any(|field| field_keywords(*field).matches(&text))
                })
            })
            .unwrap_or(0)
    }
}

/// Find the column for a field.
///
/// A header equal to any listed synonym of the field (bare or qualified,
/// e.g. `name` and `employee name` alike) wins over a header that merely
/// contains a fragment. Within each pass the leftmost column wins, so
/// `Employee Name, Name` resolves to the first column.
#[must_use]
pub(crate) fn resolve_column(headers: &[String], field: RosterField) -> Option<usize> {
    let keywords = field_keywords(field);
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();

    normalized
        .iter()
        .position(|h| keywords.matches_exact(h))
        .or_else(|| {
            normalized
                .iter()
                .position(|h| !h.is_empty() && keywords.matches_substring(h))
        })
}

fn resolve_columns(headers: &[String], header_row: usize) -> Result<ColumnMap, ImportError> {
    let required = |field: RosterField| {
        resolve_column(headers, field).ok_or_else(|| ImportError::MissingColumn {
            field,
            header_row,
            headers: headers.to_vec(),
        })
    };

    let columns = ColumnMap {
        identifier: required(RosterField::Identifier)?,
        name: required(RosterField::Name)?,
        passport: resolve_column(headers, RosterField::Passport),
        nationality: resolve_column(headers, RosterField::Nationality),
    };
    trace!(?columns, "Resolved roster columns");
    Ok(columns)
}

fn extract_records(rows: &[Vec<Cell>], headers: &[String], columns: ColumnMap) -> Vec<UserRecord> {
    let text_at = |row: &[Cell], idx: usize| row.get(idx).map(cell_text).unwrap_or_default();
    let mut records = Vec::new();

    for (offset, row) in rows.iter().enumerate() {
        if row.iter().all(|cell| cell_text(cell).is_empty()) {
            continue;
        }

        let identifier = text_at(row, columns.identifier);
        let name = text_at(row, columns.name);
        if identifier.is_empty() && name.is_empty() {
            continue;
        }
        if identifier.is_empty() {
            debug!(row = offset, %name, "Dropping row without identifier");
            continue;
        }

        let mut record = UserRecord::new(identifier, name);
        record.passport = columns
            .passport
            .map(|idx| text_at(row, idx))
            .unwrap_or_default();
        record.nationality = columns
            .nationality
            .map(|idx| text_at(row, idx))
            .unwrap_or_default();

        for (idx, cell) in row.iter().enumerate() {
            if columns.is_mapped(idx) {
                continue;
            }
            let value = cell_text(cell);
            if value.is_empty() {
                continue;
            }
            let key = match headers.get(idx).map(|h| h.trim()) {
                Some(h) if !h.is_empty() && !record.extra.contains_key(h) => h.to_string(),
                Some(h) if !h.is_empty() => {
                    trace!(header = h, column = idx + 1, "Repeated header, keying by position");
                    format!("{h} ({})", idx + 1)
                }
                _ => format!("column_{}", idx + 1),
            };
            record.extra.insert(key, value);
        }

        records.push(record);
    }

    records
}

fn check_duplicates(records: &[UserRecord]) -> Result<(), ImportError> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();

    for record in records {
        if !seen.insert(record.identifier.as_str()) && !duplicates.contains(&record.identifier) {
            duplicates.push(record.identifier.clone());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ImportError::DuplicateIdentifier(duplicates))
    }
}

/// Render a cell as trimmed text.
///
/// Integral floats lose their fractional part so numeric identifiers read
/// back the way they were typed.
#[must_use]
pub(crate) fn cell_text(cell: &Cell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract().abs() < f64::EPSILON && f.abs() < 1e15 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: &[&[Value]]) -> Vec<Vec<Cell>> {
        rows.iter().map(|row| row.to_vec()).collect()
    }

    fn import(rows: &[&[Value]]) -> Result<Vec<UserRecord>, ImportError> {
        RosterImporter::new().import(&grid(rows))
    }

    #[test]
    fn test_basic_import() {
        let records = import(&[
            &[json!("ID"), json!("Name")],
            &[json!("A1"), json!("Alice")],
            &[json!("B2"), json!("Bob")],
        ])
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], UserRecord::new("A1", "Alice"));
        assert_eq!(records[1], UserRecord::new("B2", "Bob"));
    }

    #[test]
    fn test_duplicate_identifier_rejects_whole_batch() {
        let result = import(&[
            &[json!("ID"), json!("Name")],
            &[json!("A1"), json!("Alice")],
            &[json!("A1"), json!("Bob")],
        ]);
        assert_eq!(
            result,
            Err(ImportError::DuplicateIdentifier(vec!["A1".to_string()]))
        );
    }

    #[test]
    fn test_duplicates_listed_once_in_order() {
        let result = import(&[
            &[json!("ID"), json!("Name")],
            &[json!("B2"), json!("Bob")],
            &[json!("A1"), json!("Alice")],
            &[json!("A1"), json!("Alice again")],
            &[json!("B2"), json!("Bob again")],
            &[json!("A1"), json!("Alice thrice")],
        ]);
        assert_eq!(
            result,
            Err(ImportError::DuplicateIdentifier(vec![
                "A1".to_string(),
                "B2".to_string()
            ]))
        );
    }

    #[test]
    fn test_row_without_identifier_is_dropped() {
        let records = import(&[
            &[json!("ID"), json!("Name")],
            &[json!("A1"), json!("Alice")],
            &[json!(""), json!("Carol")],
        ])
        .unwrap();

        assert_eq!(records, vec![UserRecord::new("A1", "Alice")]);
    }

    #[test]
    fn test_identifier_without_name_is_kept() {
        let records = import(&[
            &[json!("ID"), json!("Name")],
            &[json!("A1"), Value::Null],
        ])
        .unwrap();
        assert_eq!(records, vec![UserRecord::new("A1", "")]);
    }

    #[test]
    fn test_iqama_header_resolved_by_substring() {
        let records = import(&[
            &[json!("Name"), json!("Iqama")],
            &[json!("Alice"), json!("2345678901")],
        ])
        .unwrap();
        assert_eq!(records[0].identifier, "2345678901");
        assert_eq!(records[0].name, "Alice");

        let records = import(&[
            &[json!("Employee NAME"), json!("  IQAMA # ")],
            &[json!("Alice"), json!("2345678901")],
        ])
        .unwrap();
        assert_eq!(records[0].identifier, "2345678901");
        assert_eq!(records[0].name, "Alice");
    }

    #[test]
    fn test_exact_match_preferred_over_substring() {
        let headers = vec!["Father Name".to_string(), "Name".to_string()];
        assert_eq!(resolve_column(&headers, RosterField::Name), Some(1));

        let headers = vec!["Passport Holder".to_string(), "Passport No".to_string()];
        assert_eq!(resolve_column(&headers, RosterField::Passport), Some(1));
    }

    #[test]
    fn test_listed_synonyms_tie_broken_leftmost() {
        let headers = vec!["Employee Name".to_string(), "Name".to_string()];
        assert_eq!(resolve_column(&headers, RosterField::Name), Some(0));

        let headers = vec![
            "Iqama Number".to_string(),
            "ID".to_string(),
            "Employee ID".to_string(),
        ];
        assert_eq!(resolve_column(&headers, RosterField::Identifier), Some(0));
    }

    #[test]
    fn test_substring_tie_broken_leftmost() {
        let headers = vec![
            "Father Name".to_string(),
            "Mother Name".to_string(),
            "Iqama".to_string(),
        ];
        assert_eq!(resolve_column(&headers, RosterField::Name), Some(0));
    }

    #[test]
    fn test_name_and_nationality_resolve_independently() {
        let headers = vec![
            "Nationality".to_string(),
            "Name".to_string(),
            "ID".to_string(),
        ];
        assert_eq!(resolve_column(&headers, RosterField::Nationality), Some(0));
        assert_eq!(resolve_column(&headers, RosterField::Name), Some(1));
        assert_eq!(resolve_column(&headers, RosterField::Identifier), Some(2));
    }

    #[test]
    fn test_header_found_below_title_rows() {
        let rows = grid(&[
            &[json!("Staff list, March")],
            &[],
            &[json!("Iqama"), json!("Name"), json!("Passport"), json!("Nationality")],
            &[json!(2_345_678_901_u64), json!("Alice"), json!("P123"), json!("Egypt")],
        ]);
        let importer = RosterImporter::new();
        assert_eq!(importer.find_header_row(&rows), 2);

        let records = importer.import(&rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "2345678901");
        assert_eq!(records[0].passport, "P123");
        assert_eq!(records[0].nationality, "Egypt");
    }

    #[test]
    fn test_header_outside_scan_window_defaults_to_zero() {
        let rows = grid(&[
            &[json!("title")],
            &[json!("subtitle")],
            &[json!("notes")],
            &[json!("ID"), json!("Name")],
        ]);
        assert_eq!(RosterImporter::new().find_header_row(&rows), 0);

        let wider = RosterImporter::with_config(ImportConfig {
            header_scan_rows: 4,
        });
        assert_eq!(wider.find_header_row(&rows), 3);
    }

    #[test]
    fn test_arabic_headers() {
        let records = import(&[
            &[json!("رقم الإقامة"), json!("الاسم"), json!("الجنسية")],
            &[json!("2345678901"), json!("أحمد"), json!("مصر")],
        ])
        .unwrap();
        assert_eq!(records[0].identifier, "2345678901");
        assert_eq!(records[0].name, "أحمد");
        assert_eq!(records[0].nationality, "مصر");
    }

    #[test]
    fn test_missing_identifier_column() {
        let result = import(&[&[json!("Name"), json!("Passport")], &[json!("Alice"), json!("P1")]]);
        match result {
            Err(ImportError::MissingColumn {
                field,
                header_row,
                headers,
            }) => {
                assert_eq!(field, RosterField::Identifier);
                assert_eq!(header_row, 0);
                assert_eq!(headers, vec!["Name".to_string(), "Passport".to_string()]);
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_name_column() {
        let result = import(&[&[json!("Iqama"), json!("Passport")], &[json!("1"), json!("P1")]]);
        assert!(matches!(
            result,
            Err(ImportError::MissingColumn {
                field: RosterField::Name,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(
            import(&[&[json!("ID"), json!("Name")]]),
            Err(ImportError::EmptyResult)
        );
        assert_eq!(
            import(&[
                &[json!("ID"), json!("Name")],
                &[],
                &[json!(" "), Value::Null],
                &[json!(""), json!("Nobody")],
            ]),
            Err(ImportError::EmptyResult)
        );
    }

    #[test]
    fn test_empty_grid_reports_missing_column() {
        let result = RosterImporter::new().import(&[]);
        assert!(matches!(
            result,
            Err(ImportError::MissingColumn {
                field: RosterField::Identifier,
                header_row: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_cells_are_trimmed_and_stringified() {
        let records = import(&[
            &[json!("ID"), json!("Name"), json!("Passport")],
            &[json!(1234.0), json!("  Alice  "), json!(987_654)],
        ])
        .unwrap();
        assert_eq!(records[0].identifier, "1234");
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].passport, "987654");
    }

    #[test]
    fn test_short_rows_do_not_panic() {
        let records = import(&[
            &[json!("Name"), json!("Nationality"), json!("ID")],
            &[json!("Alice")],
            &[json!("Bob"), json!("Sudan"), json!("B2")],
        ])
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "B2");
    }

    #[test]
    fn test_unmapped_columns_become_extra() {
        let records = import(&[
            &[json!("ID"), json!("Name"), json!("Department"), json!("")],
            &[json!("A1"), json!("Alice"), json!("Finance"), json!("note")],
            &[json!("B2"), json!("Bob"), Value::Null],
        ])
        .unwrap();
        assert_eq!(records[0].extra.get("Department").map(String::as_str), Some("Finance"));
        assert_eq!(records[0].extra.get("column_4").map(String::as_str), Some("note"));
        assert!(records[1].extra.is_empty());
    }

    #[test]
    fn test_repeated_extra_headers_keep_both_values() {
        let records = import(&[
            &[json!("ID"), json!("Name"), json!("Phone"), json!("Phone")],
            &[json!("A1"), json!("Alice"), json!(111), json!(222)],
        ])
        .unwrap();
        let extra = &records[0].extra;
        assert_eq!(extra.len(), 2);
        assert_eq!(extra.get("Phone").map(String::as_str), Some("111"));
        assert_eq!(extra.get("Phone (4)").map(String::as_str), Some("222"));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(12.5)), "12.5");
        assert_eq!(cell_text(&json!(-3)), "-3");
        assert_eq!(cell_text(&json!("  x ")), "x");
    }
}
