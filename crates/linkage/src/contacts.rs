use std::collections::HashSet;

use calllog_io::Table;
use tracing::debug;

use crate::error::PipelineError;
use crate::frame::Frame;
use crate::model::{ContactDirectory, ContactEntry};
use crate::phone::PhoneNumber;

pub const SOURCE: &str = "contacts";

/// Build the canonical contact directory.
///
/// Column names are capitalized, `Number` is normalized to a phone key and
/// whitespace-only cells count as absent. Columns with no value in any row
/// are dropped. When a number repeats, the first row wins: repeated numbers
/// in real contact exports carry near-identical names.
pub fn load_contacts(table: Table) -> Result<ContactDirectory, PipelineError> {
    let frame = Frame::from_table(SOURCE, table)?;
    let number_col = frame.column("Number")?;
    let name_col = frame.column("Name")?;

    // Cell values per row, with the number column already normalized
    let parsed: Vec<(Option<PhoneNumber>, Vec<Option<String>>)> = frame
        .rows
        .iter()
        .map(|row| {
            let number = PhoneNumber::from_cell(row.cell(number_col));
            let values = (0..frame.headers.len())
                .map(|c| row.cell(c).text())
                .collect();
            (number, values)
        })
        .collect();

    let present: Vec<bool> = (0..frame.headers.len())
        .map(|c| {
            if c == number_col {
                parsed.iter().any(|(n, _)| n.is_some())
            } else {
                parsed.iter().any(|(_, v)| v[c].is_some())
            }
        })
        .collect();

    let columns: Vec<String> = frame
        .headers
        .iter()
        .zip(&present)
        .filter(|(h, p)| **p && !h.is_empty())
        .map(|(h, _)| h.clone())
        .collect();

    let mut seen: HashSet<PhoneNumber> = HashSet::new();
    let mut entries = Vec::with_capacity(parsed.len());
    let mut duplicates = 0;

    for (number, mut values) in parsed {
        if let Some(ref n) = number {
            if !seen.insert(n.clone()) {
                duplicates += 1;
                continue;
            }
        }

        let extra = frame
            .headers
            .iter()
            .enumerate()
            .filter(|&(c, h)| c != number_col && c != name_col && present[c] && !h.is_empty())
            .filter_map(|(c, h)| values[c].take().map(|v| (h.clone(), v)))
            .collect();

        entries.push(ContactEntry {
            number,
            name: values[name_col].take(),
            extra,
        });
    }

    debug!(
        contacts = entries.len(),
        duplicates,
        dropped_columns = frame.headers.len() - columns.len(),
        "contacts loaded"
    );

    Ok(ContactDirectory::new(entries, columns, duplicates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calllog_io::Cell;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table::from_text_rows(rows)
    }

    #[test]
    fn first_duplicate_wins() {
        let dir = load_contacts(table(vec![
            vec!["Number", "Name"],
            vec!["(555) 123-4567", "Jane Doe"],
            vec!["5551234567", "Jane D."],
            vec!["5559876543", "John Roe"],
        ]))
        .unwrap();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.duplicates_dropped, 1);
        let jane = dir.lookup(&PhoneNumber::parse("5551234567").unwrap()).unwrap();
        assert_eq!(jane.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn numeric_cells_join_with_text() {
        let t = Table::new(vec![
            vec![Cell::Text("NUMBER".into()), Cell::Text("name".into())],
            vec![Cell::Number(5551234567.0), Cell::Text("Jane".into())],
        ]);
        let dir = load_contacts(t).unwrap();
        assert!(dir.lookup(&PhoneNumber::parse("555-123-4567").unwrap()).is_some());
    }

    #[test]
    fn empty_columns_dropped_and_extras_kept() {
        let dir = load_contacts(table(vec![
            vec!["Number", "Name", "Fax", "Company"],
            vec!["555", "Jane", "  ", "Acme"],
            vec!["556", "John", "", ""],
        ]))
        .unwrap();

        assert_eq!(dir.columns, vec!["Number", "Name", "Company"]);
        assert_eq!(dir.entries[0].extra, vec![("Company".to_string(), "Acme".to_string())]);
        assert!(dir.entries[1].extra.is_empty());
    }

    #[test]
    fn empty_name_column_yields_absent_names() {
        let dir = load_contacts(table(vec![
            vec!["Number", "Name"],
            vec!["555", ""],
            vec!["556", "   "],
        ]))
        .unwrap();
        assert_eq!(dir.columns, vec!["Number"]);
        assert!(dir.entries.iter().all(|e| e.name.is_none()));
    }

    #[test]
    fn absent_numbers_kept_but_never_deduplicated() {
        let dir = load_contacts(table(vec![
            vec!["Number", "Name"],
            vec!["", "Front desk"],
            vec!["n/a", "Back office"],
        ]))
        .unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.duplicates_dropped, 0);
    }

    #[test]
    fn missing_columns() {
        let err = load_contacts(table(vec![vec!["Phone", "Name"], vec!["555", "x"]])).unwrap_err();
        assert_eq!(err.to_string(), "contacts: missing column 'Number'");

        let err = load_contacts(table(vec![vec!["Number"], vec!["555"]])).unwrap_err();
        assert_eq!(err.to_string(), "contacts: missing column 'Name'");
    }
}
