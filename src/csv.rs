//! Minimal CSV/TSV support: rows in as a [`Table`], placements out as CSV.

use crate::table::Table;
use crate::types::{CellValue, Placement};

/// Delimiter for parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }
}

/// Parse CSV/TSV bytes into a [`Table`].
///
/// Empty lines are dropped. Fields that parse as numbers become
/// [`CellValue::Number`]. A leading header row is detected and removed when
/// none of its coordinate/size columns is numeric.
pub fn parse_delimited(data: &[u8], delim: Delimiter) -> Table {
    let text = String::from_utf8_lossy(data);
    let sep = delim.as_char();

    let mut rows: Vec<Vec<CellValue>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            split_csv_line(line, sep)
                .into_iter()
                .map(|field| classify(field.trim()))
                .collect()
        })
        .collect();

    if rows.first().is_some_and(|first| is_header(first)) {
        rows.remove(0);
    }

    Table::new(rows)
}

fn classify(value: &str) -> CellValue {
    if value.is_empty() {
        CellValue::Empty
    } else if let Ok(n) = value.parse::<f64>() {
        CellValue::Number(n)
    } else {
        CellValue::Text(value.to_string())
    }
}

fn is_header(row: &[CellValue]) -> bool {
    row.iter()
        .skip(1)
        .take(4)
        .all(|cell| !matches!(cell, CellValue::Number(_)))
}

/// Split a CSV line respecting quoted fields.
fn split_csv_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

/// Render placements as `name,x,y` rows with a header.
pub fn write_placements(placements: &[Placement], delim: Delimiter) -> String {
    let sep = delim.as_char();
    let mut out = String::with_capacity(32 * (placements.len() + 1));
    out.push_str(&format!("name{sep}x{sep}y\n"));
    for p in placements {
        out.push_str(&quote_field(&p.name, sep));
        out.push(sep);
        out.push_str(&p.x.to_string());
        out.push(sep);
        out.push_str(&p.y.to_string());
        out.push('\n');
    }
    out
}

fn quote_field(field: &str, sep: char) -> String {
    if field.contains(sep) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_with_header() {
        let data = b"Name,X,Y,Length,Width\nWS-1,100,200,120,60\nWS-2,150,210,120,60";
        let table = parse_delimited(data, Delimiter::Comma);
        assert_eq!(table.len(), 2);
        assert_eq!(*table.get(0, 0), CellValue::Text("WS-1".to_string()));
        assert_eq!(*table.get(1, 4), CellValue::Number(60.0));
    }

    #[test]
    fn test_parse_csv_without_header() {
        let table = parse_delimited(b"a,1,2,3,4\n\nb,5,6,7,8\n", Delimiter::Comma);
        assert_eq!(table.len(), 2);
        assert_eq!(*table.get(1, 1), CellValue::Number(5.0));
    }

    #[test]
    fn test_parse_tsv() {
        let table = parse_delimited(b"desk\t1.5\t2\t3\t4", Delimiter::Tab);
        assert_eq!(*table.get(0, 1), CellValue::Number(1.5));
    }

    #[test]
    fn test_quoted_fields() {
        let fields = split_csv_line(r#""Desk, corner",1,"say ""hi""""#, ',');
        assert_eq!(fields, vec!["Desk, corner", "1", "say \"hi\""]);
    }

    #[test]
    fn test_write_placements_quotes_names() {
        let csv = write_placements(
            &[
                Placement {
                    name: "Desk, corner".to_string(),
                    x: 45.0,
                    y: 45.5,
                },
                Placement {
                    name: "plain".to_string(),
                    x: 55.0,
                    y: 55.0,
                },
            ],
            Delimiter::Comma,
        );
        assert_eq!(csv, "name,x,y\n\"Desk, corner\",45,45.5\nplain,55,55\n");
    }

    #[test]
    fn test_written_csv_parses_back() {
        let csv = write_placements(
            &[Placement {
                name: "a".to_string(),
                x: 1.25,
                y: 2.0,
            }],
            Delimiter::Tab,
        );
        let table = parse_delimited(csv.as_bytes(), Delimiter::Tab);
        assert_eq!(table.len(), 1);
        assert_eq!(*table.get(0, 1), CellValue::Number(1.25));
    }
}
