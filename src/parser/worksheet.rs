//! Worksheet parsing - parses individual sheet XML into Sheet structs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::{OverlapFixError, Result};
use crate::types::{Cell, CellData, CellValue, ColumnDef, Formula, RowDef, Sheet};
use crate::xml_helpers::{attr_bool_default, attr_f64, attr_string, attr_u32};

use super::relationships::SheetInfo;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" | b"d" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

/// Text collected from a `<c>` element's children.
#[derive(Default)]
struct CellBody {
    value: Option<String>,
    formula: Option<Formula>,
    inline: Option<String>,
}

#[derive(Clone, Copy)]
enum TextTarget {
    Value,
    Formula,
    Inline,
}

/// Parse a single worksheet
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;
    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut sheet = Sheet::new(info.name.clone());
    sheet.state = info.state;

    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    // Rows and cells may omit `r`; track the implied position.
    let mut current_row: u32 = 0;
    let mut seen_row = false;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"sheetFormatPr" => {
                        sheet.default_row_height = attr_f64(e, b"defaultRowHeight");
                    }
                    b"col" => {
                        if let Some(col) = parse_col(e) {
                            sheet.columns.push(col);
                        }
                    }
                    b"row" => {
                        let implied = if seen_row { current_row + 1 } else { 0 };
                        current_row = attr_u32(e, b"r")
                            .and_then(|r| r.checked_sub(1))
                            .unwrap_or(implied);
                        seen_row = true;
                        next_col = 0;
                        let height = attr_f64(e, b"ht");
                        let hidden = attr_bool_default(e, b"hidden", false);
                        if height.is_some() || hidden {
                            sheet.rows.push(RowDef {
                                row: current_row,
                                height,
                                hidden,
                            });
                        }
                    }
                    b"c" => {
                        let (col, row) = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"r")
                            .and_then(|a| parse_cell_ref_bytes(&a.value))
                            .unwrap_or((next_col, current_row));
                        next_col = col + 1;
                        let cell_type = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"t")
                            .map(|a| parse_cell_type_tag(&a.value))
                            .unwrap_or(CellTypeTag::Default);
                        let style_idx = attr_u32(e, b"s");

                        // Empty/self-closing cells like <c r="A1" s="2"/> have no children
                        let body = if is_start_event {
                            read_cell_body(&mut xml, &mut cell_buf)?
                        } else {
                            CellBody::default()
                        };

                        let value = cell_value(cell_type, &body, shared_strings);
                        let formula = body.formula.filter(|f| !f.is_empty());
                        if value != CellValue::Empty || style_idx.is_some() || formula.is_some() {
                            sheet.cells.push(CellData {
                                r: row,
                                c: col,
                                cell: Cell {
                                    value,
                                    style_idx,
                                    formula,
                                },
                            });
                        }
                    }
                    b"mergeCell" => {
                        if let Some(range) = attr_string(e, b"ref") {
                            sheet.merges.push(range);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    sheet.normalize();
    Ok(sheet)
}

fn parse_col(e: &BytesStart) -> Option<ColumnDef> {
    let min = attr_u32(e, b"min")?;
    let max = attr_u32(e, b"max").unwrap_or(min);
    Some(ColumnDef {
        min,
        max,
        width: attr_f64(e, b"width"),
        style: attr_u32(e, b"style"),
        custom_width: attr_bool_default(e, b"customWidth", false),
        hidden: attr_bool_default(e, b"hidden", false),
    })
}

/// Read everything up to the matching `</c>`.
fn read_cell_body<B: BufRead>(xml: &mut Reader<B>, buf: &mut Vec<u8>) -> Result<CellBody> {
    let mut body = CellBody::default();
    let mut target: Option<TextTarget> = None;

    loop {
        buf.clear();
        match xml.read_event_into(buf)? {
            Event::Start(ref inner) => {
                target = match inner.local_name().as_ref() {
                    b"v" => Some(TextTarget::Value),
                    b"f" => {
                        body.formula = Some(formula_attrs(inner));
                        Some(TextTarget::Formula)
                    }
                    b"t" => Some(TextTarget::Inline),
                    _ => target,
                };
            }
            // Shared formula followers: <f t="shared" si="0"/>
            Event::Empty(ref inner) if inner.local_name().as_ref() == b"f" => {
                body.formula = Some(formula_attrs(inner));
            }
            Event::Text(ref text) => {
                if let Some(t) = target {
                    let text = text.unescape()?;
                    match t {
                        TextTarget::Value => {
                            body.value.get_or_insert_with(String::new).push_str(&text);
                        }
                        TextTarget::Formula => body
                            .formula
                            .get_or_insert_with(Formula::default)
                            .text
                            .push_str(&text),
                        TextTarget::Inline => {
                            body.inline.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
            }
            Event::End(ref inner) => match inner.local_name().as_ref() {
                b"c" => break,
                b"v" | b"f" | b"t" => target = None,
                _ => {}
            },
            Event::Eof => {
                return Err(OverlapFixError::Parse(
                    "worksheet ended inside a <c> element".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(body)
}

/// Group attributes of an `<f>` element; the text is filled in by the caller.
fn formula_attrs(e: &BytesStart) -> Formula {
    Formula {
        text: String::new(),
        kind: attr_string(e, b"t"),
        range: attr_string(e, b"ref"),
        shared_index: attr_u32(e, b"si"),
    }
}

fn cell_value(tag: CellTypeTag, body: &CellBody, shared_strings: &[String]) -> CellValue {
    match tag {
        CellTypeTag::Shared => body
            .value
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| shared_strings.get(idx))
            .map_or(CellValue::Empty, |s| CellValue::Text(s.clone())),
        CellTypeTag::Inline => body
            .inline
            .clone()
            .map_or(CellValue::Empty, CellValue::Text),
        CellTypeTag::Str => body
            .value
            .clone()
            .map_or(CellValue::Empty, CellValue::Text),
        CellTypeTag::Bool => body
            .value
            .as_deref()
            .map_or(CellValue::Empty, |v| {
                CellValue::Bool(matches!(v.trim(), "1" | "true" | "TRUE"))
            }),
        CellTypeTag::Error => body
            .value
            .clone()
            .map_or(CellValue::Empty, CellValue::Error),
        CellTypeTag::Default => match body.value.as_deref() {
            None => CellValue::Empty,
            Some(v) => v
                .trim()
                .parse::<f64>()
                .map_or_else(|_| CellValue::Text(v.to_string()), CellValue::Number),
        },
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

    fn body(value: Option<&str>) -> CellBody {
        CellBody {
            value: value.map(str::to_string),
            ..CellBody::default()
        }
    }

    #[test]
    fn test_cell_type_tags() {
        assert_eq!(parse_cell_type_tag(b"s"), CellTypeTag::Shared);
        assert_eq!(parse_cell_type_tag(b"inlineStr"), CellTypeTag::Inline);
        assert_eq!(parse_cell_type_tag(b"n"), CellTypeTag::Default);
    }

    #[test]
    fn test_cell_value_typing() {
        let strings = vec!["WS-1".to_string()];
        assert_eq!(
            cell_value(CellTypeTag::Shared, &body(Some("0")), &strings),
            CellValue::Text("WS-1".to_string())
        );
        assert_eq!(
            cell_value(CellTypeTag::Shared, &body(Some("7")), &strings),
            CellValue::Empty
        );
        assert_eq!(
            cell_value(CellTypeTag::Default, &body(Some("15885.22")), &strings),
            CellValue::Number(15885.22)
        );
        assert_eq!(
            cell_value(CellTypeTag::Default, &body(Some("abc")), &strings),
            CellValue::Text("abc".to_string())
        );
        assert_eq!(
            cell_value(CellTypeTag::Bool, &body(Some("1")), &strings),
            CellValue::Bool(true)
        );
        assert_eq!(
            cell_value(CellTypeTag::Error, &body(Some("#N/A")), &strings),
            CellValue::Error("#N/A".to_string())
        );
        assert_eq!(
            cell_value(CellTypeTag::Default, &body(None), &strings),
            CellValue::Empty
        );
    }

    #[test]
    fn test_read_cell_body_inline_and_formula() {
        let xml = r#"<c r="A1" t="inlineStr"><f>CONCAT("W","S")</f><is><r><t>W</t></r><r><t>S</t></r></is></c><c r="B1"/>"#;
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        // Consume the opening <c>
        let _ = reader.read_event_into(&mut buf).unwrap();
        let mut cell_buf = Vec::new();
        let body = read_cell_body(&mut reader, &mut cell_buf).unwrap();
        assert_eq!(body.inline.as_deref(), Some("WS"));
        assert_eq!(body.formula, Some(Formula::new(r#"CONCAT("W","S")"#)));
        assert!(body.value.is_none());
    }

    fn read_body(xml: &str) -> CellBody {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let _ = reader.read_event_into(&mut buf).unwrap();
        let mut cell_buf = Vec::new();
        read_cell_body(&mut reader, &mut cell_buf).unwrap()
    }

    #[test]
    fn test_read_cell_body_shared_formula_master() {
        let body = read_body(r#"<c r="M2"><f t="shared" ref="M2:M3" si="0">B2*2</f><v>100</v></c>"#);
        assert_eq!(
            body.formula,
            Some(Formula {
                text: "B2*2".to_string(),
                kind: Some("shared".to_string()),
                range: Some("M2:M3".to_string()),
                shared_index: Some(0),
            })
        );
        assert_eq!(body.value.as_deref(), Some("100"));
    }

    #[test]
    fn test_read_cell_body_shared_formula_follower() {
        let body = read_body(r#"<c r="M3"><f t="shared" si="0"/><v>100</v></c>"#);
        let formula = body.formula.unwrap();
        assert!(formula.text.is_empty());
        assert!(!formula.is_empty());
        assert_eq!(formula.kind.as_deref(), Some("shared"));
        assert_eq!(formula.shared_index, Some(0));
        assert_eq!(formula.range, None);
        assert_eq!(body.value.as_deref(), Some("100"));
    }

    #[test]
    fn test_read_cell_body_array_formula() {
        let body = read_body(r#"<c r="A1"><f t="array" ref="A1:A3">{1;2;3}</f><v>1</v></c>"#);
        let formula = body.formula.unwrap();
        assert_eq!(formula.text, "{1;2;3}");
        assert_eq!(formula.kind.as_deref(), Some("array"));
        assert_eq!(formula.range.as_deref(), Some("A1:A3"));
    }

    #[test]
    fn test_read_cell_body_truncated() {
        let mut reader = Reader::from_str(r#"<c r="A1"><v>1</v>"#);
        let mut buf = Vec::new();
        let _ = reader.read_event_into(&mut buf).unwrap();
        let mut cell_buf = Vec::new();
        assert!(read_cell_body(&mut reader, &mut cell_buf).is_err());
    }
}
