//! Built-in `"default"` parser: header row + keyed data rows.
//!
//! Row 0 names the fields. Every later row becomes one object, keyed in the
//! output by the text of its first cell:
//!
//! ```text
//! id | name   | hp          {
//! e1 | Goblin | 10    ==>     "e1": { "id": "e1", "name": "Goblin", "hp": 10 },
//! e2 | Orc    | 25            "e2": { "id": "e2", "name": "Orc", "hp": 25 }
//!                           }
//! ```
//!
//! Columns with an empty header are dropped. Column 0 is treated like any
//! other column, so a named key column also appears as a field.

use super::{Document, SheetParser};
use crate::value::{cell_text, coerce};
use crate::{RawTable, Result};
use serde_json::{Map, Value};

/// Parser registered under the `"default"` tag
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl DefaultParser {
    /// Tag of the built-in parser
    pub const TAG: &'static str = "default";

    /// Create the default parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SheetParser for DefaultParser {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn parse(&self, tab_id: i64, table: &RawTable) -> Result<Document> {
        let Some((header, rows)) = table.rows.split_first() else {
            return Ok(Document::empty());
        };
        let headers: Vec<String> = header.iter().map(cell_text).collect();

        let mut document = Map::new();
        for (index, row) in rows.iter().enumerate() {
            let Some(key_cell) = row.first() else {
                tracing::debug!(tab_id, row = index + 1, "Skipping blank row");
                continue;
            };

            let mut item = Map::new();
            for (column, cell) in row.iter().enumerate() {
                let Some(field) = headers.get(column).filter(|h| !h.is_empty()) else {
                    continue;
                };
                item.insert(field.clone(), Value::from(coerce(&cell_text(cell))));
            }

            // Later rows with the same key replace earlier ones in place
            document.insert(cell_text(key_cell), Value::Object(item));
        }

        tracing::debug!(
            tab_id,
            rows = rows.len(),
            entries = document.len(),
            "Parsed sheet with default parser"
        );
        Ok(Document::from(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(rows: Vec<Vec<&str>>) -> Value {
        DefaultParser::new()
            .parse(0, &RawTable::from_strings(rows))
            .unwrap()
            .into_value()
    }

    #[test]
    fn test_tag() {
        assert_eq!(DefaultParser::new().tag(), "default");
    }

    #[test]
    fn test_parse_enemies() {
        let doc = parse(vec![
            vec!["id", "name", "hp"],
            vec!["e1", "Goblin", "10"],
            vec!["e2", "Orc", "25"],
        ]);

        assert_eq!(
            doc,
            json!({
                "e1": {"id": "e1", "name": "Goblin", "hp": 10},
                "e2": {"id": "e2", "name": "Orc", "hp": 25}
            })
        );
    }

    #[test]
    fn test_key_column_is_emitted_as_field() {
        let doc = parse(vec![vec!["id", "name"], vec!["a", "Alpha"]]);
        assert_eq!(doc["a"]["id"], json!("a"));
        assert_eq!(doc["a"]["name"], json!("Alpha"));
    }

    #[test]
    fn test_empty_key_header_drops_field_but_keeps_key() {
        let doc = parse(vec![vec!["", "name"], vec!["a", "Alpha"]]);
        assert_eq!(doc, json!({"a": {"name": "Alpha"}}));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let doc = parse(vec![vec!["key", "v"], vec!["k", "A"], vec!["k", "B"]]);
        assert_eq!(doc, json!({"k": {"key": "k", "v": "B"}}));
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let doc = DefaultParser::new()
            .parse(
                0,
                &RawTable::from_strings(vec![
                    vec!["key", "v"],
                    vec!["a", "1"],
                    vec!["b", "2"],
                    vec!["a", "3"],
                ]),
            )
            .unwrap();

        assert_eq!(
            doc.to_pretty_string(),
            "{\n  \"a\": {\n    \"key\": \"a\",\n    \"v\": 3\n  },\n  \"b\": {\n    \"key\": \"b\",\n    \"v\": 2\n  }\n}"
        );
    }

    #[test]
    fn test_short_row_yields_fewer_fields() {
        let doc = parse(vec![vec!["id", "name", "hp"], vec!["e1", "Goblin"]]);
        assert_eq!(doc, json!({"e1": {"id": "e1", "name": "Goblin"}}));
    }

    #[test]
    fn test_row_longer_than_header_ignores_extra_cells() {
        let doc = parse(vec![vec!["id"], vec!["e1", "extra", "more"]]);
        assert_eq!(doc, json!({"e1": {"id": "e1"}}));
    }

    #[test]
    fn test_empty_header_column_skipped() {
        let doc = parse(vec![
            vec!["id", "", "hp"],
            vec!["e1", "note", "3,5"],
        ]);
        assert_eq!(doc, json!({"e1": {"id": "e1", "hp": 3.5}}));
    }

    #[test]
    fn test_empty_table() {
        let doc = DefaultParser::new().parse(0, &RawTable::default()).unwrap();
        assert_eq!(doc, Document::empty());
    }

    #[test]
    fn test_header_only() {
        assert_eq!(parse(vec![vec!["id", "name"]]), json!({}));
    }

    #[test]
    fn test_blank_row_skipped() {
        let doc = parse(vec![vec!["id"], vec![], vec!["e1"]]);
        assert_eq!(doc, json!({"e1": {"id": "e1"}}));
    }

    #[test]
    fn test_non_string_cells() {
        let table = RawTable::new(vec![
            vec![json!("id"), json!("count"), json!("flag")],
            vec![json!(7), json!(12), json!(true)],
        ]);
        let doc = DefaultParser::new().parse(0, &table).unwrap().into_value();
        assert_eq!(doc, json!({"7": {"id": 7, "count": 12, "flag": "true"}}));
    }
}
