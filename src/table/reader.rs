//! Delimited text reading and field quoting.
//!
//! Handles the subset of RFC 4180 that measurement tables use: quoted fields
//! with embedded delimiters, doubled quotes and line breaks, LF or CRLF line
//! endings. Blank lines are skipped.

use crate::error::{PipelineError, Result};

/// Split delimited text into rows of fields.
pub fn parse_delimited(text: &str, delimiter: char) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Set once a row has any content, so blank lines are dropped.
    let mut row_started = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_started = true;
                quote_line = line;
            }
            c if c == delimiter => {
                row.push(std::mem::take(&mut field));
                row_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if row_started || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                row_started = false;
                line += 1;
            }
            _ => {
                field.push(c);
                row_started = true;
            }
        }
    }

    if in_quotes {
        return Err(PipelineError::table(quote_line, "unterminated quoted field"));
    }
    if row_started || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

/// Quote a field for output if it contains the delimiter, a quote or a line break.
pub fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rows() {
        let rows = parse_delimited("a,b\n1,2\n", ',').unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let rows = parse_delimited("\"x, y\",\"say \"\"hi\"\"\"\n", ',').unwrap();
        assert_eq!(rows, vec![vec!["x, y", "say \"hi\""]]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let rows = parse_delimited("a,b\r\n\r\n1,2\r\n\n", ',').unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_empty_trailing_field() {
        let rows = parse_delimited("1,\n", ',').unwrap();
        assert_eq!(rows, vec![vec!["1", ""]]);
    }

    #[test]
    fn test_tab_delimiter() {
        let rows = parse_delimited("a\tb\n", '\t').unwrap();
        assert_eq!(rows, vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_delimited("a\n\"open,1\n", ',').unwrap_err();
        assert!(matches!(err, PipelineError::Table { line: 2, .. }));
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("plain", ','), "plain");
        assert_eq!(quote_field("a,b", ','), "\"a,b\"");
        assert_eq!(quote_field("q\"", ','), "\"q\"\"\"");
    }
}
