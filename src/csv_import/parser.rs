//! Delimited-text parsing for lead files.
//!
//! Semicolon files come from Finnish Excel, comma files from everything else.
//! The delimiter is picked from the header line only, so a quoted value that
//! contains the other separator on a later line is not taken into account.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Header row plus data rows of a parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: char,
}

impl ParsedCsv {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// `;` when the line has strictly more semicolons than commas, `,` otherwise.
pub fn detect_delimiter(line: &str) -> char {
    let semicolons = line.matches(';').count();
    let commas = line.matches(',').count();

    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split one line into trimmed fields.
///
/// Double quotes toggle quoting; inside a quoted section `""` is a literal
/// quote. Unbalanced quotes simply leave the rest of the line quoted.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                field.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(field.trim().to_string());
            field.clear();
        } else {
            field.push(c);
        }
    }
    fields.push(field.trim().to_string());

    fields
}

/// Parse a whole file held in memory.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.split('\n').filter(|l| !l.is_empty());

    let Some(header_line) = lines.next() else {
        return ParsedCsv {
            headers: Vec::new(),
            rows: Vec::new(),
            delimiter: ',',
        };
    };

    let delimiter = detect_delimiter(header_line);
    let headers = split_line(header_line, delimiter);
    let rows = lines.map(|line| split_line(line, delimiter)).collect();

    ParsedCsv {
        headers,
        rows,
        delimiter,
    }
}

/// Read a file completely and parse it.
///
/// Invalid UTF-8 sequences are replaced and a leading byte-order mark is
/// dropped, the same way a browser decodes an uploaded file.
pub fn read_csv_file(path: &Path) -> Result<ParsedCsv> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let parsed = parse_csv(text);
    log::debug!(
        "Parsed {}: {} columns, {} rows, delimiter '{}'",
        path.display(),
        parsed.headers.len(),
        parsed.rows.len(),
        parsed.delimiter
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b,c;d"), ';');
        assert_eq!(detect_delimiter("a,b;c,d"), ',');
        assert_eq!(detect_delimiter("a;b,c"), ',');
        assert_eq!(detect_delimiter("nimi"), ',');
    }

    #[test]
    fn test_quoted_field_keeps_delimiter() {
        let fields = split_line(r#""Acme, Inc.","foo@bar.com""#, ',');
        assert_eq!(fields, vec!["Acme, Inc.", "foo@bar.com"]);

        let fields = split_line(r#""Acme; Oy";"foo@bar.com""#, ';');
        assert_eq!(fields, vec!["Acme; Oy", "foo@bar.com"]);
    }

    #[test]
    fn test_doubled_quote_escape() {
        let fields = split_line(r#""She said ""hi""""#, ',');
        assert_eq!(fields, vec![r#"She said "hi""#]);
    }

    #[test]
    fn test_fields_are_trimmed_and_last_field_emitted() {
        assert_eq!(split_line(" a ; b ;", ';'), vec!["a", "b", ""]);
        assert_eq!(split_line("", ','), vec![""]);
    }

    #[test]
    fn test_unbalanced_quote_swallows_rest_of_line() {
        assert_eq!(split_line(r#""open,still open"#, ','), vec!["open,still open"]);
    }

    #[test]
    fn test_line_endings_and_blank_lines() {
        let parsed = parse_csv("name,email\r\nA,a@x.fi\r\n\r\nB,b@x.fi\rC,c@x.fi\n\n");
        assert_eq!(parsed.headers, vec!["name", "email"]);
        assert_eq!(
            parsed.rows,
            vec![
                vec!["A", "a@x.fi"],
                vec!["B", "b@x.fi"],
                vec!["C", "c@x.fi"],
            ]
        );
        assert_eq!(parsed.delimiter, ',');
    }

    #[test]
    fn test_whitespace_only_line_is_kept() {
        let parsed = parse_csv("name\n   \nA\n");
        assert_eq!(parsed.rows, vec![vec![""], vec!["A"]]);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_csv("\r\n\n");
        assert!(parsed.is_empty());
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_delimiter_only_from_header_line() {
        // Header says comma; the semicolon row stays a single field.
        let parsed = parse_csv("nimi,email\nA;B;C\n");
        assert_eq!(parsed.delimiter, ',');
        assert_eq!(parsed.rows[0], vec!["A;B;C"]);
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let text = "Nimi;Sähköposti\n\"Acme; Oy\";info@acme.fi\nBeta;b@b.fi\n";
        assert_eq!(parse_csv(text), parse_csv(text));
    }

    #[test]
    fn test_read_csv_file_strips_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{feff}Nimi;Kaupunki\nAcme Oy;Oulu\n".as_bytes())
            .unwrap();

        let parsed = read_csv_file(file.path()).unwrap();
        assert_eq!(parsed.headers, vec!["Nimi", "Kaupunki"]);
        assert_eq!(parsed.rows, vec![vec!["Acme Oy", "Oulu"]]);
        assert_eq!(parsed.delimiter, ';');
    }
}
