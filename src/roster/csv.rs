//! Minimal header-mapped CSV reader for roster files.

use std::collections::HashMap;

/// One non-blank data row, with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    fields: HashMap<String, String>,
}

impl CsvRow {
    /// Value of `column`, or `None` if the header does not have that column
    /// or the row is too short to reach it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Header names plus the data rows mapped by header.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Parses comma-delimited text whose first non-blank line is the header.
///
/// Blank lines are skipped everywhere. Quoted fields may contain commas and
/// `""` escapes, but not line breaks.
pub fn parse_table(content: &str) -> CsvTable {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some((_, line)) => parse_record(line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => return CsvTable::default(),
    };

    let rows = lines
        .map(|(idx, line)| {
            let values = parse_record(line);
            let fields = headers
                .iter()
                .cloned()
                .zip(values)
                .collect::<HashMap<_, _>>();
            CsvRow {
                line: idx + 1,
                fields,
            }
        })
        .collect();

    CsvTable { headers, rows }
}

/// Splits one record into fields, honouring double-quoted sections.
pub fn parse_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_plain() {
        assert_eq!(parse_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_record("a,,c"), vec!["a", "", "c"]);
        assert_eq!(parse_record(""), vec![""]);
    }

    #[test]
    fn test_parse_record_quoted() {
        assert_eq!(
            parse_record(r#""Lovelace, Ada",1,"say ""hi""""#),
            vec!["Lovelace, Ada", "1", r#"say "hi""#]
        );
    }

    #[test]
    fn test_parse_table_maps_headers() {
        let table = parse_table("name,rollNumber,email\nAda,1,ada@example.com\n");
        assert_eq!(table.headers, vec!["name", "rollNumber", "email"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("rollNumber"), Some("1"));
        assert_eq!(table.rows[0].get("email"), Some("ada@example.com"));
        assert_eq!(table.rows[0].line, 2);
    }

    #[test]
    fn test_parse_table_skips_blank_lines() {
        let table = parse_table("\nrollNumber,name\n\n1,Ada\r\n   \n2,Bob\n");
        assert_eq!(table.headers, vec!["rollNumber", "name"]);
        let lines: Vec<_> = table.rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![4, 6]);
        assert_eq!(table.rows[1].get("name"), Some("Bob"));
    }

    #[test]
    fn test_parse_table_short_rows() {
        let table = parse_table("rollNumber,name,email\n3\n");
        assert_eq!(table.rows[0].get("rollNumber"), Some("3"));
        assert_eq!(table.rows[0].get("email"), None);
    }

    #[test]
    fn test_parse_table_strips_bom() {
        let table = parse_table("\u{feff}rollNumber\n1\n");
        assert!(table.has_column("rollNumber"));
    }

    #[test]
    fn test_parse_table_empty() {
        let table = parse_table("  \n\n");
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
