//! CSV decoding of book rows

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::book::Book;

/// Decodes a raw file body into books, in file order
pub trait RecordParser: Send + Sync {
    fn parse(&self, data: &[u8]) -> Result<Vec<Book>>;
}

/// Parser for UTF-8 CSV with a `title,author,genre,period` header
///
/// Columns are matched by name. Whitespace before a field is ignored, also
/// ahead of an opening quote, and every field is trimmed. Blank lines are
/// skipped, so a header-only body yields no books. A line of bare separators
/// is a row of empty fields, not a blank line. A row with the wrong number of
/// fields, a missing column or invalid UTF-8 fails the whole parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }
}

/// Drop spaces and tabs at the start of every field outside quotes
///
/// The csv reader only treats `"` as a quote when it is the first byte of a
/// field, and trimming happens after tokenizing, so `  "a, b"` would split
/// inside the quotes without this pass. Line breaks are kept as they are.
fn strip_leading_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            out.push(c);
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            ' ' | '\t' if field_start => {},
            '"' if field_start => {
                out.push(c);
                in_quotes = true;
                field_start = false;
            },
            ',' | '\n' => {
                out.push(c);
                field_start = true;
            },
            _ => {
                out.push(c);
                field_start = false;
            },
        }
    }

    out
}

/// Leftover of a whitespace-only line: fewer fields than the header, all empty
fn is_blank(record: &StringRecord, width: usize) -> bool {
    record.len() < width && record.iter().all(|field| field.is_empty())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

impl RecordParser for CsvParser {
    fn parse(&self, data: &[u8]) -> Result<Vec<Book>> {
        let text = std::str::from_utf8(data).context("CSV file is not valid UTF-8")?;
        let text = strip_leading_whitespace(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            // Column counts are checked below so whitespace-only lines can be skipped first
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().context("Failed to read CSV header")?.clone();

        let mut books = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read CSV row")?;

            if is_blank(&record, headers.len()) {
                continue;
            }

            if record.len() != headers.len() {
                bail!(
                    "CSV row at line {} has {} fields, header has {}",
                    line_of(&record),
                    record.len(),
                    headers.len()
                );
            }

            let book: Book = record
                .deserialize(Some(&headers))
                .with_context(|| format!("Failed to decode CSV row at line {}", line_of(&record)))?;
            books.push(book);
        }

        Ok(books)
    }
}
