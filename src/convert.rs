//! Tagged books CSV → JSON array.
//!
//! Column names come in English or Korean; each output field takes the first
//! non-empty value among its synonyms.

use std::path::PathBuf;

use anyhow::Context as _;
use csv::StringRecord;

use crate::cli::ConvertArgs;
use crate::formats::ConvertedBook;
use crate::output::{ensure_output_writable, write_json};

const TITLE: &[&str] = &["title", "제목"];
const AUTHOR: &[&str] = &["author", "저자"];
const PUBLISHER: &[&str] = &["publisher", "출판사"];
const YEAR: &[&str] = &["year", "출판년도"];
const PAGES: &[&str] = &["pages", "분량"];
const DESCRIPTION: &[&str] = &["description", "소개", "설명", "요약", "줄거리"];
const TAGS: &[&str] = &["tags", "태그"];

const TAG_SEPARATORS: &[char] = &[',', '|', '/'];

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let out_path = PathBuf::from(&args.out);
    ensure_output_writable(&out_path, args.force)?;

    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read csv: {}", args.input))?;
    let books = convert_csv(&input).with_context(|| format!("parse csv: {}", args.input))?;

    write_json(&out_path, &books, args.force).context("write books json")?;
    println!("converted {} rows to {}", books.len(), out_path.display());
    Ok(())
}

pub fn convert_csv(input: &str) -> anyhow::Result<Vec<ConvertedBook>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input.as_bytes());
    let headers = reader.headers().context("read csv header")?.clone();

    let mut books = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: one-based, after the header line.
        let record = record.with_context(|| format!("read csv row {}", idx + 2))?;
        let row = Row {
            headers: &headers,
            record: &record,
        };
        books.push(ConvertedBook {
            title: row.pick(TITLE),
            author: row.pick(AUTHOR),
            publisher: row.pick(PUBLISHER),
            year: row.pick(YEAR),
            pages: row.pick(PAGES),
            tags: split_tags(row.first_non_empty_raw(TAGS)),
            description: row.pick(DESCRIPTION),
        });
    }
    Ok(books)
}

struct Row<'a> {
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h.trim() == column)?;
        self.record.get(idx)
    }

    fn pick(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .filter_map(|column| self.get(column))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_owned()
    }

    /// Untrimmed: a whitespace-only cell still wins over later synonyms.
    fn first_non_empty_raw(&self, columns: &[&str]) -> &str {
        columns
            .iter()
            .filter_map(|column| self.get(column))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(TAG_SEPARATORS)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
