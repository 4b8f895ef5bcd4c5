// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Column, RowDisplay, RowFields};

/// Source of raw cell text for one row.
///
/// Implementors return the text content of the element designated for
/// `column`, or `None` when the row lacks it. Everything above this trait
/// works on plain strings, so the filtering and sorting code never touches
/// a rendering surface.
pub trait RowFieldExtractor {
    fn raw_text(&self, column: Column) -> Option<String>;
}

/// In-memory row, indexed by `Column::position`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlainRow {
    cells: [Option<String>; 4],
}

impl PlainRow {
    pub fn new(host: &str, title: &str, status_code: &str, technologies: &str) -> Self {
        Self {
            cells: [
                Some(host.to_owned()),
                Some(title.to_owned()),
                Some(status_code.to_owned()),
                Some(technologies.to_owned()),
            ],
        }
    }

    pub fn with_cell(mut self, column: Column, value: Option<&str>) -> Self {
        self.cells[column.position()] = value.map(str::to_owned);
        self
    }
}

impl RowFieldExtractor for PlainRow {
    fn raw_text(&self, column: Column) -> Option<String> {
        self.cells[column.position()].clone()
    }
}

/// Collapses whitespace runs to one space, trims, and lowercases.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Collapses whitespace runs to one space and trims, keeping case.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a `[a b c]` technology list into display tokens.
pub fn technology_tokens(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Vec::new();
    }

    trimmed
        .chars()
        .filter(|ch| *ch != '[' && *ch != ']')
        .collect::<String>()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

pub fn normalized_technologies(text: &str) -> Vec<String> {
    technology_tokens(text)
        .iter()
        .map(|token| normalize_text(token))
        .filter(|token| !token.is_empty())
        .collect()
}

pub fn extract_scalar<R: RowFieldExtractor + ?Sized>(row: &R, column: Column) -> String {
    normalize_text(&row.raw_text(column).unwrap_or_default())
}

pub fn extract_display<R: RowFieldExtractor + ?Sized>(row: &R, column: Column) -> String {
    collapse_whitespace(&row.raw_text(column).unwrap_or_default())
}

pub fn extract_technologies<R: RowFieldExtractor + ?Sized>(row: &R) -> Vec<String> {
    normalized_technologies(&row.raw_text(Column::Technologies).unwrap_or_default())
}

impl RowFields {
    pub fn extract<R: RowFieldExtractor + ?Sized>(row: &R) -> Self {
        let technologies_raw = row.raw_text(Column::Technologies).unwrap_or_default();
        Self {
            host: extract_scalar(row, Column::Host),
            title: extract_scalar(row, Column::Title),
            status_code: extract_scalar(row, Column::StatusCode),
            technologies: normalized_technologies(&technologies_raw),
            display: RowDisplay {
                host: extract_display(row, Column::Host),
                title: extract_display(row, Column::Title),
                status_code: extract_display(row, Column::StatusCode),
                technologies: technology_tokens(&technologies_raw),
            },
        }
    }

    /// Columns whose designated element was absent in `row`.
    pub fn missing_columns<R: RowFieldExtractor + ?Sized>(row: &R) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| row.raw_text(*column).is_none())
            .collect()
    }
}
