// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use probeview_app::{Column, RowFieldExtractor, RowFields, TableView};
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

const TABLE_SELECTOR: &str = "table";
const BODY_SELECTOR: &str = "tbody";
const HEAD_SELECTOR: &str = "thead";
const ROW_SELECTOR: &str = "tr";
const DOCUMENT_HEAD_SELECTOR: &str = "head";
const CELL_SELECTORS: [&str; 4] = [
    "ul li:nth-child(1) a",
    "ul li:nth-child(2) a",
    "ul li:nth-child(3) a",
    "ul li:nth-child(4) a",
];
const HIDDEN_STYLE: &str = "display: none";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("table not found")]
    TableNotFound,
    #[error("read report {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid selector {selector:?}: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
    #[error("format export timestamp")]
    Timestamp(#[from] time::error::Format),
}

fn selector(raw: &'static str) -> Result<Selector, DocumentError> {
    Selector::parse(raw).map_err(|error| DocumentError::Selector {
        selector: raw,
        message: format!("{error:?}"),
    })
}

#[derive(Debug)]
struct CellSelectors {
    cells: [Selector; 4],
}

impl CellSelectors {
    fn new() -> Result<Self, DocumentError> {
        Ok(Self {
            cells: [
                selector(CELL_SELECTORS[0])?,
                selector(CELL_SELECTORS[1])?,
                selector(CELL_SELECTORS[2])?,
                selector(CELL_SELECTORS[3])?,
            ],
        })
    }
}

/// A `<tr>` of the report table, read through the cell selectors.
struct HtmlRow<'a> {
    element: ElementRef<'a>,
    selectors: &'a CellSelectors,
}

impl RowFieldExtractor for HtmlRow<'_> {
    fn raw_text(&self, column: Column) -> Option<String> {
        self.element
            .select(&self.selectors.cells[column.position()])
            .next()
            .map(|anchor| anchor.text().collect::<String>())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowMarkup {
    attrs: Vec<(String, String)>,
    inner: String,
}

/// Parsed probe report: the extracted rows plus enough of the source
/// markup to write the table back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    rows: Vec<RowFields>,
    markup: Vec<RowMarkup>,
    head: String,
    table_attrs: Vec<(String, String)>,
    table_head: Option<String>,
}

impl ReportDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse(&raw)?;
        info!(
            path = %path.display(),
            rows = document.rows.len(),
            "loaded report"
        );
        Ok(document)
    }

    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let html = Html::parse_document(raw);
        let table = html
            .select(&selector(TABLE_SELECTOR)?)
            .next()
            .ok_or(DocumentError::TableNotFound)?;

        let head = html
            .select(&selector(DOCUMENT_HEAD_SELECTOR)?)
            .next()
            .map(|head| head.inner_html())
            .unwrap_or_default();
        let table_head = table
            .select(&selector(HEAD_SELECTOR)?)
            .next()
            .map(|thead| thead.html());
        let table_attrs = owned_attrs(table);

        let selectors = CellSelectors::new()?;
        let row_selector = selector(ROW_SELECTOR)?;
        let mut rows = Vec::new();
        let mut markup = Vec::new();
        if let Some(body) = table.select(&selector(BODY_SELECTOR)?).next() {
            for element in body.select(&row_selector) {
                let row = HtmlRow {
                    element,
                    selectors: &selectors,
                };
                let missing = RowFields::missing_columns(&row);
                if !missing.is_empty() {
                    let labels = missing.iter().map(|column| column.label()).collect::<Vec<_>>();
                    warn!(
                        row = rows.len(),
                        missing = %labels.join(", "),
                        "row is missing cells; treating them as blank"
                    );
                }
                rows.push(RowFields::extract(&row));
                markup.push(RowMarkup {
                    attrs: owned_attrs(element),
                    inner: element.inner_html(),
                });
            }
        } else {
            debug!("table has no tbody; no rows to show");
        }

        Ok(Self {
            rows,
            markup,
            head,
            table_attrs,
            table_head,
        })
    }

    pub fn rows(&self) -> &[RowFields] {
        &self.rows
    }

    pub fn into_view(self) -> TableView {
        TableView::new(self.rows)
    }

    pub fn view(&self) -> TableView {
        TableView::new(self.rows.clone())
    }

    /// Renders the table with rows in `view` order and hidden rows styled
    /// out, stamped with the current time.
    pub fn render_view(&self, view: &TableView) -> Result<String, DocumentError> {
        self.render_view_at(view, OffsetDateTime::now_utc())
    }

    pub fn render_view_at(
        &self,
        view: &TableView,
        at: OffsetDateTime,
    ) -> Result<String, DocumentError> {
        let stamp = at.format(&Rfc3339)?;
        let sort = view
            .sort_state()
            .map(|state| {
                format!(
                    ", sorted by {} {}",
                    state.column.label(),
                    state.direction.as_str()
                )
            })
            .unwrap_or_default();

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>");
        out.push_str(&self.head);
        out.push_str("</head>\n<body>\n");
        out.push_str(&format!(
            "<!-- probeview export {stamp}: {}/{} rows shown{sort} -->\n",
            view.visible_count(),
            view.row_count()
        ));
        out.push_str("<table");
        push_attrs(&mut out, &self.table_attrs);
        out.push_str(">\n");
        if let Some(table_head) = &self.table_head {
            out.push_str(table_head);
            out.push('\n');
        }
        out.push_str("<tbody>\n");
        for index in view.order() {
            let Some(row) = self.markup.get(*index) else {
                continue;
            };
            let attrs = if view.is_visible(*index) {
                row.attrs.clone()
            } else {
                hidden_attrs(&row.attrs)
            };
            out.push_str("<tr");
            push_attrs(&mut out, &attrs);
            out.push('>');
            out.push_str(&row.inner);
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        Ok(out)
    }
}

fn owned_attrs(element: ElementRef<'_>) -> Vec<(String, String)> {
    element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect()
}

fn hidden_attrs(attrs: &[(String, String)]) -> Vec<(String, String)> {
    let mut out = attrs.to_vec();
    match out.iter_mut().find(|(name, _)| name == "style") {
        Some((_, style)) => {
            let trimmed = style.trim().trim_end_matches(';');
            *style = if trimmed.is_empty() {
                HIDDEN_STYLE.to_owned()
            } else {
                format!("{trimmed}; {HIDDEN_STYLE}")
            };
        }
        None => out.push(("style".to_owned(), HIDDEN_STYLE.to_owned())),
    }
    out
}

fn push_attrs(out: &mut String, attrs: &[(String, String)]) {
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
}

/// Escapes text for use in element content or a double-quoted attribute.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{HIDDEN_STYLE, escape_html, hidden_attrs};

    #[test]
    fn hidden_attrs_adds_style() {
        let attrs = hidden_attrs(&[("class".to_owned(), "row".to_owned())]);
        assert_eq!(
            attrs,
            vec![
                ("class".to_owned(), "row".to_owned()),
                ("style".to_owned(), HIDDEN_STYLE.to_owned()),
            ]
        );
    }

    #[test]
    fn hidden_attrs_extends_existing_style() {
        let attrs = hidden_attrs(&[("style".to_owned(), "color: red;".to_owned())]);
        assert_eq!(
            attrs,
            vec![("style".to_owned(), "color: red; display: none".to_owned())]
        );
    }

    #[test]
    fn markup_characters_are_escaped() {
        assert_eq!(escape_html("a\"b&c"), "a&quot;b&amp;c");
        assert_eq!(escape_html("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }
}
