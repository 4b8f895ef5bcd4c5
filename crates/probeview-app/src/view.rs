// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{
    Column, FilterColumn, RowFieldExtractor, RowFields, SortDirection, SortState, TextCollator,
};

/// Label shown for an empty cell value in filter lists.
pub const BLANK_LABEL: &str = "(blank)";

/// Distinct normalized values of one filter column, each mapped to the
/// display text first seen for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterDomain {
    values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub value: String,
    pub label: String,
}

impl FilterDomain {
    fn record(&mut self, normalized: &str, display: &str) {
        self.values
            .entry(normalized.to_owned())
            .or_insert_with(|| display.to_owned());
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn label(&self, value: &str) -> Option<&str> {
        self.values.get(value).map(|label| {
            if label.is_empty() {
                BLANK_LABEL
            } else {
                label.as_str()
            }
        })
    }

    /// Entries ordered the way a checkbox list shows them.
    pub fn entries(&self) -> Vec<DomainEntry> {
        let mut entries = self
            .values
            .keys()
            .map(|value| DomainEntry {
                value: value.clone(),
                label: self.label(value).unwrap_or(BLANK_LABEL).to_owned(),
            })
            .collect::<Vec<_>>();
        let mut collator = TextCollator::new();
        entries.sort_by(|left, right| {
            collator
                .compare(&left.label, &right.label)
                .then_with(|| left.value.cmp(&right.value))
        });
        entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    sets: [BTreeSet<String>; 3],
}

impl SelectionState {
    pub fn selected(&self, column: FilterColumn) -> &BTreeSet<String> {
        &self.sets[column.index()]
    }

    pub fn contains(&self, column: FilterColumn, value: &str) -> bool {
        self.sets[column.index()].contains(value)
    }

    fn set_mut(&mut self, column: FilterColumn) -> &mut BTreeSet<String> {
        &mut self.sets[column.index()]
    }
}

/// Mutable view state owned by a `TableView`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub selection: SelectionState,
    pub sort: Option<SortState>,
}

/// Whether `row` passes the current selection.
///
/// A row without technologies is never excluded by the technology filter.
pub fn row_matches(row: &RowFields, selection: &SelectionState) -> bool {
    let host_match = selection.contains(FilterColumn::Host, &row.host);
    let status_match = selection.contains(FilterColumn::StatusCode, &row.status_code);
    let tech_match = row.technologies.is_empty()
        || row
            .technologies
            .iter()
            .any(|tech| selection.contains(FilterColumn::Technologies, tech));
    host_match && status_match && tech_match
}

/// Parses the numeric prefix of `value` the way a lenient float parser does:
/// `"200"`, `"-1.5e3px"` and `".5"` parse, `"abc"` and `""` do not.
pub fn parse_leading_number(value: &str) -> Option<f64> {
    let bytes = value.trim_start().as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let text = std::str::from_utf8(&bytes[..end]).ok()?;
    let text = text.strip_suffix('.').unwrap_or(text);
    text.parse::<f64>().ok()
}

/// Numeric when both sides start with a number, collated text otherwise.
pub fn compare_sort_keys(collator: &mut TextCollator, left: &str, right: &str) -> Ordering {
    match (parse_leading_number(left), parse_leading_number(right)) {
        (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => collator.compare(left, right),
    }
}

/// Filter and sort controller over a fixed set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    rows: Vec<RowFields>,
    domains: [FilterDomain; 3],
    state: ViewState,
    order: Vec<usize>,
    visible: Vec<bool>,
}

impl TableView {
    pub fn new(rows: Vec<RowFields>) -> Self {
        let mut domains: [FilterDomain; 3] = Default::default();
        for row in &rows {
            domains[FilterColumn::Host.index()].record(&row.host, &row.display.host);
            domains[FilterColumn::StatusCode.index()]
                .record(&row.status_code, &row.display.status_code);
            for (normalized, display) in row.technologies.iter().zip(&row.display.technologies) {
                domains[FilterColumn::Technologies.index()].record(normalized, display);
            }
        }

        let mut state = ViewState::default();
        for column in FilterColumn::ALL {
            *state.selection.set_mut(column) = domains[column.index()]
                .values()
                .map(str::to_owned)
                .collect();
        }

        let order = (0..rows.len()).collect();
        let visible = vec![true; rows.len()];
        let mut view = Self {
            rows,
            domains,
            state,
            order,
            visible,
        };
        view.recompute_visibility();
        view
    }

    pub fn from_rows<R: RowFieldExtractor>(rows: &[R]) -> Self {
        Self::new(rows.iter().map(RowFields::extract).collect())
    }

    pub fn rows(&self) -> &[RowFields] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&RowFields> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn domain(&self, column: FilterColumn) -> &FilterDomain {
        &self.domains[column.index()]
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selection(&self, column: FilterColumn) -> &BTreeSet<String> {
        self.state.selection.selected(column)
    }

    pub fn is_selected(&self, column: FilterColumn, value: &str) -> bool {
        self.state.selection.contains(column, value)
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.state.sort
    }

    /// Row indices in display order, hidden rows included.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|visible| **visible).count()
    }

    /// Visible rows in display order, paired with their document index.
    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &RowFields)> {
        self.order
            .iter()
            .copied()
            .filter(|index| self.visible[*index])
            .map(|index| (index, &self.rows[index]))
    }

    /// Flips `value` in the column's selection. Returns the new checked
    /// state, or `None` when `value` is not part of the column's domain.
    pub fn toggle(&mut self, column: FilterColumn, value: &str) -> Option<bool> {
        let checked = !self.is_selected(column, value);
        self.set_checked(column, value, checked).then_some(checked)
    }

    /// Returns `false` without touching state when `value` is unknown.
    pub fn set_checked(&mut self, column: FilterColumn, value: &str, checked: bool) -> bool {
        if !self.domains[column.index()].contains(value) {
            return false;
        }
        let set = self.state.selection.set_mut(column);
        if checked {
            set.insert(value.to_owned());
        } else {
            set.remove(value);
        }
        self.recompute_visibility();
        true
    }

    pub fn select_all(&mut self, column: FilterColumn) {
        *self.state.selection.set_mut(column) = self.domains[column.index()]
            .values()
            .map(str::to_owned)
            .collect();
        self.recompute_visibility();
    }

    pub fn select_none(&mut self, column: FilterColumn) {
        self.state.selection.set_mut(column).clear();
        self.recompute_visibility();
    }

    /// Re-evaluates every row against the selection; returns the visible count.
    pub fn recompute_visibility(&mut self) -> usize {
        for (visible, row) in self.visible.iter_mut().zip(&self.rows) {
            *visible = row_matches(row, &self.state.selection);
        }
        let count = self.visible_count();
        debug!(visible = count, total = self.rows.len(), "recomputed row visibility");
        count
    }

    /// Sorts by `column`, reversing direction when it is already the sort
    /// column. Ordering always starts from document order.
    pub fn sort_by(&mut self, column: Column) -> SortState {
        let next = SortState::next(self.state.sort, column);
        let keys = self
            .rows
            .iter()
            .map(|row| row.sort_key(column))
            .collect::<Vec<_>>();

        let mut collator = TextCollator::new();
        let mut order = (0..self.rows.len()).collect::<Vec<_>>();
        order.sort_by(|left, right| {
            let ordering = compare_sort_keys(&mut collator, &keys[*left], &keys[*right]);
            match next.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        self.order = order;
        self.state.sort = Some(next);
        debug!(
            column = column.as_str(),
            direction = next.direction.as_str(),
            "sorted rows"
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::{BLANK_LABEL, TableView, compare_sort_keys, parse_leading_number, row_matches};
    use crate::{Column, FilterColumn, PlainRow, RowFields, SortDirection, TextCollator};
    use std::cmp::Ordering;

    fn sample_view() -> TableView {
        TableView::from_rows(&[
            PlainRow::new("alpha.example", "Alpha", "200", "[nginx php]"),
            PlainRow::new("Beta.example", "beta", "404", "[apache]"),
            PlainRow::new("gamma.example", "Gamma", "301", "[]"),
            PlainRow::new("alpha.example", "Alpha admin", "200", "[Nginx]"),
        ])
    }

    fn visible_hosts(view: &TableView) -> Vec<String> {
        view.visible_rows().map(|(_, row)| row.host.clone()).collect()
    }

    fn ordered_status(view: &TableView) -> Vec<String> {
        view.order()
            .iter()
            .map(|index| view.rows()[*index].status_code.clone())
            .collect()
    }

    #[test]
    fn domains_collect_distinct_normalized_values() {
        let view = sample_view();
        let hosts = view.domain(FilterColumn::Host).values().collect::<Vec<_>>();
        assert_eq!(hosts, vec!["alpha.example", "beta.example", "gamma.example"]);

        let techs = view
            .domain(FilterColumn::Technologies)
            .values()
            .collect::<Vec<_>>();
        assert_eq!(techs, vec!["apache", "nginx", "php"]);

        assert_eq!(
            view.domain(FilterColumn::Host).label("beta.example"),
            Some("Beta.example")
        );
    }

    #[test]
    fn everything_is_selected_and_visible_after_init() {
        let view = sample_view();
        for column in FilterColumn::ALL {
            assert_eq!(view.selection(column).len(), view.domain(column).len());
        }
        assert_eq!(view.visible_count(), 4);
    }

    #[test]
    fn deselecting_keeps_value_in_domain() {
        let mut view = sample_view();
        assert_eq!(view.toggle(FilterColumn::Host, "alpha.example"), Some(false));
        assert!(view.domain(FilterColumn::Host).contains("alpha.example"));
        assert!(!view.is_selected(FilterColumn::Host, "alpha.example"));
        assert_eq!(visible_hosts(&view), vec!["beta.example", "gamma.example"]);

        assert_eq!(view.toggle(FilterColumn::Host, "alpha.example"), Some(true));
        assert_eq!(view.visible_count(), 4);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let mut view = sample_view();
        assert_eq!(view.toggle(FilterColumn::Host, "delta.example"), None);
        assert!(!view.set_checked(FilterColumn::StatusCode, "500", true));
        assert!(!view.is_selected(FilterColumn::StatusCode, "500"));
        assert_eq!(view.selection(FilterColumn::StatusCode).len(), 3);
    }

    #[test]
    fn rows_without_technologies_ignore_technology_filter() {
        let mut view = sample_view();
        view.select_none(FilterColumn::Technologies);
        assert_eq!(visible_hosts(&view), vec!["gamma.example"]);
    }

    #[test]
    fn any_selected_technology_keeps_row() {
        let mut view = sample_view();
        view.set_checked(FilterColumn::Technologies, "nginx", false);
        assert_eq!(
            visible_hosts(&view),
            vec!["alpha.example", "beta.example", "gamma.example"]
        );
        view.set_checked(FilterColumn::Technologies, "php", false);
        assert_eq!(visible_hosts(&view), vec!["beta.example", "gamma.example"]);
    }

    #[test]
    fn select_none_then_all_round_trips_visibility() {
        let mut view = sample_view();
        view.set_checked(FilterColumn::StatusCode, "404", false);

        view.select_all(FilterColumn::Host);
        view.select_none(FilterColumn::Host);
        assert_eq!(view.visible_count(), 0);

        view.select_all(FilterColumn::Host);
        assert_eq!(
            visible_hosts(&view),
            vec!["alpha.example", "gamma.example", "alpha.example"]
        );
    }

    #[test]
    fn visibility_matches_pure_predicate() {
        let mut view = sample_view();
        view.set_checked(FilterColumn::Technologies, "apache", false);
        view.set_checked(FilterColumn::StatusCode, "301", false);
        for (index, row) in view.rows().iter().enumerate() {
            assert_eq!(
                view.is_visible(index),
                row_matches(row, &view.state().selection)
            );
        }
    }

    #[test]
    fn status_sort_is_numeric_and_toggles() {
        let mut view = TableView::from_rows(&[
            PlainRow::new("a", "", "200", "[]"),
            PlainRow::new("b", "", "404", "[]"),
            PlainRow::new("c", "", "301", "[]"),
        ]);

        let state = view.sort_by(Column::StatusCode);
        assert_eq!(state.direction, SortDirection::Asc);
        assert_eq!(ordered_status(&view), vec!["200", "301", "404"]);

        let state = view.sort_by(Column::StatusCode);
        assert_eq!(state.direction, SortDirection::Desc);
        assert_eq!(ordered_status(&view), vec!["404", "301", "200"]);
    }

    #[test]
    fn numeric_sort_does_not_compare_as_text() {
        let mut view = TableView::from_rows(&[
            PlainRow::new("a", "", "1000", "[]"),
            PlainRow::new("b", "", "99", "[]"),
        ]);
        view.sort_by(Column::StatusCode);
        assert_eq!(ordered_status(&view), vec!["99", "1000"]);
    }

    #[test]
    fn switching_columns_resets_to_ascending() {
        let mut view = sample_view();
        view.sort_by(Column::Title);
        view.sort_by(Column::Title);
        let state = view.sort_by(Column::Host);
        assert_eq!(state.column, Column::Host);
        assert_eq!(state.direction, SortDirection::Asc);
    }

    #[test]
    fn text_sort_is_case_insensitive_and_stable() {
        let mut view = sample_view();
        view.sort_by(Column::Host);
        let hosts = view
            .order()
            .iter()
            .map(|index| (view.rows()[*index].host.clone(), *index))
            .collect::<Vec<_>>();
        assert_eq!(
            hosts,
            vec![
                ("alpha.example".to_owned(), 0),
                ("alpha.example".to_owned(), 3),
                ("beta.example".to_owned(), 1),
                ("gamma.example".to_owned(), 2),
            ]
        );

        view.sort_by(Column::Host);
        assert_eq!(view.order(), &[2, 1, 0, 3]);
    }

    #[test]
    fn sorting_leaves_filters_alone() {
        let mut view = sample_view();
        view.set_checked(FilterColumn::StatusCode, "404", false);
        let before = view.state().selection.clone();
        view.sort_by(Column::StatusCode);
        assert_eq!(view.state().selection, before);
        assert_eq!(view.visible_count(), 3);
    }

    #[test]
    fn blank_values_are_selectable_domain_members() {
        let mut view = TableView::from_rows(&[
            PlainRow::new("a", "", "200", "[]").with_cell(Column::Host, None),
            PlainRow::new("b", "", "200", "[]"),
        ]);
        assert!(view.domain(FilterColumn::Host).contains(""));
        assert_eq!(view.domain(FilterColumn::Host).label(""), Some(BLANK_LABEL));
        assert_eq!(view.visible_count(), 2);

        view.toggle(FilterColumn::Host, "");
        assert_eq!(view.visible_count(), 1);
    }

    #[test]
    fn domain_entries_sort_by_label() {
        let view = sample_view();
        let labels = view
            .domain(FilterColumn::Technologies)
            .entries()
            .into_iter()
            .map(|entry| entry.label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["apache", "nginx", "php"]);
    }

    #[test]
    fn leading_number_parse_matches_lenient_float_rules() {
        assert_eq!(parse_leading_number("200"), Some(200.0));
        assert_eq!(parse_leading_number("404 not found"), Some(404.0));
        assert_eq!(parse_leading_number("-1.5e3px"), Some(-1500.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("7."), Some(7.0));
        assert_eq!(parse_leading_number("1e"), Some(1.0));
        assert_eq!(parse_leading_number("abc"), None);
        assert_eq!(parse_leading_number(""), None);
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number("."), None);
    }

    #[test]
    fn mixed_keys_fall_back_to_text() {
        let mut collator = TextCollator::new();
        assert_eq!(compare_sort_keys(&mut collator, "10", "9"), Ordering::Greater);
        assert_eq!(compare_sort_keys(&mut collator, "10", "abc"), Ordering::Less);
        assert_eq!(compare_sort_keys(&mut collator, "Abc", "abd"), Ordering::Less);
        assert_eq!(compare_sort_keys(&mut collator, "", "a"), Ordering::Less);
    }

    #[test]
    fn text_sort_follows_locale_collation() {
        let rows = ["Zèbre", "École", "a1", "a_b"]
            .iter()
            .map(|title| PlainRow::new("h", title, "ok", "[]"))
            .collect::<Vec<_>>();
        let mut view = TableView::from_rows(&rows);

        view.sort_by(Column::Title);
        let titles = view
            .visible_rows()
            .map(|(_, row)| row.display.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["a_b", "a1", "École", "Zèbre"]);

        view.sort_by(Column::Title);
        let titles = view
            .visible_rows()
            .map(|(_, row)| row.display.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Zèbre", "École", "a1", "a_b"]);
    }

    #[test]
    fn filter_labels_follow_locale_collation() {
        let rows = ["Zèbre.test", "École.test", "a1.test", "a_b.test"]
            .iter()
            .map(|host| PlainRow::new(host, "t", "200", "[]"))
            .collect::<Vec<_>>();
        let view = TableView::from_rows(&rows);
        let labels = view
            .domain(FilterColumn::Host)
            .entries()
            .into_iter()
            .map(|entry| entry.label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["a_b.test", "a1.test", "École.test", "Zèbre.test"]);
    }

    #[test]
    fn rows_can_be_built_from_extracted_fields() {
        let row = RowFields::extract(&PlainRow::new("x", "y", "500", "[]"));
        let view = TableView::new(vec![row.clone()]);
        assert_eq!(view.row(0), Some(&row));
        assert_eq!(view.row_count(), 1);
    }
}
