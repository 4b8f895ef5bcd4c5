// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Host,
    Title,
    StatusCode,
    Technologies,
}

impl Column {
    pub const ALL: [Self; 4] = [Self::Host, Self::Title, Self::StatusCode, Self::Technologies];

    /// Zero-based position of the column's `<li>` inside a row's list.
    pub const fn position(self) -> usize {
        match self {
            Self::Host => 0,
            Self::Title => 1,
            Self::StatusCode => 2,
            Self::Technologies => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Title => "Title",
            Self::StatusCode => "Status Code",
            Self::Technologies => "Technologies",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Title => "title",
            Self::StatusCode => "status_code",
            Self::Technologies => "technologies",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "host" => Some(Self::Host),
            "title" => Some(Self::Title),
            "status" | "status_code" | "status-code" | "status code" => Some(Self::StatusCode),
            "technologies" | "tech" => Some(Self::Technologies),
            _ => None,
        }
    }

    pub const fn filter_column(self) -> Option<FilterColumn> {
        match self {
            Self::Host => Some(FilterColumn::Host),
            Self::Title => None,
            Self::StatusCode => Some(FilterColumn::StatusCode),
            Self::Technologies => Some(FilterColumn::Technologies),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterColumn {
    Host,
    StatusCode,
    Technologies,
}

impl FilterColumn {
    pub const ALL: [Self; 3] = [Self::Host, Self::StatusCode, Self::Technologies];

    pub const fn column(self) -> Column {
        match self {
            Self::Host => Column::Host,
            Self::StatusCode => Column::StatusCode,
            Self::Technologies => Column::Technologies,
        }
    }

    pub const fn label(self) -> &'static str {
        self.column().label()
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Host => 0,
            Self::StatusCode => 1,
            Self::Technologies => 2,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Column::parse(value).and_then(Column::filter_column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortState {
    /// Sort state after a request to sort by `column`, given the current one.
    pub fn next(current: Option<Self>, column: Column) -> Self {
        match current {
            Some(state) if state.column == column => Self {
                column,
                direction: state.direction.reversed(),
            },
            _ => Self {
                column,
                direction: SortDirection::Asc,
            },
        }
    }
}

/// Values extracted from one row. `technologies` keeps token order and may
/// contain duplicates; only set membership matters for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowFields {
    pub host: String,
    pub title: String,
    pub status_code: String,
    pub technologies: Vec<String>,
    pub display: RowDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowDisplay {
    pub host: String,
    pub title: String,
    pub status_code: String,
    pub technologies: Vec<String>,
}

impl RowFields {
    pub fn scalar(&self, column: Column) -> Option<&str> {
        match column {
            Column::Host => Some(&self.host),
            Column::Title => Some(&self.title),
            Column::StatusCode => Some(&self.status_code),
            Column::Technologies => None,
        }
    }

    /// Normalized text used as the sort key for `column`.
    pub fn sort_key(&self, column: Column) -> String {
        match self.scalar(column) {
            Some(value) => value.to_owned(),
            None => self.technologies.join(" "),
        }
    }

    /// Display text for a table cell.
    pub fn display_cell(&self, column: Column) -> String {
        match column {
            Column::Host => self.display.host.clone(),
            Column::Title => self.display.title.clone(),
            Column::StatusCode => self.display.status_code.clone(),
            Column::Technologies => self.display.technologies.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, FilterColumn, RowFields, SortDirection, SortState};

    #[test]
    fn column_parse_accepts_aliases() {
        assert_eq!(Column::parse("Host"), Some(Column::Host));
        assert_eq!(Column::parse(" status "), Some(Column::StatusCode));
        assert_eq!(Column::parse("status-code"), Some(Column::StatusCode));
        assert_eq!(Column::parse("tech"), Some(Column::Technologies));
        assert_eq!(Column::parse("server"), None);
    }

    #[test]
    fn title_is_not_filterable() {
        assert_eq!(Column::Title.filter_column(), None);
        assert_eq!(FilterColumn::parse("title"), None);
        assert_eq!(FilterColumn::parse("status"), Some(FilterColumn::StatusCode));
    }

    #[test]
    fn sort_state_toggles_same_column_and_resets_on_new_one() {
        let first = SortState::next(None, Column::StatusCode);
        assert_eq!(first.direction, SortDirection::Asc);

        let second = SortState::next(Some(first), Column::StatusCode);
        assert_eq!(second.direction, SortDirection::Desc);

        let third = SortState::next(Some(second), Column::StatusCode);
        assert_eq!(third.direction, SortDirection::Asc);

        let other = SortState::next(Some(second), Column::Host);
        assert_eq!(
            other,
            SortState {
                column: Column::Host,
                direction: SortDirection::Asc,
            }
        );
    }

    #[test]
    fn technologies_sort_key_joins_tokens() {
        let row = RowFields {
            technologies: vec!["nginx".to_owned(), "php".to_owned()],
            ..RowFields::default()
        };
        assert_eq!(row.sort_key(Column::Technologies), "nginx php");
        assert_eq!(row.sort_key(Column::Host), "");
    }
}
