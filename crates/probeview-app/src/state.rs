// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Column, FilterColumn, SortState, TableView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Toggle { column: FilterColumn, value: String },
    SetChecked {
        column: FilterColumn,
        value: String,
        checked: bool,
    },
    SelectAll(FilterColumn),
    SelectNone(FilterColumn),
    SortBy(Column),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SelectionChanged {
        column: FilterColumn,
        selected: usize,
        total: usize,
    },
    VisibilityChanged {
        visible: usize,
        total: usize,
    },
    Sorted(SortState),
    UnknownValue {
        column: FilterColumn,
        value: String,
    },
}

impl ViewEvent {
    pub fn message(&self) -> String {
        match self {
            Self::SelectionChanged {
                column,
                selected,
                total,
            } => format!("{} {selected}/{total} selected", column.label()),
            Self::VisibilityChanged { visible, total } => format!("{visible}/{total} rows shown"),
            Self::Sorted(state) => {
                format!("sort {} {}", state.column.label(), state.direction.as_str())
            }
            Self::UnknownValue { column, value } => {
                format!("no {} value {value:?}", column.label())
            }
        }
    }
}

impl TableView {
    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::Toggle { column, value } => match self.toggle(column, &value) {
                Some(_) => self.selection_events(column),
                None => vec![ViewEvent::UnknownValue { column, value }],
            },
            ViewCommand::SetChecked {
                column,
                value,
                checked,
            } => {
                if self.set_checked(column, &value, checked) {
                    self.selection_events(column)
                } else {
                    vec![ViewEvent::UnknownValue { column, value }]
                }
            }
            ViewCommand::SelectAll(column) => {
                self.select_all(column);
                self.selection_events(column)
            }
            ViewCommand::SelectNone(column) => {
                self.select_none(column);
                self.selection_events(column)
            }
            ViewCommand::SortBy(column) => vec![ViewEvent::Sorted(self.sort_by(column))],
        }
    }

    fn selection_events(&self, column: FilterColumn) -> Vec<ViewEvent> {
        vec![
            ViewEvent::SelectionChanged {
                column,
                selected: self.selection(column).len(),
                total: self.domain(column).len(),
            },
            ViewEvent::VisibilityChanged {
                visible: self.visible_count(),
                total: self.row_count(),
            },
        ]
    }
}
