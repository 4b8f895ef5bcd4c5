// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use probeview_app::TableView;
use probeview_html::ReportDocument;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEMO_EXPORT_NAME: &str = "probeview-demo.view.html";

/// Exports views of one loaded report to a fixed file.
pub struct FileRuntime<'a> {
    document: &'a ReportDocument,
    export_path: PathBuf,
}

impl<'a> FileRuntime<'a> {
    pub fn new(document: &'a ReportDocument, export_path: PathBuf) -> Self {
        Self {
            document,
            export_path,
        }
    }
}

impl probeview_tui::ViewRuntime for FileRuntime<'_> {
    fn export_view(&mut self, view: &TableView) -> Result<PathBuf> {
        write_view(self.document, view, &self.export_path)?;
        Ok(self.export_path.clone())
    }
}

pub fn write_view(document: &ReportDocument, view: &TableView, path: &Path) -> Result<()> {
    let html = document.render_view(view).context("render view")?;
    fs::write(path, html).with_context(|| format!("write export {}", path.display()))?;
    info!(
        path = %path.display(),
        visible = view.visible_count(),
        total = view.row_count(),
        "exported view"
    );
    Ok(())
}

/// `report.html` exports to `report.view.html` beside it; the demo report
/// exports into the working directory.
pub fn default_export_path(report: Option<&Path>) -> PathBuf {
    match report {
        Some(path) => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".to_owned());
            path.with_file_name(format!("{stem}.view.html"))
        }
        None => PathBuf::from(DEMO_EXPORT_NAME),
    }
}
