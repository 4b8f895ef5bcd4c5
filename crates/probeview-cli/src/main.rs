// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use probeview_app::{
    Column, FilterColumn, SortState, TableView, ViewCommand, ViewEvent, normalize_text,
};
use probeview_html::ReportDocument;
use probeview_tui::UiOptions;
use runtime::FileRuntime;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `probeview --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    logging::init(&config, options.is_interactive())?;

    let source = report_source(&options)?;
    let document = match source {
        Some(path) => ReportDocument::load(path).with_context(|| {
            format!(
                "load report {}; expected an HTML probe report with a <table> of results",
                path.display()
            )
        })?,
        None => ReportDocument::parse(&probeview_testkit::demo_report())
            .context("parse demo report")?,
    };

    let mut view = document.view();
    apply_view_options(&mut view, config.initial_sort(), &options)?;
    info!(
        rows = view.row_count(),
        visible = view.visible_count(),
        "view ready"
    );

    if !options.is_interactive() {
        if let Some(path) = &options.export_path {
            runtime::write_view(&document, &view, path)?;
        }
        if options.json {
            println!("{}", json_view(&view)?);
        }
        if options.check_only {
            println!("{}", check_summary(&source_label(source), &view));
        }
        return Ok(());
    }

    let mut runtime = FileRuntime::new(&document, runtime::default_export_path(source));
    probeview_tui::run_app(
        &mut view,
        &mut runtime,
        UiOptions {
            panel_height: config.panel_height(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    report_path: Option<PathBuf>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    json: bool,
    export_path: Option<PathBuf>,
    sorts: Vec<Column>,
    hides: Vec<(FilterColumn, String)>,
    show_help: bool,
}

impl CliOptions {
    fn is_interactive(&self) -> bool {
        !self.check_only && !self.json && self.export_path.is_none()
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        report_path: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        json: false,
        export_path: None,
        sorts: Vec::new(),
        hides: Vec::new(),
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--json" => {
                options.json = true;
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export requires a file path"))?;
                options.export_path = Some(PathBuf::from(value.as_ref()));
            }
            "--sort" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--sort requires a column name"))?;
                options.sorts.push(parse_sort_column(value.as_ref())?);
            }
            "--hide" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--hide requires <column>=<value>"))?;
                options.hides.push(parse_hide(value.as_ref())?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown if unknown.starts_with('-') => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
            path => {
                if options.report_path.is_some() {
                    bail!("unexpected extra argument {path:?}; pass a single report file");
                }
                options.report_path = Some(PathBuf::from(path));
            }
        }
    }

    Ok(options)
}

fn parse_sort_column(raw: &str) -> Result<Column> {
    Column::parse(raw).ok_or_else(|| {
        anyhow!("unknown column {raw:?}; expected one of host, title, status_code, technologies")
    })
}

fn parse_hide(raw: &str) -> Result<(FilterColumn, String)> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--hide expects <column>=<value>, got {raw:?}"))?;
    let column = FilterColumn::parse(column).ok_or_else(|| {
        anyhow!(
            "cannot filter on {column:?}; filterable columns are host, status_code, technologies"
        )
    })?;
    Ok((column, value.to_owned()))
}

fn report_source(options: &CliOptions) -> Result<Option<&Path>> {
    match (&options.report_path, options.demo) {
        (Some(_), true) => bail!("--demo cannot be combined with a report path"),
        (Some(path), false) => Ok(Some(path.as_path())),
        (None, true) => Ok(None),
        (None, false) => {
            bail!("no report given; run `probeview <report.html>` or `probeview --demo`")
        }
    }
}

fn source_label(source: Option<&Path>) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => "demo report".to_owned(),
    }
}

/// Applies the startup sort and `--sort`/`--hide` requests. Command-line
/// sorts replace the configured initial sort.
fn apply_view_options(
    view: &mut TableView,
    initial_sort: Option<Column>,
    options: &CliOptions,
) -> Result<()> {
    if options.sorts.is_empty() {
        if let Some(column) = initial_sort {
            view.sort_by(column);
        }
    } else {
        for column in &options.sorts {
            view.sort_by(*column);
        }
    }

    for (column, value) in &options.hides {
        let events = view.dispatch(ViewCommand::SetChecked {
            column: *column,
            value: normalize_text(value),
            checked: false,
        });
        if let Some(ViewEvent::UnknownValue { .. }) = events.first() {
            let known = view
                .domain(*column)
                .entries()
                .into_iter()
                .map(|entry| entry.label)
                .collect::<Vec<_>>();
            bail!(
                "--hide {}={value:?}: no such value; known values: {}",
                column.column().as_str(),
                known.join(", ")
            );
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonView<'a> {
    total: usize,
    visible: usize,
    sort: Option<SortState>,
    rows: Vec<JsonRow<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    host: &'a str,
    title: &'a str,
    status_code: &'a str,
    technologies: &'a [String],
}

fn json_view(view: &TableView) -> Result<String> {
    let rows = view
        .visible_rows()
        .map(|(_, row)| JsonRow {
            host: &row.display.host,
            title: &row.display.title,
            status_code: &row.display.status_code,
            technologies: &row.display.technologies,
        })
        .collect();
    let payload = JsonView {
        total: view.row_count(),
        visible: view.visible_count(),
        sort: view.sort_state(),
        rows,
    };
    serde_json::to_string_pretty(&payload).context("serialize view as JSON")
}

fn check_summary(source: &str, view: &TableView) -> String {
    let domains = FilterColumn::ALL
        .iter()
        .map(|column| format!("{} {}", view.domain(*column).len(), column.label()))
        .collect::<Vec<_>>();
    format!(
        "{source}: {}/{} rows shown; values: {}",
        view.visible_count(),
        view.row_count(),
        domains.join(", ")
    )
}

fn print_help() {
    println!("probeview [options] <report.html>");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Open a generated demo report");
    println!("  --check                  Load the report, print a summary and exit");
    println!("  --sort <column>          Sort by column (repeat to reverse)");
    println!("  --hide <column>=<value>  Uncheck a filter value (repeatable)");
    println!("  --json                   Print visible rows as JSON and exit");
    println!("  --export <path>          Write the filtered, sorted report and exit");
    println!("  --help                   Show this help");
}
