// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use probeview_app::PlainRow;
use probeview_html::escape_html;
use std::fs;
use std::path::PathBuf;

pub const DEMO_SEED: u64 = 42;
pub const DEMO_ROW_COUNT: usize = 40;

const SUBDOMAINS: [&str; 12] = [
    "www", "api", "admin", "mail", "dev", "staging", "cdn", "portal", "vpn", "shop", "blog",
    "status",
];
const DOMAINS: [&str; 5] = [
    "example.com",
    "example.org",
    "example.net",
    "acme.test",
    "initech.test",
];
const SCHEMES: [&str; 2] = ["https", "http"];
const STATUS_CODES: [u16; 7] = [200, 200, 200, 301, 302, 403, 404];
const TITLES: [&str; 10] = [
    "Welcome to nginx!",
    "Apache2 Ubuntu Default Page",
    "IIS Windows Server",
    "Login",
    "Dashboard",
    "403 Forbidden",
    "404 Not Found",
    "Moved Permanently",
    "Grafana",
    "",
];
const TECHNOLOGIES: [&str; 12] = [
    "Nginx",
    "Apache",
    "IIS",
    "PHP",
    "jQuery",
    "Bootstrap",
    "React",
    "Cloudflare",
    "WordPress",
    "ASP.NET",
    "Ubuntu",
    "HSTS",
];

/// One row of a probe report before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub host: String,
    pub title: String,
    pub status_code: String,
    pub technologies: Vec<String>,
}

impl ReportRow {
    pub fn new(host: &str, title: &str, status_code: &str, technologies: &[&str]) -> Self {
        Self {
            host: host.to_owned(),
            title: title.to_owned(),
            status_code: status_code.to_owned(),
            technologies: technologies.iter().map(|tech| (*tech).to_owned()).collect(),
        }
    }

    pub fn technologies_text(&self) -> String {
        format!("[{}]", self.technologies.join(" "))
    }

    pub fn plain_row(&self) -> PlainRow {
        PlainRow::new(
            &self.host,
            &self.title,
            &self.status_code,
            &self.technologies_text(),
        )
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic generator of probe report rows.
#[derive(Debug, Clone)]
pub struct ReportFaker {
    rng: DeterministicRng,
}

impl ReportFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn row(&mut self) -> ReportRow {
        let host = format!(
            "{}://{}.{}",
            self.pick(&SCHEMES),
            self.pick(&SUBDOMAINS),
            self.pick(&DOMAINS),
        );
        let status = STATUS_CODES[self.rng.int_n(STATUS_CODES.len())];
        let title = self.pick(&TITLES).to_owned();

        let tech_count = self.rng.int_n(4);
        let mut technologies = Vec::with_capacity(tech_count);
        for _ in 0..tech_count {
            let tech = self.pick(&TECHNOLOGIES).to_owned();
            if !technologies.contains(&tech) {
                technologies.push(tech);
            }
        }

        ReportRow {
            host,
            title,
            status_code: status.to_string(),
            technologies,
        }
    }

    pub fn rows(&mut self, count: usize) -> Vec<ReportRow> {
        (0..count).map(|_| self.row()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn demo_rows() -> Vec<ReportRow> {
    ReportFaker::new(DEMO_SEED).rows(DEMO_ROW_COUNT)
}

pub fn demo_report() -> String {
    render_report(&demo_rows())
}

/// Renders rows in the probe report layout: one `<ul>` per row whose list
/// items hold Host, Title, Status Code and Technologies anchors.
pub fn render_report(rows: &[ReportRow]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>probe report</title>\n</head>\n<body>\n<table>\n<thead><tr><th>Result</th></tr></thead>\n<tbody>\n",
    );
    for row in rows {
        html.push_str(&format!(
            "<tr><td><ul>\
             <li>Host: <a href=\"{host}\">{host}</a></li>\
             <li>Title: <a>{title}</a></li>\
             <li>Status Code: <a>{status}</a></li>\
             <li>Technologies: <a>{techs}</a></li>\
             </ul></td></tr>\n",
            host = escape_html(&row.host),
            title = escape_html(&row.title),
            status = escape_html(&row.status_code),
            techs = escape_html(&row.technologies_text()),
        ));
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

pub fn temp_report(rows: &[ReportRow]) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("report.html");
    fs::write(&path, render_report(rows))
        .with_context(|| format!("write report {}", path.display()))?;
    Ok((dir, path))
}

/// Four rows covering numeric sort, shared hosts and an empty tech list.
pub fn sample_rows() -> Vec<ReportRow> {
    vec![
        ReportRow::new("https://alpha.example", "Alpha", "200", &["Nginx", "PHP"]),
        ReportRow::new("https://Beta.example", "beta", "404", &["Apache"]),
        ReportRow::new("http://gamma.example", "Gamma Home", "301", &[]),
        ReportRow::new("https://alpha.example", "Alpha Admin", "200", &["nginx"]),
    ]
}
