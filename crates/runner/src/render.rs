//! HTML and JSON report rendering

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

use halmock_common::{Result, RunReport, TestStatus};

use crate::report::ReportContext;

/// Paths of the artifacts written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub html: PathBuf,
    pub json: PathBuf,
}

/// Writes the end-of-run artifacts into one directory
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    output_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Collect the run from the accumulator and its CSV sink
    pub fn collect(&self, ctx: &ReportContext, build_name: &str, started_at: DateTime<Local>) -> Result<RunReport> {
        Ok(RunReport {
            build_name: build_name.to_string(),
            started_at,
            rows: ctx.read_rows()?,
            passed: ctx.passed().to_vec(),
            failed: ctx.failed().to_vec(),
        })
    }

    /// Render the HTML report and the JSON summary. Any write failure is
    /// returned to the caller.
    pub fn render(&self, ctx: &ReportContext, build_name: &str, started_at: DateTime<Local>) -> Result<RenderedReport> {
        let report = self.collect(ctx, build_name, started_at)?;
        Ok(RenderedReport {
            html: self.write_html(&report)?,
            json: self.write_json(&report)?,
        })
    }

    /// Write `report` as `<build>_<timestamp>.html`
    pub fn write_html(&self, report: &RunReport) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(html_file_name(&report.build_name, &report.started_at));
        std::fs::write(&path, render_html(report))?;

        info!("HTML report written to: {}", path.display());
        Ok(path)
    }

    /// Write `report` as `test-results.json`
    pub fn write_json(&self, report: &RunReport) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

pub fn html_file_name(build_name: &str, started_at: &DateTime<Local>) -> String {
    format!("{}_{}.html", build_name, started_at.format("%Y%m%d_%H%M%S"))
}

fn render_html(report: &RunReport) -> String {
    let mut rows = String::new();
    for (index, row) in report.rows.iter().enumerate() {
        let class = match row.status {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
        };
        rows.push_str(&format!(
            "      <tr class=\"{class}\"><td>{n}</td><td>{id}</td><td><code>{response}</code></td><td>{status}</td><td>{message}</td></tr>\n",
            class = class,
            n = index + 1,
            id = escape_html(&row.test_id),
            response = escape_html(&row.response),
            status = row.status,
            message = escape_html(&row.message),
        ));
    }

    let failed_list = if report.failed.is_empty() {
        "<p>None</p>".to_string()
    } else {
        let items: String = report
            .failed
            .iter()
            .map(|id| format!("<li>{}</li>", escape_html(id)))
            .collect();
        format!("<ul>{}</ul>", items)
    };

    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>{build} - HAL Mock Test Report</title>
    <style>
      body {{ font-family: ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; padding: 18px; }}
      table {{ border-collapse: collapse; width: 100%; }}
      th, td {{ border: 1px solid #d1d5db; padding: 6px 8px; text-align: left; vertical-align: top; }}
      th {{ background: #111827; color: #fff; }}
      tr.pass td:nth-child(4) {{ color: #15803d; font-weight: bold; }}
      tr.fail td:nth-child(4) {{ color: #b91c1c; font-weight: bold; }}
      code {{ word-break: break-all; }}
      .summary span {{ margin-right: 18px; }}
    </style>
  </head>
  <body>
    <h1>HAL Mock Test Report</h1>
    <p>Build: <b>{build}</b><br />Executed: <b>{started}</b></p>
    <p class="summary"><span>Total: <b>{total}</b></span><span>Passed: <b>{passed}</b></span><span>Failed: <b>{failed}</b></span></p>
    <h2>Failed test cases</h2>
    {failed_list}
    <h2>Results</h2>
    <table>
      <tr><th>#</th><th>Test case</th><th>Response</th><th>Status</th><th>Message</th></tr>
{rows}    </table>
  </body>
</html>
"#,
        build = escape_html(&report.build_name),
        started = report.started_at.format("%Y-%m-%d %H:%M:%S"),
        total = report.total(),
        passed = report.passed.len(),
        failed = report.failed.len(),
        failed_list = failed_list,
        rows = rows,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
