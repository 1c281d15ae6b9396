//! Report accumulation: passed/failed lists plus the CSV sink

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use halmock_common::{Error, ReportRow, Result, TestResult, TestStatus};

const CSV_HEADER: [&str; 4] = ["test_id", "response", "status", "message"];

/// Outcome of every test executed in one run.
///
/// Passed explicitly through the driver. Writes are strictly sequential; a
/// parallel driver would need to serialise `record` calls.
#[derive(Debug)]
pub struct ReportContext {
    csv_path: PathBuf,
    passed: Vec<String>,
    failed: Vec<String>,
    results: Vec<TestResult>,
}

impl ReportContext {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            passed: Vec::new(),
            failed: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Clear both lists and start a fresh CSV sink containing only the header
    pub fn reset(&mut self) -> Result<()> {
        self.passed.clear();
        self.failed.clear();
        self.results.clear();

        if let Some(parent) = self.csv_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.csv_path, csv_line(&CSV_HEADER))?;
        debug!("Report sink reset: {}", self.csv_path.display());
        Ok(())
    }

    /// Append one row to the sink, then to the list matching its status
    pub fn record(&mut self, result: TestResult) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.csv_path)?;
        file.write_all(
            csv_line(&[
                result.test_id.as_str(),
                result.observed.as_str(),
                result.status.as_str(),
                result.message.as_str(),
            ])
            .as_bytes(),
        )?;

        match result.status {
            TestStatus::Pass => self.passed.push(result.test_id.clone()),
            TestStatus::Fail => self.failed.push(result.test_id.clone()),
        }
        self.results.push(result);
        Ok(())
    }

    pub fn passed(&self) -> &[String] {
        &self.passed
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Number of test cases recorded since the last reset
    pub fn executed(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Read every recorded row back from the sink
    pub fn read_rows(&self) -> Result<Vec<ReportRow>> {
        read_rows(&self.csv_path)
    }
}

/// Parse a CSV sink written by [`ReportContext`]
pub fn read_rows(path: &Path) -> Result<Vec<ReportRow>> {
    let content = std::fs::read_to_string(path)?;
    let mut records = parse_csv(&content).into_iter();

    match records.next() {
        Some(header) if header == CSV_HEADER => {}
        Some(header) => {
            return Err(Error::Report(format!(
                "unexpected CSV header in {}: {:?}",
                path.display(),
                header
            )))
        }
        None => return Ok(Vec::new()),
    }

    records
        .enumerate()
        .map(|(i, fields)| {
            let [test_id, response, status, message]: [String; 4] =
                fields.try_into().map_err(|fields: Vec<String>| {
                    Error::Report(format!("row {} has {} fields, expected 4", i + 1, fields.len()))
                })?;
            let status = status
                .parse::<TestStatus>()
                .map_err(|e| Error::Report(format!("row {}: {}", i + 1, e)))?;
            Ok(ReportRow {
                test_id,
                response,
                status,
                message,
            })
        })
        .collect()
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// RFC 4180 quoting: fields containing a comma, quote or line break are quoted
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result(id: &str, observed: &str, status: TestStatus) -> TestResult {
        TestResult {
            test_id: id.to_string(),
            observed: observed.to_string(),
            status,
            message: "Output response is different from expected one".to_string(),
            duration_ms: 3,
        }
    }

    #[test]
    fn test_reset_then_nothing_recorded() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = ReportContext::new(tmp.path().join("out").join("results.csv"));
        ctx.reset().unwrap();

        assert!(ctx.passed().is_empty());
        assert!(ctx.failed().is_empty());
        assert_eq!(ctx.executed(), 0);
        assert!(ctx.read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_record_routes_by_status() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = ReportContext::new(tmp.path().join("results.csv"));
        ctx.reset().unwrap();

        ctx.record(result("TCID001", "{}", TestStatus::Pass)).unwrap();
        ctx.record(result("TCID002", "", TestStatus::Fail)).unwrap();
        ctx.record(result("TCID003", "{}", TestStatus::Pass)).unwrap();

        assert_eq!(ctx.passed(), ["TCID001", "TCID003"]);
        assert_eq!(ctx.failed(), ["TCID002"]);
        assert_eq!(ctx.executed(), 3);
        assert!(ctx.passed().iter().all(|id| !ctx.failed().contains(id)));
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = ReportContext::new(tmp.path().join("results.csv"));
        ctx.reset().unwrap();
        ctx.record(result("TCID001", "{}", TestStatus::Fail)).unwrap();

        ctx.reset().unwrap();
        assert_eq!(ctx.executed(), 0);
        assert!(ctx.results().is_empty());
        assert!(ctx.read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_json_responses_survive_the_sink() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = ReportContext::new(tmp.path().join("results.csv"));
        ctx.reset().unwrap();

        let response = "{\"jsonrpc\":\"2.0\",\"id\":42,\"result\":{\"preferences\":\"a,b\"}}\nsecond line";
        ctx.record(result("TCID002_FrontPanel_get_preferences", response, TestStatus::Fail))
            .unwrap();

        let rows = ctx.read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_id, "TCID002_FrontPanel_get_preferences");
        assert_eq!(rows[0].response, response);
        assert_eq!(rows[0].status, TestStatus::Fail);
    }

    #[test]
    fn test_record_without_reset_fails() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = ReportContext::new(tmp.path().join("missing").join("results.csv"));
        assert!(ctx.record(result("TCID001", "{}", TestStatus::Pass)).is_err());
        assert_eq!(ctx.executed(), 0);
    }

    #[test]
    fn test_foreign_header_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("other.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(read_rows(&path), Err(Error::Report(_))));
    }
}
