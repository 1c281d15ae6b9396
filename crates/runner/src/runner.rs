//! Test manager: selects a plan, runs it against the endpoint and reports

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use halmock_common::{Error, HarnessConfig, Result, TestCase, TestResult, TestStatus};

use crate::compare::{matcher_for, ResponseMatcher};
use crate::invoker::{self, Transport};
use crate::plan::{Plan, Selection};
use crate::registry::Registry;
use crate::render::ReportRenderer;
use crate::report::ReportContext;

/// Prefix of the message recorded when a request produced no response
pub const INVOKE_FAILED: &str = "Request invoke failed";

/// Result of one `test-manager` invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub build_name: String,
    pub started_at: DateTime<Local>,
    pub duration_ms: u64,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub results: Vec<TestResult>,
    pub html_report: PathBuf,
    pub json_summary: PathBuf,
}

impl RunOutcome {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs test plans sequentially against one JSON-RPC endpoint
pub struct TestManager {
    config: HarnessConfig,
    registry: Registry,
    transport: Box<dyn Transport>,
    matcher: Box<dyn ResponseMatcher>,
    renderer: ReportRenderer,
}

impl TestManager {
    /// Build a manager from configuration: built-in suites plus `suites_dir`,
    /// the configured transport and comparison mode.
    pub fn from_config(config: HarnessConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = Registry::builtin()?;
        if let Some(dir) = &config.suites_dir {
            let loaded = registry.load_dir(dir)?;
            info!("Loaded {} suite file(s) from {}", loaded, dir.display());
        }

        let transport = invoker::from_config(&config)
            .map_err(|e| Error::InvalidConfig(format!("transport: {}", e)))?;
        let matcher = matcher_for(config.match_mode);

        Ok(Self::with_parts(config, registry, transport, matcher))
    }

    /// Assemble a manager from explicit parts
    pub fn with_parts(
        config: HarnessConfig,
        registry: Registry,
        transport: Box<dyn Transport>,
        matcher: Box<dyn ResponseMatcher>,
    ) -> Self {
        let renderer = ReportRenderer::new(config.output_dir.clone());
        Self {
            config,
            registry,
            transport,
            matcher,
            renderer,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run whatever `targets` select, then render the report once.
    ///
    /// An error from the accumulator aborts the remaining plan and no report
    /// is rendered.
    pub async fn run<S: AsRef<str>>(&self, targets: &[S]) -> Result<RunOutcome> {
        let started_at = Local::now();
        let start = Instant::now();

        let selection = Selection::parse(targets);
        debug!("Selection: {:?}", selection);
        let plan = Plan::build(&selection, &self.registry, self.config.multi_group)?;

        // The previous run's sink survives a selection error.
        let mut ctx = ReportContext::new(self.config.csv_path());
        ctx.reset()?;

        info!(
            "Running {} test(s) against {} via {} ({} match)",
            plan.len(),
            self.config.endpoint,
            self.transport.name(),
            self.matcher.name()
        );
        info!("***** Test Execution Starts *****");
        self.execute_plan(&plan, &mut ctx).await?;
        info!("***** Test Execution Ends *****");

        let rendered = self.renderer.render(&ctx, &self.config.build_name, started_at)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            ctx.passed().len(),
            ctx.failed().len(),
            duration_ms
        );

        Ok(RunOutcome {
            build_name: self.config.build_name.clone(),
            started_at,
            duration_ms,
            passed: ctx.passed().to_vec(),
            failed: ctx.failed().to_vec(),
            results: ctx.results().to_vec(),
            html_report: rendered.html,
            json_summary: rendered.json,
        })
    }

    /// Execute every case of `plan` in order, recording each outcome
    pub async fn execute_plan(&self, plan: &Plan<'_>, ctx: &mut ReportContext) -> Result<()> {
        for case in plan.cases() {
            let result = self.run_case(case).await;
            match result.status {
                TestStatus::Pass => info!("✓ {} ({} ms)", result.test_id, result.duration_ms),
                TestStatus::Fail => error!("✗ {} - {}", result.test_id, result.message),
            }
            ctx.record(result)?;
        }
        Ok(())
    }

    /// Send one case's request and compare the response with its fixture
    pub async fn run_case(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", case.name);
        if !case.description.is_empty() {
            info!("TC Description - {}", case.description);
        }

        for payload in &case.setup {
            match self.transport.send(payload).await {
                Ok(response) => debug!("Setup response: {}", response),
                Err(e) => warn!("Setup request for {} failed: {}", case.id, e),
            }
        }

        let (observed, status, message) = match self.transport.send(&case.request).await {
            Ok(response) if !response.is_empty() => {
                debug!("Request for {} sent from the test runner", case.id);
                let (status, message) = self.matcher.compare(&response, &case.expected);
                let message = match (&case.pass_detail, status) {
                    (Some(detail), TestStatus::Pass) => format!("{}. {}", message, detail),
                    _ => message,
                };
                (response, status, message)
            }
            Ok(_) => {
                error!("{} invoke failed for {}: empty response", self.transport.name(), case.id);
                (
                    String::new(),
                    TestStatus::Fail,
                    format!("{} via {}: empty response", INVOKE_FAILED, self.transport.name()),
                )
            }
            Err(e) => {
                error!("{} invoke failed for {}: {}", self.transport.name(), case.id, e);
                (
                    String::new(),
                    TestStatus::Fail,
                    format!("{} via {}: {}", INVOKE_FAILED, self.transport.name(), e),
                )
            }
        };

        info!("Testcase ID : {}", case.id);
        info!("Testcase Output Response : {}", observed);
        info!("Testcase Status : {}", status);
        info!("Testcase Message : {}", message);

        TestResult {
            test_id: case.id.clone(),
            observed,
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}
