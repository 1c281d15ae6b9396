use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use halmock_common::{CapabilityGroup, Error, HarnessConfig, MatchMode, MultiGroupPolicy, TestStatus};
use halmock_runner::compare::{ExactMatcher, JsonMatcher};
use halmock_runner::report::read_rows;
use halmock_runner::runner::INVOKE_FAILED;
use halmock_runner::{Registry, TestManager, Transport, TransportError};

const POWER_LED_ON: &str = "TCID006_FrontPanel_power_led_on";
const SUCCESS: &str = r#"{"jsonrpc":"2.0","id":42,"result":{"success":true}}"#;

/// Answers from a table keyed by request payload and remembers what it was sent.
/// Repeated payloads walk through their queued responses; the last one sticks.
struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<String>>>,
    fallback: String,
    sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(fallback: &str) -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fallback: fallback.to_string(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A well-behaved endpoint: every request gets its fixture, in suite order
    fn conforming(registry: &Registry) -> Self {
        let transport = Self::new("");
        {
            let mut responses = transport.responses.lock().unwrap();
            for case in registry.suites().iter().flat_map(|s| &s.cases) {
                responses
                    .entry(case.request.clone())
                    .or_default()
                    .push_back(case.expected.clone());
            }
        }
        transport
    }

    fn respond(self, request: &str, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(request.to_string(), VecDeque::from([response.to_string()]));
        self
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, payload: &str) -> Result<String, TransportError> {
        self.sent.lock().unwrap().push(payload.to_string());
        let mut responses = self.responses.lock().unwrap();
        let response = match responses.get_mut(payload) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// An endpoint nobody is listening on
struct RefusingTransport;

#[async_trait]
impl Transport for RefusingTransport {
    fn name(&self) -> &'static str {
        "refusing"
    }

    async fn send(&self, _payload: &str) -> Result<String, TransportError> {
        Err(TransportError::Exit {
            binary: "curl".to_string(),
            code: Some(7),
            stderr: "Failed to connect to 127.0.0.1 port 55555".to_string(),
        })
    }
}

/// Removes the output directory on the first request, breaking the CSV sink
struct SinkBreakingTransport {
    output_dir: std::path::PathBuf,
}

#[async_trait]
impl Transport for SinkBreakingTransport {
    fn name(&self) -> &'static str {
        "sink-breaking"
    }

    async fn send(&self, _payload: &str) -> Result<String, TransportError> {
        let _ = std::fs::remove_dir_all(&self.output_dir);
        Ok(SUCCESS.to_string())
    }
}

fn config(dir: &Path) -> HarnessConfig {
    HarnessConfig {
        output_dir: dir.join("results"),
        ..Default::default()
    }
}

fn manager(dir: &Path, transport: Box<dyn Transport>) -> TestManager {
    TestManager::with_parts(
        config(dir),
        Registry::builtin().unwrap(),
        transport,
        Box::new(ExactMatcher),
    )
}

fn power_led_on_request(registry: &Registry) -> String {
    registry.find(POWER_LED_ON).unwrap().1.request.clone()
}

#[tokio::test]
async fn frontpanel_against_conforming_endpoint_passes() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::conforming(&registry);
    let manager = TestManager::with_parts(config(tmp.path()), registry, Box::new(transport), Box::new(ExactMatcher));

    let outcome = manager.run(&["FrontPanel"]).await.unwrap();

    let expected = manager.registry().cases_for(CapabilityGroup::FrontPanel).len();
    assert_eq!(outcome.total(), expected);
    assert!(outcome.success(), "failed: {:?}", outcome.failed);
    assert!(outcome.passed.contains(&POWER_LED_ON.to_string()));

    let order: Vec<&str> = outcome.results.iter().map(|r| r.test_id.as_str()).collect();
    assert_eq!(order.first(), Some(&"TCID000_FrontPanel_activate"));
    assert_eq!(order.last(), Some(&"TCID016_FrontPanel_deactivate"));

    let rows = read_rows(&manager.config().csv_path()).unwrap();
    assert_eq!(rows.len(), expected);
    assert!(outcome.html_report.exists());
    assert!(outcome.json_summary.exists());
}

#[tokio::test]
async fn setup_requests_precede_the_compared_request() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let case = registry
        .find("TCID_015_DS_FrontPanel_getSetBrightnessCombination")
        .unwrap()
        .1
        .clone();
    let transport = std::sync::Arc::new(
        ScriptedTransport::new(SUCCESS).respond(&case.request, &case.expected),
    );
    let manager = manager(tmp.path(), Box::new(SharedTransport(transport.clone())));

    let result = manager.run_case(&case).await;
    assert_eq!(result.status, TestStatus::Pass);
    assert!(result.message.contains("The brightness set is obtained"));

    let mut expected = case.setup.clone();
    expected.push(case.request.clone());
    assert_eq!(transport.sent(), expected);
}

#[tokio::test]
async fn power_led_on_scenario_passes_while_others_fail() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::new(r#"{"jsonrpc":"2.0","id":42,"result":"#)
        .respond(&power_led_on_request(&registry), SUCCESS);
    let manager = manager(tmp.path(), Box::new(transport));

    let outcome = manager.run(&["FrontPanel"]).await.unwrap();

    assert!(outcome.passed.contains(&POWER_LED_ON.to_string()));
    assert!(!outcome.failed.contains(&POWER_LED_ON.to_string()));
    assert!(!outcome.success());
    // Every case still ran after the earlier mismatches.
    assert_eq!(
        outcome.total(),
        manager.registry().cases_for(CapabilityGroup::FrontPanel).len()
    );

    let row = outcome.results.iter().find(|r| r.test_id == POWER_LED_ON).unwrap();
    assert_eq!(row.observed, SUCCESS);
    assert!(row.message.contains("The power led ON is obtained"));
}

#[tokio::test]
async fn malformed_or_empty_response_fails_and_run_continues() {
    for response in [r#"{"jsonrpc":"2.0","id":42,"result":{"succ"#, ""] {
        let tmp = TempDir::new().unwrap();
        let registry = Registry::builtin().unwrap();
        let transport = ScriptedTransport::conforming(&registry).respond(&power_led_on_request(&registry), response);
        let manager = manager(tmp.path(), Box::new(transport));

        let outcome = manager.run(&["FrontPanel"]).await.unwrap();

        assert_eq!(outcome.failed, vec![POWER_LED_ON.to_string()]);
        let index = outcome.results.iter().position(|r| r.test_id == POWER_LED_ON).unwrap();
        assert!(index + 1 < outcome.results.len(), "driver stopped after the failure");
        assert!(outcome.results[index + 1..].iter().all(|r| r.status == TestStatus::Pass));
    }
}

#[tokio::test]
async fn non_responsive_endpoint_twice_records_two_invoke_failures() {
    let tmp = TempDir::new().unwrap();
    let manager = manager(tmp.path(), Box::new(RefusingTransport));

    let mut failures = Vec::new();
    for _ in 0..2 {
        let outcome = manager.run(&["TCID_006_DS_FrontPanel_powerLedOn"]).await.unwrap();
        assert_eq!(outcome.failed, vec![POWER_LED_ON.to_string()]);
        assert!(outcome.passed.is_empty());
        failures.extend(outcome.results);
    }

    assert_eq!(failures.len(), 2);
    for result in failures {
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.message.starts_with(INVOKE_FAILED), "{}", result.message);
        assert!(result.observed.is_empty());
    }
}

#[tokio::test]
async fn single_test_by_report_id_runs_only_that_case() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::conforming(&registry);
    let manager = manager(tmp.path(), Box::new(transport));

    let outcome = manager.run(&[POWER_LED_ON]).await.unwrap();
    assert_eq!(outcome.passed, vec![POWER_LED_ON.to_string()]);
    assert_eq!(outcome.total(), 1);
}

#[tokio::test]
async fn no_targets_still_renders_an_empty_report() {
    let tmp = TempDir::new().unwrap();
    let manager = manager(tmp.path(), Box::new(RefusingTransport));

    let outcome = manager.run::<&str>(&[]).await.unwrap();
    assert_eq!(outcome.total(), 0);
    assert!(outcome.success());

    let html = std::fs::read_to_string(&outcome.html_report).unwrap();
    assert!(html.contains("23Q4-HAL-MOCK-TEST"));
    assert!(html.contains("Total: <b>0</b>"));
}

#[tokio::test]
async fn unknown_test_case_is_a_harness_error() {
    let tmp = TempDir::new().unwrap();
    let manager = manager(tmp.path(), Box::new(RefusingTransport));

    let err = manager.run(&["TCID_404_DS_FrontPanel_missing"]).await.unwrap_err();
    assert!(matches!(err, Error::UnknownTestCase(_)));
}

#[tokio::test]
async fn unknown_test_case_keeps_the_previous_csv() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::conforming(&registry);
    let manager = TestManager::with_parts(config(tmp.path()), registry, Box::new(transport), Box::new(ExactMatcher));

    let outcome = manager.run(&["LEDControl"]).await.unwrap();
    let csv = manager.config().csv_path();
    assert_eq!(read_rows(&csv).unwrap().len(), outcome.total());

    manager.run(&["TCID_404_DS_FrontPanel_missing"]).await.unwrap_err();
    assert_eq!(read_rows(&csv).unwrap().len(), outcome.total());
}

#[tokio::test]
async fn placeholder_group_first_does_not_hide_an_implemented_group() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::conforming(&registry);
    let manager = TestManager::with_parts(config(tmp.path()), registry, Box::new(transport), Box::new(ExactMatcher));

    let outcome = manager.run(&["Bluetooth", "FrontPanel", "LEDControl"]).await.unwrap();

    let frontpanel = manager.registry().cases_for(CapabilityGroup::FrontPanel);
    assert_eq!(outcome.total(), frontpanel.len());
    assert_eq!(outcome.results[0].test_id, frontpanel[0].id);
    assert!(outcome.success(), "failed: {:?}", outcome.failed);
}

#[tokio::test]
async fn union_policy_runs_every_implemented_group_in_argument_order() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let transport = ScriptedTransport::conforming(&registry);
    let manager = TestManager::with_parts(
        HarnessConfig {
            multi_group: MultiGroupPolicy::Union,
            ..config(tmp.path())
        },
        registry,
        Box::new(transport),
        Box::new(ExactMatcher),
    );

    let outcome = manager.run(&["LEDControl", "Bluetooth", "HDCPProfile"]).await.unwrap();

    let led = manager.registry().cases_for(CapabilityGroup::LedControl);
    let hdcp = manager.registry().cases_for(CapabilityGroup::HdcpProfile);
    assert_eq!(outcome.total(), led.len() + hdcp.len());
    assert_eq!(outcome.results[0].test_id, led[0].id);
    assert_eq!(outcome.results[led.len()].test_id, hdcp[0].id);
}

#[tokio::test]
async fn broken_sink_aborts_the_plan_without_a_report() {
    let tmp = TempDir::new().unwrap();
    let output_dir = tmp.path().join("results");
    let transport = SinkBreakingTransport {
        output_dir: output_dir.clone(),
    };
    let manager = manager(tmp.path(), Box::new(transport));

    let err = manager.run(&["FrontPanel"]).await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn json_mode_tolerates_reordered_keys() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let reordered = r#"{"result":{"success":true},"id":42,"jsonrpc":"2.0"}"#;
    let request = power_led_on_request(&registry);

    let exact = TestManager::with_parts(
        config(tmp.path()),
        registry.clone(),
        Box::new(ScriptedTransport::new(reordered).respond(&request, reordered)),
        Box::new(ExactMatcher),
    );
    let outcome = exact.run(&[POWER_LED_ON]).await.unwrap();
    assert_eq!(outcome.failed, vec![POWER_LED_ON.to_string()]);

    let json = TestManager::with_parts(
        HarnessConfig {
            match_mode: MatchMode::Json,
            ..config(tmp.path())
        },
        registry,
        Box::new(ScriptedTransport::new(reordered).respond(&request, reordered)),
        Box::new(JsonMatcher),
    );
    let outcome = json.run(&[POWER_LED_ON]).await.unwrap();
    assert_eq!(outcome.passed, vec![POWER_LED_ON.to_string()]);
}

#[tokio::test]
async fn from_config_loads_extra_suites() {
    let tmp = TempDir::new().unwrap();
    let suites = tmp.path().join("suites");
    std::fs::create_dir_all(&suites).unwrap();
    std::fs::write(
        suites.join("wifi.yaml"),
        r#"
group: Wifi
cases:
  - name: TCID_001_Wifi_getConnectedSSID
    id: TCID001_Wifi_get_connected_ssid
    request: '{"jsonrpc":"2.0","id":42,"method":"org.rdk.Wifi.1.getConnectedSSID"}'
    expected: '{"jsonrpc":"2.0","id":42,"result":{"ssid":"lab","success":true}}'
"#,
    )
    .unwrap();

    let manager = TestManager::from_config(HarnessConfig {
        suites_dir: Some(suites),
        curl_binary: "/nonexistent/halmock-curl".into(),
        ..config(tmp.path())
    })
    .unwrap();

    let outcome = manager.run(&["Wifi"]).await.unwrap();
    assert_eq!(outcome.failed, vec!["TCID001_Wifi_get_connected_ssid".to_string()]);
    assert!(outcome.results[0].message.starts_with(INVOKE_FAILED));
}

#[tokio::test]
async fn from_config_rejects_a_missing_suites_dir() {
    let tmp = TempDir::new().unwrap();
    let result = TestManager::from_config(HarnessConfig {
        suites_dir: Some(tmp.path().join("no-such-dir")),
        ..config(tmp.path())
    });

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[tokio::test]
async fn requests_are_sent_in_plan_order() {
    let tmp = TempDir::new().unwrap();
    let registry = Registry::builtin().unwrap();
    let expected: Vec<String> = registry
        .cases_for(CapabilityGroup::LedControl)
        .iter()
        .flat_map(|c| c.setup.iter().chain(std::iter::once(&c.request)).cloned())
        .collect();

    let transport = std::sync::Arc::new(ScriptedTransport::conforming(&registry));
    let manager = TestManager::with_parts(
        config(tmp.path()),
        registry,
        Box::new(SharedTransport(transport.clone())),
        Box::new(ExactMatcher),
    );

    let outcome = manager.run(&["LEDControl"]).await.unwrap();
    assert!(outcome.success());
    assert_eq!(transport.sent(), expected);
}

/// Lets a test keep a handle on a transport owned by the manager
struct SharedTransport(std::sync::Arc<ScriptedTransport>);

#[async_trait]
impl Transport for SharedTransport {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    async fn send(&self, payload: &str) -> Result<String, TransportError> {
        self.0.send(payload).await
    }
}
