//! Core data model for conformance runs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Capability groups
// ============================================================================

/// A named cluster of related HAL test cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityGroup {
    FrontPanel,
    #[serde(rename = "HDCPProfile")]
    HdcpProfile,
    #[serde(rename = "LEDControl")]
    LedControl,
    DeviceSettings,
    Bluetooth,
    Wifi,
    HdmiInput,
}

impl CapabilityGroup {
    /// Every known group, in the order `all` executes them
    pub const ALL: [CapabilityGroup; 7] = [
        CapabilityGroup::FrontPanel,
        CapabilityGroup::HdcpProfile,
        CapabilityGroup::LedControl,
        CapabilityGroup::DeviceSettings,
        CapabilityGroup::Bluetooth,
        CapabilityGroup::Wifi,
        CapabilityGroup::HdmiInput,
    ];

    /// Name as typed on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityGroup::FrontPanel => "FrontPanel",
            CapabilityGroup::HdcpProfile => "HDCPProfile",
            CapabilityGroup::LedControl => "LEDControl",
            CapabilityGroup::DeviceSettings => "DeviceSettings",
            CapabilityGroup::Bluetooth => "Bluetooth",
            CapabilityGroup::Wifi => "Wifi",
            CapabilityGroup::HdmiInput => "HdmiInput",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Test cases
// ============================================================================

/// One fixture-backed test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Selection name, e.g. `TCID_006_DS_FrontPanel_powerLedOn`
    pub name: String,

    /// Identifier written to the report, e.g. `TCID006_FrontPanel_power_led_on`
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Requests sent before `request`; their responses are logged only
    #[serde(default)]
    pub setup: Vec<String>,

    /// JSON-RPC payload, sent verbatim
    pub request: String,

    /// Literal expected response
    pub expected: String,

    /// Extra sentence appended to the pass message
    #[serde(default)]
    pub pass_detail: Option<String>,
}

impl TestCase {
    /// True when `name` is either the selection name or the report id
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.id == name
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "Pass",
            TestStatus::Fail => "Fail",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pass" => Ok(TestStatus::Pass),
            "Fail" => Ok(TestStatus::Fail),
            other => Err(format!("unknown test status: {}", other)),
        }
    }
}

/// Result of executing a single test case. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub observed: String,
    pub status: TestStatus,
    pub message: String,
    pub duration_ms: u64,
}

/// One persisted report row, as read back from the CSV sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub test_id: String,
    pub response: String,
    pub status: TestStatus,
    pub message: String,
}

/// Everything the renderer needs for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub build_name: String,
    pub started_at: DateTime<Local>,
    pub rows: Vec<ReportRow>,
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}
