//! Harness configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Build name stamped on reports when none is configured
pub const DEFAULT_BUILD_NAME: &str = "23Q4-HAL-MOCK-TEST";

/// JSON-RPC endpoint of the plugin host under test
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:55555/jsonrpc";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Build name written into the report title and file name
    pub build_name: String,

    /// JSON-RPC endpoint
    pub endpoint: String,

    /// How requests reach the endpoint
    pub transport: TransportKind,

    /// curl binary used by the curl transport
    pub curl_binary: PathBuf,

    /// Per-request timeout. None leaves the transport default in place.
    pub timeout_secs: Option<u64>,

    /// How responses are compared with fixtures
    pub match_mode: MatchMode,

    /// What to run when several groups are named
    pub multi_group: MultiGroupPolicy,

    /// Directory for the CSV sink, HTML report and JSON summary
    pub output_dir: PathBuf,

    /// CSV sink file name inside `output_dir`
    pub csv_file: String,

    /// Extra suite files loaded on top of the built-in catalogue
    pub suites_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            build_name: DEFAULT_BUILD_NAME.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport: TransportKind::default(),
            curl_binary: PathBuf::from("curl"),
            timeout_secs: None,
            match_mode: MatchMode::default(),
            multi_group: MultiGroupPolicy::default(),
            output_dir: PathBuf::from("test-results"),
            csv_file: "test_results.csv".to_string(),
            suites_dir: None,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values that would only fail later, mid-run
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("endpoint must not be empty".to_string()));
        }
        if self.build_name.trim().is_empty() {
            return Err(Error::InvalidConfig("build_name must not be empty".to_string()));
        }
        if self.build_name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "build_name is used in a file name and cannot contain path separators: {}",
                self.build_name
            )));
        }
        if self.csv_file.trim().is_empty() {
            return Err(Error::InvalidConfig("csv_file must not be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::InvalidConfig(
                "timeout_secs must be at least 1; omit it to keep the transport default".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the CSV sink
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file)
    }
}

/// Request transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Spawn `curl` once per request
    #[default]
    Curl,
    /// In-process HTTP client
    Http,
}

/// Response comparison mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Byte-for-byte string equality
    #[default]
    Exact,
    /// Structural JSON equality, ignoring key order and whitespace
    Json,
}

/// Plan construction when more than one known group is selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiGroupPolicy {
    /// Run only the first recognised group
    #[default]
    First,
    /// Run every recognised group in argument order
    Union,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown value '{}' (expected one of: {})",
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

str_enum!(TransportKind { Curl => "curl", Http => "http" });
str_enum!(MatchMode { Exact => "exact", Json => "json" });
str_enum!(MultiGroupPolicy { First => "first", Union => "union" });
