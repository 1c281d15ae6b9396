//! Response comparison against fixtures

use halmock_common::{MatchMode, TestStatus};

pub const MATCH_MESSAGE: &str = "Output response is matching with expected one";
pub const MISMATCH_MESSAGE: &str = "Output response is different from expected one";

/// Decides whether an observed response satisfies a fixture.
///
/// Implementations must be pure: the verdict depends on the two inputs only.
pub trait ResponseMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn compare(&self, observed: &str, expected: &str) -> (TestStatus, String);
}

/// Byte-for-byte equality. Key order and whitespace matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl ResponseMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn compare(&self, observed: &str, expected: &str) -> (TestStatus, String) {
        verdict(observed == expected)
    }
}

/// Structural equality of the parsed JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMatcher;

impl ResponseMatcher for JsonMatcher {
    fn name(&self) -> &'static str {
        "json"
    }

    fn compare(&self, observed: &str, expected: &str) -> (TestStatus, String) {
        let expected: serde_json::Value = match serde_json::from_str(expected) {
            Ok(v) => v,
            Err(e) => return (TestStatus::Fail, format!("Expected response is not valid JSON: {}", e)),
        };
        match serde_json::from_str::<serde_json::Value>(observed) {
            Ok(observed) => verdict(observed == expected),
            Err(_) => (TestStatus::Fail, format!("{} (not valid JSON)", MISMATCH_MESSAGE)),
        }
    }
}

/// Matcher for the configured mode
pub fn matcher_for(mode: MatchMode) -> Box<dyn ResponseMatcher> {
    match mode {
        MatchMode::Exact => Box::new(ExactMatcher),
        MatchMode::Json => Box::new(JsonMatcher),
    }
}

fn verdict(matches: bool) -> (TestStatus, String) {
    if matches {
        (TestStatus::Pass, MATCH_MESSAGE.to_string())
    } else {
        (TestStatus::Fail, MISMATCH_MESSAGE.to_string())
    }
}
