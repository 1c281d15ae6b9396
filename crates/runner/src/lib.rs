//! HAL Mock Conformance Runner
//!
//! Sends fixture-backed JSON-RPC requests to a plugin host and records
//! whether each response matches its expected text exactly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TestManager                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Selection::parse(args) -> Single | Groups | All | ...      │
//! │  Plan::build(selection, registry) -> [TestCase]             │
//! │  for case in plan:                                          │
//! │    Transport::send(case.request) -> response                │
//! │    ResponseMatcher::compare(response, case.expected)        │
//! │    ReportContext::record(result)   (CSV sink + lists)       │
//! │  ReportRenderer::render(ctx) -> <build>_<time>.html         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suites (YAML)                                              │
//! │    ├── group, callsign                                      │
//! │    └── cases: [name, id, setup?, request, expected]         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod compare;
pub mod invoker;
pub mod plan;
pub mod registry;
pub mod render;
pub mod report;
pub mod runner;

pub use compare::{ExactMatcher, JsonMatcher, ResponseMatcher};
pub use invoker::{CurlTransport, HttpTransport, Transport, TransportError};
pub use plan::{Plan, Selection};
pub use registry::{Registry, Suite};
pub use render::{RenderedReport, ReportRenderer};
pub use report::ReportContext;
pub use runner::{RunOutcome, TestManager};
