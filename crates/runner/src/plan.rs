//! Target selection and execution plans

use tracing::{info, warn};

use halmock_common::{CapabilityGroup, Error, MultiGroupPolicy, Result, TestCase};

use crate::registry::Registry;

/// Wildcard target selecting every implemented group
pub const ALL_TARGET: &str = "all";

/// Marker identifying a single test case target
pub const TEST_CASE_MARKER: &str = "TCID";

/// What the positional arguments asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No arguments
    Empty,
    /// One test case by selection name or report id
    Single(String),
    /// The `all` wildcard
    All,
    /// Known groups in argument order, without repeats
    Groups {
        groups: Vec<CapabilityGroup>,
        ignored: Vec<String>,
    },
    /// Arguments were given but none was recognised
    Unrecognized(Vec<String>),
}

impl Selection {
    /// Interpret positional arguments. A test case name wins over `all`,
    /// which wins over group names.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).filter(|a| !a.is_empty()).collect();
        if args.is_empty() {
            return Selection::Empty;
        }

        if let Some(name) = args.iter().find(|a| a.contains(TEST_CASE_MARKER)) {
            return Selection::Single(name.to_string());
        }

        if args.contains(&ALL_TARGET) {
            return Selection::All;
        }

        let mut groups = Vec::new();
        let mut ignored = Vec::new();
        for arg in args {
            match CapabilityGroup::from_name(arg) {
                Some(group) if !groups.contains(&group) => groups.push(group),
                Some(_) => {}
                None => ignored.push(arg.to_string()),
            }
        }

        if groups.is_empty() {
            Selection::Unrecognized(ignored)
        } else {
            Selection::Groups { groups, ignored }
        }
    }
}

/// Ordered list of test cases for one run
#[derive(Debug, Clone, Default)]
pub struct Plan<'a> {
    groups: Vec<CapabilityGroup>,
    cases: Vec<&'a TestCase>,
}

impl<'a> Plan<'a> {
    /// Resolve `selection` against the catalogue
    pub fn build(selection: &Selection, registry: &'a Registry, policy: MultiGroupPolicy) -> Result<Self> {
        match selection {
            Selection::Empty => {
                info!("No plugin or test case given, nothing to execute");
                Ok(Self::default())
            }
            Selection::Unrecognized(args) => {
                warn!("No known plugin or test case in {:?}, nothing to execute", args);
                Ok(Self::default())
            }
            Selection::Single(name) => {
                let (group, case) = registry
                    .find(name)
                    .ok_or_else(|| Error::UnknownTestCase(name.clone()))?;
                info!("Execution of testcase {}", case.name);
                Ok(Self {
                    groups: vec![group],
                    cases: vec![case],
                })
            }
            Selection::All => {
                info!("Executing complete test suite for all plugins");
                Ok(Self::from_groups(registry.implemented_groups(), registry))
            }
            Selection::Groups { groups, ignored } => {
                if !ignored.is_empty() {
                    warn!("Ignoring unrecognised target(s): {}", ignored.join(", "));
                }
                let groups = match policy {
                    MultiGroupPolicy::Union => groups.clone(),
                    MultiGroupPolicy::First => {
                        // Placeholder groups never win over an implemented one.
                        let chosen = groups
                            .iter()
                            .copied()
                            .find(|g| !registry.cases_for(*g).is_empty())
                            .unwrap_or(groups[0]);
                        if groups.len() > 1 {
                            let skipped: Vec<&str> = groups
                                .iter()
                                .filter(|g| **g != chosen)
                                .map(|g| g.as_str())
                                .collect();
                            warn!(
                                "Several plugins given; executing {} only (multi_group = first), skipping {}",
                                chosen,
                                skipped.join(", ")
                            );
                        }
                        vec![chosen]
                    }
                };
                Ok(Self::from_groups(groups, registry))
            }
        }
    }

    fn from_groups(groups: Vec<CapabilityGroup>, registry: &'a Registry) -> Self {
        let mut cases = Vec::new();
        for group in &groups {
            let group_cases = registry.cases_for(*group);
            if group_cases.is_empty() {
                warn!("No test cases implemented for {}, skipping", group);
            } else {
                info!("Executing {} test suite ({} case(s))", group, group_cases.len());
            }
            cases.extend(group_cases.iter());
        }
        Self { groups, cases }
    }

    pub fn groups(&self) -> &[CapabilityGroup] {
        &self.groups
    }

    pub fn cases(&self) -> &[&'a TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
