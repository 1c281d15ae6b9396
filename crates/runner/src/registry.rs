//! Declarative YAML suite catalogue

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use halmock_common::{CapabilityGroup, Error, Result, TestCase};

const BUILTIN_SUITES: &[(&str, &str)] = &[
    ("suites/frontpanel.yaml", include_str!("../suites/frontpanel.yaml")),
    ("suites/hdcpprofile.yaml", include_str!("../suites/hdcpprofile.yaml")),
    ("suites/ledcontrol.yaml", include_str!("../suites/ledcontrol.yaml")),
];

/// All test cases of one capability group, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub group: CapabilityGroup,

    /// Plugin callsign the group activates and deactivates
    #[serde(default)]
    pub callsign: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Order matters: cases may depend on state left by earlier ones
    pub cases: Vec<TestCase>,
}

impl Suite {
    /// Parse a suite from a YAML string
    pub fn from_yaml(source: &str, yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::suite_parse(source, e))
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&path.display().to_string(), &content)
    }
}

/// Maps test identifiers and groups to their definitions
#[derive(Debug, Clone, Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    /// Build a registry from suites, rejecting duplicate names or ids
    pub fn new(suites: Vec<Suite>) -> Result<Self> {
        let registry = Self { suites };
        registry.check_unique()?;
        Ok(registry)
    }

    /// The suites compiled into the binary
    pub fn builtin() -> Result<Self> {
        let suites = BUILTIN_SUITES
            .iter()
            .map(|(source, yaml)| Suite::from_yaml(source, yaml))
            .collect::<Result<Vec<_>>>()?;
        Self::new(suites)
    }

    /// Load every `*.yaml`/`*.yml` under `dir`. A suite for a group that is
    /// already present replaces it.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "suites directory does not exist: {}",
                dir.display()
            )));
        }

        let mut loaded = 0;
        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_suite = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if !is_suite {
                continue;
            }

            let suite = Suite::from_file(entry.path())?;
            debug!("Loaded {} case(s) for {} from {}", suite.cases.len(), suite.group, entry.path().display());
            self.insert(suite);
            loaded += 1;
        }

        self.check_unique()?;
        Ok(loaded)
    }

    fn insert(&mut self, suite: Suite) {
        match self.suites.iter_mut().find(|s| s.group == suite.group) {
            Some(existing) => {
                warn!("Suite for {} replaced by a loaded suite", suite.group);
                *existing = suite;
            }
            None => self.suites.push(suite),
        }
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for case in self.suites.iter().flat_map(|s| &s.cases) {
            // A case may reuse its own name as its id; only collisions across cases count.
            let keys: HashSet<&str> = [case.name.as_str(), case.id.as_str()].into_iter().collect();
            for key in keys {
                if !seen.insert(key) {
                    return Err(Error::DuplicateTestCase(key.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Suite for `group`, if that group has been implemented
    pub fn suite(&self, group: CapabilityGroup) -> Option<&Suite> {
        self.suites.iter().find(|s| s.group == group && !s.cases.is_empty())
    }

    /// Ordered cases of `group`; empty for placeholder groups
    pub fn cases_for(&self, group: CapabilityGroup) -> &[TestCase] {
        self.suite(group).map(|s| s.cases.as_slice()).unwrap_or(&[])
    }

    /// Look up a single case by selection name or report id
    pub fn find(&self, name: &str) -> Option<(CapabilityGroup, &TestCase)> {
        self.suites
            .iter()
            .flat_map(|s| s.cases.iter().map(move |c| (s.group, c)))
            .find(|(_, c)| c.answers_to(name))
    }

    /// Groups that have at least one case, in enumeration order
    pub fn implemented_groups(&self) -> Vec<CapabilityGroup> {
        CapabilityGroup::ALL
            .into_iter()
            .filter(|g| self.suite(*g).is_some())
            .collect()
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }
}
