use std::collections::HashMap;

use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::types::{ProductionUnit, Project, TestUnit};

/// File extensions stripped from unit names before matching.
pub const EXTENSIONS: &[&str] = &[".java", ".class"];

/// Suffixes that turn a production class name into a test class name.
pub const TEST_SUFFIXES: &[&str] = &["Test", "Tests", "ITCase", "IT"];

/// Units that document a package rather than test a class.
pub const MARKER_UNITS: &[&str] = &["package-info"];

/// Strip a known extension and the `_`/`$` characters of synthetic names.
pub fn normalize(name: &str) -> String {
    let base = EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    base.chars().filter(|c| !matches!(c, '_' | '$')).collect()
}

/// Production units by normalized name. When two units normalize to the
/// same key, the first one seen is kept.
#[derive(Debug, Default)]
pub struct ProductionIndex<'a> {
    by_name: HashMap<String, &'a ProductionUnit>,
}

impl<'a> ProductionIndex<'a> {
    pub fn new(project: &'a Project) -> Self {
        let mut by_name = HashMap::new();
        for unit in project.production_units() {
            by_name.entry(normalize(unit.name())).or_insert(unit);
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&'a ProductionUnit> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Every test class is named after a production class plus a test suffix.
pub struct RuleEveryTestHasProductionClass<'a> {
    index: &'a ProductionIndex<'a>,
    unit: &'a TestUnit,
}

impl<'a> RuleEveryTestHasProductionClass<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleEveryTestHasProductionClass"];

    pub fn new(index: &'a ProductionIndex<'a>, unit: &'a TestUnit) -> Self {
        Self { index, unit }
    }

    /// The production unit this test corresponds to.
    pub fn production(&self) -> Option<&'a ProductionUnit> {
        let name = normalize(self.unit.name());
        TEST_SUFFIXES
            .iter()
            .filter_map(|suffix| name.strip_suffix(suffix))
            .filter(|base| !base.is_empty())
            .find_map(|base| self.index.get(base))
    }

    fn exempt(&self) -> bool {
        let characteristics = self.unit.characteristics();
        MARKER_UNITS.contains(&self.unit.name())
            || characteristics.is_integration_test()
            || characteristics.is_junit_extension()
    }
}

impl Rule for RuleEveryTestHasProductionClass<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if self.exempt() || self.production().is_some() {
            return Vec::new();
        }
        let name = self.unit.name();
        let expected = TEST_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .filter(|base| !base.is_empty())
            .unwrap_or(name);
        vec![Complaint::tagged(
            self.name(),
            format!("Test class '{name}' doesn't have corresponding production class"),
        )
        .linked(format!(
            "Either rename or move the test class '{name}', or create the production class '{expected}'"
        ))]
    }
}
