use std::collections::BTreeSet;

use crate::types::{Field, TestCase, TestUnit};

/// Prefix that namespaces testcop rules inside `@SuppressWarnings` values.
pub const SUPPRESSION_PREFIX: &str = "TESTCOP.";

/// Strip [`SUPPRESSION_PREFIX`] from a raw marker value, ignoring case.
pub fn strip_prefix(raw: &str) -> &str {
    match raw.get(..SUPPRESSION_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(SUPPRESSION_PREFIX) => {
            &raw[SUPPRESSION_PREFIX.len()..]
        }
        _ => raw,
    }
}

/// Resolves the effective set of suppressed rule names for units, cases
/// and fields.
///
/// Scopes are additive: a case inherits the markers of its unit and the
/// project-wide exclusions.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    exclusions: BTreeSet<String>,
    known: Option<BTreeSet<String>>,
}

impl Suppressions {
    pub fn new<I, S>(exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lenient = Self::default();
        let exclusions = exclusions
            .into_iter()
            .filter_map(|raw| lenient.normalize(raw.as_ref()))
            .collect();
        Self {
            exclusions,
            known: None,
        }
    }

    /// Discard marker values that are not one of `known` once stripped.
    pub fn strict<I, S>(mut self, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known = Some(known.into_iter().map(|s| s.as_ref().to_string()).collect());
        let exclusions = std::mem::take(&mut self.exclusions);
        self.exclusions = exclusions
            .iter()
            .filter_map(|raw| self.normalize(raw))
            .collect();
        self
    }

    /// Project-wide exclusions after normalization.
    pub fn exclusions(&self) -> &BTreeSet<String> {
        &self.exclusions
    }

    pub fn for_unit(&self, unit: &TestUnit) -> BTreeSet<String> {
        let mut set = self.exclusions.clone();
        self.extend(&mut set, unit.suppressed());
        set
    }

    pub fn for_case(&self, unit: &TestUnit, case: &TestCase) -> BTreeSet<String> {
        let mut set = self.for_unit(unit);
        self.extend(&mut set, case.suppressed());
        set
    }

    pub fn for_field(&self, unit: &TestUnit, field: &Field) -> BTreeSet<String> {
        let mut set = self.for_unit(unit);
        self.extend(&mut set, field.suppressed());
        set
    }

    fn extend(&self, set: &mut BTreeSet<String>, raw: &[String]) {
        set.extend(raw.iter().filter_map(|r| self.normalize(r)));
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let name = strip_prefix(raw.trim());
        match &self.known {
            Some(known) if !known.contains(name) => {
                tracing::debug!(marker = raw, "ignoring unknown suppression");
                None
            }
            _ => Some(name.to_string()),
        }
    }
}
