use std::sync::OnceLock;

use regex::Regex;

use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::types::{TestCase, TestUnit};

fn mock_creation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:[\w$]+\.)*mock\s*\(").expect("mock pattern is valid"))
}

/// Number of statements that create a mock.
pub fn count_mocks(case: &TestCase) -> usize {
    case.statements()
        .iter()
        .filter(|s| mock_creation().is_match(s.trim_start()))
        .count()
}

/// A test case creates at most a configured number of mocks.
pub struct RuleTestCaseContainsMockery<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
    max: usize,
}

impl<'a> RuleTestCaseContainsMockery<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleTestCaseContainsMockery"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase, max: usize) -> Self {
        Self { unit, case, max }
    }
}

impl Rule for RuleTestCaseContainsMockery<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let mocks = count_mocks(self.case);
        if mocks <= self.max {
            return Vec::new();
        }
        vec![Complaint::tagged(
            self.name(),
            format!(
                "Method '{}' in {} creates {mocks} mocks, while at most {} are allowed",
                self.case.name(),
                self.unit.name(),
                self.max
            ),
        )
        .linked("Use fakes or real objects instead of mocks, or split the test")]
    }
}
