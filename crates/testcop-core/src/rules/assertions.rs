use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::types::{TestCase, TestUnit};

/// Every assertion explains what it verifies.
pub struct RuleAssertionMessage<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleAssertionMessage<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleAssertionMessage"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RuleAssertionMessage<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let missing = self
            .case
            .assertions()
            .iter()
            .filter(|a| a.explanation().is_none())
            .count();
        if missing == 0 {
            return Vec::new();
        }
        vec![Complaint::tagged(
            self.name(),
            format!(
                "Method '{}' in {} has {missing} assertion(s) without an explanation",
                self.case.name(),
                self.unit.name()
            ),
        )
        .linked("Add a message to each assertion saying what it checks, e.g. assertThat(\"returns the price\", price, equalTo(10))")]
    }
}

/// No assertion compares a hardcoded boolean with itself.
pub struct RuleLineHitter<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleLineHitter<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleLineHitter"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RuleLineHitter<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let hitters = self
            .case
            .assertions()
            .iter()
            .filter(|a| a.is_line_hitter())
            .count();
        if hitters == 0 {
            return Vec::new();
        }
        vec![Complaint::tagged(
            self.name(),
            format!(
                "Method '{}' in {} is a line hitter: {hitters} assertion(s) always pass and verify nothing",
                self.case.name(),
                self.unit.name()
            ),
        )
        .linked("Assert on the result of the code under test instead of a constant")]
    }
}
