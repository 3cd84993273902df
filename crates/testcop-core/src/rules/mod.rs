//! Rules and the suppression decorator that wraps them.
//!
//! A rule borrows the part of the unit model it checks and is evaluated on
//! demand. Composite rules build a fixed list of sub-rules, wrap each one in
//! [`RuleSuppressed`] and flatten the results.

mod assertions;
mod mockery;
mod naming;
mod production;
mod tense;
mod unit;

use std::collections::BTreeSet;

use crate::complaint::Complaint;
use crate::config::RuleParameters;
use crate::tagger::Tagger;
use crate::types::{TestCase, TestUnit};

pub use assertions::{RuleAssertionMessage, RuleLineHitter};
pub use mockery::RuleTestCaseContainsMockery;
pub use naming::{RuleNotCamelCase, RuleNotContainsTestWord, RuleNotSpam, RuleNotUsesSpecialCharacters};
pub use production::{normalize, ProductionIndex, RuleEveryTestHasProductionClass, TEST_SUFFIXES};
pub use tense::{is_present_tense, RulePresentSimple, RulePresentTense};
pub use unit::{RuleInheritanceInTests, RuleOnlyTestMethods, RuleProhibitStaticFields};

/// A single check producing complaints.
pub trait Rule {
    /// Names this rule answers to in suppressions. The first one is its
    /// identity; the rest are legacy aliases.
    fn names(&self) -> &'static [&'static str];

    fn complaints(&self) -> Vec<Complaint>;

    fn name(&self) -> &'static str {
        self.names().first().copied().unwrap_or_default()
    }
}

impl<R: Rule + ?Sized> Rule for Box<R> {
    fn names(&self) -> &'static [&'static str] {
        (**self).names()
    }

    fn complaints(&self) -> Vec<Complaint> {
        (**self).complaints()
    }
}

/// Skips the wrapped rule when any of its names is suppressed.
pub struct RuleSuppressed<R> {
    rule: R,
    suppressed: BTreeSet<String>,
}

impl<R: Rule> RuleSuppressed<R> {
    pub fn new(rule: R, suppressed: BTreeSet<String>) -> Self {
        Self { rule, suppressed }
    }

    pub fn is_suppressed(&self) -> bool {
        self.rule
            .names()
            .iter()
            .any(|name| self.suppressed.contains(*name))
    }
}

impl<R: Rule> Rule for RuleSuppressed<R> {
    fn names(&self) -> &'static [&'static str] {
        self.rule.names()
    }

    fn complaints(&self) -> Vec<Complaint> {
        if self.is_suppressed() {
            tracing::trace!(rule = self.rule.name(), "rule suppressed");
            Vec::new()
        } else {
            self.rule.complaints()
        }
    }
}

/// Every rule name and alias, for strict suppression matching.
pub fn known_rule_names() -> Vec<&'static str> {
    [
        RuleNotCamelCase::NAMES,
        RuleNotSpam::NAMES,
        RuleNotUsesSpecialCharacters::NAMES,
        RuleNotContainsTestWord::NAMES,
        RulePresentTense::NAMES,
        RulePresentSimple::NAMES,
        RuleAssertionMessage::NAMES,
        RuleLineHitter::NAMES,
        RuleTestCaseContainsMockery::NAMES,
        RuleInheritanceInTests::NAMES,
        RuleOnlyTestMethods::NAMES,
        RuleProhibitStaticFields::NAMES,
        RuleEveryTestHasProductionClass::NAMES,
    ]
    .concat()
}

fn run<'a>(rules: Vec<Box<dyn Rule + 'a>>, suppressed: &BTreeSet<String>) -> Vec<Complaint> {
    rules
        .into_iter()
        .flat_map(|rule| RuleSuppressed::new(rule, suppressed.clone()).complaints())
        .collect()
}

/// Naming rules for one test case.
pub struct RuleCorrectTestName<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
    suppressed: BTreeSet<String>,
    tagger: Option<&'a dyn Tagger>,
}

impl<'a> RuleCorrectTestName<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleCorrectTestName"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase, suppressed: BTreeSet<String>) -> Self {
        Self {
            unit,
            case,
            suppressed,
            tagger: None,
        }
    }

    /// Also run the model-assisted tense rule.
    pub fn with_tagger(mut self, tagger: &'a dyn Tagger) -> Self {
        self.tagger = Some(tagger);
        self
    }

    fn rules(&self) -> Vec<Box<dyn Rule + 'a>> {
        let (unit, case) = (self.unit, self.case);
        let mut rules: Vec<Box<dyn Rule + 'a>> = vec![
            Box::new(RuleNotCamelCase::new(unit, case)),
            Box::new(RuleNotSpam::new(unit, case)),
            Box::new(RuleNotUsesSpecialCharacters::new(unit, case)),
            Box::new(RuleNotContainsTestWord::new(unit, case)),
            Box::new(RulePresentTense::new(unit, case)),
        ];
        if let Some(tagger) = self.tagger {
            rules.push(Box::new(RulePresentSimple::new(unit, case, tagger)));
        }
        rules
    }
}

impl Rule for RuleCorrectTestName<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        run(self.rules(), &self.suppressed)
    }
}

/// Every case-level rule: naming, assertions and mocking.
pub struct RuleCorrectTestCase<'a> {
    names: RuleCorrectTestName<'a>,
    params: &'a RuleParameters,
}

impl<'a> RuleCorrectTestCase<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleCorrectTestCase"];

    pub fn new(
        unit: &'a TestUnit,
        case: &'a TestCase,
        params: &'a RuleParameters,
        suppressed: BTreeSet<String>,
    ) -> Self {
        Self {
            names: RuleCorrectTestName::new(unit, case, suppressed),
            params,
        }
    }

    pub fn with_tagger(mut self, tagger: &'a dyn Tagger) -> Self {
        self.names = self.names.with_tagger(tagger);
        self
    }
}

impl Rule for RuleCorrectTestCase<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let (unit, case) = (self.names.unit, self.names.case);
        let mut rules = self.names.rules();
        rules.push(Box::new(RuleAssertionMessage::new(unit, case)));
        rules.push(Box::new(RuleLineHitter::new(unit, case)));
        rules.push(Box::new(RuleTestCaseContainsMockery::new(
            unit,
            case,
            self.params.max_number_of_mocks(),
        )));
        run(rules, &self.names.suppressed)
    }
}

/// Class-level rules for one test unit, including its fields.
pub struct RuleCorrectTestUnit<'a> {
    unit: &'a TestUnit,
    suppressed: BTreeSet<String>,
    field_suppressed: Vec<BTreeSet<String>>,
}

impl<'a> RuleCorrectTestUnit<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleCorrectTestUnit"];

    /// `field_suppressed` holds the effective set of each field of `unit`, in order.
    pub fn new(
        unit: &'a TestUnit,
        suppressed: BTreeSet<String>,
        field_suppressed: Vec<BTreeSet<String>>,
    ) -> Self {
        Self {
            unit,
            suppressed,
            field_suppressed,
        }
    }
}

impl Rule for RuleCorrectTestUnit<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let unit = self.unit;
        let rules: Vec<Box<dyn Rule + '_>> = vec![
            Box::new(RuleInheritanceInTests::new(unit)),
            Box::new(RuleOnlyTestMethods::new(unit)),
        ];
        let mut complaints = run(rules, &self.suppressed);
        for (field, suppressed) in unit.fields().iter().zip(&self.field_suppressed) {
            complaints.extend(
                RuleSuppressed::new(RuleProhibitStaticFields::new(unit, field), suppressed.clone())
                    .complaints(),
            );
        }
        complaints
    }
}
