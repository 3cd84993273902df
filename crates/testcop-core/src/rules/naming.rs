use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::types::{TestCase, TestUnit};

fn wrong_name(rule: &str, unit: &TestUnit, case: &TestCase, because: &str) -> Complaint {
    Complaint::tagged(
        rule,
        format!(
            "Test name '{}' doesn't follow naming rules, because {because}, test class: {}",
            case.name(),
            unit.name()
        ),
    )
}

/// Test names start with a lower-case letter.
pub struct RuleNotCamelCase<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleNotCamelCase<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleNotCamelCase"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RuleNotCamelCase<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if self
            .case
            .name()
            .chars()
            .next()
            .is_some_and(char::is_uppercase)
        {
            vec![wrong_name(
                self.name(),
                self.unit,
                self.case,
                "test name should start with a lower-case letter",
            )
            .linked("Rename the test so it starts with a verb in lower case, e.g. 'createsCheese'")]
        } else {
            Vec::new()
        }
    }
}

/// Test names have no runs of more than two identical characters.
pub struct RuleNotSpam<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleNotSpam<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleNotSpam"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

/// Length of the longest run of identical consecutive characters.
fn longest_run(name: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for c in name.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

impl Rule for RuleNotSpam<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if longest_run(self.case.name()) > 2 {
            vec![wrong_name(
                self.name(),
                self.unit,
                self.case,
                "test name contains spam (the same character repeated)",
            )
            .linked("Give the test a name that describes the behavior it checks")]
        } else {
            Vec::new()
        }
    }
}

/// Test names use neither `$` nor `_`.
pub struct RuleNotUsesSpecialCharacters<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleNotUsesSpecialCharacters<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleNotUsesSpecialCharacters"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RuleNotUsesSpecialCharacters<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if self.case.name().contains(['$', '_']) {
            vec![wrong_name(
                self.name(),
                self.unit,
                self.case,
                "test name uses special characters '$' or '_'",
            )
            .linked("Use camelCase instead of '_' or '$', e.g. 'createsCheese'")]
        } else {
            Vec::new()
        }
    }
}

/// Test names don't repeat the word "test".
pub struct RuleNotContainsTestWord<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RuleNotContainsTestWord<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleNotContainsTestWord"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RuleNotContainsTestWord<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if self.case.name().to_lowercase().contains("test") {
            vec![wrong_name(
                self.name(),
                self.unit,
                self.case,
                "test name doesn't have to contain the word 'test'",
            )
            .linked("Remove the word 'test' from the name, it says nothing about the behavior")]
        } else {
            Vec::new()
        }
    }
}
