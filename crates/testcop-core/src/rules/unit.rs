use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::types::{Field, TestUnit};

/// Test classes don't extend other classes. JUnit extensions are exempt.
pub struct RuleInheritanceInTests<'a> {
    unit: &'a TestUnit,
}

impl<'a> RuleInheritanceInTests<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleInheritanceInTests"];

    pub fn new(unit: &'a TestUnit) -> Self {
        Self { unit }
    }
}

impl Rule for RuleInheritanceInTests<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let characteristics = self.unit.characteristics();
        match characteristics.parent() {
            Some(parent) if !characteristics.is_junit_extension() => {
                vec![Complaint::tagged(
                    self.name(),
                    format!(
                        "Test class {} extends {parent}; inherited setup and helpers hide what a test does",
                        self.unit.name()
                    ),
                )
                .linked("Replace the base class with composition or JUnit extensions")]
            }
            _ => Vec::new(),
        }
    }
}

/// Test classes contain test methods only.
pub struct RuleOnlyTestMethods<'a> {
    unit: &'a TestUnit,
}

impl<'a> RuleOnlyTestMethods<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleOnlyTestMethods"];

    pub fn new(unit: &'a TestUnit) -> Self {
        Self { unit }
    }
}

impl Rule for RuleOnlyTestMethods<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let characteristics = self.unit.characteristics();
        let tests = characteristics.number_of_tests();
        let methods = characteristics.number_of_methods();
        if characteristics.is_junit_extension() || methods <= tests {
            return Vec::new();
        }
        vec![Complaint::tagged(
            self.name(),
            format!(
                "Test class {} declares {methods} method(s), but only {tests} of them are tests",
                self.unit.name()
            ),
        )
        .linked("Move helper methods into a separate class, a fake, or a JUnit extension")]
    }
}

/// Test classes keep no state in static fields.
pub struct RuleProhibitStaticFields<'a> {
    unit: &'a TestUnit,
    field: &'a Field,
}

impl<'a> RuleProhibitStaticFields<'a> {
    pub const NAMES: &'static [&'static str] = &["RuleProhibitStaticFields"];

    pub fn new(unit: &'a TestUnit, field: &'a Field) -> Self {
        Self { unit, field }
    }
}

impl Rule for RuleProhibitStaticFields<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if !self.field.is_static() {
            return Vec::new();
        }
        vec![Complaint::tagged(
            self.name(),
            format!(
                "Test class {} declares static field '{}'; static state leaks between tests",
                self.unit.name(),
                self.field.name()
            ),
        )
        .linked("Turn the field into a local variable or an instance field")]
    }
}
