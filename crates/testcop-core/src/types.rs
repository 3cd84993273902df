use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::assertion::{self, Assertion};

/// Simple names of the annotations that mark a method as a test case.
pub const TEST_ANNOTATIONS: &[&str] = &[
    "Test",
    "ParameterizedTest",
    "RepeatedTest",
    "TestFactory",
    "TestTemplate",
];

/// Package holding the JUnit 5 extension points.
pub const JUNIT_EXTENSION_NAMESPACE: &str = "org.junit.jupiter.api.extension";

/// Last package segment that marks integration tests, e.g. `com.example.it`.
pub const INTEGRATION_PACKAGE: &str = "it";

/// Class name suffixes used by integration tests.
pub const INTEGRATION_SUFFIXES: &[&str] = &["ITCase", "IT"];

/// Returns true if a unit in `package` named `name` is an integration test.
pub fn is_integration(package: &str, name: &str) -> bool {
    package.rsplit('.').next() == Some(INTEGRATION_PACKAGE)
        || INTEGRATION_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Returns true if a fully qualified type name lives in the JUnit extension namespace.
pub fn is_junit_extension_type(qualified: &str) -> bool {
    qualified
        .strip_prefix(JUNIT_EXTENSION_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// A production class, named after its file (`Cheese.java`, `Cheese.class`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionUnit {
    name: String,
    path: PathBuf,
}

impl ProductionUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build a production unit from its file path, named after the file.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(name, path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Syntactic category of a call argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentKind {
    StringLiteral,
    BooleanLiteral,
    Name,
    FieldAccess,
    MethodCall,
    Other,
}

/// Statically resolved type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedType {
    Boolean,
    Named(String),
    /// Resolution failed; treated conservatively by every consumer.
    Unresolved,
}

impl ResolvedType {
    /// Map a declared Java type to a resolved type.
    pub fn from_declared(type_text: &str) -> Self {
        match type_text.trim() {
            "boolean" | "Boolean" | "java.lang.Boolean" => ResolvedType::Boolean,
            "" | "var" => ResolvedType::Unresolved,
            other => ResolvedType::Named(other.to_string()),
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ResolvedType::Boolean)
    }
}

/// One argument of a call expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub text: String,
    pub kind: ArgumentKind,
    pub resolved: ResolvedType,
}

impl Argument {
    pub fn new(text: impl Into<String>, kind: ArgumentKind, resolved: ResolvedType) -> Self {
        Self {
            text: text.into(),
            kind,
            resolved,
        }
    }

    /// The value of a string literal argument, without its quotes.
    pub fn string_value(&self) -> Option<String> {
        if self.kind != ArgumentKind::StringLiteral {
            return None;
        }
        let text = self.text.trim();
        let inner = text
            .strip_prefix("\"\"\"")
            .and_then(|t| t.strip_suffix("\"\"\""))
            .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))?;
        Some(inner.to_string())
    }
}

/// A method call found in the body of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Method name without the receiver, e.g. `assertEquals`.
    pub name: String,
    /// Full source text of the call expression.
    pub text: String,
    pub arguments: Vec<Argument>,
}

impl Call {
    pub fn new(name: impl Into<String>, text: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            arguments,
        }
    }
}

/// A field declared on a test class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    is_static: bool,
    suppressed: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, is_static: bool) -> Self {
        Self {
            name: name.into(),
            is_static,
            suppressed: Vec::new(),
        }
    }

    pub fn with_suppressed(mut self, suppressed: Vec<String>) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }
}

/// One test method.
///
/// Equality and hashing use the case name only, so two cases with the same
/// name compare equal even when they come from different test classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    name: String,
    unit: String,
    suppressed: Vec<String>,
    calls: Vec<Call>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            suppressed: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_suppressed(mut self, suppressed: Vec<String>) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn with_calls(mut self, calls: Vec<Call>) -> Self {
        self.calls = calls;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning test unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Markers declared on the method itself.
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Raw text of every call expression in the body.
    pub fn statements(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.text.as_str()).collect()
    }

    /// Calls recognized as assertions.
    pub fn assertions(&self) -> Vec<Assertion> {
        assertion::classify(&self.calls)
    }
}

impl PartialEq for TestCase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TestCase {}

impl Hash for TestCase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Class-level facts about a test unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Characteristics {
    junit_extension: bool,
    integration_test: bool,
    number_of_tests: usize,
    number_of_methods: usize,
    parent: Option<String>,
}

impl Characteristics {
    /// Test methods are always declared methods, so the method count is
    /// raised to the test count when a backend reports fewer.
    pub fn new(number_of_tests: usize, number_of_methods: usize) -> Self {
        Self {
            number_of_tests,
            number_of_methods: number_of_methods.max(number_of_tests),
            ..Self::default()
        }
    }

    pub fn with_junit_extension(mut self, junit_extension: bool) -> Self {
        self.junit_extension = junit_extension;
        self
    }

    pub fn with_integration_test(mut self, integration_test: bool) -> Self {
        self.integration_test = integration_test;
        self
    }

    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }

    pub fn is_junit_extension(&self) -> bool {
        self.junit_extension
    }

    pub fn is_integration_test(&self) -> bool {
        self.integration_test
    }

    pub fn number_of_tests(&self) -> usize {
        self.number_of_tests
    }

    pub fn number_of_methods(&self) -> usize {
        self.number_of_methods
    }

    /// Simple name of the superclass, absent when it is `Object`.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// A test class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestUnit {
    name: String,
    path: PathBuf,
    package: String,
    cases: Vec<TestCase>,
    fields: Vec<Field>,
    suppressed: Vec<String>,
    characteristics: Characteristics,
}

impl TestUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            package: String::new(),
            cases: Vec::new(),
            fields: Vec::new(),
            suppressed: Vec::new(),
            characteristics: Characteristics::default(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_cases(mut self, cases: Vec<TestCase>) -> Self {
        let name = self.name.clone();
        self.cases = cases
            .into_iter()
            .map(|mut case| {
                case.unit = name.clone();
                case
            })
            .collect();
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_suppressed(mut self, suppressed: Vec<String>) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn with_characteristics(mut self, characteristics: Characteristics) -> Self {
        self.characteristics = characteristics;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn all(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Markers declared on the class itself.
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }

    pub fn characteristics(&self) -> &Characteristics {
        &self.characteristics
    }
}

impl fmt::Display for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// Snapshot of every production and test unit found in one analysis run.
#[derive(Debug, Clone, Default)]
pub struct Project {
    production: Vec<ProductionUnit>,
    tests: Vec<TestUnit>,
}

impl Project {
    /// Units sharing a path with an earlier unit are dropped.
    pub fn new(production: Vec<ProductionUnit>, tests: Vec<TestUnit>) -> Self {
        let mut seen = HashSet::new();
        let production = production
            .into_iter()
            .filter(|u| seen.insert(u.path().to_path_buf()))
            .collect();
        let mut seen = HashSet::new();
        let tests = tests
            .into_iter()
            .filter(|u| seen.insert(u.path().to_path_buf()))
            .collect();
        Self { production, tests }
    }

    pub fn production_units(&self) -> &[ProductionUnit] {
        &self.production
    }

    pub fn test_units(&self) -> &[TestUnit] {
        &self.tests
    }
}
