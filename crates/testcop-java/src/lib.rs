use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

use testcop_core::extractor::{
    collect_units, read_file, source_files, Batch, ExtractionError, Extractor,
};
use testcop_core::types::*;

mod resolve;

use resolve::{argument_kind, Scope};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const SUPPRESS_WARNINGS: &str = "SuppressWarnings";

/// Java source extraction backend using tree-sitter.
pub struct SourceExtractor {
    main: PathBuf,
    test: PathBuf,
    language: Language,
    call_query: Query,
}

impl SourceExtractor {
    pub fn new(main: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Result<Self> {
        let language: Language = tree_sitter_java::LANGUAGE.into();

        let call_query = Query::new(
            &language,
            r#"
            (method_invocation
              name: (identifier) @name
              arguments: (argument_list) @args) @call
            "#,
        )
        .context("failed to compile call query")?;

        Ok(Self {
            main: main.into(),
            test: test.into(),
            language,
            call_query,
        })
    }

    /// Extract the test unit declared in one source file.
    pub fn parse_unit(&self, path: &Path, content: &str) -> Result<TestUnit, ExtractionError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ExtractionError::parse(path, e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ExtractionError::parse(path, "parser produced no syntax tree"))?;
        let root = tree.root_node();

        if let Some(error) = first_error(root) {
            let at = error.start_position();
            return Err(ExtractionError::parse(
                path,
                format!("syntax error at line {}, column {}", at.row + 1, at.column + 1),
            ));
        }

        let package = package_of(root, content);
        let imports = Imports::of(root, content);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some(declaration) = named_children(root)
            .into_iter()
            .find(|n| TYPE_DECLARATIONS.contains(&n.kind()))
        else {
            tracing::debug!(path = %path.display(), "no type declaration, empty unit");
            let characteristics =
                Characteristics::new(0, 0).with_integration_test(is_integration(&package, &stem));
            return Ok(TestUnit::new(stem, path)
                .with_package(package)
                .with_characteristics(characteristics));
        };

        let name = declaration
            .child_by_field_name("name")
            .map(|n| node_text(n, content))
            .unwrap_or(stem);

        let superclass = declaration
            .child_by_field_name("superclass")
            .and_then(|s| named_children(s).into_iter().next())
            .map(|t| type_name(t, content));
        let parent = superclass
            .as_deref()
            .map(simple_name)
            .filter(|p| *p != "Object")
            .map(str::to_string);

        let mut supertypes: Vec<String> = superclass.into_iter().collect();
        for clause in named_children(declaration)
            .into_iter()
            .filter(|n| matches!(n.kind(), "super_interfaces" | "extends_interfaces"))
        {
            for list in named_children(clause) {
                supertypes.extend(named_children(list).into_iter().map(|t| type_name(t, content)));
            }
        }
        let junit_extension = supertypes
            .iter()
            .any(|t| imports.is_junit_extension(t, &package));

        let members = declaration
            .child_by_field_name("body")
            .map(members)
            .unwrap_or_default();
        let scope = Scope::of_fields(&members, content);

        let mut methods = 0;
        let mut cases = Vec::new();
        let mut fields = Vec::new();
        for member in &members {
            match member.kind() {
                "method_declaration" => {
                    methods += 1;
                    if is_test_method(*member, content) {
                        cases.push(self.test_case(*member, content, &scope));
                    }
                }
                "field_declaration" => {
                    let is_static = has_modifier(*member, "static");
                    let suppressed = suppressed(*member, content);
                    for declarator in declarators(*member) {
                        if let Some(field_name) = declarator.child_by_field_name("name") {
                            fields.push(
                                Field::new(node_text(field_name, content), is_static)
                                    .with_suppressed(suppressed.clone()),
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        let characteristics = Characteristics::new(cases.len(), methods)
            .with_junit_extension(junit_extension)
            .with_integration_test(is_integration(&package, &name))
            .with_parent(parent);

        Ok(TestUnit::new(name, path)
            .with_package(package)
            .with_suppressed(suppressed(declaration, content))
            .with_fields(fields)
            .with_cases(cases)
            .with_characteristics(characteristics))
    }

    fn test_case(&self, method: Node<'_>, content: &str, fields: &Scope) -> TestCase {
        let name = method
            .child_by_field_name("name")
            .map(|n| node_text(n, content))
            .unwrap_or_default();
        let calls = match method.child_by_field_name("body") {
            Some(body) => self.calls(body, content, &fields.for_method(method, content)),
            None => Vec::new(),
        };
        TestCase::new(name)
            .with_suppressed(suppressed(method, content))
            .with_calls(calls)
    }

    /// Every call expression under `body`, in source order.
    fn calls(&self, body: Node<'_>, content: &str, scope: &Scope) -> Vec<Call> {
        let mut cursor = QueryCursor::new();
        let call_idx = self.call_query.capture_index_for_name("call");
        let name_idx = self.call_query.capture_index_for_name("name");
        let args_idx = self.call_query.capture_index_for_name("args");

        let mut calls = Vec::new();
        let mut matches = cursor.matches(&self.call_query, body, content.as_bytes());
        while let Some(m) = matches.next() {
            let mut text = String::new();
            let mut name = String::new();
            let mut arguments = Vec::new();
            for capture in m.captures {
                let idx = Some(capture.index);
                if idx == call_idx {
                    text = node_text(capture.node, content);
                } else if idx == name_idx {
                    name = node_text(capture.node, content);
                } else if idx == args_idx {
                    arguments = named_children(capture.node)
                        .into_iter()
                        .filter(|a| !a.kind().ends_with("comment"))
                        .map(|a| {
                            Argument::new(node_text(a, content), argument_kind(a), scope.resolve(a, content))
                        })
                        .collect();
                }
            }
            if !name.is_empty() {
                calls.push(Call::new(name, text, arguments));
            }
        }
        calls
    }
}

impl Extractor for SourceExtractor {
    fn backend(&self) -> &'static str {
        "source"
    }

    fn production_units(&self) -> Result<Vec<ProductionUnit>, ExtractionError> {
        Ok(source_files(&self.main, &["java"])
            .iter()
            .map(|p| ProductionUnit::from_path(p))
            .collect())
    }

    fn test_units(&self) -> Batch<TestUnit> {
        let files = source_files(&self.test, &["java"]);
        let results: Vec<_> = files
            .par_iter()
            .map(|path| {
                let bytes = read_file(path)?;
                let content = String::from_utf8(bytes)
                    .map_err(|_| ExtractionError::parse(path, "file is not valid UTF-8"))?;
                self.parse_unit(path, &content)
            })
            .collect();
        collect_units(results)
    }
}

/// Type imports of a compilation unit. Static imports are ignored.
#[derive(Debug, Default)]
struct Imports {
    explicit: Vec<String>,
    wildcards: Vec<String>,
}

impl Imports {
    fn of(root: Node<'_>, content: &str) -> Self {
        let mut imports = Self::default();
        for import in named_children(root)
            .into_iter()
            .filter(|n| n.kind() == "import_declaration")
        {
            let text: String = node_text(import, content)
                .trim_start_matches("import")
                .trim_end_matches(';')
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if text.starts_with("static ") {
                continue;
            }
            let path: String = text.split_whitespace().collect();
            match path.strip_suffix(".*") {
                Some(package) => imports.wildcards.push(package.to_string()),
                None => imports.explicit.push(path),
            }
        }
        imports
    }

    /// Whether the type named `name` in `package` resolves into the JUnit
    /// extension namespace.
    fn is_junit_extension(&self, name: &str, package: &str) -> bool {
        if name.contains('.') {
            return is_junit_extension_type(name);
        }
        if let Some(qualified) = self
            .explicit
            .iter()
            .find(|i| i.rsplit('.').next() == Some(name))
        {
            return is_junit_extension_type(qualified);
        }
        package == JUNIT_EXTENSION_NAMESPACE
            || self.wildcards.iter().any(|w| w == JUNIT_EXTENSION_NAMESPACE)
    }
}

fn package_of(root: Node<'_>, content: &str) -> String {
    named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_declaration")
        .and_then(|p| {
            named_children(p)
                .into_iter()
                .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        })
        .map(|n| node_text(n, content))
        .unwrap_or_default()
}

/// Members of a type body, including those after the constants of an enum.
fn members(body: Node<'_>) -> Vec<Node<'_>> {
    let mut members = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(named_children(child));
        } else {
            members.push(child);
        }
    }
    members
}

fn modifiers(node: Node<'_>) -> Option<Node<'_>> {
    named_children(node)
        .into_iter()
        .find(|n| n.kind() == "modifiers")
}

fn has_modifier(node: Node<'_>, keyword: &str) -> bool {
    modifiers(node).is_some_and(|m| {
        let mut cursor = m.walk();
        let found = m.children(&mut cursor).any(|c| c.kind() == keyword);
        found
    })
}

/// Annotations on a declaration, paired with their simple names.
fn annotations<'t>(node: Node<'t>, content: &str) -> Vec<(String, Node<'t>)> {
    modifiers(node)
        .map(named_children)
        .unwrap_or_default()
        .into_iter()
        .filter(|n| matches!(n.kind(), "marker_annotation" | "annotation"))
        .filter_map(|a| {
            let name = a.child_by_field_name("name")?;
            Some((simple_name(&node_text(name, content)).to_string(), a))
        })
        .collect()
}

fn is_test_method(method: Node<'_>, content: &str) -> bool {
    annotations(method, content)
        .iter()
        .any(|(name, _)| TEST_ANNOTATIONS.contains(&name.as_str()))
}

/// Values of `@SuppressWarnings` on a declaration.
fn suppressed(node: Node<'_>, content: &str) -> Vec<String> {
    let mut values = Vec::new();
    for (_, annotation) in annotations(node, content)
        .into_iter()
        .filter(|(name, _)| name == SUPPRESS_WARNINGS)
    {
        if let Some(arguments) = annotation.child_by_field_name("arguments") {
            string_values(arguments, content, &mut values);
        }
    }
    values
}

fn string_values(node: Node<'_>, content: &str, values: &mut Vec<String>) {
    for child in named_children(node) {
        if matches!(child.kind(), "string_literal" | "text_block") {
            values.push(unquote(&node_text(child, content)));
        } else {
            string_values(child, content, values);
        }
    }
}

fn unquote(literal: &str) -> String {
    let literal = literal.trim();
    literal
        .strip_prefix("\"\"\"")
        .and_then(|l| l.strip_suffix("\"\"\""))
        .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
        .unwrap_or(literal)
        .trim()
        .to_string()
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

pub(crate) fn declarators(declaration: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = declaration.walk();
    let declarators = declaration
        .children_by_field_name("declarator", &mut cursor)
        .collect();
    declarators
}

pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

/// Name of a type without its type arguments, e.g. `Base` for `Base<T>`.
pub(crate) fn type_name(node: Node<'_>, content: &str) -> String {
    if node.kind() == "generic_type" {
        if let Some(base) = named_children(node).into_iter().next() {
            return type_name(base, content);
        }
    }
    node_text(node, content).split_whitespace().collect()
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Extract text from a tree-sitter node.
pub(crate) fn node_text(node: Node<'_>, source: &str) -> String {
    source[node.byte_range()].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SourceExtractor {
        SourceExtractor::new("src/main/java", "src/test/java").unwrap()
    }

    fn parse(content: &str) -> TestUnit {
        let path = PathBuf::from("src/test/java/com/example/CheeseTest.java");
        extractor().parse_unit(&path, content).unwrap()
    }

    #[test]
    fn test_parse_test_class() {
        let unit = parse(
            r#"
package com.example;

import org.junit.jupiter.api.Test;

class CheeseTest {
    @Test
    void melts() {}

    @org.junit.jupiter.api.Test
    void ages() {}

    @ParameterizedTest
    void slices(int n) {}

    void helper() {}

    CheeseTest() {}
}
"#,
        );
        assert_eq!(unit.name(), "CheeseTest");
        assert_eq!(unit.package(), "com.example");
        let names: Vec<_> = unit.all().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["melts", "ages", "slices"]);
        assert_eq!(unit.characteristics().number_of_tests(), 3);
        assert_eq!(unit.characteristics().number_of_methods(), 4);
        assert_eq!(unit.characteristics().parent(), None);
        assert!(!unit.characteristics().is_junit_extension());
        assert!(unit.all().iter().all(|c| c.unit() == "CheeseTest"));
    }

    #[test]
    fn test_parent_is_simple_name() {
        let unit = parse("class CheeseTest extends com.example.Base<String> { }");
        assert_eq!(unit.characteristics().parent(), Some("Base"));
        let unit = parse("class CheeseTest extends Object { }");
        assert_eq!(unit.characteristics().parent(), None);
    }

    #[test]
    fn test_junit_extension_through_explicit_import() {
        let unit = parse(
            r#"
import org.junit.jupiter.api.extension.BeforeEachCallback;
class CheeseTest implements BeforeEachCallback { }
"#,
        );
        assert!(unit.characteristics().is_junit_extension());
    }

    #[test]
    fn test_junit_extension_through_wildcard_and_qualified_name() {
        let unit = parse(
            r#"
import org.junit.jupiter.api.extension.*;
class CheeseTest implements ParameterResolver { }
"#,
        );
        assert!(unit.characteristics().is_junit_extension());

        let unit = parse(
            "class CheeseTest implements org.junit.jupiter.api.extension.AfterAllCallback { }",
        );
        assert!(unit.characteristics().is_junit_extension());

        let unit = parse(
            r#"
import java.io.Serializable;
class CheeseTest implements Serializable { }
"#,
        );
        assert!(!unit.characteristics().is_junit_extension());
    }

    #[test]
    fn test_integration_detection() {
        let path = PathBuf::from("CheeseIT.java");
        let unit = extractor()
            .parse_unit(&path, "class CheeseIT { }")
            .unwrap();
        assert!(unit.characteristics().is_integration_test());

        let unit = parse("package com.example.it; class CheeseTest { }");
        assert!(unit.characteristics().is_integration_test());

        let unit = parse("package com.example.itx; class CheeseTest { }");
        assert!(!unit.characteristics().is_integration_test());
    }

    #[test]
    fn test_fields_and_static_modifier() {
        let unit = parse(
            r#"
class CheeseTest {
    private static final String A = "a", B = "b";
    @SuppressWarnings("TESTCOP.RuleProhibitStaticFields")
    static int cache;
    private int count;
}
"#,
        );
        let fields: Vec<_> = unit
            .fields()
            .iter()
            .map(|f| (f.name(), f.is_static()))
            .collect();
        assert_eq!(
            fields,
            vec![("A", true), ("B", true), ("cache", true), ("count", false)]
        );
        assert_eq!(unit.fields()[2].suppressed(), ["TESTCOP.RuleProhibitStaticFields"]);
    }

    #[test]
    fn test_suppression_forms() {
        let unit = parse(
            r#"
@SuppressWarnings({"TESTCOP.RuleNotCamelCase", "unchecked"})
class CheeseTest {
    @Test
    @SuppressWarnings(value = "TESTCOP.RuleNotSpam")
    void meltsss() {}

    @Test
    @java.lang.SuppressWarnings(value = {"TESTCOP.RulePresentTense"})
    void melt() {}
}
"#,
        );
        assert_eq!(unit.suppressed(), ["TESTCOP.RuleNotCamelCase", "unchecked"]);
        assert_eq!(unit.all()[0].suppressed(), ["TESTCOP.RuleNotSpam"]);
        assert_eq!(unit.all()[1].suppressed(), ["TESTCOP.RulePresentTense"]);
    }

    #[test]
    fn test_calls_with_resolved_arguments() {
        let unit = parse(
            r#"
class CheeseTest {
    @Test
    void melts() {
        boolean melted = true;
        assertThat("it melts", melted);
        assertEquals(1, 1, "counts match");
    }
}
"#,
        );
        let case = &unit.all()[0];
        let names: Vec<_> = case.calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["assertThat", "assertEquals"]);
        let matcher = &case.calls()[0];
        assert_eq!(matcher.arguments[0].kind, ArgumentKind::StringLiteral);
        assert_eq!(matcher.arguments[1].resolved, ResolvedType::Boolean);
        assert_eq!(case.statements()[1], "assertEquals(1, 1, \"counts match\")");

        let assertions = case.assertions();
        assert_eq!(assertions.len(), 2);
        assert!(assertions.iter().all(|a| a.explanation().is_some()));
    }

    #[test]
    fn test_comments_are_not_arguments() {
        let unit = parse(
            r#"
class CheeseTest {
    @Test
    void melts() {
        assertEquals(1, /* expected */ 1, "counts match");
    }
}
"#,
        );
        assert_eq!(unit.all()[0].calls()[0].arguments.len(), 3);
    }

    #[test]
    fn test_file_without_type_is_named_after_file() {
        let path = PathBuf::from("src/test/java/com/example/package-info.java");
        let unit = extractor()
            .parse_unit(&path, "package com.example;")
            .unwrap();
        assert_eq!(unit.name(), "package-info");
        assert!(unit.all().is_empty());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let path = PathBuf::from("Broken.java");
        let err = extractor()
            .parse_unit(&path, "class Broken { void m( }")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_extractor_walks_roots() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("src/main/java/com/example");
        let test = dir.path().join("src/test/java/com/example");
        std::fs::create_dir_all(&main).unwrap();
        std::fs::create_dir_all(&test).unwrap();
        std::fs::write(main.join("Cheese.java"), "package com.example; class Cheese {}").unwrap();
        std::fs::write(
            test.join("CheeseTest.java"),
            "package com.example; class CheeseTest { @Test void melts() {} }",
        )
        .unwrap();

        let extractor = SourceExtractor::new(
            dir.path().join("src/main/java"),
            dir.path().join("src/test/java"),
        )
        .unwrap();
        let extraction = extractor.project().unwrap();
        assert!(extraction.failures.is_empty());
        let project = extraction.project;
        assert_eq!(project.production_units().len(), 1);
        assert_eq!(project.production_units()[0].name(), "Cheese.java");
        assert_eq!(project.test_units().len(), 1);
        assert_eq!(project.test_units()[0].all().len(), 1);
    }

    #[test]
    fn test_broken_units_do_not_hide_healthy_ones() {
        let dir = tempfile::tempdir().unwrap();
        let test = dir.path().join("test");
        std::fs::create_dir_all(&test).unwrap();
        std::fs::write(test.join("ATest.java"), "class ATest {").unwrap();
        std::fs::write(test.join("BTest.java"), "class BTest { int }").unwrap();
        std::fs::write(
            test.join("CTest.java"),
            "class CTest { @Test void Bad_Name() {} }",
        )
        .unwrap();

        let extractor = SourceExtractor::new(dir.path().join("main"), &test).unwrap();
        let batch = extractor.test_units();
        assert_eq!(batch.failures.len(), 2);
        assert!(batch.failures[0].path().ends_with("ATest.java"));
        assert!(batch.failures[1].path().ends_with("BTest.java"));
        assert_eq!(batch.units.len(), 1);
        assert_eq!(batch.units[0].name(), "CTest");
        assert_eq!(batch.units[0].all()[0].name(), "Bad_Name");
    }
}
