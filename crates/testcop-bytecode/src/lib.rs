pub mod classfile;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use testcop_core::extractor::{
    collect_units, read_file, source_files, Batch, ExtractionError, Extractor,
};
use testcop_core::types::*;

use classfile::{simple_name, ClassFile};

pub use classfile::ClassFileError;

const OBJECT: &str = "java/lang/Object";

/// Compiled class-file extraction backend.
///
/// Class files carry no method bodies worth reading and no source-retention
/// annotations, so units produced here have no calls and no suppressions.
pub struct ClassFileExtractor {
    main: PathBuf,
    test: PathBuf,
}

impl ClassFileExtractor {
    pub fn new(main: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        Self {
            main: main.into(),
            test: test.into(),
        }
    }

    /// Build the test unit described by one class file.
    pub fn parse_unit(&self, path: &Path, bytes: &[u8]) -> Result<TestUnit, ExtractionError> {
        let class =
            classfile::parse(bytes).map_err(|e| ExtractionError::parse(path, e.to_string()))?;
        Ok(unit_of(path, &class))
    }
}

fn unit_of(path: &Path, class: &ClassFile) -> TestUnit {
    let (package, name) = match class.this_class.rsplit_once('/') {
        Some((package, name)) => (package.replace('/', "."), name.to_string()),
        None => (String::new(), class.this_class.clone()),
    };

    let parent = class
        .super_class
        .as_deref()
        .filter(|s| *s != OBJECT)
        .map(|s| simple_name(s).to_string());

    let junit_extension = class
        .super_class
        .iter()
        .chain(&class.interfaces)
        .any(|t| is_junit_extension_type(&t.replace(['/', '$'], ".")));

    let declared: Vec<_> = class
        .methods
        .iter()
        .filter(|m| !matches!(m.name.as_str(), "<init>" | "<clinit>"))
        .filter(|m| !m.is_synthetic() && !m.is_bridge())
        .collect();
    let cases: Vec<_> = declared
        .iter()
        .filter(|m| m.annotation_names().any(|a| TEST_ANNOTATIONS.contains(&a)))
        .map(|m| TestCase::new(&m.name))
        .collect();

    let fields = class
        .fields
        .iter()
        .filter(|f| !f.is_synthetic())
        .map(|f| Field::new(&f.name, f.is_static()))
        .collect();

    let characteristics = Characteristics::new(cases.len(), declared.len())
        .with_junit_extension(junit_extension)
        .with_integration_test(is_integration(&package, &name))
        .with_parent(parent);

    TestUnit::new(name, path)
        .with_package(package)
        .with_fields(fields)
        .with_cases(cases)
        .with_characteristics(characteristics)
}

/// Nested and anonymous classes compile to `Outer$Inner.class`.
fn is_inner_class(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().contains('$'))
}

impl Extractor for ClassFileExtractor {
    fn backend(&self) -> &'static str {
        "bytecode"
    }

    fn production_units(&self) -> Result<Vec<ProductionUnit>, ExtractionError> {
        Ok(source_files(&self.main, &["class"])
            .iter()
            .map(|p| ProductionUnit::from_path(p))
            .collect())
    }

    fn test_units(&self) -> Batch<TestUnit> {
        let files: Vec<_> = source_files(&self.test, &["class"])
            .into_iter()
            .filter(|p| {
                let inner = is_inner_class(p);
                if inner {
                    tracing::debug!(path = %p.display(), "skipping inner class");
                }
                !inner
            })
            .collect();
        let results: Vec<_> = files
            .par_iter()
            .map(|path| self.parse_unit(path, &read_file(path)?))
            .collect();
        collect_units(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classfile::{Member, ACC_BRIDGE, ACC_STATIC, ACC_SYNTHETIC};

    fn method(name: &str, access: u16, annotations: &[&str]) -> Member {
        Member {
            access,
            name: name.into(),
            descriptor: "()V".into(),
            annotations: annotations.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn class(super_class: Option<&str>, interfaces: &[&str], methods: Vec<Member>) -> ClassFile {
        ClassFile {
            access: 0x0021,
            this_class: "com/example/CheeseTest".into(),
            super_class: super_class.map(str::to_string),
            interfaces: interfaces.iter().map(|i| i.to_string()).collect(),
            fields: vec![
                Member {
                    access: ACC_STATIC,
                    name: "CACHE".into(),
                    descriptor: "I".into(),
                    annotations: vec![],
                },
                Member {
                    access: ACC_STATIC | ACC_SYNTHETIC,
                    name: "$assertionsDisabled".into(),
                    descriptor: "Z".into(),
                    annotations: vec![],
                },
            ],
            methods,
        }
    }

    #[test]
    fn test_unit_from_class() {
        let methods = vec![
            method("<init>", 0, &[]),
            method("<clinit>", ACC_STATIC, &[]),
            method("melts", 0, &["Lorg/junit/jupiter/api/Test;"]),
            method("slices", 0, &["Lorg/junit/jupiter/params/ParameterizedTest;"]),
            method("helper", 0, &[]),
            method("lambda$melts$0", ACC_SYNTHETIC, &[]),
            method("compareTo", ACC_BRIDGE | ACC_SYNTHETIC, &[]),
        ];
        let unit = unit_of(
            Path::new("CheeseTest.class"),
            &class(Some("java/lang/Object"), &[], methods),
        );
        assert_eq!(unit.name(), "CheeseTest");
        assert_eq!(unit.package(), "com.example");
        assert_eq!(unit.characteristics().number_of_tests(), 2);
        assert_eq!(unit.characteristics().number_of_methods(), 3);
        assert_eq!(unit.characteristics().parent(), None);
        assert_eq!(unit.fields().len(), 1);
        assert!(unit.fields()[0].is_static());
        assert!(unit.all().iter().all(|c| c.calls().is_empty()));
        assert!(unit.suppressed().is_empty());
    }

    #[test]
    fn test_parent_and_extension() {
        let unit = unit_of(
            Path::new("CheeseTest.class"),
            &class(
                Some("com/example/Base"),
                &["org/junit/jupiter/api/extension/BeforeEachCallback"],
                vec![],
            ),
        );
        assert_eq!(unit.characteristics().parent(), Some("Base"));
        assert!(unit.characteristics().is_junit_extension());

        let unit = unit_of(
            Path::new("CheeseTest.class"),
            &class(None, &["java/io/Serializable"], vec![]),
        );
        assert!(!unit.characteristics().is_junit_extension());
    }

    #[test]
    fn test_inner_classes_are_detected() {
        assert!(is_inner_class(Path::new("com/example/CheeseTest$Nested.class")));
        assert!(!is_inner_class(Path::new("com/example/CheeseTest.class")));
    }

    #[test]
    fn test_malformed_class_is_parse_error() {
        let extractor = ClassFileExtractor::new("main", "test");
        let path = Path::new("Broken.class");
        let err = extractor.parse_unit(path, b"not a class").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { .. }));
        assert!(err.to_string().contains("Broken.class"));
    }
}
