use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised while building configuration. Always reported before any
/// rule runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parameter '{key}' expects {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("rule parameters must come in key/value pairs, got {len} values")]
    OddParameters { len: usize },

    #[error("invalid exclude pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("unknown backend '{0}', expected 'source' or 'bytecode'")]
    UnknownBackend(String),
}

/// Parameter key for the mock limit of `RuleTestCaseContainsMockery`.
pub const MAX_NUMBER_OF_MOCKS: &str = "maxNumberOfMocks";

/// Typed rule-set parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParameters {
    max_number_of_mocks: usize,
}

impl Default for RuleParameters {
    fn default() -> Self {
        Self {
            max_number_of_mocks: 2,
        }
    }
}

impl RuleParameters {
    pub fn max_number_of_mocks(&self) -> usize {
        self.max_number_of_mocks
    }

    pub fn with_max_number_of_mocks(mut self, max: usize) -> Self {
        self.max_number_of_mocks = max;
        self
    }

    /// Build parameters from a TOML table. Unknown keys are ignored.
    pub fn from_table(table: &toml::Table) -> Result<Self, ConfigError> {
        let mut params = Self::default();
        for (key, value) in table {
            match key.as_str() {
                MAX_NUMBER_OF_MOCKS => {
                    let max = value
                        .as_integer()
                        .and_then(|v| usize::try_from(v).ok())
                        .ok_or_else(|| ConfigError::TypeMismatch {
                            key: key.clone(),
                            expected: "a non-negative integer",
                            actual: describe(value),
                        })?;
                    params.max_number_of_mocks = max;
                }
                _ => tracing::debug!(parameter = %key, "ignoring unknown rule parameter"),
            }
        }
        Ok(params)
    }

    /// Build parameters from a flat `key, value, key, value` list, as passed
    /// on a command line.
    pub fn from_pairs<S: AsRef<str>>(values: &[S]) -> Result<Self, ConfigError> {
        if values.len() % 2 != 0 {
            return Err(ConfigError::OddParameters { len: values.len() });
        }
        let mut params = Self::default();
        for pair in values.chunks(2) {
            let (key, value) = (pair[0].as_ref(), pair[1].as_ref());
            match key {
                MAX_NUMBER_OF_MOCKS => {
                    params.max_number_of_mocks =
                        value
                            .trim()
                            .parse()
                            .map_err(|_| ConfigError::TypeMismatch {
                                key: key.to_string(),
                                expected: "a non-negative integer",
                                actual: format!("string \"{value}\""),
                            })?;
                }
                _ => tracing::debug!(parameter = %key, "ignoring unknown rule parameter"),
            }
        }
        Ok(params)
    }
}

fn describe(value: &toml::Value) -> String {
    format!("{} {value}", value.type_str())
}

/// Which extraction backend builds the unit model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Java sources parsed with tree-sitter.
    #[default]
    Source,
    /// Compiled `.class` files.
    Bytecode,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Source => write!(f, "source"),
            Backend::Bytecode => write!(f, "bytecode"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source" | "src" => Ok(Backend::Source),
            "bytecode" | "class" => Ok(Backend::Bytecode),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Top-level configuration from `.testcop.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub suppressions: SuppressionsConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Production sources (or classes) relative to the project root.
    #[serde(default = "default_main")]
    pub main: PathBuf,
    /// Test sources (or classes) relative to the project root.
    #[serde(default = "default_test")]
    pub test: PathBuf,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_main() -> PathBuf {
    PathBuf::from("src/main/java")
}

fn default_test() -> PathBuf {
    PathBuf::from("src/test/java")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            main: default_main(),
            test: default_test(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Default roots for compiled classes in a Maven layout.
    pub fn bytecode_roots() -> (PathBuf, PathBuf) {
        (
            PathBuf::from("target/classes"),
            PathBuf::from("target/test-classes"),
        )
    }
}

/// Project-wide suppressions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuppressionsConfig {
    /// Rule names silenced everywhere.
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Drop marker values that are not known rule names.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Enables rules that need an external part-of-speech tagger.
    #[serde(default)]
    pub experimental: bool,
    /// `word TAG` lexicon backing the tagger, relative to the project root.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
    #[serde(default)]
    pub parameters: toml::Table,
}

impl RulesConfig {
    pub fn parameters(&self) -> Result<RuleParameters, ConfigError> {
        RuleParameters::from_table(&self.parameters)
    }
}

impl Config {
    /// Load configuration from a `.testcop.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `testcop init` to create a valid config file",
                path.display()
            )
        })?;
        config
            .rules
            .parameters()
            .with_context(|| format!("invalid rule parameters in '{}'", path.display()))?;
        Ok(config)
    }

    /// Load from `.testcop.toml` in the given directory or any ancestor.
    /// Defaults apply only when no file is found; a file that fails to load is an error.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        for current in start.ancestors() {
            let config_path = current.join(".testcop.toml");
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "using discovered config");
                return Self::load(&config_path);
            }
        }
        Ok(Self::default())
    }

    /// Generate default TOML content for `testcop init`.
    pub fn default_toml() -> String {
        r#"# testcop - Test Suite Linter Configuration

[project]
# "source" parses Java files, "bytecode" reads compiled classes
backend = "source"
main = "src/main/java"
test = "src/test/java"
# Test files to skip, as glob patterns
exclude_patterns = []

[suppressions]
# Rules silenced for the whole project, e.g. ["RuleNotContainsTestWord"]
exclusions = []
# Ignore @SuppressWarnings values that are not testcop rule names
strict = false

[rules]
# Rules that need a part-of-speech tagger
experimental = false
# lexicon = "testcop-lexicon.txt"

[rules.parameters]
maxNumberOfMocks = 2
"#
        .to_string()
    }
}
