//! Recognition of assertion calls in test bodies.
//!
//! Two idioms are understood: the JUnit 5 `Assertions` utility methods and
//! the Hamcrest `assertThat(..)` matcher style. A call matches at most one.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Argument, ArgumentKind, Call, ResolvedType};

/// Public static methods of `org.junit.jupiter.api.Assertions` (JUnit 5.10).
pub const JUNIT_ASSERTIONS: &[&str] = &[
    "assertAll",
    "assertArrayEquals",
    "assertDoesNotThrow",
    "assertEquals",
    "assertFalse",
    "assertInstanceOf",
    "assertIterableEquals",
    "assertLinesMatch",
    "assertNotEquals",
    "assertNotNull",
    "assertNotSame",
    "assertNull",
    "assertSame",
    "assertThrows",
    "assertThrowsExactly",
    "assertTimeout",
    "assertTimeoutPreemptively",
    "assertTrue",
    "fail",
];

/// The only method name accepted for matcher-based assertions.
pub const MATCHER_ASSERTION: &str = "assertThat";

/// Explanation recorded when the message is an expression evaluated at runtime.
pub const RUNTIME_EXPLANATION: &str = "Unknown message. The message will be known only at runtime";

/// A call recognized as an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    explanation: Option<String>,
    line_hitter: bool,
}

impl Assertion {
    pub fn new(explanation: Option<String>, line_hitter: bool) -> Self {
        Self {
            explanation,
            line_hitter,
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// True when the assertion compares a hardcoded boolean with itself.
    pub fn is_line_hitter(&self) -> bool {
        self.line_hitter
    }
}

/// Classify the calls of one test case, in order, keeping only assertions.
pub fn classify(calls: &[Call]) -> Vec<Assertion> {
    calls.iter().filter_map(recognize).collect()
}

/// Classify a single call.
pub fn recognize(call: &Call) -> Option<Assertion> {
    if call.name == MATCHER_ASSERTION {
        Some(Assertion::new(
            matcher_explanation(call),
            is_line_hitter(&call.arguments),
        ))
    } else if JUNIT_ASSERTIONS.contains(&call.name.as_str()) && call.arguments.len() > 2 {
        Some(Assertion::new(
            call.arguments[2].string_value(),
            is_line_hitter(&call.arguments),
        ))
    } else {
        None
    }
}

fn matcher_explanation(call: &Call) -> Option<String> {
    let args = &call.arguments;
    match args.len() {
        n if n > 2 => message_of(&args[0]),
        2 => {
            let last = &args[1];
            if last.resolved.is_boolean() {
                message_of(&args[0])
            } else {
                if last.resolved == ResolvedType::Unresolved {
                    tracing::debug!(
                        call = %call.text,
                        argument = %last.text,
                        "argument type unresolved, assertion treated as unexplained"
                    );
                }
                None
            }
        }
        _ => None,
    }
}

fn message_of(arg: &Argument) -> Option<String> {
    match arg.kind {
        ArgumentKind::StringLiteral => arg.string_value(),
        ArgumentKind::Name | ArgumentKind::FieldAccess | ArgumentKind::MethodCall => {
            Some(RUNTIME_EXPLANATION.to_string())
        }
        ArgumentKind::BooleanLiteral | ArgumentKind::Other => None,
    }
}

fn equal_to_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z_$][\w$]*\.)*equalTo\((true|false)\)$")
            .expect("equalTo pattern is valid")
    })
}

fn is_line_hitter(args: &[Argument]) -> bool {
    let mut literal_true = false;
    let mut literal_false = false;
    let mut matcher_true = false;
    let mut matcher_false = false;
    for arg in args {
        let text: String = arg.text.chars().filter(|c| !c.is_whitespace()).collect();
        match text.as_str() {
            "true" => literal_true = true,
            "false" => literal_false = true,
            _ => {
                if let Some(caps) = equal_to_pattern().captures(&text) {
                    match &caps[1] {
                        "true" => matcher_true = true,
                        _ => matcher_false = true,
                    }
                }
            }
        }
    }
    (literal_true && matcher_true) || (literal_false && matcher_false)
}
