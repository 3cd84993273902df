use serde::Serialize;
use std::fmt;

/// Location of the rule reference, relative to the repository root.
pub const RULES_DOC: &str = "docs/rules.md";

/// Documentation anchor for a rule.
pub fn rule_link(rule: &str) -> String {
    format!("{RULES_DOC}#{}", rule.to_lowercase())
}

/// One reported violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Complaint {
    /// Free text.
    Text { message: String },
    /// A message attributed to a rule.
    Tagged { rule: String, message: String },
    /// A complaint with a remediation hint and a documentation reference.
    Linked {
        complaint: Box<Complaint>,
        suggestion: String,
        link: String,
    },
    /// Several complaints reported as one, enumerated.
    Composite { complaints: Vec<Complaint> },
    /// All complaints of a single test unit.
    Class {
        unit: String,
        complaints: Vec<Complaint>,
    },
}

impl Complaint {
    pub fn text(message: impl Into<String>) -> Self {
        Complaint::Text {
            message: message.into(),
        }
    }

    pub fn tagged(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Complaint::Tagged {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Attach a suggestion and the documentation anchor of the rule this
    /// complaint is tagged with, if any.
    pub fn linked(self, suggestion: impl Into<String>) -> Self {
        let link = self
            .rule()
            .map(rule_link)
            .unwrap_or_else(|| RULES_DOC.to_string());
        Complaint::Linked {
            complaint: Box::new(self),
            suggestion: suggestion.into(),
            link,
        }
    }

    /// Identity of the rule behind this complaint.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Complaint::Tagged { rule, .. } => Some(rule),
            Complaint::Linked { complaint, .. } => complaint.rule(),
            _ => None,
        }
    }

    /// Number of leaf complaints.
    pub fn count(&self) -> usize {
        match self {
            Complaint::Composite { complaints } | Complaint::Class { complaints, .. } => {
                complaints.iter().map(Complaint::count).sum()
            }
            _ => 1,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Complaint::Text { message } => message.clone(),
            Complaint::Tagged { rule, message } => format!("[{rule}] {message}"),
            Complaint::Linked {
                complaint,
                suggestion,
                link,
            } => format!(
                "{}\n\t{suggestion}\n\tYou can read more about the rule here: {link}",
                complaint.message()
            ),
            Complaint::Composite { complaints } => enumerate(complaints),
            Complaint::Class { unit, complaints } => format!(
                "Test {unit} has {} complaint(s):\n{}",
                complaints.len(),
                enumerate(complaints)
            ),
        }
    }
}

impl fmt::Display for Complaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

fn enumerate(complaints: &[Complaint]) -> String {
    complaints
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let message = c.message().replace('\n', "\n\t");
            format!("\t{}) {message}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
