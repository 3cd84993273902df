use serde::Serialize;

use testcop_core::Complaint;

/// Check output with pass/fail metadata.
#[derive(Debug, Serialize)]
pub struct CheckOutput<'a> {
    pub count: usize,
    pub passed: bool,
    pub complaints: &'a [Complaint],
}

impl<'a> CheckOutput<'a> {
    pub fn new(complaints: &'a [Complaint]) -> Self {
        let count = crate::count(complaints);
        Self {
            count,
            passed: count == 0,
            complaints,
        }
    }
}

/// Format complaints as JSON.
pub fn format_report(complaints: &[Complaint], compact: bool) -> serde_json::Result<String> {
    let output = CheckOutput::new(complaints);
    if compact {
        serde_json::to_string(&output)
    } else {
        serde_json::to_string_pretty(&output)
    }
}
