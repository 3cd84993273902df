use colored::Colorize;

use testcop_core::Complaint;

/// Format complaints for terminal output.
///
/// Expects the output of `Cop::check_grouped`: one class complaint per test
/// unit. Other complaints are listed as they come.
pub fn format_report(complaints: &[Complaint]) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "Testcop - Test Quality Report".bold()));
    out.push_str(&format!("{}\n", "=".repeat(40)));

    let total = crate::count(complaints);
    if total == 0 {
        out.push_str(&format!("\n{}\n\n", "No complaints found!".green().bold()));
        return out;
    }

    for complaint in complaints {
        match complaint {
            Complaint::Class { unit, complaints } => {
                out.push_str(&format!(
                    "\n{} {} ({} complaint(s))\n{}\n",
                    "Test".bold(),
                    unit.bold(),
                    complaints.len(),
                    "-".repeat(40),
                ));
                for (i, c) in complaints.iter().enumerate() {
                    out.push_str(&format_complaint(i + 1, c));
                }
            }
            other => out.push_str(&format_complaint(1, other)),
        }
    }

    out.push_str(&format!(
        "\n{}\n\n",
        format!(
            "{total} complaint(s) in {} test class(es)",
            complaints.len()
        )
        .red()
        .bold()
    ));
    out
}

fn format_complaint(index: usize, complaint: &Complaint) -> String {
    let rule = complaint
        .rule()
        .map(|r| format!("[{}] ", r.yellow().bold()))
        .unwrap_or_default();
    let mut out = format!("  {index}) {rule}{}\n", body(complaint));
    if let Complaint::Linked {
        suggestion, link, ..
    } = complaint
    {
        out.push_str(&format!("     {}: {suggestion}\n", "Suggestion".cyan()));
        out.push_str(&format!("     {}: {link}\n", "See".cyan()));
    }
    out
}

/// Message text without the rule tag or link lines.
fn body(complaint: &Complaint) -> String {
    match complaint {
        Complaint::Tagged { message, .. } | Complaint::Text { message } => message.clone(),
        Complaint::Linked { complaint, .. } => body(complaint),
        other => other.message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Complaint> {
        vec![Complaint::Class {
            unit: "com.example.CheeseTest".to_string(),
            complaints: vec![
                Complaint::tagged("RuleNotSpam", "Test name 'meltsss' is spam").linked("Rename it"),
                Complaint::text("Something else"),
            ],
        }]
    }

    #[test]
    fn test_report_lists_units_and_rules() {
        colored::control::set_override(false);
        let report = format_report(&sample());
        assert!(report.contains("Test com.example.CheeseTest (2 complaint(s))"), "{report}");
        assert!(report.contains("1) [RuleNotSpam] Test name 'meltsss' is spam"), "{report}");
        assert!(report.contains("Suggestion: Rename it"), "{report}");
        assert!(report.contains("docs/rules.md#rulenotspam"), "{report}");
        assert!(report.contains("2) Something else"), "{report}");
        assert!(report.contains("2 complaint(s) in 1 test class(es)"), "{report}");
    }

    #[test]
    fn test_clean_report() {
        colored::control::set_override(false);
        let report = format_report(&[]);
        assert!(report.contains("No complaints found!"));
    }
}
