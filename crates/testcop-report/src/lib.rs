pub mod json;
pub mod text;

use testcop_core::Complaint;

/// Total number of leaf complaints.
pub fn count(complaints: &[Complaint]) -> usize {
    complaints.iter().map(Complaint::count).sum()
}
