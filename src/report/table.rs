use super::ReferenceIssue;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct IssueRow {
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Reference")]
    pub reference: String,
    #[tabled(rename = "Issue")]
    pub message: String,
}

pub struct IssueTable {
    rows: Vec<IssueRow>,
}

impl IssueTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_issue(&mut self, issue: &ReferenceIssue) {
        self.rows.push(IssueRow {
            path: issue.path.clone(),
            reference: format!("{}={}", issue.reference_name, issue.value),
            message: issue.message().to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for IssueTable {
    fn default() -> Self {
        Self::new()
    }
}
