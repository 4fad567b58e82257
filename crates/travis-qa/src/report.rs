//! Check findings

use serde::{Deserialize, Serialize};

/// Schema identifier for the JSON report
pub const QA_REPORT_SCHEMA_ID: &str = "travis-qa/report@1";

/// Outcome of a single check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The check does not apply to this plugin
    Skip,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// Check identifier, e.g. `php-headers`
    pub check: String,
    pub status: CheckStatus,
    pub message: String,
}

impl Finding {
    pub fn pass(check: &str, message: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Pass, message)
    }

    pub fn fail(check: &str, message: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Fail, message)
    }

    pub fn skip(check: &str, message: impl Into<String>) -> Self {
        Self::new(check, CheckStatus::Skip, message)
    }

    fn new(check: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// All findings for one plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReport {
    pub schema_id: String,
    pub plugin: String,
    pub findings: Vec<Finding>,
}

impl QaReport {
    pub fn new(plugin: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            schema_id: QA_REPORT_SCHEMA_ID.to_string(),
            plugin: plugin.into(),
            findings,
        }
    }

    /// No finding failed
    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status == CheckStatus::Fail)
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        for finding in &self.findings {
            out.push_str(&format!(
                "[{}] {}: {}\n",
                finding.status.as_str(),
                finding.check,
                finding.message
            ));
        }
        let failed = self.failures().count();
        if failed == 0 {
            out.push_str(&format!("{}: all checks passed\n", self.plugin));
        } else {
            out.push_str(&format!("{}: {} check(s) failed\n", self.plugin, failed));
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
