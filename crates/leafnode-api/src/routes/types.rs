//! Request and response types

use leafnode_core::JobSummary;
use serde::{Deserialize, Serialize};

// ==================== Auth ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
}

// ==================== Functions ====================

/// Body of a job call. Every field is optional; an empty body runs the
/// job over its backlog.
#[derive(Debug, Default, Deserialize)]
pub struct FunctionRequest {
    #[serde(default, alias = "filmIds", alias = "bookIds")]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Job call result
#[derive(Debug, Serialize)]
pub struct FunctionResponse {
    pub success: bool,
    pub message: String,
    pub processed: u32,
    pub successful: u32,
    pub failed: u32,
    pub skipped: u32,
    pub aborted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl FunctionResponse {
    pub fn from_summary(job: &str, summary: JobSummary) -> Self {
        Self {
            success: true,
            message: summary.message(job),
            processed: summary.processed,
            successful: summary.successful,
            failed: summary.failed,
            skipped: summary.skipped,
            aborted: summary.aborted,
            errors: summary.errors,
        }
    }
}

// ==================== Library ====================

/// Paging for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page_size")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_page_size() -> i64 {
    50
}

/// Run history filter
#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub job: Option<String>,
    #[serde(default = "default_page_size")]
    pub limit: i64,
}
