use serde::Serialize;

use crate::dispatcher::Invocation;

#[derive(Serialize, Debug)]
pub struct CallResponse {
    pub status: &'static str,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl CallResponse {
    pub fn from_invocation(inv: Invocation, report_exit_code: bool) -> Self {
        Self {
            status: "success",
            stdout: inv.stdout,
            stderr: inv.stderr,
            exit_code: if report_exit_code { inv.exit_code } else { None },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
}
