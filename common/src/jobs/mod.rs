use serde::{Deserialize, Serialize};

/// Status of a background job (for example an on-demand cleanup sweep).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
}
