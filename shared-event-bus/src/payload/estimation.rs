use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `estimation:approved` 载荷
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct EstimationApproved {
    pub estimation_id: String,
    pub project_id: String,
    pub project_name: String,
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
    pub total_amount: f64,
}
