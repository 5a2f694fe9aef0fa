use bon::Builder;
use serde::{Deserialize, Serialize};

/// `project:status:changed` 载荷
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusChanged {
    pub project_id: String,
    pub project_name: String,
    pub customer_id: String,
    pub previous_status: String,
    pub new_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<f64>,
}
