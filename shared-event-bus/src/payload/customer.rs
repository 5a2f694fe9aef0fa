use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `customer:created` 载荷
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreated {
    pub customer_id: String,
    pub customer_name: String,
    /// 获客渠道（如 `ONLINE`、`REFERRAL`）
    pub channel: String,
    pub city: String,
    pub status: String,
}

/// `customer:updated` 载荷
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdated {
    pub customer_id: String,
    pub customer_name: String,
    /// 变更字段集合，形如 `{"city": "Bandung"}`
    #[builder(default = empty_changes())]
    #[serde(default = "empty_changes")]
    pub changes: Value,
}

fn empty_changes() -> Value {
    Value::Object(Default::default())
}
