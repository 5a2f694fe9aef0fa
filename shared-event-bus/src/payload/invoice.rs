use bon::Builder;
use serde::{Deserialize, Serialize};

/// `invoice:created` 载荷
///
/// 日期字段保持发布方给出的原始字符串（`2024-05-01` 或完整 ISO 时间均可）。
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreated {
    pub invoice_id: String,
    pub invoice_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub currency: String,
    pub status: String,
    pub invoice_date: String,
    pub due_date: String,
}
