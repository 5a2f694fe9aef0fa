//! 事件名注册表（EventName）
//!
//! 封闭枚举：每个事件名同时标识语义与载荷形态，线上传输使用 `domain:action` 字符串。
//!
use crate::error::{EventBusError, EventBusResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "customer:created")]
    CustomerCreated,
    #[serde(rename = "customer:updated")]
    CustomerUpdated,
    #[serde(rename = "project:status:changed")]
    ProjectStatusChanged,
    #[serde(rename = "invoice:created")]
    InvoiceCreated,
    #[serde(rename = "estimation:approved")]
    EstimationApproved,
}

impl EventName {
    /// 全部事件名，分布式桥接据此订阅所有频道
    pub const ALL: [EventName; 5] = [
        EventName::CustomerCreated,
        EventName::CustomerUpdated,
        EventName::ProjectStatusChanged,
        EventName::InvoiceCreated,
        EventName::EstimationApproved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::CustomerCreated => "customer:created",
            EventName::CustomerUpdated => "customer:updated",
            EventName::ProjectStatusChanged => "project:status:changed",
            EventName::InvoiceCreated => "invoice:created",
            EventName::EstimationApproved => "estimation:approved",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = EventBusError;

    fn from_str(s: &str) -> EventBusResult<Self> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| EventBusError::UnknownEventName(s.to_string()))
    }
}
