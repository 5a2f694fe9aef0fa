use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::metadata::Metadata;
use crate::event_name::EventName;
use crate::payload::{EventPayload, TypedPayload};

/// 事件信封，包含元数据与强类型载荷
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub metadata: Metadata,
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// 以 `source` 的名义封装一次发布：新的 `event_id`，时间戳取当前时刻
    pub fn new(source: &str, payload: impl Into<EventPayload>) -> Self {
        let metadata = Metadata::builder()
            .event_id(Uuid::new_v4().to_string())
            .source(source)
            .timestamp(Utc::now())
            .build();

        Self {
            metadata,
            payload: payload.into(),
        }
    }

    pub fn event_id(&self) -> &str {
        self.metadata.event_id()
    }

    pub fn event_name(&self) -> EventName {
        self.payload.event_name()
    }

    pub fn source(&self) -> &str {
        self.metadata.source()
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        self.metadata.timestamp()
    }

    pub fn data(&self) -> &EventPayload {
        &self.payload
    }

    /// 取出指定类型的载荷，事件名不符时返回 `None`
    pub fn data_as<T: TypedPayload>(&self) -> Option<&T> {
        T::from_payload(&self.payload)
    }
}
