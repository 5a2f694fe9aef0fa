use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EventEnvelope, Metadata};
use crate::error::{EventBusError, EventBusResult};
use crate::event_name::EventName;
use crate::payload::EventPayload;

/// 信封的线上形态：`{eventId, eventName, source, timestamp, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedEnvelope {
    /// 事件唯一标识符
    event_id: String,
    /// 事件名，决定 `data` 的形态
    event_name: EventName,
    /// 发布方服务名
    source: String,
    /// 发布时间（RFC 3339）
    timestamp: DateTime<Utc>,
    /// 事件负载
    data: Value,
}

impl SerializedEnvelope {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_name(&self) -> EventName {
        self.event_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn to_json(&self) -> EventBusResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> EventBusResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl TryFrom<&EventEnvelope> for SerializedEnvelope {
    type Error = EventBusError;

    fn try_from(envelope: &EventEnvelope) -> Result<Self, Self::Error> {
        Ok(SerializedEnvelope {
            event_id: envelope.event_id().to_string(),
            event_name: envelope.event_name(),
            source: envelope.source().to_string(),
            timestamp: *envelope.timestamp(),
            data: envelope.payload.to_value()?,
        })
    }
}

impl TryFrom<&SerializedEnvelope> for EventEnvelope {
    type Error = EventBusError;

    fn try_from(value: &SerializedEnvelope) -> Result<Self, Self::Error> {
        let metadata = Metadata::builder()
            .event_id(value.event_id.clone())
            .source(value.source.clone())
            .timestamp(value.timestamp)
            .build();

        let payload = EventPayload::decode(value.event_name, value.data.clone())?;

        Ok(EventEnvelope { metadata, payload })
    }
}
