use bon::Builder;
use chrono::{DateTime, Utc};

/// 元数据
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metadata {
    #[builder(into)]
    event_id: String,
    #[builder(into)]
    source: String,
    timestamp: DateTime<Utc>,
}

impl Metadata {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }
}
