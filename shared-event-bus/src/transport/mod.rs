//! 分布式传输（transport）
//!
//! 发布侧只做“发出即忘”：远端投递的结果以 `RemoteOutcome` 表达，仅用于日志与统计，
//! 从不抛给发布方；本地投递不受远端结果影响。
//!
//! 订阅侧把收到的原始消息解码为与本地完全相同的 `EventEnvelope`，并丢弃
//! 本实例自己发出的回声（按 `source` 比对）。
//!
//! `Transport` 只负责按频道收发字符串，不关心信封与事件名；编码、回声过滤、
//! 超时与后台监听由 `Bridge` 统一完成。内置 Redis 与内存广播两种实现。
//!
mod bridge;
mod memory;
#[cfg(feature = "redis")]
mod redis_transport;

pub(crate) use bridge::Bridge;
pub use memory::InMemoryTransport;
#[cfg(feature = "redis")]
pub use redis_transport::RedisTransport;

use crate::envelope::{EventEnvelope, SerializedEnvelope};
use crate::error::EventBusResult;
use crate::event_name::EventName;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// 某频道上收到的一条原始消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub channel: String,
    pub payload: String,
}

/// 原始消息流；单条消息读取失败以 `Err` 出现，不会终止流
pub type MessageStream = BoxStream<'static, EventBusResult<RawMessage>>;

/// 分布式传输：按频道发布与订阅原始消息
#[async_trait]
pub trait Transport: Send + Sync {
    /// 传输名称（用于日志）
    fn kind(&self) -> &'static str;

    /// 发布到 `channel`，返回当时在线的接收者数量
    async fn publish(&self, channel: &str, payload: String) -> EventBusResult<usize>;

    /// 订阅给定频道，返回 'static 生命周期的消息流，便于在 tokio::spawn 中消费
    async fn subscribe(&self, channels: Vec<String>) -> EventBusResult<MessageStream>;
}

/// 一次远端发布的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// 已交给 Broker，`receivers` 为当时在线的订阅连接数
    Sent { receivers: usize },
    /// 未配置或已断开分布式传输
    SkippedNoTransport,
    /// 载荷无法序列化，远端未发送
    SerializationFailed(String),
    /// Broker 不可达或超时，本次远端投递丢弃
    TransportFailed(String),
}

impl RemoteOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, RemoteOutcome::Sent { .. })
    }
}

/// 事件名对应的频道
pub fn channel_for(prefix: &str, name: EventName) -> String {
    format!("{prefix}{name}")
}

/// 解码远端消息；若为本实例（`local_source`）发出的回声则返回 `None`
pub fn decode_remote(local_source: &str, raw: &str) -> EventBusResult<Option<EventEnvelope>> {
    let wire = SerializedEnvelope::from_json(raw)?;
    if wire.source() == local_source {
        return Ok(None);
    }
    Ok(Some(EventEnvelope::try_from(&wire)?))
}

/// 编码待发往远端的信封
pub fn encode_remote(envelope: &EventEnvelope) -> EventBusResult<String> {
    SerializedEnvelope::try_from(envelope)?.to_json()
}
