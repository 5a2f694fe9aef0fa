//! 事件总线统一错误定义
//!
//! 仅覆盖构造、事件名解析、序列化与传输层等最小必要集合。
//! 处理器自身的失败使用 `anyhow::Error`，由分发器记录后吞掉，不会出现在这里。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventBusError {
    // --- 构造/配置 ---
    #[error("event bus source must not be empty")]
    EmptySource,
    #[error("invalid config: key={key}, reason={reason}")]
    Config { key: &'static str, reason: String },

    // --- 事件名/载荷 ---
    #[error("unknown event name: {0}")]
    UnknownEventName(String),
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("payload mismatch: expected={expected}, found={found}")]
    PayloadMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("non-finite amount: event_name={event_name}, field={field}")]
    NonFiniteAmount {
        event_name: &'static str,
        field: &'static str,
    },

    // --- 传输 ---
    #[error("transport error: {reason}")]
    Transport { reason: String },
}

/// 统一 Result 类型别名
pub type EventBusResult<T> = Result<T, EventBusError>;

#[cfg(feature = "redis")]
impl From<redis::RedisError> for EventBusError {
    fn from(err: redis::RedisError) -> Self {
        EventBusError::Transport {
            reason: err.to_string(),
        }
    }
}

