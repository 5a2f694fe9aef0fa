//! 事件信封（Envelope）
//!
//! `EventEnvelope` 是处理器收到的统一形态：无论本地投递还是经由分布式传输到达，
//! 结构完全一致；`SerializedEnvelope` 为其线上（JSON）形态。

mod event_envelope;
mod metadata;
mod serialized_envelope;

pub use event_envelope::EventEnvelope;
pub use metadata::Metadata;
pub use serialized_envelope::SerializedEnvelope;
