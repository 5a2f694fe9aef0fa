//! 内存版传输（InMemoryTransport）
//!
//! 基于 `tokio::sync::broadcast` 的进程内传输，满足 `Transport` 协议：
//! - `publish`：把消息广播给全部订阅流；
//! - `subscribe`：返回只保留指定频道的 `'static` 消息流；
//! - 典型用途：测试环境与本地开发中，让多个总线实例像连到同一 Broker 一样互通。
//!
//! 注意：返回的接收者数量为广播订阅流的总数，不按频道区分；无订阅者时发送被忽略。

use super::{MessageStream, RawMessage, Transport};
use crate::error::{EventBusError, EventBusResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::future::ready;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Clone)]
pub struct InMemoryTransport {
    tx: broadcast::Sender<RawMessage>,
}

impl InMemoryTransport {
    /// `capacity` 为广播缓冲区容量，慢订阅者落后超过该值时会丢消息
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    fn kind(&self) -> &'static str {
        "in-memory"
    }

    async fn publish(&self, channel: &str, payload: String) -> EventBusResult<usize> {
        let msg = RawMessage {
            channel: channel.to_string(),
            payload,
        };
        // 无订阅者时 send 返回错误，视为 0 个接收者
        Ok(self.tx.send(msg).unwrap_or(0))
    }

    async fn subscribe(&self, channels: Vec<String>) -> EventBusResult<MessageStream> {
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| {
            let item = match item {
                Ok(msg) if !channels.contains(&msg.channel) => None,
                Ok(msg) => Some(Ok(msg)),
                Err(err) => Some(Err(EventBusError::Transport {
                    reason: err.to_string(),
                })),
            };
            ready(item)
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_only_sees_its_channels() -> anyhow::Result<()> {
        let transport = InMemoryTransport::new(16);
        let mut stream = transport
            .subscribe(vec!["events:customer:created".to_string()])
            .await?;

        assert_eq!(
            transport
                .publish("events:invoice:created", "skip".to_string())
                .await?,
            1
        );
        transport
            .publish("events:customer:created", "keep".to_string())
            .await?;

        let msg = stream.next().await.expect("stream is open")?;
        assert_eq!(msg.channel, "events:customer:created");
        assert_eq!(msg.payload, "keep");
        Ok(())
    }

    #[tokio::test]
    async fn publish_without_subscribers_reports_zero() -> anyhow::Result<()> {
        let transport = InMemoryTransport::new(4);
        assert_eq!(transport.publish("events:x", "{}".to_string()).await?, 0);
        Ok(())
    }
}
