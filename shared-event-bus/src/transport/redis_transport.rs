//! Redis pub/sub 传输
//!
//! 发布复用一条多路复用连接；每次订阅单独建立一条 pub/sub 连接。
//!
use super::{MessageStream, RawMessage, Transport};
use crate::error::{EventBusError, EventBusResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tokio::time::timeout;

pub struct RedisTransport {
    client: redis::Client,
    publisher: MultiplexedConnection,
}

impl RedisTransport {
    /// 建立发布连接；Broker 不可达或超时即返回错误
    pub async fn connect(url: &str, connect_timeout: Duration) -> EventBusResult<Self> {
        let client = redis::Client::open(url)?;
        let publisher = timeout(connect_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| EventBusError::Transport {
                reason: format!("connect timed out after {connect_timeout:?}"),
            })??;
        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl Transport for RedisTransport {
    fn kind(&self) -> &'static str {
        "redis"
    }

    async fn publish(&self, channel: &str, payload: String) -> EventBusResult<usize> {
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn.publish(channel, payload).await?;
        Ok(usize::try_from(receivers).unwrap_or(0))
    }

    async fn subscribe(&self, channels: Vec<String>) -> EventBusResult<MessageStream> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        for channel in &channels {
            pubsub.subscribe(channel).await?;
        }

        let stream = pubsub
            .into_on_message()
            .map(|msg| -> EventBusResult<RawMessage> {
                let payload: String = msg.get_payload()?;
                Ok(RawMessage {
                    channel: msg.get_channel_name().to_string(),
                    payload,
                })
            });
        Ok(stream.boxed())
    }
}
