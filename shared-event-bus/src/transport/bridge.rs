//! 传输桥接（Bridge）
//!
//! - 发布：信封编码为 JSON，交给传输发往 `{prefix}{event_name}`，带超时；
//! - 订阅：启动时即订阅全部事件名对应的频道，后台任务把收到的消息解码后
//!   交给本地分发器（回声按 `source` 过滤）；
//! - 无持久化、无重试、无确认，消息流结束后远端发布直接跳过并记录日志。
//!
use super::{MessageStream, RemoteOutcome, Transport, channel_for, decode_remote, encode_remote};
use crate::config::EventBusConfig;
use crate::dispatcher::Dispatcher;
use crate::envelope::EventEnvelope;
use crate::error::{EventBusError, EventBusResult};
use crate::event_name::EventName;
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub(crate) struct Bridge {
    transport: Arc<dyn Transport>,
    channel_prefix: String,
    publish_timeout: Duration,
    connected: Arc<AtomicBool>,
    token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Bridge {
    /// 订阅全部频道并启动监听任务
    pub(crate) async fn start(
        config: &EventBusConfig,
        transport: Arc<dyn Transport>,
        dispatcher: Arc<Dispatcher>,
    ) -> EventBusResult<Self> {
        let prefix = config.channel_prefix.clone();
        let channels: Vec<String> = EventName::ALL
            .into_iter()
            .map(|name| channel_for(&prefix, name))
            .collect();

        let messages = timeout(config.connect_timeout, transport.subscribe(channels))
            .await
            .map_err(|_| EventBusError::Transport {
                reason: format!("subscribe timed out after {:?}", config.connect_timeout),
            })??;

        let connected = Arc::new(AtomicBool::new(true));
        let token = CancellationToken::new();
        let listener = tokio::spawn(listen(
            messages,
            config.source.clone(),
            dispatcher,
            connected.clone(),
            token.clone(),
        ));

        info!(
            source = %config.source,
            transport = transport.kind(),
            prefix = %prefix,
            "event bridge connected"
        );

        Ok(Self {
            transport,
            channel_prefix: prefix,
            publish_timeout: config.publish_timeout,
            connected,
            token,
            listener: Mutex::new(Some(listener)),
        })
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// 发出即忘：不返回错误，结果只用于日志
    pub(crate) async fn publish(&self, envelope: &EventEnvelope) -> RemoteOutcome {
        if !self.is_connected() {
            return RemoteOutcome::SkippedNoTransport;
        }

        let raw = match encode_remote(envelope) {
            Ok(raw) => raw,
            Err(err) => return RemoteOutcome::SerializationFailed(err.to_string()),
        };

        let channel = channel_for(&self.channel_prefix, envelope.event_name());
        match timeout(self.publish_timeout, self.transport.publish(&channel, raw)).await {
            Ok(Ok(receivers)) => RemoteOutcome::Sent { receivers },
            Ok(Err(err)) => RemoteOutcome::TransportFailed(err.to_string()),
            Err(_) => RemoteOutcome::TransportFailed(format!(
                "publish timed out after {:?}",
                self.publish_timeout
            )),
        }
    }

    /// 停止监听任务并等待其退出；可重复调用
    pub(crate) async fn close(&self) {
        self.token.cancel();
        let listener = self.listener.lock().await.take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        self.connected.store(false, Ordering::Release);
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn listen(
    mut messages: MessageStream,
    source: String,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(%source, "event bridge closing");
                break;
            }
            maybe_msg = messages.next() => {
                let msg = match maybe_msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(err)) => {
                        warn!(%source, error = %err, "unreadable remote message");
                        continue;
                    }
                    None => {
                        warn!(%source, "remote message stream ended, falling back to local delivery");
                        break;
                    }
                };

                match decode_remote(&source, &msg.payload) {
                    Ok(Some(envelope)) => {
                        // 每条远端消息独立分发，慢处理器不阻塞后续消息
                        let dispatcher = dispatcher.clone();
                        tokio::spawn(async move {
                            dispatcher.dispatch(&envelope).await;
                        });
                    }
                    Ok(None) => {
                        trace!(channel = %msg.channel, "skipped own echo");
                    }
                    Err(err) => {
                        warn!(channel = %msg.channel, error = %err, "undecodable remote event");
                    }
                }
            }
        }
    }

    connected.store(false, Ordering::Release);
}
