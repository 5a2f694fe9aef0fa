//! 事件总线（EventBus）
//!
//! 每个服务进程在启动时创建一个实例并注入到需要的地方（实例可廉价克隆），
//! 不依赖全局单例：
//! - `publish`：封装信封，等待本地处理器全部结束，再把信封发往分布式传输；
//! - `subscribe`：按事件名注册处理器，本地发布与远端到达的事件走同一条分发路径；
//! - 未配置 Broker 或连接失败时自动降级为仅本地投递，不向调用方报错。
//!
use crate::config::EventBusConfig;
use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::envelope::EventEnvelope;
use crate::error::{EventBusError, EventBusResult};
use crate::event_name::EventName;
use crate::handler::{EventHandler, FnHandler, SubscriptionId};
use crate::payload::{EventPayload, TypedPayload};
use crate::transport::{Bridge, RemoteOutcome, Transport};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

#[cfg(feature = "redis")]
use crate::transport::RedisTransport;

/// 一次发布的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_id: String,
    pub event_name: EventName,
    /// 本地投递统计
    pub local: DispatchReport,
    /// 远端投递结果（仅供日志/统计）
    pub remote: RemoteOutcome,
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    source: String,
    dispatcher: Arc<Dispatcher>,
    bridge: RwLock<Option<Bridge>>,
}

impl EventBus {
    /// 按配置创建总线；仅在 `source` 为空时失败
    pub async fn connect(config: EventBusConfig) -> EventBusResult<Self> {
        let config = normalize(config)?;
        let dispatcher = Arc::new(Dispatcher::new(config.handler_concurrency));

        let bridge = match config.redis_url.as_deref() {
            Some(url) => open_redis(&config, url, &dispatcher).await,
            None => None,
        };

        Ok(Self::assemble(config, dispatcher, bridge))
    }

    /// 使用给定的传输创建分布式总线（如多个实例共享一个 `InMemoryTransport`）；
    /// 忽略 `redis_url`，订阅失败时同样降级为仅本地投递
    pub async fn with_transport(
        config: EventBusConfig,
        transport: Arc<dyn Transport>,
    ) -> EventBusResult<Self> {
        let config = normalize(config)?;
        let dispatcher = Arc::new(Dispatcher::new(config.handler_concurrency));
        let bridge = start_bridge(&config, transport, &dispatcher).await;
        Ok(Self::assemble(config, dispatcher, bridge))
    }

    fn assemble(
        config: EventBusConfig,
        dispatcher: Arc<Dispatcher>,
        bridge: Option<Bridge>,
    ) -> Self {
        info!(
            source = %config.source,
            distributed = bridge.is_some(),
            "event bus ready"
        );
        Self {
            inner: Arc::new(Inner {
                source: config.source,
                dispatcher,
                bridge: RwLock::new(bridge),
            }),
        }
    }

    /// 仅本地投递的总线
    pub async fn local(source: impl Into<String>) -> EventBusResult<Self> {
        Self::connect(EventBusConfig::builder().source(source).build()).await
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// 当前是否处于分布式模式（已连接 Broker）
    pub async fn is_distributed(&self) -> bool {
        self.inner
            .bridge
            .read()
            .await
            .as_ref()
            .is_some_and(|bridge| bridge.is_connected())
    }

    /// 注册处理器，返回可用于取消订阅的句柄
    pub fn subscribe(&self, name: EventName, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        self.inner.dispatcher.subscribe(name, handler)
    }

    /// 以闭包注册处理器
    pub fn subscribe_fn<F, Fut>(&self, name: EventName, f: F) -> SubscriptionId
    where
        F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.subscribe(name, Arc::new(FnHandler::new(name.as_str(), f)))
    }

    /// 以强类型载荷注册处理器，事件名由载荷类型决定
    pub fn on<T, F, Fut>(&self, f: F) -> SubscriptionId
    where
        T: TypedPayload,
        F: Fn(EventEnvelope, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let f = Arc::new(f);
        self.subscribe_fn(T::NAME, move |envelope| {
            let f = f.clone();
            async move {
                let data = envelope.payload.downcast::<T>()?.clone();
                f(envelope, data).await
            }
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.inner.dispatcher.subscriber_count(name)
    }

    /// 发布事件：本地处理器全部结束后返回；远端投递发出即忘，从不报错
    pub async fn publish(&self, payload: impl Into<EventPayload>) -> PublishReport {
        let envelope = EventEnvelope::new(&self.inner.source, payload);
        let local = self.inner.dispatcher.dispatch(&envelope).await;
        let remote = self.publish_remote(&envelope).await;

        match &remote {
            RemoteOutcome::Sent { receivers } => debug!(
                event_id = envelope.event_id(),
                event_name = %envelope.event_name(),
                receivers,
                "event sent to broker"
            ),
            RemoteOutcome::SkippedNoTransport => trace!(
                event_id = envelope.event_id(),
                event_name = %envelope.event_name(),
                "no distributed transport"
            ),
            RemoteOutcome::SerializationFailed(reason) | RemoteOutcome::TransportFailed(reason) => {
                warn!(
                    event_id = envelope.event_id(),
                    event_name = %envelope.event_name(),
                    reason = %reason,
                    "distributed delivery dropped"
                )
            }
        }

        PublishReport {
            event_id: envelope.event_id().to_string(),
            event_name: envelope.event_name(),
            local,
            remote,
        }
    }

    async fn publish_remote(&self, envelope: &EventEnvelope) -> RemoteOutcome {
        match self.inner.bridge.read().await.as_ref() {
            Some(bridge) => bridge.publish(envelope).await,
            None => RemoteOutcome::SkippedNoTransport,
        }
    }

    /// 断开分布式传输；之后总线继续以本地模式工作。可重复调用
    pub async fn close(&self) {
        let bridge = self.inner.bridge.write().await.take();
        if let Some(bridge) = bridge {
            bridge.close().await;
            info!(source = %self.inner.source, "event bus disconnected from broker");
        }
    }
}

/// 校验并去除 `source` 两端空白
fn normalize(config: EventBusConfig) -> EventBusResult<EventBusConfig> {
    let source = validate_source(&config.source)?;
    Ok(EventBusConfig { source, ..config })
}

async fn start_bridge(
    config: &EventBusConfig,
    transport: Arc<dyn Transport>,
    dispatcher: &Arc<Dispatcher>,
) -> Option<Bridge> {
    let kind = transport.kind();
    match Bridge::start(config, transport, dispatcher.clone()).await {
        Ok(bridge) => Some(bridge),
        Err(err) => {
            warn!(source = %config.source, transport = kind, error = %err, "event broker unavailable, using local delivery only");
            None
        }
    }
}

#[cfg(feature = "redis")]
async fn open_redis(
    config: &EventBusConfig,
    url: &str,
    dispatcher: &Arc<Dispatcher>,
) -> Option<Bridge> {
    match RedisTransport::connect(url, config.connect_timeout).await {
        Ok(transport) => start_bridge(config, Arc::new(transport), dispatcher).await,
        Err(err) => {
            warn!(source = %config.source, error = %err, "event broker unavailable, using local delivery only");
            None
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn open_redis(
    config: &EventBusConfig,
    _url: &str,
    _dispatcher: &Arc<Dispatcher>,
) -> Option<Bridge> {
    warn!(source = %config.source, "built without the `redis` feature, using local delivery only");
    None
}

fn validate_source(source: &str) -> EventBusResult<String> {
    let source = source.trim();
    if source.is_empty() {
        return Err(EventBusError::EmptySource);
    }
    Ok(source.to_string())
}

/// 从环境变量读取配置并创建总线；环境变量无法解析时回退为默认值，不会失败
///
/// ```no_run
/// use shared_event_bus::{create_event_bus, payload::CustomerCreated};
///
/// # async fn run() -> anyhow::Result<()> {
/// let bus = create_event_bus("crm-service").await?;
/// bus.on(|envelope, customer: CustomerCreated| async move {
///     println!("{} created by {}", customer.customer_id, envelope.source());
///     anyhow::Ok(())
/// });
/// # Ok(())
/// # }
/// ```
pub async fn create_event_bus(source: impl Into<String>) -> EventBusResult<EventBus> {
    EventBus::connect(EventBusConfig::from_env(source)).await
}
