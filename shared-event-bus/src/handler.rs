//! 事件处理器（EventHandler）
//!
//! 定义订阅方的处理逻辑与元信息（名称），并提供闭包适配器 `FnHandler`，
//! 以便直接以 `async` 闭包订阅。
//!
use crate::envelope::EventEnvelope;
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// 事件处理器：处理某一事件名下的信封
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与审计）
    fn handler_name(&self) -> &str;
    /// 处理事件；返回错误只会被记录，不会影响发布方与其它处理器
    async fn handle(&self, envelope: &EventEnvelope) -> anyhow::Result<()>;
}

type HandlerFn = Box<dyn Fn(EventEnvelope) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// 闭包处理器
pub struct FnHandler {
    name: String,
    f: HandlerFn,
}

impl FnHandler {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |envelope: EventEnvelope| f(envelope).boxed()),
        }
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        (self.f)(envelope.clone()).await
    }
}

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SubscriptionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}
