//! 进程内分发器（Dispatcher）
//!
//! 维护 `事件名 → 处理器列表` 的注册表，并把信封分发给匹配的处理器：
//! - 注册顺序即调用顺序；
//! - 分发前先对处理器列表做快照，处理器在执行中订阅/取消订阅不会影响本次分发；
//! - 单个处理器返回错误或 panic 都只记录日志，不影响其它处理器与发布方；
//! - `dispatch` 在所有本地处理器结束后才返回。
//!
use crate::envelope::EventEnvelope;
use crate::event_name::EventName;
use crate::handler::{EventHandler, SubscriptionId};
use dashmap::DashMap;
use futures_util::{FutureExt, StreamExt, stream};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, trace, warn};

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// 单次分发的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 被调用的处理器数量
    pub invoked: usize,
    /// 其中返回错误或 panic 的数量
    pub failed: usize,
}

pub struct Dispatcher {
    subscribers: DashMap<EventName, Vec<Subscriber>>,
    concurrency: usize,
}

impl Dispatcher {
    /// `concurrency` 为单次分发内处理器的并发上限
    pub fn new(concurrency: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            concurrency,
        }
    }

    pub fn subscribe(&self, name: EventName, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId::next();
        trace!(event_name = %name, handler = handler.handler_name(), %id, "subscribed");
        self.subscribers
            .entry(name)
            .or_default()
            .push(Subscriber { id, handler });
        id
    }

    /// 取消订阅，返回该句柄此前是否存在
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        for mut entry in self.subscribers.iter_mut() {
            let before = entry.len();
            entry.retain(|s| s.id != id);
            if entry.len() < before {
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, name: EventName) -> usize {
        self.subscribers.get(&name).map_or(0, |list| list.len())
    }

    fn snapshot(&self, name: EventName) -> Vec<Subscriber> {
        self.subscribers
            .get(&name)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub async fn dispatch(&self, envelope: &EventEnvelope) -> DispatchReport {
        let subscribers = self.snapshot(envelope.event_name());
        if subscribers.is_empty() {
            trace!(event_id = envelope.event_id(), event_name = %envelope.event_name(), "no local subscribers");
            return DispatchReport::default();
        }

        let invoked = subscribers.len();
        let failed = AtomicUsize::new(0);

        stream::iter(subscribers.iter())
            .for_each_concurrent(Some(self.concurrency), |sub| {
                let failed = &failed;
                async move {
                    let outcome = AssertUnwindSafe(sub.handler.handle(envelope))
                        .catch_unwind()
                        .await;
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            warn!(
                                event_id = envelope.event_id(),
                                event_name = %envelope.event_name(),
                                handler = sub.handler.handler_name(),
                                error = %err,
                                "event handler failed"
                            );
                        }
                        Err(panic) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            error!(
                                event_id = envelope.event_id(),
                                event_name = %envelope.event_name(),
                                handler = sub.handler.handler_name(),
                                panic = panic_message(&*panic),
                                "event handler panicked"
                            );
                        }
                    }
                }
            })
            .await;

        DispatchReport {
            invoked,
            failed: failed.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
