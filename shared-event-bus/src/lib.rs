//! 服务间共享事件总线（shared-event-bus）
//!
//! 为后端服务提供发布/订阅能力：
//! - 进程内投递：同一实例内按事件名分发给已注册的处理器；
//! - 分布式投递：配置 `REDIS_URL` 后，经 Redis pub/sub 扇出到其它进程中订阅了同名事件的实例；
//!   传输可替换（`Transport`），测试与本地开发可用内存广播让多个实例互通；
//! - 封闭的事件名注册表（`event_name`）与强类型载荷（`payload`）；
//! - 统一的信封结构（`envelope`），本地与远端到达的事件对处理器完全一致。
//!
//! 分布式部分为尽力而为的消息通道：无持久化、无重试、无确认，Broker 不可用时
//! 自动降级为仅本地投递。
//!
//! 典型用法：
//! 1. 服务启动时 `create_event_bus("crm-service")` 创建唯一实例并注入各处；
//! 2. 通过 `subscribe`/`subscribe_fn`/`on` 注册关心的事件；
//! 3. 状态变化时 `publish(CustomerCreated { .. })`；
//! 4. 退出前调用 `close` 断开 Broker。
//!
pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod event_name;
pub mod handler;
pub mod payload;
pub mod transport;

pub use bus::{EventBus, PublishReport, create_event_bus};
pub use config::EventBusConfig;
pub use dispatcher::DispatchReport;
pub use envelope::{EventEnvelope, SerializedEnvelope};
pub use error::{EventBusError, EventBusResult};
pub use event_name::EventName;
pub use handler::{EventHandler, FnHandler, SubscriptionId};
pub use payload::{EventPayload, TypedPayload};
pub use transport::{InMemoryTransport, RawMessage, RemoteOutcome, Transport};
#[cfg(feature = "redis")]
pub use transport::RedisTransport;
