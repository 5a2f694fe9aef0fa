//! 事件总线冒烟检查
//!
//! 以 `crm-service-test` 身份创建总线，订阅并发布一条 `customer:created`，
//! 确认本地订阅者收到 `customerId == "test-customer-1"`。设置 `REDIS_URL`
//! 时同时走分布式通道；未设置时仅本地投递。
use anyhow::{Context, bail};
use shared_event_bus::payload::CustomerCreated;
use shared_event_bus::{EventEnvelope, EventName, create_event_bus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();

    let bus = create_event_bus("crm-service-test")
        .await
        .context("create event bus")?;
    info!(
        source = bus.source(),
        distributed = bus.is_distributed().await,
        "event bus created"
    );

    let received: Arc<Mutex<Option<EventEnvelope>>> = Arc::new(Mutex::new(None));
    {
        let received = received.clone();
        bus.subscribe_fn(EventName::CustomerCreated, move |envelope| {
            let received = received.clone();
            async move {
                info!(
                    event_id = envelope.event_id(),
                    source = envelope.source(),
                    "received customer:created"
                );
                if let Ok(mut slot) = received.lock() {
                    *slot = Some(envelope);
                }
                anyhow::Ok(())
            }
        });
    }

    let report = bus
        .publish(
            CustomerCreated::builder()
                .customer_id("test-customer-1")
                .customer_name("Test Customer")
                .channel("ONLINE")
                .city("Jakarta")
                .status("ACTIVE")
                .build(),
        )
        .await;
    info!(event_id = %report.event_id, remote = ?report.remote, "published");

    // 远端订阅者（若有）需要一点时间收到消息
    tokio::time::sleep(Duration::from_millis(200)).await;
    bus.close().await;

    let envelope = received
        .lock()
        .map_err(|_| anyhow::anyhow!("subscriber state poisoned"))?
        .take();
    let Some(envelope) = envelope else {
        bail!("customer:created was not delivered to the local subscriber");
    };
    let customer = envelope
        .data_as::<CustomerCreated>()
        .context("unexpected payload type")?;
    if customer.customer_id != "test-customer-1" {
        bail!("unexpected customerId: {}", customer.customer_id);
    }

    println!(
        "ok: {} delivered to {} (event {})",
        envelope.event_name(),
        envelope.source(),
        envelope.event_id()
    );
    Ok(())
}
