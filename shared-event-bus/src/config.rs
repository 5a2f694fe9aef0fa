//! 事件总线配置
//!
//! 唯一对外可配置的行为是分布式传输的连接地址；其余为调优参数，均有默认值。
//!
//! | 环境变量 | 含义 | 默认 |
//! |---|---|---|
//! | `REDIS_URL` | Broker 地址，为空或未设置则仅本地投递 | 未设置 |
//! | `EVENT_BUS_DISTRIBUTED` | 设为 `false`/`0`/`off` 时显式关闭分布式投递 | 开启 |
//! | `EVENT_BUS_CHANNEL_PREFIX` | 频道前缀 | `events:` |
//! | `EVENT_BUS_HANDLER_CONCURRENCY` | 单次发布内处理器并发上限 | 8 |
//!
use crate::error::{EventBusError, EventBusResult};
use bon::Builder;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CHANNEL_PREFIX: &str = "events:";
pub const DEFAULT_HANDLER_CONCURRENCY: usize = 8;

/// 事件总线配置
#[derive(Builder, Clone, Debug)]
#[builder(on(String, into))]
pub struct EventBusConfig {
    /// 所属服务名，会写入每个信封的 `source`
    pub source: String,
    /// Broker 地址；`None` 表示仅本地投递
    pub redis_url: Option<String>,
    /// 频道前缀，频道名为 `{prefix}{event_name}`
    #[builder(default = DEFAULT_CHANNEL_PREFIX.to_string())]
    pub channel_prefix: String,
    /// 单次发布内处理器并发上限
    #[builder(default = DEFAULT_HANDLER_CONCURRENCY)]
    pub handler_concurrency: usize,
    /// 建立 Broker 连接的超时
    #[builder(default = Duration::from_secs(3))]
    pub connect_timeout: Duration,
    /// 单次远端发布的超时
    #[builder(default = Duration::from_secs(1))]
    pub publish_timeout: Duration,
}

impl EventBusConfig {
    /// 从进程环境变量读取配置
    ///
    /// 无法解析的取值只记录告警并回退：分布式开关读不懂时按关闭处理，
    /// 并发上限读不懂时取默认值。总线的构造不会因为环境变量而失败。
    pub fn from_env(source: impl Into<String>) -> Self {
        Self::from_lookup_or_default(source, |key| std::env::var(key).ok())
    }

    /// 与 `from_env` 相同的回退规则，键值来源可替换
    pub fn from_lookup_or_default<F>(source: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, problems) = Self::read(source, lookup);
        for problem in problems {
            warn!(error = %problem, "ignoring unreadable event bus setting");
        }
        config
    }

    /// 严格读取：任一取值无法解析即返回 `Config` 错误
    pub fn from_lookup<F>(source: impl Into<String>, lookup: F) -> EventBusResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, problems) = Self::read(source, lookup);
        match problems.into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(config),
        }
    }

    fn read<F>(source: impl Into<String>, lookup: F) -> (Self, Vec<EventBusError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        let distributed = match lookup("EVENT_BUS_DISTRIBUTED").map(|raw| parse_flag(&raw)) {
            None => true,
            Some(Ok(flag)) => flag,
            Some(Err(reason)) => {
                problems.push(EventBusError::Config {
                    key: "EVENT_BUS_DISTRIBUTED",
                    reason,
                });
                false
            }
        };

        let redis_url = lookup("REDIS_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty() && distributed);

        let channel_prefix = lookup("EVENT_BUS_CHANNEL_PREFIX")
            .unwrap_or_else(|| DEFAULT_CHANNEL_PREFIX.to_string());

        let handler_concurrency = match lookup("EVENT_BUS_HANDLER_CONCURRENCY") {
            None => DEFAULT_HANDLER_CONCURRENCY,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                Ok(_) => {
                    problems.push(EventBusError::Config {
                        key: "EVENT_BUS_HANDLER_CONCURRENCY",
                        reason: "must be at least 1".to_string(),
                    });
                    DEFAULT_HANDLER_CONCURRENCY
                }
                Err(e) => {
                    problems.push(EventBusError::Config {
                        key: "EVENT_BUS_HANDLER_CONCURRENCY",
                        reason: e.to_string(),
                    });
                    DEFAULT_HANDLER_CONCURRENCY
                }
            },
        };

        let config = Self::builder()
            .source(source)
            .maybe_redis_url(redis_url)
            .channel_prefix(channel_prefix)
            .handler_concurrency(handler_concurrency)
            .build();
        (config, problems)
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(format!("expected a boolean, got `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_only() {
        let cfg = EventBusConfig::from_lookup("crm-service", lookup(&[])).unwrap();
        assert_eq!(cfg.source, "crm-service");
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.channel_prefix, DEFAULT_CHANNEL_PREFIX);
        assert_eq!(cfg.handler_concurrency, DEFAULT_HANDLER_CONCURRENCY);
    }

    #[test]
    fn reads_redis_url_and_tuning() {
        let cfg = EventBusConfig::from_lookup(
            "finance-service",
            lookup(&[
                ("REDIS_URL", " redis://cache:6379/0 "),
                ("EVENT_BUS_CHANNEL_PREFIX", "staging:"),
                ("EVENT_BUS_HANDLER_CONCURRENCY", "2"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379/0"));
        assert_eq!(cfg.channel_prefix, "staging:");
        assert_eq!(cfg.handler_concurrency, 2);
    }

    #[test]
    fn empty_url_or_explicit_disable_means_local_only() {
        let empty = EventBusConfig::from_lookup("s", lookup(&[("REDIS_URL", "  ")])).unwrap();
        assert_eq!(empty.redis_url, None);

        let disabled = EventBusConfig::from_lookup(
            "s",
            lookup(&[
                ("REDIS_URL", "redis://localhost:6379"),
                ("EVENT_BUS_DISTRIBUTED", "off"),
            ]),
        )
        .unwrap();
        assert_eq!(disabled.redis_url, None);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = EventBusConfig::from_lookup(
            "s",
            lookup(&[("EVENT_BUS_HANDLER_CONCURRENCY", "many")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EventBusError::Config {
                key: "EVENT_BUS_HANDLER_CONCURRENCY",
                ..
            }
        ));

        let err =
            EventBusConfig::from_lookup("s", lookup(&[("EVENT_BUS_DISTRIBUTED", "maybe")]))
                .unwrap_err();
        assert!(matches!(err, EventBusError::Config { .. }));
    }

    #[test]
    fn lenient_read_falls_back_to_local_only_defaults() {
        let cfg = EventBusConfig::from_lookup_or_default(
            "crm-service-test",
            lookup(&[
                ("REDIS_URL", "redis://cache:6379/0"),
                ("EVENT_BUS_DISTRIBUTED", "maybe"),
                ("EVENT_BUS_HANDLER_CONCURRENCY", "lots"),
            ]),
        );
        assert_eq!(cfg.source, "crm-service-test");
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.handler_concurrency, DEFAULT_HANDLER_CONCURRENCY);

        let zero = EventBusConfig::from_lookup_or_default(
            "s",
            lookup(&[("EVENT_BUS_HANDLER_CONCURRENCY", "0")]),
        );
        assert_eq!(zero.handler_concurrency, DEFAULT_HANDLER_CONCURRENCY);
    }
}
