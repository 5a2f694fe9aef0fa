//! 事件载荷（EventPayload）
//!
//! 事件名即判别式：`EventPayload` 为各事件载荷的和类型，处理器按事件名拿到强类型数据，
//! 而不是一袋无类型字段。线上传输时 `data` 为载荷本身的 JSON 对象（camelCase）。

mod customer;
mod estimation;
mod invoice;
mod project;

pub use customer::{CustomerCreated, CustomerUpdated};
pub use estimation::EstimationApproved;
pub use invoice::InvoiceCreated;
pub use project::ProjectStatusChanged;

use crate::error::{EventBusError, EventBusResult};
use crate::event_name::EventName;
use serde_json::Value;

/// 单个事件载荷类型需要满足的能力边界
pub trait TypedPayload: Clone + Into<EventPayload> + Send + Sync + 'static {
    /// 该载荷对应的事件名
    const NAME: EventName;

    /// 从和类型中取出自身，事件名不匹配时返回 `None`
    fn from_payload(payload: &EventPayload) -> Option<&Self>;
}

/// 载荷和类型
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    CustomerCreated(CustomerCreated),
    CustomerUpdated(CustomerUpdated),
    ProjectStatusChanged(ProjectStatusChanged),
    InvoiceCreated(InvoiceCreated),
    EstimationApproved(EstimationApproved),
}

macro_rules! typed_payloads {
    ($($variant:ident),+ $(,)?) => {
        impl EventPayload {
            pub fn event_name(&self) -> EventName {
                match self {
                    $(EventPayload::$variant(_) => EventName::$variant,)+
                }
            }

            /// 编码为线上 `data` 对象；金额为 NaN/无穷时拒绝编码
            pub fn to_value(&self) -> EventBusResult<Value> {
                self.ensure_finite_amounts()?;
                let value = match self {
                    $(EventPayload::$variant(data) => serde_json::to_value(data)?,)+
                };
                Ok(value)
            }

            /// 按事件名解码 `data` 对象
            pub fn decode(name: EventName, data: Value) -> EventBusResult<Self> {
                let payload = match name {
                    $(EventName::$variant => EventPayload::$variant(serde_json::from_value(data)?),)+
                };
                Ok(payload)
            }
        }

        $(
            impl From<$variant> for EventPayload {
                fn from(data: $variant) -> Self {
                    EventPayload::$variant(data)
                }
            }

            impl TypedPayload for $variant {
                const NAME: EventName = EventName::$variant;

                fn from_payload(payload: &EventPayload) -> Option<&Self> {
                    match payload {
                        EventPayload::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            }
        )+
    };
}

typed_payloads!(
    CustomerCreated,
    CustomerUpdated,
    ProjectStatusChanged,
    InvoiceCreated,
    EstimationApproved,
);

impl EventPayload {
    /// JSON 无法表示非有限数，serde_json 会静默写成 `null`，接收方随后解码失败
    fn ensure_finite_amounts(&self) -> EventBusResult<()> {
        let amounts: Vec<(&'static str, Option<f64>)> = match self {
            EventPayload::CustomerCreated(_) | EventPayload::CustomerUpdated(_) => Vec::new(),
            EventPayload::ProjectStatusChanged(data) => vec![
                ("estimatedValue", data.estimated_value),
                ("contractValue", data.contract_value),
            ],
            EventPayload::InvoiceCreated(data) => vec![("totalAmount", Some(data.total_amount))],
            EventPayload::EstimationApproved(data) => {
                vec![("totalAmount", Some(data.total_amount))]
            }
        };

        match amounts
            .into_iter()
            .find(|(_, amount)| amount.is_some_and(|v| !v.is_finite()))
        {
            Some((field, _)) => Err(EventBusError::NonFiniteAmount {
                event_name: self.event_name().as_str(),
                field,
            }),
            None => Ok(()),
        }
    }

    /// 取出指定类型的载荷；类型不符时返回 `PayloadMismatch`
    pub fn downcast<T: TypedPayload>(&self) -> EventBusResult<&T> {
        T::from_payload(self).ok_or(EventBusError::PayloadMismatch {
            expected: T::NAME.as_str(),
            found: self.event_name().as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer() -> CustomerCreated {
        CustomerCreated::builder()
            .customer_id("c-1")
            .customer_name("PT Maju")
            .channel("ONLINE")
            .city("Jakarta")
            .status("ACTIVE")
            .build()
    }

    #[test]
    fn data_is_camel_case() {
        let payload = EventPayload::from(customer());
        let value = payload.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "customerId": "c-1",
                "customerName": "PT Maju",
                "channel": "ONLINE",
                "city": "Jakarta",
                "status": "ACTIVE",
            })
        );
    }

    #[test]
    fn decode_follows_event_name() {
        let data = json!({
            "projectId": "p-9",
            "projectName": "Gedung A",
            "customerId": "c-1",
            "previousStatus": "DRAFT",
            "newStatus": "WON",
            "contractValue": 1250000.0,
        });
        let payload = EventPayload::decode(EventName::ProjectStatusChanged, data).unwrap();
        assert_eq!(payload.event_name(), EventName::ProjectStatusChanged);

        let project = payload.downcast::<ProjectStatusChanged>().unwrap();
        assert_eq!(project.new_status, "WON");
        assert_eq!(project.estimated_value, None);
        assert_eq!(project.contract_value, Some(1250000.0));
    }

    #[test]
    fn decode_rejects_wrong_shape() {
        let err = EventPayload::decode(EventName::InvoiceCreated, json!({"customerId": "c-1"}))
            .unwrap_err();
        assert!(matches!(err, EventBusError::Serde { .. }));
    }

    #[test]
    fn downcast_reports_mismatch() {
        let payload = EventPayload::from(customer());
        let err = payload.downcast::<InvoiceCreated>().unwrap_err();
        match err {
            EventBusError::PayloadMismatch { expected, found } => {
                assert_eq!(expected, "invoice:created");
                assert_eq!(found, "customer:created");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_finite_amounts_are_not_encoded() {
        let invoice = InvoiceCreated::builder()
            .invoice_id("inv-9")
            .invoice_number("INV/2024/009")
            .customer_id("c-1")
            .customer_name("PT Maju")
            .total_amount(f64::NAN)
            .currency("IDR")
            .status("DRAFT")
            .invoice_date("2024-05-01")
            .due_date("2024-05-31")
            .build();
        let err = EventPayload::from(invoice).to_value().unwrap_err();
        assert!(matches!(
            err,
            EventBusError::NonFiniteAmount {
                event_name: "invoice:created",
                field: "totalAmount",
            }
        ));

        let project = ProjectStatusChanged::builder()
            .project_id("p-9")
            .project_name("Gedung A")
            .customer_id("c-1")
            .previous_status("DRAFT")
            .new_status("WON")
            .contract_value(f64::INFINITY)
            .build();
        assert!(matches!(
            EventPayload::from(project).to_value(),
            Err(EventBusError::NonFiniteAmount {
                field: "contractValue",
                ..
            })
        ));
    }

    #[test]
    fn customer_updated_defaults_changes_to_empty_object() {
        let data = json!({"customerId": "c-1", "customerName": "PT Maju"});
        let payload = EventPayload::decode(EventName::CustomerUpdated, data).unwrap();
        let updated = payload.downcast::<CustomerUpdated>().unwrap();
        assert_eq!(updated.changes, json!({}));
    }
}
