use ddd_domain::domain_event::{DomainEvent, EventMeta};
use ddd_macros::domain_event;
use serde::{Deserialize, Serialize};

#[domain_event(version = 1)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum BankEvent {
    #[event(event_type = "bank.opened")]
    Opened { name: String },
    #[event(event_type = "bank.renamed", event_version = 2)]
    Renamed { to: String },
    Closed {},
}

// 显式声明 meta 字段时保持原样
#[domain_event]
enum LedgerEvent {
    Posted { amount: i64, meta: EventMeta },
}

fn main() {
    let meta = EventMeta::new();
    let opened = BankEvent::Opened {
        meta: meta.clone(),
        name: "main".to_string(),
    };
    assert_eq!(opened.event_type(), "bank.opened");
    assert_eq!(opened.event_version(), 1);
    assert_eq!(opened.event_id(), meta.event_id());
    assert_eq!(opened.occurred_on(), meta.occurred_on());

    let renamed = BankEvent::Renamed {
        meta: EventMeta::new(),
        to: "savings".to_string(),
    };
    assert_eq!(renamed.event_type(), "bank.renamed");
    assert_eq!(renamed.event_version(), 2);
    assert_ne!(renamed.event_id(), opened.event_id());

    let closed = BankEvent::Closed {
        meta: EventMeta::new(),
    };
    assert_eq!(closed.event_type(), "BankEvent.Closed");

    let posted = LedgerEvent::Posted {
        amount: 5,
        meta: EventMeta::new(),
    };
    assert_eq!(posted.event_type(), "LedgerEvent.Posted");
    assert_eq!(posted.clone(), posted);
}
