//! 领域事件（Domain Event）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）、每个事件携带的元数据
//! （`EventMeta`），以及描述字段旧值/新值的辅助载荷 `FieldChanged`。
//! 具体聚合的事件通常是一个枚举，通过 `#[domain_event]` 宏生成 `DomainEvent` 实现。

mod domain_event_trait;
mod event_meta;
mod field_changed;

pub use domain_event_trait::DomainEvent;
pub use event_meta::EventMeta;
pub use field_changed::FieldChanged;
