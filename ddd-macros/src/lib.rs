//! ddd-domain 配套过程宏
//!
//! - `#[domain_event]`：为事件枚举注入 `meta` 字段并实现 `DomainEvent`
//! - `#[entity_id]`：强类型标识包装，实现 `EntityId`
//! - `#[value_object]`：按字段顺序生成相等性分量并实现 `ValueObject`
//!
use proc_macro::TokenStream;

mod domain_event;
mod entity_id;
mod utils;
mod value_object;

/// 领域事件宏
/// - 支持：`#[domain_event(version = N)]`
/// - 变体可覆写：`#[event(event_type = "...", event_version = N)]`
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 实体标识宏：`#[entity_id] struct UserId(Uuid);`
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 值对象宏：`#[value_object] struct Money { amount: i64, currency: String }`
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}
