//! DDD 领域层基础库（ddd-domain）
//!
//! 为所有业务实体共享的领域模型运行时提供通用构件：
//! - 实体（`entity`）：标识、乐观版本、审计字段与待发布事件；
//! - 聚合（`aggregate`）与线程安全的聚合根（`aggregate_root`）：事件的追加/移除/清空
//!   与版本递增在同一把实例锁内完成，事件溯源式的 `apply` 与不变式校验原子提交；
//! - 领域事件（`domain_event`）与值对象（`value_object`）；
//! - 软删除（`soft_delete`）、规约（`specification`）与异步不变式端口（`domain_service`）；
//! - 统一错误（`error`）：业务规则违例、不变式校验汇总与实体不存在。
//!
//! 本 crate 不包含持久化、事件分发与传输实现：仓储在事务成功后通过
//! `take_domain_events` 取出事件自行发布，并在提交前调用 `enforce_invariants`。
//!
//! 典型用法：
//! 1. 定义聚合状态与事件枚举（`#[domain_event]`），在 `Aggregate::apply` 中穷尽匹配事件；
//! 2. 在 `check_invariants` 中用 `InvariantRules` 描述不变式；
//! 3. 用 `AggregateRoot::new` 包装状态，通过 `execute` / `add_and_apply_event` 修改。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod audit;
pub mod domain_event;
pub mod domain_service;
pub mod entity;
pub mod error;
pub mod soft_delete;
pub mod specification;
pub mod value_object;

// 允许在本 crate 内部通过 ::ddd_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_domain 路径。
extern crate self as ddd_domain;
