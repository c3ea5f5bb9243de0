//! 聚合（Aggregate）状态抽象
//!
//! 约束一个聚合状态的核心行为：
//! - `apply` 将事件投影到状态（事件溯源风格的状态迁移）；
//! - `check_invariants` / `check_invariants_async` 描述聚合整体的不变式。
//!
//! 聚合状态本身是普通数据，并发访问、版本与待发布事件由 `AggregateRoot` 负责。
//! 与其他聚合的关联只保存对方的标识，不持有引用。
//!
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain_event::DomainEvent;
use crate::entity::EntityId;
use crate::error::{DomainError, DomainResult};

/// 聚合状态接口
#[async_trait]
pub trait Aggregate: Clone + Send + Sync + 'static {
    /// 聚合类型名（用于日志与 NotFound 诊断）
    const TYPE: &'static str;

    /// 聚合标识类型
    type Id: EntityId;
    /// 该聚合产生的领域事件类型，通常是一个枚举
    type Event: DomainEvent;

    /// 应用事件，更新聚合状态；返回错误时该事件不会被提交
    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        let _ = event;
        Ok(())
    }

    /// 聚合整体的不变式，返回全部违例信息
    fn check_invariants(&self) -> Vec<String> {
        Vec::new()
    }

    /// 需要 I/O 的不变式；默认仍执行同步检查
    async fn check_invariants_async(&self, token: &CancellationToken) -> DomainResult<Vec<String>> {
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        Ok(self.check_invariants())
    }
}
