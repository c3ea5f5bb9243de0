//! 实体（Entity）基础抽象
//!
//! - `EntityId`：强类型标识，构造后永不为空值；
//! - `Entity`：标识 + 乐观版本 + 同步/异步不变式校验契约；
//! - `EntityBase`：供具体实体组合的基础状态（标识、版本、审计、待发布事件）。
//!
//! `EntityBase` 的事件操作不是线程安全的，需要并发写入时使用 `AggregateRoot`。
//!
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::audit::AuditInfo;
use crate::domain_event::DomainEvent;
use crate::error::{DomainError, DomainResult, ensure_valid};
use crate::value_object::Version;

/// 实体标识
pub trait EntityId:
    Clone + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static
{
    /// 生成新的唯一标识
    fn generate() -> Self;

    /// 是否为零值/空值
    fn is_nil(&self) -> bool;
}

impl EntityId for Uuid {
    fn generate() -> Self {
        Uuid::now_v7()
    }

    fn is_nil(&self) -> bool {
        Uuid::is_nil(self)
    }
}

impl EntityId for String {
    fn generate() -> Self {
        Uuid::now_v7().to_string()
    }

    fn is_nil(&self) -> bool {
        self.trim().is_empty()
    }
}

/// 校验外部传入的标识
pub fn ensure_id<I: EntityId>(id: I) -> DomainResult<I> {
    if id.is_nil() {
        return Err(DomainError::invalid_id(format!(
            "{} must not be empty",
            std::any::type_name::<I>()
        )));
    }
    Ok(id)
}

/// 具备唯一标识、版本与不变式的实体抽象
#[async_trait]
pub trait Entity: Send + Sync {
    type Id: EntityId;

    fn id(&self) -> &Self::Id;

    /// 当前版本（用于乐观锁与并发控制）
    fn version(&self) -> Version;

    /// 返回全部违例信息；组合其他实体时须合并其结果
    fn check_invariants(&self) -> Vec<String> {
        Vec::new()
    }

    /// 需要 I/O 的不变式（如唯一性）；默认仍执行同步检查
    async fn check_invariants_async(&self, token: &CancellationToken) -> DomainResult<Vec<String>> {
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        Ok(self.check_invariants())
    }

    /// 存在违例时返回携带全部信息的 `DomainError::Validation`
    fn enforce_invariants(&self) -> DomainResult<()> {
        ensure_valid(self.check_invariants())
    }

    async fn enforce_invariants_async(&self, token: &CancellationToken) -> DomainResult<()> {
        ensure_valid(self.check_invariants_async(token).await?)
    }
}

/// 实体基础状态，由具体实体以字段形式组合
#[derive(Debug, Clone)]
pub struct EntityBase<I, E> {
    id: I,
    version: Version,
    audit: AuditInfo,
    pending_events: Vec<E>,
}

impl<I, E> EntityBase<I, E>
where
    I: EntityId,
    E: DomainEvent,
{
    /// 使用新生成的标识创建
    pub fn new() -> Self {
        Self {
            id: I::generate(),
            version: Version::new(),
            audit: AuditInfo::default(),
            pending_events: Vec::new(),
        }
    }

    /// 使用给定标识创建；空标识被拒绝
    pub fn with_id(id: I) -> DomainResult<Self> {
        Ok(Self {
            id: ensure_id(id)?,
            ..Self::new()
        })
    }

    /// 从持久化状态恢复，不带待发布事件
    pub fn restore(id: I, version: Version, audit: AuditInfo) -> DomainResult<Self> {
        Ok(Self {
            id: ensure_id(id)?,
            version,
            audit,
            pending_events: Vec::new(),
        })
    }

    pub fn id(&self) -> &I {
        &self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    /// 供外部审计协作方写入
    pub fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }

    /// 版本加一，在一次变更提交时调用
    pub fn increment_version(&mut self) {
        self.version = self.version.next();
    }

    pub fn domain_events(&self) -> &[E] {
        &self.pending_events
    }

    pub fn add_domain_event(&mut self, event: E) {
        self.pending_events.push(event);
    }

    /// 按事件标识移除，返回被移除的事件
    pub fn remove_domain_event(&mut self, event_id: Uuid) -> Option<E> {
        let index = self
            .pending_events
            .iter()
            .position(|e| e.event_id() == event_id)?;
        Some(self.pending_events.remove(index))
    }

    pub fn clear_domain_events(&mut self) {
        self.pending_events.clear();
    }

    /// 取出并清空待发布事件
    pub fn take_domain_events(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending_events)
    }

    /// 基础层没有自身的不变式
    pub fn check_invariants(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<I, E> Default for EntityBase<I, E>
where
    I: EntityId,
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}
