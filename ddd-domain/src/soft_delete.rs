//! 软删除（Soft Delete）
//!
//! `SoftDeleteState` 以字段形式组合进实体或聚合状态，记录删除标记、时间与操作者。
//! 删除与恢复都是幂等的：已删除时再次删除、未删除时恢复，均不产生事件也不修改状态。
//!
//! 对聚合根，`mark_deleted` / `restore` 通过 `AggregateRoot::execute` 完成，
//! 与其他状态变更一样参与版本递增、线程安全与不变式校验。
//!
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::aggregate_root::AggregateRoot;
use crate::error::DomainResult;

/// 软删除事件载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeletion {
    pub entity_id: String,
    pub entity_type: String,
    pub deleted_by: String,
    pub deleted_at: DateTime<Utc>,
}

/// 恢复事件载荷，携带此前的删除者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restoration {
    pub entity_id: String,
    pub entity_type: String,
    pub previously_deleted_by: String,
}

/// 软删除状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteState {
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl SoftDeleteState {
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn deleted_by(&self) -> Option<&str> {
        self.deleted_by.as_deref()
    }

    /// 计划删除；已删除时返回 `None`
    pub fn plan_deletion(
        &self,
        entity_id: &dyn Display,
        entity_type: &str,
        actor: Option<&str>,
        default_actor: &str,
        at: DateTime<Utc>,
    ) -> Option<SoftDeletion> {
        if self.is_deleted {
            return None;
        }
        Some(SoftDeletion {
            entity_id: entity_id.to_string(),
            entity_type: entity_type.to_string(),
            deleted_by: actor.unwrap_or(default_actor).to_string(),
            deleted_at: at,
        })
    }

    /// 计划恢复；未删除时返回 `None`
    pub fn plan_restoration(
        &self,
        entity_id: &dyn Display,
        entity_type: &str,
    ) -> Option<Restoration> {
        if !self.is_deleted {
            return None;
        }
        Some(Restoration {
            entity_id: entity_id.to_string(),
            entity_type: entity_type.to_string(),
            previously_deleted_by: self.deleted_by.clone().unwrap_or_default(),
        })
    }

    /// 在 `apply` 中回放删除事件
    pub fn apply_deletion(&mut self, deletion: &SoftDeletion) {
        self.is_deleted = true;
        self.deleted_at = Some(deletion.deleted_at);
        self.deleted_by = Some(deletion.deleted_by.clone());
    }

    /// 在 `apply` 中回放恢复事件
    pub fn apply_restoration(&mut self, _restoration: &Restoration) {
        self.is_deleted = false;
        self.deleted_at = None;
        self.deleted_by = None;
    }

    /// 非聚合实体直接使用：计划并立即应用删除
    pub fn mark_deleted(
        &mut self,
        entity_id: &dyn Display,
        entity_type: &str,
        actor: Option<&str>,
        default_actor: &str,
    ) -> Option<SoftDeletion> {
        let deletion = self.plan_deletion(entity_id, entity_type, actor, default_actor, Utc::now())?;
        self.apply_deletion(&deletion);
        Some(deletion)
    }

    /// 非聚合实体直接使用：计划并立即应用恢复
    pub fn restore(&mut self, entity_id: &dyn Display, entity_type: &str) -> Option<Restoration> {
        let restoration = self.plan_restoration(entity_id, entity_type)?;
        self.apply_restoration(&restoration);
        Some(restoration)
    }

    /// 删除标记与时间、操作者必须同时存在或同时缺失
    pub fn check_invariants(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.is_deleted != self.deleted_at.is_some() {
            errors.push("deleted_at must be set exactly when the entity is deleted".to_string());
        }
        if self.is_deleted != self.deleted_by.is_some() {
            errors.push("deleted_by must be set exactly when the entity is deleted".to_string());
        }
        errors
    }
}

/// 支持软删除的聚合状态
pub trait SoftDeletable: Aggregate {
    fn soft_delete_state(&self) -> &SoftDeleteState;

    /// 将删除载荷包装为聚合自身的事件
    fn deleted_event(deletion: SoftDeletion) -> Self::Event;

    /// 将恢复载荷包装为聚合自身的事件
    fn restored_event(restoration: Restoration) -> Self::Event;
}

impl<A: SoftDeletable> AggregateRoot<A> {
    pub fn is_deleted(&self) -> bool {
        self.read(|state| state.soft_delete_state().is_deleted())
    }

    /// 软删除；`actor` 缺省时使用配置中的系统操作者。返回是否产生了删除事件。
    pub fn mark_deleted(&self, actor: Option<&str>) -> DomainResult<bool> {
        let entity_id = self.id().to_string();
        let default_actor = self.config().system_actor().to_string();
        let events = self.execute(|state| {
            Ok(state
                .soft_delete_state()
                .plan_deletion(&entity_id, A::TYPE, actor, &default_actor, Utc::now())
                .map(A::deleted_event)
                .into_iter()
                .collect())
        })?;
        Ok(!events.is_empty())
    }

    /// 恢复；返回是否产生了恢复事件
    pub fn restore(&self) -> DomainResult<bool> {
        let entity_id = self.id().to_string();
        let events = self.execute(|state| {
            Ok(state
                .soft_delete_state()
                .plan_restoration(&entity_id, A::TYPE)
                .map(A::restored_event)
                .into_iter()
                .collect())
        })?;
        Ok(!events.is_empty())
    }
}
