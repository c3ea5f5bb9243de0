//! 审计信息（Audit）
//!
//! 创建/最后修改的时间与操作者由外部协作方（`AuditProvider`）提供，实体自身从不计算。
//! 典型用法是仓储在提交前调用 `stamp_created` / `stamp_modified`。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 审计时间与操作者的提供方
pub trait AuditProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 当前操作者，未知时为 `None`
    fn current_actor(&self) -> Option<String>;
}

/// 使用系统时钟的默认提供方
#[derive(Debug, Clone, Default)]
pub struct SystemAuditProvider {
    actor: Option<String>,
}

impl SystemAuditProvider {
    pub fn new(actor: Option<String>) -> Self {
        Self { actor }
    }
}

impl AuditProvider for SystemAuditProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn current_actor(&self) -> Option<String> {
        self.actor.clone()
    }
}

/// 审计字段
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    created_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    last_modified_at: Option<DateTime<Utc>>,
    last_modified_by: Option<String>,
}

impl AuditInfo {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified_at
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.last_modified_by.as_deref()
    }

    /// 记录创建信息，已记录过时保持首次的值
    pub fn stamp_created(&mut self, provider: &dyn AuditProvider) {
        if self.created_at.is_some() {
            return;
        }
        let now = provider.now();
        let actor = provider.current_actor();
        self.created_at = Some(now);
        self.created_by = actor.clone();
        self.last_modified_at = Some(now);
        self.last_modified_by = actor;
    }

    pub fn stamp_modified(&mut self, provider: &dyn AuditProvider) {
        self.last_modified_at = Some(provider.now());
        self.last_modified_by = provider.current_actor();
    }
}
