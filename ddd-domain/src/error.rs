//! 领域层统一错误定义
//!
//! 区分三类领域失败：
//! - 单条业务规则违例（`BusinessRule`）；
//! - 一次不变式校验汇总得到的全部违例（`Validation`，`BusinessRule` 的细化）；
//! - 实体不存在（`NotFound`，携带实体类型与标识）。
//!
//! 核心从不捕获或吞掉这些错误，而是同步返回给直接调用方，由应用层决定如何呈现。
//!
use std::fmt;
use std::ops::Deref;

use thiserror::Error;

use crate::aggregate::Aggregate;

/// 非空、有序的校验错误列表
///
/// 只能由非空 `Vec<String>` 构造，保证 `DomainError::Validation` 永远携带至少一条信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    /// 列表为空时返回 `None`
    pub fn new(errors: Vec<String>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for ValidationErrors {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl IntoIterator for ValidationErrors {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // --- 领域规则 ---
    #[error("business rule violated: {rule}")]
    BusinessRule { rule: String },
    #[error("domain validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("entity not found: type={entity_type}, id={id}")]
    NotFound { entity_type: String, id: String },

    // --- 标识与并发 ---
    #[error("invalid entity id: {reason}")]
    InvalidId { reason: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: usize, actual: usize },
    #[error("operation cancelled")]
    Cancelled,

    // --- 建模错误 ---
    #[error("value object {type_name} exposes no equality components")]
    EmptyEqualityComponents { type_name: &'static str },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn business_rule(rule: impl Into<String>) -> Self {
        Self::BusinessRule { rule: rule.into() }
    }

    /// 由一次不变式检查的结果构造；结果为空时返回 `None`
    pub fn validation(errors: Vec<String>) -> Option<Self> {
        ValidationErrors::new(errors).map(Self::Validation)
    }

    pub fn not_found<A: Aggregate>(id: &A::Id) -> Self {
        Self::NotFound {
            entity_type: A::TYPE.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_id(reason: impl Into<String>) -> Self {
        Self::InvalidId {
            reason: reason.into(),
        }
    }

    /// `Validation` 是 `BusinessRule` 的细化，两者都视为业务规则违例
    pub fn is_business_rule_violation(&self) -> bool {
        matches!(self, Self::BusinessRule { .. } | Self::Validation(_))
    }

    /// 校验失败时返回全部错误信息
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::Validation(errors) => Some(errors.as_slice()),
            _ => None,
        }
    }
}

/// 将一次不变式检查的结果转换为 `DomainResult`，保留全部信息与顺序
pub fn ensure_valid(errors: Vec<String>) -> DomainResult<()> {
    match DomainError::validation(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::InvalidId {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_list_is_not_a_validation_failure() {
        assert!(ValidationErrors::new(vec![]).is_none());
        assert!(DomainError::validation(vec![]).is_none());
        assert!(ensure_valid(vec![]).is_ok());
    }

    #[test]
    fn validation_keeps_every_message_in_order() {
        let err = ensure_valid(vec![
            "Name cannot be empty".to_string(),
            "Description too long".to_string(),
        ])
        .unwrap_err();

        assert_eq!(
            err.validation_errors().unwrap(),
            ["Name cannot be empty", "Description too long"]
        );
        assert_eq!(
            err.to_string(),
            "domain validation failed: Name cannot be empty; Description too long"
        );
    }

    #[test]
    fn validation_is_a_business_rule_violation() {
        let rule = DomainError::business_rule("cannot ship a cancelled order");
        let validation = DomainError::validation(vec!["x".into()]).unwrap();
        let missing = DomainError::NotFound {
            entity_type: "skill".into(),
            id: "42".into(),
        };

        assert!(rule.is_business_rule_violation());
        assert!(validation.is_business_rule_violation());
        assert!(!missing.is_business_rule_violation());
        assert!(rule.validation_errors().is_none());
        assert_eq!(missing.to_string(), "entity not found: type=skill, id=42");
    }

    #[test]
    fn uuid_parse_errors_become_invalid_id() {
        let err: DomainError = "not-a-uuid".parse::<uuid::Uuid>().unwrap_err().into();
        assert!(matches!(err, DomainError::InvalidId { .. }));
    }
}
