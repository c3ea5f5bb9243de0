//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的不可变对象。相等性与哈希由有序的“相等性分量”推导：
//! - 两个值对象相等，当且仅当具体类型相同、分量序列逐项相等且顺序一致；
//! - 哈希对每个分量的哈希做顺序敏感的折叠，空分量（`Component::Null`）贡献固定值 0；
//! - 分量序列为空是建模错误，哈希时报错而不是返回常量。
//!
//! 通常通过 `#[value_object]` 宏从字段顺序生成分量，也可以手写 `equality_components`。
//!
use std::any::{Any, type_name};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

const NULL_COMPONENT_HASH: u64 = 0;
const HASH_SEED: u64 = 17;
const HASH_FACTOR: u64 = 0x0000_0100_0000_01b3;

/// 可参与值对象相等性比较的分量
///
/// 对所有 `PartialEq + Hash + Debug` 的 `'static` 类型自动实现。
pub trait EqualityComponent: fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// 仅当另一分量具有相同具体类型且值相等时返回 true
    fn component_eq(&self, other: &dyn EqualityComponent) -> bool;

    fn component_hash(&self) -> u64;
}

impl<T> EqualityComponent for T
where
    T: Any + PartialEq + Hash + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn component_eq(&self, other: &dyn EqualityComponent) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn component_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// 单个相等性分量，`Null` 表示缺省值
#[derive(Debug, Clone, Copy)]
pub enum Component<'a> {
    Null,
    Value(&'a dyn EqualityComponent),
}

impl<'a> Component<'a> {
    pub fn of<T: EqualityComponent>(value: &'a T) -> Self {
        Self::Value(value)
    }

    /// `None` 映射为 `Component::Null`
    pub fn optional<T: EqualityComponent>(value: Option<&'a T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn hash_value(&self) -> u64 {
        match self {
            Self::Null => NULL_COMPONENT_HASH,
            Self::Value(value) => value.component_hash(),
        }
    }
}

impl PartialEq for Component<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Value(left), Self::Value(right)) => left.component_eq(*right),
            _ => false,
        }
    }
}

/// 值对象抽象
pub trait ValueObject: Any + fmt::Debug + Send + Sync {
    /// 有序的相等性分量，至少包含一个
    fn equality_components(&self) -> Vec<Component<'_>>;

    /// 创建值对象时进行业务校验
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }

    /// 分量序列逐项相等
    fn value_eq(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        let left = self.equality_components();
        let right = other.equality_components();
        left.len() == right.len() && left.iter().zip(&right).all(|(l, r)| l == r)
    }

    /// 与任意对象比较：具体类型不同则不相等
    fn value_eq_any(&self, other: &dyn Any) -> bool
    where
        Self: Sized,
    {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| self.value_eq(other))
    }

    /// 顺序敏感地折叠各分量哈希；分量为空时返回错误
    fn try_value_hash(&self) -> DomainResult<u64> {
        let components = self.equality_components();
        if components.is_empty() {
            return Err(DomainError::EmptyEqualityComponents {
                type_name: type_name::<Self>(),
            });
        }
        Ok(components.iter().fold(HASH_SEED, |acc, component| {
            (acc.rotate_left(5) ^ component.hash_value()).wrapping_mul(HASH_FACTOR)
        }))
    }

    /// 供 `Hash` 实现使用的哈希值
    ///
    /// # Panics
    ///
    /// 分量序列为空时 panic：没有分量的值对象无法被区分，属于建模错误。
    fn value_hash(&self) -> u64 {
        match self.try_value_hash() {
            Ok(hash) => hash,
            Err(err) => panic!("{err}"),
        }
    }
}

/// 版本号（用于乐观锁和并发控制）
///
/// 提供类型安全的版本号操作，避免直接使用 usize 导致的语义不明确问题。
///
/// # 示例
///
/// ```
/// use ddd_domain::value_object::Version;
///
/// let v1 = Version::new();
/// assert_eq!(v1.value(), 0);
/// assert!(v1.is_new());
///
/// let v2 = v1.next();
/// assert_eq!(v2.value(), 1);
/// assert!(!v2.is_new());
///
/// assert!(v2 > v1);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(usize);

impl Version {
    /// 创建初始版本（版本号为 0）
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_value(value: usize) -> Self {
        Self(value)
    }

    /// 获取下一个版本号
    ///
    /// ```
    /// use ddd_domain::value_object::Version;
    ///
    /// let v1 = Version::from_value(10);
    /// assert_eq!(v1.next().value(), 11);
    /// ```
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn value(&self) -> usize {
        self.0
    }

    /// 检查是否为初始版本
    pub fn is_new(&self) -> bool {
        self.0 == 0
    }

    /// 检查聚合是否已提交过变更（版本大于零）
    pub fn is_created(&self) -> bool {
        self.0 > 0
    }
}

impl ValueObject for Version {
    fn equality_components(&self) -> Vec<Component<'_>> {
        vec![Component::of(&self.0)]
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<usize> for Version {
    fn from(value: usize) -> Self {
        Self::from_value(value)
    }
}

impl From<Version> for usize {
    fn from(version: Version) -> Self {
        version.value()
    }
}
