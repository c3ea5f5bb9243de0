//! 领域服务（Domain Service）
//!
//! 不变式检查有时需要聚合之外的信息（例如名称唯一性需要查询仓储）。
//! 这类检查以 `InvariantValidator` 端口的形式在构造 `AggregateRoot` 时注入，
//! 而不是硬编码在聚合内部。
//!
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::DomainResult;

/// 异步不变式校验端口
#[async_trait]
pub trait InvariantValidator<A>: Send + Sync {
    /// 校验名称，用于日志
    fn name(&self) -> &str;

    /// 对候选状态进行校验，返回全部违例信息
    async fn validate(&self, candidate: &A, token: &CancellationToken) -> DomainResult<Vec<String>>;
}

#[async_trait]
impl<A, T> InvariantValidator<A> for Arc<T>
where
    A: Sync,
    T: InvariantValidator<A> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn validate(&self, candidate: &A, token: &CancellationToken) -> DomainResult<Vec<String>> {
        (**self).validate(candidate, token).await
    }
}
