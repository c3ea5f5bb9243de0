//! 聚合根运行时（AggregateRoot）
//!
//! 包装一个聚合状态 `A`，提供：
//! - 不可变的标识与单调递增的版本；
//! - 线程安全的待发布事件列表：追加、移除、清空与版本递增在同一把实例锁内完成；
//! - 事件溯源式的 `apply`：事件先应用到候选状态，校验通过后才与版本、事件列表一起提交；
//! - 同步与异步两条不变式校验路径，异步路径可通过 `CancellationToken` 取消。
//!
//! 锁只作用于单个实例，不同聚合之间互不竞争；跨聚合的原子性由外部工作单元负责。
//!
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::audit::{AuditInfo, AuditProvider};
use crate::domain_event::DomainEvent;
use crate::domain_service::InvariantValidator;
use crate::entity::{Entity, EntityId, ensure_id};
use crate::error::{DomainError, DomainResult, ensure_valid};
use crate::value_object::Version;

/// 聚合根配置
#[derive(Builder, Debug, Clone)]
pub struct AggregateConfig {
    /// 异步提交路径的乐观重试次数
    #[builder(default = 8)]
    max_commit_attempts: usize,
    /// 软删除未指定操作者时使用的默认操作者
    #[builder(into, default = String::from("system"))]
    system_actor: String,
}

impl AggregateConfig {
    pub fn max_commit_attempts(&self) -> usize {
        self.max_commit_attempts
    }

    pub fn system_actor(&self) -> &str {
        &self.system_actor
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

struct RootState<A: Aggregate> {
    state: A,
    version: Version,
    audit: AuditInfo,
    pending_events: Vec<A::Event>,
}

/// 线程安全的聚合根
pub struct AggregateRoot<A: Aggregate> {
    id: A::Id,
    config: AggregateConfig,
    validators: Vec<Arc<dyn InvariantValidator<A>>>,
    inner: Mutex<RootState<A>>,
    /// 异步提交闸门：串行化 `execute_async` 从决定到提交的全过程
    commit_gate: tokio::sync::Mutex<()>,
}

impl<A: Aggregate> AggregateRoot<A> {
    /// 使用新生成的标识创建聚合根
    pub fn new(state: A) -> Self {
        Self::build(A::Id::generate(), state, Version::new())
    }

    /// 使用给定标识创建；空标识被拒绝
    pub fn with_id(id: A::Id, state: A) -> DomainResult<Self> {
        Ok(Self::build(ensure_id(id)?, state, Version::new()))
    }

    /// 通过回放历史事件重建状态，版本等于事件数量，不产生待发布事件
    pub fn from_history<I>(id: A::Id, initial: A, history: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = A::Event>,
    {
        let id = ensure_id(id)?;
        let mut state = initial;
        let mut version = Version::new();
        for event in history {
            state.apply(&event)?;
            version = version.next();
        }
        trace!(aggregate_type = A::TYPE, aggregate_id = %id, %version, "aggregate rehydrated");
        Ok(Self::build(id, state, version))
    }

    fn build(id: A::Id, state: A, version: Version) -> Self {
        Self {
            id,
            config: AggregateConfig::default(),
            validators: Vec::new(),
            inner: Mutex::new(RootState {
                state,
                version,
                audit: AuditInfo::default(),
                pending_events: Vec::new(),
            }),
            commit_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: AggregateConfig) -> Self {
        self.config = config;
        self
    }

    /// 注入异步不变式校验端口
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: InvariantValidator<A> + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    pub fn id(&self) -> &A::Id {
        &self.id
    }

    pub fn version(&self) -> Version {
        self.inner.lock().version
    }

    pub fn audit(&self) -> AuditInfo {
        self.inner.lock().audit.clone()
    }

    pub fn stamp_created(&self, provider: &dyn AuditProvider) {
        self.inner.lock().audit.stamp_created(provider);
    }

    pub fn stamp_modified(&self, provider: &dyn AuditProvider) {
        self.inner.lock().audit.stamp_modified(provider);
    }

    /// 在锁内读取当前状态
    pub fn read<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.inner.lock().state)
    }

    pub fn snapshot(&self) -> A {
        self.inner.lock().state.clone()
    }

    /// 待发布事件的快照，按提交顺序排列
    pub fn domain_events(&self) -> Vec<A::Event> {
        self.inner.lock().pending_events.clone()
    }

    pub fn has_domain_events(&self) -> bool {
        !self.inner.lock().pending_events.is_empty()
    }

    /// 记录事件并递增版本（不调用 `apply`）
    pub fn add_domain_event(&self, event: A::Event) {
        let mut inner = self.inner.lock();
        inner.pending_events.push(event);
        inner.version = inner.version.next();
        trace!(aggregate_type = A::TYPE, aggregate_id = %self.id, version = %inner.version, "domain event recorded");
    }

    /// 按事件标识移除；版本不回退
    pub fn remove_domain_event(&self, event_id: Uuid) -> Option<A::Event> {
        let mut inner = self.inner.lock();
        let index = inner
            .pending_events
            .iter()
            .position(|e| e.event_id() == event_id)?;
        Some(inner.pending_events.remove(index))
    }

    pub fn clear_domain_events(&self) {
        self.inner.lock().pending_events.clear();
    }

    /// 原子地取出并清空待发布事件，供发布方在事务成功后调用
    pub fn take_domain_events(&self) -> Vec<A::Event> {
        std::mem::take(&mut self.inner.lock().pending_events)
    }

    /// 应用事件、校验不变式并提交
    ///
    /// 任一步失败时状态、版本与事件列表都保持不变。
    pub fn add_and_apply_event(&self, event: A::Event) -> DomainResult<()> {
        self.execute(move |_| Ok(vec![event])).map(|_| ())
    }

    /// 在锁内根据当前状态决定事件，应用到候选状态并校验，全部通过后一次性提交
    ///
    /// 决定结果为空时不做任何修改。返回已提交的事件。
    pub fn execute<F>(&self, decide: F) -> DomainResult<Vec<A::Event>>
    where
        F: FnOnce(&A) -> DomainResult<Vec<A::Event>>,
    {
        let mut inner = self.inner.lock();
        let events = decide(&inner.state)?;
        if events.is_empty() {
            return Ok(events);
        }

        let candidate = apply_all(&inner.state, &events)?;
        if let Err(err) = ensure_valid(candidate.check_invariants()) {
            self.log_rejected(&err);
            return Err(err);
        }

        self.commit(&mut inner, candidate, &events);
        Ok(events)
    }

    /// `add_and_apply_event` 的异步版本，使用异步不变式路径
    pub async fn add_and_apply_event_async(
        &self,
        event: A::Event,
        token: &CancellationToken,
    ) -> DomainResult<()> {
        self.execute_async(move |_| Ok(vec![event.clone()]), token)
            .await
            .map(|_| ())
    }

    /// `execute` 的异步版本
    ///
    /// 异步调用方在实例的提交闸门上排队，持有闸门直到提交结束；
    /// 校验期间不持有状态锁。若校验期间有同步 `execute` 推进了版本则重新决定，
    /// 最多尝试 `max_commit_attempts` 次后返回 `VersionConflict`。
    /// 取消只会发生在修改状态之前。
    pub async fn execute_async<F>(
        &self,
        decide: F,
        token: &CancellationToken,
    ) -> DomainResult<Vec<A::Event>>
    where
        F: Fn(&A) -> DomainResult<Vec<A::Event>> + Send + Sync,
    {
        let attempts = self.config.max_commit_attempts.max(1);
        let mut conflict = (Version::new(), Version::new());

        let _gate = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(DomainError::Cancelled),
            gate = self.commit_gate.lock() => gate,
        };

        for attempt in 1..=attempts {
            if token.is_cancelled() {
                return Err(DomainError::Cancelled);
            }

            let Some((base, events, candidate)) = self.prepare(&decide)? else {
                return Ok(Vec::new());
            };

            let errors = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(DomainError::Cancelled),
                result = self.collect_async_violations(&candidate, token) => result?,
            };
            if let Err(err) = ensure_valid(errors) {
                self.log_rejected(&err);
                return Err(err);
            }

            match self.try_commit(base, candidate, &events, token)? {
                Ok(()) => return Ok(events),
                Err(actual) => {
                    debug!(
                        aggregate_type = A::TYPE,
                        aggregate_id = %self.id,
                        attempt,
                        expected = %base,
                        actual = %actual,
                        "synchronous commit interleaved, retrying"
                    );
                    conflict = (base, actual);
                }
            }
        }

        Err(DomainError::VersionConflict {
            expected: conflict.0.value(),
            actual: conflict.1.value(),
        })
    }

    fn prepare<F>(&self, decide: &F) -> DomainResult<Option<(Version, Vec<A::Event>, A)>>
    where
        F: Fn(&A) -> DomainResult<Vec<A::Event>>,
    {
        let inner = self.inner.lock();
        let events = decide(&inner.state)?;
        if events.is_empty() {
            return Ok(None);
        }
        let candidate = apply_all(&inner.state, &events)?;
        Ok(Some((inner.version, events, candidate)))
    }

    /// 版本未变化时提交；否则返回当前版本
    fn try_commit(
        &self,
        base: Version,
        candidate: A,
        events: &[A::Event],
        token: &CancellationToken,
    ) -> DomainResult<Result<(), Version>> {
        let mut inner = self.inner.lock();
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if inner.version != base {
            return Ok(Err(inner.version));
        }
        self.commit(&mut inner, candidate, events);
        Ok(Ok(()))
    }

    fn commit(&self, inner: &mut RootState<A>, candidate: A, events: &[A::Event]) {
        inner.state = candidate;
        for event in events {
            inner.pending_events.push(event.clone());
            inner.version = inner.version.next();
        }
        debug!(
            aggregate_type = A::TYPE,
            aggregate_id = %self.id,
            version = %inner.version,
            events = events.len(),
            "events committed"
        );
    }

    async fn collect_async_violations(
        &self,
        candidate: &A,
        token: &CancellationToken,
    ) -> DomainResult<Vec<String>> {
        let mut errors = candidate.check_invariants_async(token).await?;
        for validator in &self.validators {
            let found = validator.validate(candidate, token).await?;
            if !found.is_empty() {
                debug!(
                    aggregate_type = A::TYPE,
                    validator = validator.name(),
                    violations = found.len(),
                    "validator reported violations"
                );
            }
            errors.extend(found);
        }
        Ok(errors)
    }

    fn log_rejected(&self, err: &DomainError) {
        warn!(
            aggregate_type = A::TYPE,
            aggregate_id = %self.id,
            error = %err,
            "change rejected by invariants"
        );
    }
}

fn apply_all<A: Aggregate>(state: &A, events: &[A::Event]) -> DomainResult<A> {
    let mut candidate = state.clone();
    for event in events {
        candidate.apply(event)?;
    }
    Ok(candidate)
}

#[async_trait]
impl<A: Aggregate> Entity for AggregateRoot<A> {
    type Id = A::Id;

    fn id(&self) -> &A::Id {
        &self.id
    }

    fn version(&self) -> Version {
        AggregateRoot::version(self)
    }

    fn check_invariants(&self) -> Vec<String> {
        self.inner.lock().state.check_invariants()
    }

    async fn check_invariants_async(&self, token: &CancellationToken) -> DomainResult<Vec<String>> {
        if token.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        let snapshot = self.snapshot();
        self.collect_async_violations(&snapshot, token).await
    }
}

impl<A: Aggregate> fmt::Debug for AggregateRoot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("AggregateRoot")
            .field("type", &A::TYPE)
            .field("id", &self.id)
            .field("version", &inner.version)
            .field("pending_events", &inner.pending_events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::{EventMeta, FieldChanged};
    use ddd_macros::domain_event;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default)]
    struct Counter {
        value: i64,
        limit: i64,
    }

    #[domain_event(version = 1)]
    enum CounterEvent {
        Added { amount: i64 },
        LimitChanged { change: FieldChanged<i64> },
        #[event(event_type = "counter.broken")]
        Broken {},
    }

    impl Aggregate for Counter {
        const TYPE: &'static str = "counter";
        type Id = String;
        type Event = CounterEvent;

        fn apply(&mut self, event: &CounterEvent) -> DomainResult<()> {
            match event {
                CounterEvent::Added { amount, .. } => self.value += amount,
                CounterEvent::LimitChanged { change, .. } => self.limit = change.new,
                CounterEvent::Broken { .. } => {
                    return Err(DomainError::business_rule("counter cannot break"));
                }
            }
            Ok(())
        }

        fn check_invariants(&self) -> Vec<String> {
            let mut errors = Vec::new();
            if self.value < 0 {
                errors.push("value must not be negative".to_string());
            }
            if self.value > self.limit {
                errors.push("value exceeds limit".to_string());
            }
            errors
        }
    }

    fn added(amount: i64) -> CounterEvent {
        CounterEvent::Added {
            meta: EventMeta::new(),
            amount,
        }
    }

    fn counter(limit: i64) -> AggregateRoot<Counter> {
        AggregateRoot::new(Counter { value: 0, limit })
    }

    #[test]
    fn new_root_has_id_and_zero_version() {
        let root = counter(10);
        assert!(!root.id().is_nil());
        assert!(root.version().is_new());
        assert!(!root.has_domain_events());
        assert!(AggregateRoot::with_id(String::new(), Counter::default()).is_err());
    }

    #[test]
    fn add_domain_event_increments_version_per_event() {
        let root = counter(10);
        root.add_domain_event(added(1));
        root.add_domain_event(added(2));

        assert_eq!(root.version().value(), 2);
        assert_eq!(root.domain_events().len(), 2);
        // 仅记录，不应用
        assert_eq!(root.read(|s| s.value), 0);
    }

    #[test]
    fn add_and_apply_commits_state_event_and_version_together() {
        let root = counter(10);
        root.add_and_apply_event(added(4)).unwrap();

        assert_eq!(root.read(|s| s.value), 4);
        assert_eq!(root.version().value(), 1);
        let events = root.domain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "CounterEvent.Added");
    }

    #[test]
    fn failing_apply_leaves_no_trace() {
        let root = counter(10);
        let err = root
            .add_and_apply_event(CounterEvent::Broken {
                meta: EventMeta::new(),
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::BusinessRule { .. }));
        assert!(root.version().is_new());
        assert!(!root.has_domain_events());
    }

    #[test]
    fn invariant_violation_rolls_back_the_change() {
        let root = counter(5);
        root.add_and_apply_event(added(3)).unwrap();

        let err = root.add_and_apply_event(added(10)).unwrap_err();
        assert_eq!(err.validation_errors().unwrap(), ["value exceeds limit"]);
        assert_eq!(root.read(|s| s.value), 3);
        assert_eq!(root.version().value(), 1);
        assert_eq!(root.domain_events().len(), 1);
    }

    #[test]
    fn execute_commits_a_batch_atomically() {
        let root = counter(100);
        let events = root
            .execute(|state| {
                let change = FieldChanged::new(state.limit, 200);
                Ok(vec![
                    CounterEvent::LimitChanged {
                        meta: EventMeta::new(),
                        change,
                    },
                    added(150),
                ])
            })
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(root.version().value(), 2);
        assert_eq!(root.read(|s| (s.value, s.limit)), (150, 200));
    }

    #[test]
    fn execute_without_events_is_a_no_op() {
        let root = counter(10);
        let events = root.execute(|_| Ok(vec![])).unwrap();
        assert!(events.is_empty());
        assert!(root.version().is_new());
    }

    #[test]
    fn remove_clear_and_take_keep_version() {
        let root = counter(10);
        root.add_and_apply_event(added(1)).unwrap();
        root.add_and_apply_event(added(1)).unwrap();
        root.add_and_apply_event(added(1)).unwrap();

        let first = root.domain_events()[0].event_id();
        assert!(root.remove_domain_event(first).is_some());
        assert!(root.remove_domain_event(first).is_none());
        assert_eq!(root.domain_events().len(), 2);

        let drained = root.take_domain_events();
        assert_eq!(drained.len(), 2);
        assert!(!root.has_domain_events());

        root.add_and_apply_event(added(1)).unwrap();
        root.clear_domain_events();
        assert!(!root.has_domain_events());
        assert_eq!(root.version().value(), 4);
    }

    #[test]
    fn from_history_replays_without_pending_events() {
        let history = vec![added(1), added(2), added(3)];
        let root =
            AggregateRoot::from_history("c-1".to_string(), Counter { value: 0, limit: 10 }, history)
                .unwrap();

        assert_eq!(root.version().value(), 3);
        assert_eq!(root.read(|s| s.value), 6);
        assert!(!root.has_domain_events());
    }

    #[test]
    fn concurrent_adds_are_serialized() {
        let root = counter(10_000);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        root.add_and_apply_event(added(1)).unwrap();
                    }
                });
            }
        });

        assert_eq!(root.version().value(), 400);
        assert_eq!(root.domain_events().len(), 400);
        assert_eq!(root.read(|s| s.value), 400);
    }

    struct CountingValidator {
        calls: AtomicUsize,
        forbidden: i64,
    }

    #[async_trait]
    impl InvariantValidator<Counter> for CountingValidator {
        fn name(&self) -> &str {
            "counting"
        }

        async fn validate(
            &self,
            candidate: &Counter,
            _token: &CancellationToken,
        ) -> DomainResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if candidate.value == self.forbidden {
                Ok(vec![format!("value {} is reserved", self.forbidden)])
            } else {
                Ok(vec![])
            }
        }
    }

    #[tokio::test]
    async fn async_path_merges_injected_validators() {
        let validator = Arc::new(CountingValidator {
            calls: AtomicUsize::new(0),
            forbidden: 7,
        });
        let root = counter(5).with_validator(validator.clone());
        let token = CancellationToken::new();

        root.add_and_apply_event_async(added(2), &token).await.unwrap();
        let err = root
            .add_and_apply_event_async(added(5), &token)
            .await
            .unwrap_err();

        assert_eq!(
            err.validation_errors().unwrap(),
            ["value exceeds limit", "value 7 is reserved"]
        );
        assert_eq!(root.version().value(), 1);
        assert_eq!(validator.calls.load(Ordering::SeqCst), 2);

        assert!(root.enforce_invariants_async(&token).await.is_ok());
    }

    /// 校验时先通知测试方，再等待放行
    struct PausingValidator {
        entered: Arc<tokio::sync::Notify>,
        proceed: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl InvariantValidator<Counter> for PausingValidator {
        fn name(&self) -> &str {
            "pausing"
        }

        async fn validate(
            &self,
            _candidate: &Counter,
            _token: &CancellationToken,
        ) -> DomainResult<Vec<String>> {
            self.entered.notify_one();
            self.proceed.notified().await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn sync_commit_during_async_validation_exhausts_attempts() {
        let entered = Arc::new(tokio::sync::Notify::new());
        let proceed = Arc::new(tokio::sync::Notify::new());
        let root = counter(100)
            .with_config(AggregateConfig::builder().max_commit_attempts(1).build())
            .with_validator(PausingValidator {
                entered: Arc::clone(&entered),
                proceed: Arc::clone(&proceed),
            });
        let token = CancellationToken::new();

        let (async_result, sync_result) = tokio::join!(
            root.add_and_apply_event_async(added(10), &token),
            async {
                entered.notified().await;
                let result = root.add_and_apply_event(added(3));
                proceed.notify_one();
                result
            }
        );

        sync_result.unwrap();
        assert_eq!(
            async_result.unwrap_err(),
            DomainError::VersionConflict {
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(root.read(|s| s.value), 3);
        assert_eq!(root.version().value(), 1);
        assert_eq!(root.domain_events().len(), 1);
    }

    #[tokio::test]
    async fn interleaved_sync_commit_is_retried_against_fresh_state() {
        let entered = Arc::new(tokio::sync::Notify::new());
        let proceed = Arc::new(tokio::sync::Notify::new());
        let root = counter(100).with_validator(PausingValidator {
            entered: Arc::clone(&entered),
            proceed: Arc::clone(&proceed),
        });
        let token = CancellationToken::new();

        let (async_result, sync_result) = tokio::join!(
            root.execute_async(
                |state| {
                    let change = FieldChanged::new(state.limit, state.value + 50);
                    Ok(vec![CounterEvent::LimitChanged {
                        meta: EventMeta::new(),
                        change,
                    }])
                },
                &token,
            ),
            async {
                entered.notified().await;
                let result = root.add_and_apply_event(added(3));
                // 第二次尝试同样会进入校验，提前放行
                proceed.notify_one();
                entered.notified().await;
                proceed.notify_one();
                result
            }
        );

        sync_result.unwrap();
        let events = async_result.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(root.read(|s| (s.value, s.limit)), (3, 53));
        assert_eq!(root.version().value(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_async_adds_queue_instead_of_conflicting() {
        struct Sleepy;

        #[async_trait]
        impl InvariantValidator<Counter> for Sleepy {
            fn name(&self) -> &str {
                "sleepy"
            }

            async fn validate(
                &self,
                _candidate: &Counter,
                _token: &CancellationToken,
            ) -> DomainResult<Vec<String>> {
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                Ok(vec![])
            }
        }

        let root = Arc::new(counter(1_000).with_validator(Sleepy));
        let token = CancellationToken::new();

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let root = Arc::clone(&root);
                let token = token.clone();
                tokio::spawn(async move { root.add_and_apply_event_async(added(1), &token).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(root.version().value(), 100);
        assert_eq!(root.domain_events().len(), 100);
        assert_eq!(root.read(|s| s.value), 100);
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_mutation() {
        let root = counter(5);
        let token = CancellationToken::new();
        token.cancel();

        let err = root
            .add_and_apply_event_async(added(1), &token)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Cancelled);
        assert!(root.version().is_new());
        assert!(!root.has_domain_events());
    }

    #[test]
    fn config_defaults() {
        let config = AggregateConfig::default();
        assert_eq!(config.max_commit_attempts(), 8);
        assert_eq!(config.system_actor(), "system");

        let custom = AggregateConfig::builder()
            .max_commit_attempts(2)
            .system_actor("batch-job")
            .build();
        let root = counter(1).with_config(custom);
        assert_eq!(root.config().system_actor(), "batch-job");
    }
}
