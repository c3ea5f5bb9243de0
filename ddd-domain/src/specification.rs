//! 规约（Specification）与不变式规则集
//!
//! 规约封装单条可复用、可组合的业务规则；`InvariantRules` 将一组规约与违例信息
//! 按顺序绑定，一次检查返回全部不满足规则的信息，用于编写 `check_invariants`。
//!

/// 规约模式的核心 trait
pub trait Specification<T> {
    /// 检查候选对象是否满足规约
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// 与另一个规约进行 AND 组合
    fn and<S>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        AndSpecification::new(Box::new(self), Box::new(other))
    }

    /// 与另一个规约进行 OR 组合
    fn or<S>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
        S: Specification<T> + 'static,
    {
        OrSpecification::new(Box::new(self), Box::new(other))
    }

    /// 对规约进行 NOT 操作
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification::new(Box::new(self))
    }
}

/// 使 `Box<dyn Specification<T>>` 可以直接作为规约使用
impl<T> Specification<T> for Box<dyn Specification<T>> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }
}

/// 闭包形式的规约
pub struct Predicate<F>(pub F);

impl<T, F> Specification<T> for Predicate<F>
where
    F: Fn(&T) -> bool,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.0)(candidate)
    }
}

/// AND 组合规约
pub struct AndSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> AndSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }
}

/// OR 组合规约
pub struct OrSpecification<T> {
    left: Box<dyn Specification<T>>,
    right: Box<dyn Specification<T>>,
}

impl<T> OrSpecification<T> {
    pub fn new(left: Box<dyn Specification<T>>, right: Box<dyn Specification<T>>) -> Self {
        Self { left, right }
    }
}

impl<T> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }
}

/// NOT 规约
pub struct NotSpecification<T> {
    inner: Box<dyn Specification<T>>,
}

impl<T> NotSpecification<T> {
    pub fn new(inner: Box<dyn Specification<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }
}

/// 有序的不变式规则集
pub struct InvariantRules<T> {
    rules: Vec<(Box<dyn Specification<T>>, String)>,
}

impl<T> InvariantRules<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// 追加一条规则：不满足 `spec` 时报告 `message`
    pub fn rule<S>(mut self, spec: S, message: impl Into<String>) -> Self
    where
        S: Specification<T> + 'static,
    {
        self.rules.push((Box::new(spec), message.into()));
        self
    }

    /// 以闭包形式追加规则
    pub fn ensure<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.rule(Predicate(predicate), message)
    }

    /// 返回全部不满足规则的信息，顺序与规则声明顺序一致
    pub fn violations(&self, candidate: &T) -> Vec<String> {
        self.rules
            .iter()
            .filter(|(spec, _)| !spec.is_satisfied_by(candidate))
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T> Default for InvariantRules<T> {
    fn default() -> Self {
        Self::new()
    }
}
