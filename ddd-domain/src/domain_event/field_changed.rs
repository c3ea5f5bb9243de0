use serde::{Deserialize, Serialize};

/// 字段变更载荷，记录旧值与新值，供 `apply` 回放
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChanged<T> {
    pub old: T,
    pub new: T,
}

impl<T> FieldChanged<T> {
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }

    pub fn old_value(&self) -> &T {
        &self.old
    }

    pub fn new_value(&self) -> &T {
        &self.new
    }

    pub fn into_new(self) -> T {
        self.new
    }

    /// 反向变更（用于撤销/补偿事件）
    pub fn reversed(self) -> Self {
        Self {
            old: self.new,
            new: self.old,
        }
    }
}

impl<T: PartialEq> FieldChanged<T> {
    pub fn is_changed(&self) -> bool {
        self.old != self.new
    }
}
