use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use uuid::Uuid;

use super::event_meta::EventMeta;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件一经创建即不可变；每个实例都有唯一的 `event_id`，即便载荷完全相同。
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件元数据（标识与发生时间）
    fn meta(&self) -> &EventMeta;

    /// 事件类型（形如 `SkillEvent.Renamed` 或自定义类型名）
    fn event_type(&self) -> &str;

    /// 事件载荷版本（用于版本兼容）
    fn event_version(&self) -> usize;

    /// 事件唯一标识
    fn event_id(&self) -> Uuid {
        self.meta().event_id()
    }

    /// 事件发生时间
    fn occurred_on(&self) -> DateTime<Utc> {
        self.meta().occurred_on()
    }
}
