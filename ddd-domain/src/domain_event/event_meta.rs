use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件元数据
///
/// `event_id` 每次创建都重新生成；`occurred_on` 默认为创建时刻，可注入固定时间便于测试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventMeta {
    event_id: Uuid,
    occurred_on: DateTime<Utc>,
}

impl EventMeta {
    pub fn new() -> Self {
        Self::occurred_at(Utc::now())
    }

    pub fn occurred_at(occurred_on: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_on,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_on(&self) -> DateTime<Utc> {
        self.occurred_on
    }
}

impl Default for EventMeta {
    fn default() -> Self {
        Self::new()
    }
}
