use ddd_domain::entity::EntityId;
use ddd_macros::entity_id;
use std::collections::HashSet;
use uuid::Uuid;

#[entity_id]
struct UserId(Uuid);

#[entity_id]
struct Sku(String);

#[entity_id(debug = false)]
struct ProfileId(Uuid);

impl std::fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileId(..)")
    }
}

fn main() {
    let raw = Uuid::new_v4();
    let id = UserId::new(raw);
    let _ = format!("{:?}", id); // 默认启用 Debug
    assert_eq!(id.to_string(), raw.to_string());
    assert_eq!(id.as_ref(), &raw);

    let parsed: UserId = raw.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert_eq!(Uuid::from(parsed), raw);

    // 生成与判空委托给内层类型
    let generated = UserId::generate();
    assert!(!generated.is_nil());
    assert!(UserId::new(Uuid::nil()).is_nil());
    assert!(Sku::from("  ".to_string()).is_nil());
    assert!(!Sku::generate().is_nil());

    let mut seen = HashSet::new();
    seen.insert(UserId::generate());
    seen.insert(UserId::generate());
    assert_eq!(seen.len(), 2);

    let pid = ProfileId::new(Uuid::new_v4());
    assert_eq!(format!("{:?}", pid), "ProfileId(..)");
}
