use ddd_domain::value_object::ValueObject;
use ddd_macros::value_object;
use std::collections::HashSet;

#[value_object]
struct Amount {
    value: i64,
}

#[value_object]
struct Address {
    street: String,
    city: String,
    zip: Option<String>,
}

#[value_object(debug = false)]
struct NonDebugVO(i32);

impl std::fmt::Debug for NonDebugVO {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NonDebugVO(..)")
    }
}

#[value_object]
#[derive(Default)]
enum Level {
    #[default]
    Low,
    High,
}

fn main() {
    let _ = format!("{:?}", Amount { value: 0 });

    let a = Amount { value: 7 };
    assert_eq!(a.clone(), Amount { value: 7 });
    assert_ne!(a, Amount { value: 8 });

    let home = Address {
        street: "1 Main St".into(),
        city: "Springfield".into(),
        zip: None,
    };
    let same = home.clone();
    let zipped = Address {
        zip: Some("12345".into()),
        ..home.clone()
    };
    assert_eq!(home, same);
    assert_eq!(home.value_hash(), same.value_hash());
    assert_ne!(home, zipped);
    assert_eq!(home.equality_components().len(), 3);

    let mut set = HashSet::new();
    set.insert(home);
    set.insert(same);
    set.insert(zipped);
    assert_eq!(set.len(), 2);

    assert_eq!(NonDebugVO(1), NonDebugVO(1));

    let lv: Level = Default::default();
    assert_eq!(lv, Level::Low);
    assert_ne!(Level::Low.value_hash(), Level::High.value_hash());
}
