/// Account 聚合示例
/// 演示命令决策、事件回放、不变式回滚、软删除与事件取出
use ddd_domain::aggregate::Aggregate;
use ddd_domain::aggregate_root::{AggregateConfig, AggregateRoot};
use ddd_domain::domain_event::{DomainEvent, EventMeta};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::soft_delete::{Restoration, SoftDeletable, SoftDeleteState, SoftDeletion};
use ddd_domain::specification::InvariantRules;
use ddd_domain::value_object::ValueObject;
use ddd_macros::{domain_event, entity_id, value_object};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ============================================================================
// 领域模型定义
// ============================================================================

#[entity_id]
struct AccountId(Uuid);

#[value_object]
struct Money {
    amount: i64,
    currency: String,
}

impl Money {
    fn cny(amount: i64) -> Self {
        Self {
            amount,
            currency: "CNY".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    balance: Money,
    deletion: SoftDeleteState,
}

#[derive(Debug)]
enum AccountCommand {
    Deposit { amount: i64 },
    Withdraw { amount: i64 },
}

#[domain_event(version = 1)]
enum AccountEvent {
    #[event(event_type = "account.deposited")]
    Deposited { amount: i64 },
    #[event(event_type = "account.withdrawn")]
    Withdrawn { amount: i64 },
    #[event(event_type = "account.closed")]
    Closed { deletion: SoftDeletion },
    #[event(event_type = "account.reopened")]
    Reopened { restoration: Restoration },
}

impl Account {
    fn decide(&self, command: &AccountCommand) -> DomainResult<Vec<AccountEvent>> {
        if self.deletion.is_deleted() {
            return Err(DomainError::business_rule("account is closed"));
        }
        let event = match *command {
            AccountCommand::Deposit { amount } if amount <= 0 => {
                return Err(DomainError::business_rule("deposit must be positive"));
            }
            AccountCommand::Deposit { amount } => AccountEvent::Deposited {
                meta: EventMeta::new(),
                amount,
            },
            AccountCommand::Withdraw { amount } => AccountEvent::Withdrawn {
                meta: EventMeta::new(),
                amount,
            },
        };
        Ok(vec![event])
    }
}

impl Aggregate for Account {
    const TYPE: &'static str = "account";
    type Id = AccountId;
    type Event = AccountEvent;

    fn apply(&mut self, event: &AccountEvent) -> DomainResult<()> {
        match event {
            AccountEvent::Deposited { amount, .. } => self.balance.amount += amount,
            AccountEvent::Withdrawn { amount, .. } => self.balance.amount -= amount,
            AccountEvent::Closed { deletion, .. } => self.deletion.apply_deletion(deletion),
            AccountEvent::Reopened { restoration, .. } => {
                self.deletion.apply_restoration(restoration)
            }
        }
        Ok(())
    }

    fn check_invariants(&self) -> Vec<String> {
        InvariantRules::new()
            .ensure(|a: &Account| a.balance.amount >= 0, "insufficient funds")
            .ensure(|a: &Account| a.balance.currency == "CNY", "unsupported currency")
            .violations(self)
    }
}

impl SoftDeletable for Account {
    fn soft_delete_state(&self) -> &SoftDeleteState {
        &self.deletion
    }

    fn deleted_event(deletion: SoftDeletion) -> AccountEvent {
        AccountEvent::Closed {
            meta: EventMeta::new(),
            deletion,
        }
    }

    fn restored_event(restoration: Restoration) -> AccountEvent {
        AccountEvent::Reopened {
            meta: EventMeta::new(),
            restoration,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Account 聚合示例 ===\n");
    let history = vec![AccountEvent::Deposited {
        meta: EventMeta::new(),
        amount: 1000,
    }];
    let root = AggregateRoot::from_history(
        AccountId::new(Uuid::now_v7()),
        Account {
            balance: Money::cny(0),
            deletion: SoftDeleteState::default(),
        },
        history,
    )?
    .with_config(AggregateConfig::builder().system_actor("teller").build());
    println!("✅ 回放历史: 版本={}, 余额={}", root.version(), root.read(|a| a.balance.amount));

    let token = CancellationToken::new();
    let events = root
        .execute_async(|a| a.decide(&AccountCommand::Deposit { amount: 500 }), &token)
        .await?;
    println!("✅ 存款 +500，产生 {} 个事件", events.len());

    match root.execute(|a| a.decide(&AccountCommand::Withdraw { amount: 5000 })) {
        Err(err) => println!("❌ 取款 -5000 被拒绝: {err}"),
        Ok(_) => println!("取款 -5000 意外成功"),
    }
    println!("   余额保持不变: {}", root.read(|a| a.balance.amount));

    root.execute(|a| a.decide(&AccountCommand::Withdraw { amount: 200 }))?;
    println!("✅ 取款 -200");

    root.mark_deleted(None)?;
    println!("✅ 销户（操作者: {:?}）", root.snapshot().deletion.deleted_by());
    if let Err(err) = root.execute(|a| a.decide(&AccountCommand::Deposit { amount: 1 })) {
        println!("❌ 已销户账户存款被拒绝: {err}");
    }
    root.restore()?;

    let balance = root.read(|a| a.balance.clone());
    println!(
        "\n聚合: id={}, 版本={}, 余额={} {}, 余额等于 1300 CNY: {}",
        root.id(),
        root.version(),
        balance.amount,
        balance.currency,
        balance.value_eq(&Money::cny(1300))
    );

    println!("\n--- 待发布事件 ---");
    for event in root.take_domain_events() {
        println!("{} v{} {}", event.event_type(), event.event_version(), event.event_id());
    }
    Ok(())
}
