use super::{calculator, user};
use crate::constants::MAX_EXPENSE_AMOUNT;
use crate::models::{ActivityAction, ExpenseCategory, Group, GroupRole, Split};
use crate::service::{NewExpense, SplitMode};
use crate::{GroupService, InMemoryAuditLogger, InMemoryStorage, SplitLedgerError};
use rust_decimal::Decimal;
use uuid::Uuid;

fn new_expense(paid_by: Uuid, amount: Decimal, split: SplitMode) -> NewExpense {
    NewExpense {
        amount,
        description: "Groceries".to_string(),
        note: None,
        category: Some(ExpenseCategory::Food),
        paid_by,
        expense_date: None,
        split,
    }
}

/// Group with alice (admin), bob and carol, in the given currency.
fn three_person_group(service: &mut GroupService<'_>, currency: &str) -> Group {
    let group = service
        .create_group(
            user(1),
            "Alice".to_string(),
            "House".to_string(),
            None,
            Some(currency.to_string()),
        )
        .unwrap();
    service
        .join_group(user(2), "Bob".to_string(), &group.invite_code)
        .unwrap();
    service
        .join_group(user(3), "Carol".to_string(), &group.invite_code)
        .unwrap()
}

#[test]
fn test_equal_split_puts_remainder_on_first_participant() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    let expense = service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(100_000), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();

    let owed: Vec<Decimal> = expense.splits.iter().map(|s| s.amount).collect();
    assert_eq!(
        owed,
        vec![
            Decimal::from(33_334),
            Decimal::from(33_333),
            Decimal::from(33_333)
        ]
    );
    assert_eq!(expense.split_total(), expense.amount);
    assert_eq!(expense.currency, "VND");

    let total: Decimal = [alice, bob, carol]
        .iter()
        .map(|&u| service.get_user_balance(group.id, alice, u).unwrap())
        .sum();
    assert_eq!(total, Decimal::ZERO);
    assert_eq!(
        service.get_user_balance(group.id, bob, alice).unwrap(),
        Decimal::from(66_666)
    );
}

#[test]
fn test_equal_split_in_cents() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "USD");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    let expense = service
        .add_expense(
            group.id,
            bob,
            new_expense(bob, Decimal::new(1000, 2), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();

    assert_eq!(expense.splits[0].amount, Decimal::new(334, 2));
    assert_eq!(expense.splits[1].amount, Decimal::new(333, 2));
    assert_eq!(expense.splits[2].amount, Decimal::new(333, 2));
    assert_eq!(expense.split_total(), Decimal::new(1000, 2));
}

#[test]
fn test_exact_split_must_match_amount() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob) = (user(1), user(2));

    let short = service.add_expense(
        group.id,
        alice,
        new_expense(
            alice,
            Decimal::from(50_000),
            SplitMode::Exact(vec![
                Split::new(alice, Decimal::from(20_000)),
                Split::new(bob, Decimal::from(20_000)),
            ]),
        ),
    );
    assert!(matches!(short, Err(SplitLedgerError::InvalidSplit(_))));

    let duplicate = service.add_expense(
        group.id,
        alice,
        new_expense(
            alice,
            Decimal::from(50_000),
            SplitMode::Exact(vec![
                Split::new(bob, Decimal::from(25_000)),
                Split::new(bob, Decimal::from(25_000)),
            ]),
        ),
    );
    assert!(matches!(duplicate, Err(SplitLedgerError::InvalidSplit(_))));

    let ok = service
        .add_expense(
            group.id,
            alice,
            new_expense(
                alice,
                Decimal::from(50_000),
                SplitMode::Exact(vec![
                    Split::new(alice, Decimal::from(10_000)),
                    Split::new(bob, Decimal::from(40_000)),
                ]),
            ),
        )
        .unwrap();
    assert_eq!(ok.splits.len(), 2);
    assert_eq!(
        service.get_user_balance(group.id, alice, bob).unwrap(),
        Decimal::from(-40_000)
    );
}

#[test]
fn test_expense_validation() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, stranger) = (user(1), user(2), user(99));

    let fractional = service.add_expense(
        group.id,
        alice,
        new_expense(alice, Decimal::new(10055, 1), SplitMode::Equal(vec![alice, bob])),
    );
    assert!(matches!(fractional, Err(SplitLedgerError::InvalidAmount(_))));

    let zero = service.add_expense(
        group.id,
        alice,
        new_expense(alice, Decimal::ZERO, SplitMode::Equal(vec![alice, bob])),
    );
    assert!(matches!(zero, Err(SplitLedgerError::InvalidAmount(_))));

    let outside_payer = service.add_expense(
        group.id,
        alice,
        new_expense(stranger, Decimal::from(1_000), SplitMode::Equal(vec![alice, bob])),
    );
    assert!(matches!(outside_payer, Err(SplitLedgerError::NotGroupMember(id)) if id == stranger));

    let outside_split = service.add_expense(
        group.id,
        alice,
        new_expense(alice, Decimal::from(1_000), SplitMode::Equal(vec![alice, stranger])),
    );
    assert!(matches!(outside_split, Err(SplitLedgerError::NotGroupMember(id)) if id == stranger));

    let nobody = service.add_expense(
        group.id,
        alice,
        new_expense(alice, Decimal::from(1_000), SplitMode::Equal(vec![])),
    );
    assert!(matches!(nobody, Err(SplitLedgerError::InvalidSplit(_))));

    let by_stranger = service.add_expense(
        group.id,
        stranger,
        new_expense(alice, Decimal::from(1_000), SplitMode::Equal(vec![alice, bob])),
    );
    assert!(matches!(by_stranger, Err(SplitLedgerError::NotGroupMember(_))));
}

#[test]
fn test_archived_group_rejects_expenses() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let alice = user(1);

    service.archive_group(group.id, alice).unwrap();
    let result = service.add_expense(
        group.id,
        alice,
        new_expense(alice, Decimal::from(1_000), SplitMode::Equal(vec![alice])),
    );
    assert!(matches!(result, Err(SplitLedgerError::GroupArchived(_))));
}

#[test]
fn test_deleting_expense_restores_balances() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(30_000), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();
    let before: Vec<Decimal> = [alice, bob, carol]
        .iter()
        .map(|&u| service.get_user_balance(group.id, alice, u).unwrap())
        .collect();

    let taxi = service
        .add_expense(
            group.id,
            carol,
            new_expense(carol, Decimal::from(12_000), SplitMode::Equal(vec![bob, carol])),
        )
        .unwrap();

    let denied = service.delete_expense(group.id, bob, taxi.id);
    assert!(matches!(denied, Err(SplitLedgerError::NotAuthorized(..))));

    let deleted = service.delete_expense(group.id, carol, taxi.id).unwrap();
    assert!(deleted.is_deleted);

    let after: Vec<Decimal> = [alice, bob, carol]
        .iter()
        .map(|&u| service.get_user_balance(group.id, alice, u).unwrap())
        .collect();
    assert_eq!(before, after);

    let twice = service.delete_expense(group.id, alice, taxi.id);
    assert!(matches!(twice, Err(SplitLedgerError::ExpenseAlreadyDeleted(id)) if id == taxi.id));

    let missing = service.delete_expense(group.id, alice, Uuid::new_v4());
    assert!(matches!(missing, Err(SplitLedgerError::ExpenseNotFound(_))));

    let stats = service.get_group_statistics(group.id, bob).unwrap();
    assert_eq!(stats.total_transactions, 1);
    assert_eq!(stats.total_expenses, Decimal::from(30_000));
}

#[test]
fn test_admin_can_delete_any_expense() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    let expense = service
        .add_expense(
            group.id,
            bob,
            new_expense(bob, Decimal::from(6_000), SplitMode::Equal(vec![bob, carol])),
        )
        .unwrap();
    assert!(service.delete_expense(group.id, alice, expense.id).is_ok());
}

#[test]
fn test_group_statistics_through_service() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(300_000), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();

    let stats = service.get_group_statistics(group.id, carol).unwrap();
    assert_eq!(stats.total_expenses, Decimal::from(300_000));
    assert_eq!(stats.total_transactions, 1);
    assert_eq!(stats.average_expense_per_member, Decimal::from(100_000));
    assert_eq!(
        stats.expenses_by_category.get(&ExpenseCategory::Food),
        Some(&Decimal::from(300_000))
    );
    assert_eq!(stats.member_balances[&bob].name, "Bob");
    assert_eq!(stats.member_balances[&bob].balance, Decimal::from(-100_000));
    let sum: Decimal = stats.member_balances.values().map(|b| b.balance).sum();
    assert_eq!(sum, Decimal::ZERO);

    let outsider = service.get_group_statistics(group.id, user(42));
    assert!(matches!(outsider, Err(SplitLedgerError::NotGroupMember(_))));
}

#[test]
fn test_settle_up_following_suggestions() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(90_000), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();
    service
        .add_expense(
            group.id,
            bob,
            new_expense(bob, Decimal::from(30_000), SplitMode::Equal(vec![alice, bob, carol])),
        )
        .unwrap();

    let plan = service.suggest_settlements(group.id, carol).unwrap();
    assert_eq!(plan.len(), 2);
    for transfer in &plan {
        service
            .record_settlement(group.id, transfer.from, transfer.from, transfer.to, transfer.amount)
            .unwrap();
    }

    assert!(!service.has_unsettled_balances(group.id).unwrap());
    assert!(service.suggest_settlements(group.id, alice).unwrap().is_empty());

    let self_pay = service.record_settlement(group.id, alice, alice, alice, Decimal::from(1));
    assert!(matches!(self_pay, Err(SplitLedgerError::SelfSettlement)));
}

#[test]
fn test_amounts_beyond_the_ceiling_are_rejected() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob) = (user(1), user(2));

    // Two maximal shares would overflow while being summed.
    let huge_shares = service.add_expense(
        group.id,
        alice,
        new_expense(
            alice,
            Decimal::from(50_000),
            SplitMode::Exact(vec![
                Split::new(alice, Decimal::MAX),
                Split::new(bob, Decimal::MAX),
            ]),
        ),
    );
    assert!(matches!(huge_shares, Err(SplitLedgerError::InvalidSplit(_))));

    let huge_amount = service.add_expense(
        group.id,
        alice,
        new_expense(
            alice,
            Decimal::MAX - Decimal::ONE,
            SplitMode::Equal(vec![alice, bob]),
        ),
    );
    assert!(matches!(huge_amount, Err(SplitLedgerError::InvalidAmount(_))));

    let over_by_one = service.add_expense(
        group.id,
        alice,
        new_expense(
            alice,
            MAX_EXPENSE_AMOUNT + Decimal::ONE,
            SplitMode::Equal(vec![alice, bob]),
        ),
    );
    assert!(matches!(over_by_one, Err(SplitLedgerError::InvalidAmount(_))));

    // The ceiling itself is accepted, twice over, and the balance math holds.
    for _ in 0..2 {
        service
            .add_expense(
                group.id,
                alice,
                new_expense(alice, MAX_EXPENSE_AMOUNT, SplitMode::Equal(vec![alice, bob])),
            )
            .unwrap();
    }
    assert!(service.has_unsettled_balances(group.id).unwrap());
    assert_eq!(
        service.get_user_balance(group.id, alice, bob).unwrap(),
        -MAX_EXPENSE_AMOUNT
    );
}

#[test]
fn test_settlement_is_logged_once() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob) = (user(1), user(2));

    service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(60_000), SplitMode::Equal(vec![alice, bob])),
        )
        .unwrap();
    let settlement = service
        .record_settlement(group.id, bob, bob, alice, Decimal::from(30_000))
        .unwrap();
    assert!(settlement.splits[0].is_settled);

    drop(service);
    let entries: Vec<_> = audit_logger
        .get_logs()
        .iter()
        .filter(|entry| entry.entity_id == settlement.id)
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, ActivityAction::RecordSettlement);
    assert_eq!(entries[0].user_id, bob);
    let expense_entries = audit_logger
        .get_logs()
        .iter()
        .filter(|entry| entry.action == ActivityAction::AddExpense)
        .count();
    assert_eq!(expense_entries, 1);
}

#[test]
fn test_settlement_requires_party_or_admin() {
    let mut storage = InMemoryStorage::new();
    let mut audit_logger = InMemoryAuditLogger::new();
    let mut service = GroupService::with_calculator(&mut storage, &mut audit_logger, calculator());
    let group = three_person_group(&mut service, "VND");
    let (alice, bob, carol) = (user(1), user(2), user(3));

    service
        .add_expense(
            group.id,
            alice,
            new_expense(alice, Decimal::from(60_000), SplitMode::Equal(vec![alice, bob])),
        )
        .unwrap();

    // Carol is a plain member with no part in the payment.
    let bystander = service.record_settlement(group.id, carol, bob, alice, Decimal::from(30_000));
    assert!(matches!(
        bystander,
        Err(SplitLedgerError::NotAuthorized(who, _)) if who == carol
    ));
    assert_eq!(
        service.get_user_balance(group.id, alice, bob).unwrap(),
        Decimal::from(-30_000)
    );

    let outsider = service.record_settlement(group.id, user(9), bob, alice, Decimal::from(30_000));
    assert!(matches!(outsider, Err(SplitLedgerError::NotGroupMember(_))));

    // The receiving side may confirm it.
    service
        .record_settlement(group.id, alice, bob, alice, Decimal::from(10_000))
        .unwrap();

    // An admin may record on behalf of others.
    service
        .update_member_role(group.id, alice, carol, GroupRole::Admin)
        .unwrap();
    service
        .record_settlement(group.id, carol, bob, alice, Decimal::from(20_000))
        .unwrap();
    assert!(!service.has_unsettled_balances(group.id).unwrap());
}
