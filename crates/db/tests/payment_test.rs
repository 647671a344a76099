//! Integration tests for the payment repository.

mod common;

use innkeep_core::payment::types::{LedgerChange, NewPayment, PaymentEdit, PaymentMethod};
use innkeep_core::reservation::error::{ErrorKind, ReservationError};
use innkeep_core::reservation::service::BookingPolicy;
use innkeep_db::entities::reservations;
use innkeep_db::{PaymentRepository, ReservationRepository};
use innkeep_shared::types::{Money, RoomId, UserId};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};

use common::{booking, connect, date};

fn payment(amount: Money) -> NewPayment {
    NewPayment {
        amount,
        method: PaymentMethod::Card,
        recorded_by: UserId::new(),
        note: Some("  deposit ".to_string()),
        recorded_at: None,
    }
}

fn money(value: rust_decimal::Decimal) -> Money {
    Money::from_decimal(value).expect("valid amount")
}

#[tokio::test]
async fn test_add_edit_delete_payment() {
    let Some(db) = connect().await else { return };
    let reservations = ReservationRepository::new(db.clone(), BookingPolicy::default());
    let payments = PaymentRepository::new(db);

    // 4 nights at 100.00
    let created = reservations
        .create(booking(RoomId::new(), date(2031, 2, 1), 4))
        .await
        .expect("Failed to create reservation");

    let added = payments
        .add_payment(created.id, payment(money(dec!(150.00))), Some(created.version))
        .await
        .expect("Failed to add payment");
    let LedgerChange::Added(first) = &added.change else {
        panic!("expected an added entry");
    };
    assert_eq!(first.note.as_deref(), Some("deposit"));
    assert_eq!(added.reservation.amount_paid, money(dec!(150.00)));
    assert!(!added.reservation.paid);

    let second = payments
        .add_payment(created.id, payment(money(dec!(250.00))), None)
        .await
        .expect("Failed to add payment");
    assert_eq!(second.reservation.amount_paid, money(dec!(400.00)));
    assert!(second.reservation.paid);

    let edited = payments
        .edit_payment(
            created.id,
            first.id,
            PaymentEdit {
                amount: Some(money(dec!(100.00))),
                method: Some(PaymentMethod::Cash),
                note: None,
                recorded_at: None,
                edited_by: UserId::new(),
                reason: "wrong amount keyed".to_string(),
            },
            Some(second.reservation.version),
        )
        .await
        .expect("Failed to edit payment");
    assert_eq!(edited.reservation.amount_paid, money(dec!(350.00)));
    assert!(!edited.reservation.paid);

    let stored = reservations.find(created.id).await.expect("Failed to find");
    assert_eq!(stored.payments.len(), 2);
    assert_eq!(stored.payments[0].id, first.id);
    let audit = stored.payments[0].edit.as_ref().expect("edit audit stored");
    assert_eq!(audit.reason, "wrong amount keyed");
    assert_eq!(stored.payments[0].method, PaymentMethod::Cash);

    let deleted = payments
        .delete_payment(created.id, first.id, UserId::new(), None)
        .await
        .expect("Failed to delete payment");
    assert_eq!(deleted.reservation.amount_paid, money(dec!(250.00)));

    let stored = reservations.find(created.id).await.expect("Failed to find");
    assert_eq!(stored.payments.len(), 1);
    assert!(stored.is_ledger_consistent());
}

#[tokio::test]
async fn test_overpayment_rejected_and_nothing_written() {
    let Some(db) = connect().await else { return };
    let reservations = ReservationRepository::new(db.clone(), BookingPolicy::default());
    let payments = PaymentRepository::new(db);

    let created = reservations
        .create(booking(RoomId::new(), date(2031, 3, 1), 2))
        .await
        .expect("Failed to create reservation");

    let err = payments
        .add_payment(created.id, payment(money(dec!(200.01))), None)
        .await
        .unwrap_err();
    match err {
        ReservationError::LimitExceeded {
            attempted,
            available,
        } => {
            assert_eq!(attempted, money(dec!(200.01)));
            assert_eq!(available, money(dec!(200.00)));
        }
        other => panic!("expected limit exceeded, got {other:?}"),
    }

    let stored = reservations.find(created.id).await.expect("Failed to find");
    assert!(stored.payments.is_empty());
    assert_eq!(stored.version, created.version);
}

#[tokio::test]
async fn test_stale_version_rejected() {
    let Some(db) = connect().await else { return };
    let reservations = ReservationRepository::new(db.clone(), BookingPolicy::default());
    let payments = PaymentRepository::new(db);

    let created = reservations
        .create(booking(RoomId::new(), date(2031, 4, 1), 2))
        .await
        .expect("Failed to create reservation");
    payments
        .add_payment(created.id, payment(money(dec!(50.00))), Some(created.version))
        .await
        .expect("Failed to add payment");

    let err = payments
        .add_payment(created.id, payment(money(dec!(50.00))), Some(created.version))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Concurrency);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_recalculate_repairs_drift() {
    let Some(db) = connect().await else { return };
    let reservations = ReservationRepository::new(db.clone(), BookingPolicy::default());
    let payments = PaymentRepository::new(db.clone());

    let created = reservations
        .create(booking(RoomId::new(), date(2031, 5, 1), 2))
        .await
        .expect("Failed to create reservation");
    payments
        .add_payment(created.id, payment(money(dec!(80.00))), None)
        .await
        .expect("Failed to add payment");

    // Corrupt the stored aggregate behind the repository's back.
    reservations::ActiveModel {
        id: Set(created.id.into_inner()),
        amount_paid_cents: Set(0),
        ..Default::default()
    }
    .update(&db)
    .await
    .expect("Failed to corrupt aggregate");

    let repaired = payments
        .recalculate(created.id)
        .await
        .expect("Failed to recalculate");
    assert_eq!(
        repaired.change,
        LedgerChange::Recalculated {
            previous: Money::ZERO,
            current: money(dec!(80.00)),
        }
    );

    let stored = reservations.find(created.id).await.expect("Failed to find");
    assert_eq!(stored.amount_paid, money(dec!(80.00)));

    // Nothing to repair the second time.
    let again = payments
        .recalculate(created.id)
        .await
        .expect("Failed to recalculate");
    assert_eq!(again.reservation.version, stored.version);
}
