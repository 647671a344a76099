//! Tests for the cancellation workflow.

use chrono::Utc;
use innkeep_shared::types::{Money, RoomId, UserId};
use rust_decimal_macros::dec;

use super::types::RefundStatus;
use super::workflow::CancellationWorkflow;
use crate::availability::conflict::BookedSlot;
use crate::payment::ledger::PaymentLedger;
use crate::payment::types::{NewPayment, PaymentKind, PaymentMethod};
use crate::reservation::error::ReservationError;
use crate::reservation::service::{BookingPolicy, NewReservation, ReservationService};
use crate::reservation::types::{Reservation, ReservationStatus};
use crate::status::machine::StatusMachine;
use crate::status::types::RoomEvent;
use crate::test_support::{date, sample_client, sample_reservation};

fn money(value: rust_decimal::Decimal) -> Money {
    Money::from_decimal(value).unwrap()
}

fn pay(reservation: &mut Reservation, amount: Money) {
    PaymentLedger::add_payment(
        reservation,
        NewPayment {
            amount,
            method: PaymentMethod::Card,
            recorded_by: UserId::new(),
            note: None,
            recorded_at: None,
        },
        Utc::now(),
    )
    .unwrap();
}

#[test]
fn test_booking_payment_conflict_cancel_refund_scenario() {
    let room = RoomId::new();
    let policy = BookingPolicy::default();

    let mut a = ReservationService::create(
        NewReservation {
            client: sample_client(),
            room_id: room,
            check_in: date(2024, 1, 10),
            check_out: date(2024, 1, 15),
            price_per_night: money(dec!(100.00)),
            created_by: UserId::new(),
            notes: None,
        },
        &policy,
        &[],
        Utc::now(),
    )
    .unwrap();
    assert_eq!(a.total_price, money(dec!(500.00)));

    pay(&mut a, money(dec!(300)));
    assert_eq!(a.amount_paid, money(dec!(300.00)));
    assert!(!a.paid);

    let clash = ReservationService::create(
        NewReservation {
            client: sample_client(),
            room_id: room,
            check_in: date(2024, 1, 12),
            check_out: date(2024, 1, 14),
            price_per_night: money(dec!(100.00)),
            created_by: UserId::new(),
            notes: None,
        },
        &policy,
        &[BookedSlot::from(&a)],
        Utc::now(),
    );
    assert!(matches!(clash, Err(ReservationError::Conflict { .. })));

    let outcome =
        CancellationWorkflow::cancel(&mut a, "guest request", UserId::new(), Utc::now()).unwrap();
    let mut record = outcome.record;
    assert_eq!(a.status, ReservationStatus::Cancelled);
    assert_eq!(record.refund_status, RefundStatus::Pending);
    assert_eq!(record.snapshot.amount_paid, money(dec!(300)));

    let staff = UserId::new();
    let posting = CancellationWorkflow::process_refund(
        &mut record,
        &mut a,
        PaymentMethod::Cash,
        staff,
        None,
        Utc::now(),
    )
    .unwrap();

    assert_eq!(posting.entry.amount, money(dec!(-300)));
    assert_eq!(posting.entry.kind, PaymentKind::Refund);
    assert_eq!(posting.entry.recorded_by, staff);
    assert_eq!(a.payments.last(), Some(&posting.entry));
    assert!(a.amount_paid.is_zero());
    assert!(a.is_ledger_consistent());
    assert_eq!(record.refund_status, RefundStatus::Processed);
    assert_eq!(record.refund.as_ref().map(|r| r.amount), Some(money(dec!(300))));

    // The record keeps the ledger as it was at cancellation.
    assert_eq!(record.snapshot.payments.len(), 1);
    assert_eq!(record.snapshot.amount_paid, money(dec!(300)));

    // The cancelled slot is free again.
    assert!(ReservationService::create(
        NewReservation {
            client: sample_client(),
            room_id: room,
            check_in: date(2024, 1, 12),
            check_out: date(2024, 1, 14),
            price_per_night: money(dec!(100.00)),
            created_by: UserId::new(),
            notes: None,
        },
        &policy,
        &[BookedSlot::from(&a)],
        Utc::now(),
    )
    .is_ok());
}

#[test]
fn test_cancel_unpaid_is_not_applicable() {
    let mut reservation = sample_reservation();
    let outcome =
        CancellationWorkflow::cancel(&mut reservation, "duplicate", UserId::new(), Utc::now())
            .unwrap();

    assert_eq!(outcome.record.refund_status, RefundStatus::NotApplicable);
    assert_eq!(outcome.transition.from, ReservationStatus::Pending);
    assert_eq!(outcome.transition.room_event, None);
    assert_eq!(outcome.record.snapshot.status_at_cancellation, ReservationStatus::Pending);
    assert_eq!(outcome.record.version, 1);

    let mut record = outcome.record;
    let result = CancellationWorkflow::process_refund(
        &mut record,
        &mut reservation,
        PaymentMethod::Cash,
        UserId::new(),
        None,
        Utc::now(),
    );
    assert!(matches!(
        result,
        Err(ReservationError::InvalidRefundState { status: RefundStatus::NotApplicable, .. })
    ));
}

#[test]
fn test_cancel_in_house_frees_room() {
    let mut reservation = sample_reservation();
    StatusMachine::check_in(&mut reservation, None).unwrap();

    let outcome =
        CancellationWorkflow::cancel(&mut reservation, "early departure", UserId::new(), Utc::now())
            .unwrap();
    assert!(matches!(
        outcome.transition.room_event,
        Some(RoomEvent::Freed { room_id, .. }) if room_id == reservation.room_id
    ));
    assert_eq!(
        outcome.record.snapshot.status_at_cancellation,
        ReservationStatus::InProgress
    );
}

#[test]
fn test_cancel_requires_reason_and_open_status() {
    let mut reservation = sample_reservation();
    assert!(matches!(
        CancellationWorkflow::cancel(&mut reservation, "  ", UserId::new(), Utc::now()),
        Err(ReservationError::Validation { field: "reason", .. })
    ));
    assert_eq!(reservation.status, ReservationStatus::Pending);

    for status in [
        ReservationStatus::Finished,
        ReservationStatus::Cancelled,
        ReservationStatus::NoShow,
    ] {
        let mut reservation = sample_reservation();
        reservation.status = status;
        assert!(matches!(
            CancellationWorkflow::cancel(&mut reservation, "late", UserId::new(), Utc::now()),
            Err(ReservationError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn test_refund_state_machine() {
    let mut reservation = sample_reservation();
    pay(&mut reservation, money(dec!(120)));
    let mut record =
        CancellationWorkflow::cancel(&mut reservation, "illness", UserId::new(), Utc::now())
            .unwrap()
            .record;

    // Complete before process
    assert!(matches!(
        CancellationWorkflow::complete_refund(&mut record, UserId::new(), Utc::now()),
        Err(ReservationError::InvalidRefundState { status: RefundStatus::Pending, .. })
    ));

    CancellationWorkflow::process_refund(
        &mut record,
        &mut reservation,
        PaymentMethod::BankTransfer,
        UserId::new(),
        Some("IBAN on file".into()),
        Utc::now(),
    )
    .unwrap();

    // Second process
    let ledger_len = reservation.payments.len();
    assert!(matches!(
        CancellationWorkflow::process_refund(
            &mut record,
            &mut reservation,
            PaymentMethod::Cash,
            UserId::new(),
            None,
            Utc::now(),
        ),
        Err(ReservationError::InvalidRefundState { status: RefundStatus::Processed, .. })
    ));
    assert_eq!(reservation.payments.len(), ledger_len);

    // Reject after process
    assert!(CancellationWorkflow::reject_refund(&mut record, UserId::new(), "no", Utc::now()).is_err());

    let finisher = UserId::new();
    CancellationWorkflow::complete_refund(&mut record, finisher, Utc::now()).unwrap();
    assert_eq!(record.refund_status, RefundStatus::Completed);
    assert_eq!(record.completed_by, Some(finisher));
    assert!(record.refund_status.is_final());
}

#[test]
fn test_reject_refund() {
    let mut reservation = sample_reservation();
    pay(&mut reservation, money(dec!(50)));
    let mut record =
        CancellationWorkflow::cancel(&mut reservation, "no reason", UserId::new(), Utc::now())
            .unwrap()
            .record;

    assert!(matches!(
        CancellationWorkflow::reject_refund(&mut record, UserId::new(), "", Utc::now()),
        Err(ReservationError::Validation { .. })
    ));

    CancellationWorkflow::reject_refund(&mut record, UserId::new(), "non-refundable rate", Utc::now())
        .unwrap();
    assert_eq!(record.refund_status, RefundStatus::Rejected);
    assert_eq!(record.rejection_reason.as_deref(), Some("non-refundable rate"));

    // Nothing was posted to the ledger.
    assert_eq!(reservation.amount_paid, money(dec!(50)));
    assert!(CancellationWorkflow::process_refund(
        &mut record,
        &mut reservation,
        PaymentMethod::Cash,
        UserId::new(),
        None,
        Utc::now(),
    )
    .is_err());
}

#[test]
fn test_refund_must_target_the_cancelled_reservation() {
    let mut reservation = sample_reservation();
    pay(&mut reservation, money(dec!(10)));
    let mut record =
        CancellationWorkflow::cancel(&mut reservation, "moved", UserId::new(), Utc::now())
            .unwrap()
            .record;

    let mut stranger = sample_reservation();
    assert!(matches!(
        CancellationWorkflow::process_refund(
            &mut record,
            &mut stranger,
            PaymentMethod::Cash,
            UserId::new(),
            None,
            Utc::now(),
        ),
        Err(ReservationError::Validation { field: "reservation_id", .. })
    ));
    assert_eq!(record.refund_status, RefundStatus::Pending);
}
