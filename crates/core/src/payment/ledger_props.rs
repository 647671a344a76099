//! Property-based tests for PaymentLedger.
//!
//! Feature: payment-ledger, Property: Ledger Consistency and Payment Ceiling

use chrono::Utc;
use innkeep_shared::types::{Money, UserId};
use proptest::prelude::*;

use super::ledger::PaymentLedger;
use super::types::{NewPayment, PaymentEdit, PaymentMethod};
use crate::test_support::sample_reservation;

#[derive(Debug, Clone)]
enum LedgerOp {
    Add(i64),
    Edit(usize, i64),
    Delete(usize),
    Recalculate,
}

fn arb_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        4 => (-1_000i64..30_000).prop_map(LedgerOp::Add),
        2 => (0usize..8, -1_000i64..30_000).prop_map(|(i, c)| LedgerOp::Edit(i, c)),
        1 => (0usize..8).prop_map(LedgerOp::Delete),
        1 => Just(LedgerOp::Recalculate),
    ]
}

fn arb_method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::Other),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* sequence of add/edit/delete/recalculate, `amount_paid`
    /// equals the sum of the entries and never exceeds the total price.
    #[test]
    fn prop_ledger_stays_consistent_and_capped(
        ops in prop::collection::vec(arb_op(), 1..40),
        method in arb_method(),
    ) {
        let mut reservation = sample_reservation();
        let total = reservation.total_price;

        for op in ops {
            let before = reservation.clone();
            let result = match op {
                LedgerOp::Add(cents) => PaymentLedger::add_payment(
                    &mut reservation,
                    NewPayment {
                        amount: Money::from_cents(cents),
                        method,
                        recorded_by: UserId::new(),
                        note: None,
                        recorded_at: None,
                    },
                    Utc::now(),
                )
                .map(|_| ()),
                LedgerOp::Edit(index, cents) => match reservation.payments.get(index).map(|p| p.id) {
                    Some(id) => PaymentLedger::edit_payment(
                        &mut reservation,
                        id,
                        PaymentEdit {
                            amount: Some(Money::from_cents(cents)),
                            method: None,
                            note: None,
                            recorded_at: None,
                            edited_by: UserId::new(),
                            reason: "correction".into(),
                        },
                        Utc::now(),
                    )
                    .map(|_| ()),
                    None => Ok(()),
                },
                LedgerOp::Delete(index) => match reservation.payments.get(index).map(|p| p.id) {
                    Some(id) => PaymentLedger::delete_payment(&mut reservation, id, UserId::new(), Utc::now())
                        .map(|_| ()),
                    None => Ok(()),
                },
                LedgerOp::Recalculate => {
                    PaymentLedger::recalculate(&mut reservation);
                    Ok(())
                }
            };

            // A rejected operation leaves the reservation untouched.
            if result.is_err() {
                prop_assert_eq!(&reservation, &before);
            }
            prop_assert!(reservation.is_ledger_consistent());
            prop_assert!(reservation.amount_paid <= total);
            prop_assert_eq!(reservation.paid, reservation.amount_paid >= total);
            prop_assert!(reservation.payments.iter().all(|p| p.amount.is_positive()));
        }
    }
}
