//! Property-based tests for ReservationService.
//!
//! Feature: reservations, Property: Pricing and Paid Flag

use chrono::{Duration, Utc};
use innkeep_shared::types::{Money, RoomId, UserId};
use proptest::prelude::*;

use super::service::{BookingPolicy, NewReservation, ReservationService, ReservationUpdate};
use crate::payment::ledger::PaymentLedger;
use crate::payment::types::{NewPayment, PaymentMethod};
use crate::test_support::{date, sample_client};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* stay and rate, the total is `nights × price_per_night`.
    #[test]
    fn prop_total_is_nights_times_rate(
        offset in 0i64..300,
        nights in 1i64..60,
        rate_cents in 1i64..100_000,
    ) {
        let check_in = date(2024, 1, 1) + Duration::days(offset);
        let reservation = ReservationService::create(
            NewReservation {
                client: sample_client(),
                room_id: RoomId::new(),
                check_in,
                check_out: check_in + Duration::days(nights),
                price_per_night: Money::from_cents(rate_cents),
                created_by: UserId::new(),
                notes: None,
            },
            &BookingPolicy::default(),
            &[],
            Utc::now(),
        )
        .unwrap();

        prop_assert_eq!(reservation.nights(), nights);
        prop_assert_eq!(reservation.total_price.cents(), nights * rate_cents);
    }

    /// *For any* accepted update, the amount paid still fits in the new total
    /// and `paid` is re-derived.
    #[test]
    fn prop_update_keeps_payment_ceiling(
        paid_cents in 1i64..50_000,
        new_nights in 1i64..10,
        new_rate_cents in 1i64..20_000,
    ) {
        let check_in = date(2024, 1, 10);
        let mut reservation = ReservationService::create(
            NewReservation {
                client: sample_client(),
                room_id: RoomId::new(),
                check_in,
                check_out: date(2024, 1, 15),
                price_per_night: Money::from_cents(10_000),
                created_by: UserId::new(),
                notes: None,
            },
            &BookingPolicy::default(),
            &[],
            Utc::now(),
        )
        .unwrap();
        PaymentLedger::add_payment(
            &mut reservation,
            NewPayment {
                amount: Money::from_cents(paid_cents),
                method: PaymentMethod::Cash,
                recorded_by: UserId::new(),
                note: None,
                recorded_at: None,
            },
            Utc::now(),
        )
        .unwrap();
        let before = reservation.clone();

        let result = ReservationService::apply_update(
            &mut reservation,
            ReservationUpdate {
                check_out: Some(check_in + Duration::days(new_nights)),
                price_per_night: Some(Money::from_cents(new_rate_cents)),
                ..Default::default()
            },
            &BookingPolicy::default(),
            &[],
            Utc::now(),
        );

        match result {
            Ok(()) => {
                prop_assert!(reservation.amount_paid <= reservation.total_price);
                prop_assert_eq!(reservation.total_price.cents(), new_nights * new_rate_cents);
            }
            Err(_) => {
                prop_assert!(new_nights * new_rate_cents < paid_cents);
                prop_assert_eq!(&reservation, &before);
            }
        }
        prop_assert_eq!(reservation.paid, reservation.amount_paid >= reservation.total_price);
    }
}
