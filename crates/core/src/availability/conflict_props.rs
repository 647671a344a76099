//! Property-based tests for ConflictChecker.
//!
//! Feature: availability, Property: No-Overlap Invariant

use chrono::{Duration, NaiveDate};
use innkeep_shared::types::{ReservationId, RoomId};
use proptest::prelude::*;
use uuid::Uuid;

use super::conflict::{BookedSlot, ConflictChecker};
use crate::reservation::types::{ReservationStatus, StayDates};

/// A booking request: (room index, start offset in days, nights, cancel later).
type Request = (u8, i64, i64, bool);

fn arb_request() -> impl Strategy<Value = Request> {
    (0u8..3, 0i64..60, 1i64..10, any::<bool>())
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn room(index: u8) -> RoomId {
    RoomId::from_uuid(Uuid::from_u128(u128::from(index) + 1))
}

fn stay(offset: i64, nights: i64) -> StayDates {
    let check_in = base_date() + Duration::days(offset);
    StayDates::new(check_in, check_in + Duration::days(nights)).unwrap()
}

fn arb_status() -> impl Strategy<Value = ReservationStatus> {
    prop::sample::select(ReservationStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* sequence of bookings accepted through the checker, no two
    /// room-holding reservations of the same room overlap.
    #[test]
    fn prop_accepted_bookings_never_overlap(requests in prop::collection::vec(arb_request(), 1..40)) {
        let mut slots: Vec<BookedSlot> = Vec::new();

        for (room_index, offset, nights, cancel_later) in requests {
            let room_id = room(room_index);
            let requested = stay(offset, nights);
            if ConflictChecker::ensure_available(&slots, room_id, &requested, None).is_ok() {
                slots.push(BookedSlot {
                    reservation_id: ReservationId::new(),
                    room_id,
                    stay: requested,
                    status: ReservationStatus::Confirmed,
                });
            }
            // Cancelling releases the slot for later requests.
            if cancel_later {
                if let Some(last) = slots.last_mut() {
                    last.status = ReservationStatus::Cancelled;
                }
            }
        }

        for (i, a) in slots.iter().enumerate() {
            for b in slots.iter().skip(i + 1) {
                if a.room_id == b.room_id && a.status.holds_room() && b.status.holds_room() {
                    prop_assert!(
                        !(a.stay.check_in() < b.stay.check_out() && b.stay.check_in() < a.stay.check_out()),
                        "overlap between {:?} and {:?}", a, b
                    );
                }
            }
        }
    }

    /// The checker agrees with the brute-force half-open overlap definition.
    #[test]
    fn prop_check_matches_definition(
        existing_offset in 0i64..30,
        existing_nights in 1i64..10,
        status in arb_status(),
        offset in 0i64..30,
        nights in 1i64..10,
    ) {
        let room_id = room(0);
        let existing = BookedSlot {
            reservation_id: ReservationId::new(),
            room_id,
            stay: stay(existing_offset, existing_nights),
            status,
        };
        let requested = stay(offset, nights);

        let expected = status != ReservationStatus::Cancelled
            && existing.stay.check_in() < requested.check_out()
            && existing.stay.check_out() > requested.check_in();

        prop_assert_eq!(
            ConflictChecker::has_conflict(&[existing], room_id, &requested, None),
            expected
        );
        prop_assert!(!ConflictChecker::has_conflict(
            &[existing],
            room_id,
            &requested,
            Some(existing.reservation_id)
        ));
    }
}
