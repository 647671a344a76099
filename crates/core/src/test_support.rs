//! Fixtures shared by the unit and property tests.

use chrono::{NaiveDate, Utc};
use innkeep_shared::types::{Money, ReservationId, RoomId, UserId};

use crate::reservation::types::{ClientSnapshot, Reservation, ReservationStatus, StayDates};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn sample_client() -> ClientSnapshot {
    ClientSnapshot {
        name: "Ana".into(),
        surname: "Lopez".into(),
        email: Some("ana@example.com".into()),
        phone: Some("+34 600 000 000".into()),
        document: Some("X1234567".into()),
    }
}

/// A pending 5-night stay, 2024-01-10 → 2024-01-15 at 100.00 per night.
pub(crate) fn sample_reservation() -> Reservation {
    let now = Utc::now();
    Reservation {
        id: ReservationId::new(),
        client: sample_client(),
        room_id: RoomId::new(),
        stay: StayDates::new(date(2024, 1, 10), date(2024, 1, 15)).unwrap(),
        price_per_night: Money::from_cents(10_000),
        total_price: Money::from_cents(50_000),
        status: ReservationStatus::Pending,
        payments: Vec::new(),
        amount_paid: Money::ZERO,
        paid: false,
        check_in_at: None,
        check_out_at: None,
        notes: None,
        created_by: UserId::new(),
        created_at: now,
        updated_at: now,
        version: 1,
    }
}
