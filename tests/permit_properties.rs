// Copyright 2025 Cowboy AI, LLC.

//! Property tests for permit validity and checkpoint outcomes

use chrono::{Duration, NaiveDate, Utc};
use livestock_movement::domain::{Livestock, Location, MovementPermit, PermitStatus};
use livestock_movement::numbering::format_document_number;
use livestock_movement::workflows::CheckpointVerifier;
use livestock_movement::{ClearanceId, LivestockId, OfficerId, OwnerId};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn permit(from: i64, length: i64, status: PermitStatus) -> MovementPermit {
    let mut permit = MovementPermit::issued(
        "DG-2026-000042".into(),
        ClearanceId::new(),
        LivestockId::new(),
        OwnerId::new(),
        Location::named("Gobabis"),
        Location::named("Windhoek"),
        base() + Duration::days(from),
        base() + Duration::days(from + length),
        OfficerId::new(),
        Utc::now(),
    );
    permit.status = status;
    permit
}

fn any_status() -> impl Strategy<Value = PermitStatus> {
    prop_oneof![
        Just(PermitStatus::Approved),
        Just(PermitStatus::InTransit),
        Just(PermitStatus::Completed),
        Just(PermitStatus::Cancelled),
    ]
}

proptest! {
    #[test]
    fn validity_is_approved_and_inside_inclusive_window(
        from in 0i64..60,
        length in 0i64..30,
        today in 0i64..120,
        status in any_status(),
    ) {
        let permit = permit(from, length, status);
        let today = base() + Duration::days(today);
        let inside = permit.valid_from <= today && today <= permit.valid_until;

        prop_assert_eq!(permit.is_valid(today), status == PermitStatus::Approved && inside);
        if today > permit.valid_until && matches!(status, PermitStatus::Approved | PermitStatus::InTransit) {
            prop_assert_eq!(permit.effective_status(today), PermitStatus::Expired);
        } else {
            prop_assert_eq!(permit.effective_status(today), status);
        }
    }

    #[test]
    fn stolen_livestock_is_always_flagged(
        from in 0i64..60,
        length in 0i64..30,
        today in 0i64..120,
        status in any_status(),
    ) {
        let permit = permit(from, length, status);
        let mut animal = Livestock::new("NA-OH-0300", OwnerId::new(), "cattle");
        animal.stolen = true;

        let outcome = CheckpointVerifier::evaluate(&permit, &animal, base() + Duration::days(today));
        prop_assert!(!outcome.valid);
        prop_assert_eq!(outcome.flag_reason.as_deref(), Some("stolen livestock alert"));
    }

    #[test]
    fn scan_passes_exactly_when_movable_and_in_window(
        from in 0i64..60,
        length in 0i64..30,
        today in 0i64..120,
        status in any_status(),
    ) {
        let permit = permit(from, length, status);
        let animal = Livestock::new("NA-OH-0301", OwnerId::new(), "cattle");
        let today = base() + Duration::days(today);

        let outcome = CheckpointVerifier::evaluate(&permit, &animal, today);
        let movable = matches!(status, PermitStatus::Approved | PermitStatus::InTransit);
        prop_assert_eq!(outcome.valid, movable && permit.within_window(today));
        prop_assert_eq!(outcome.valid, outcome.flag_reason.is_none());
    }

    #[test]
    fn document_numbers_keep_at_least_six_digits(sequence in 1u64..10_000_000) {
        let number = format_document_number("PC-KW", sequence);
        let digits = number.strip_prefix("PC-KW-").unwrap();
        prop_assert!(digits.len() >= 6);
        prop_assert_eq!(digits.parse::<u64>().unwrap(), sequence);
    }
}
