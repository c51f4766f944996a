//! Property tests for the streak and consistency metrics.
//!
//! These functions are pure date arithmetic, so they can be hammered with
//! arbitrary histories without a database.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use forgefit::services::achievement_service::{
    consistent_weeks, current_streak_days, longest_streak_days,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Map generated day offsets into concrete dates within a 60-day window
fn to_dates(offsets: &[i64]) -> Vec<NaiveDate> {
    offsets
        .iter()
        .map(|&offset| base_date() + Duration::days(offset))
        .collect()
}

proptest! {
    #[test]
    fn streaks_are_bounded_by_distinct_day_count(
        offsets in prop::collection::vec(0i64..60, 0..40)
    ) {
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(60);

        let mut distinct = offsets.clone();
        distinct.sort();
        distinct.dedup();
        let distinct = distinct.len() as i64;

        prop_assert!(longest_streak_days(&days) <= distinct);
        prop_assert!(current_streak_days(&days, today) <= distinct);
    }

    #[test]
    fn current_streak_never_exceeds_longest(
        offsets in prop::collection::vec(0i64..60, 0..40),
        today_offset in 0i64..62
    ) {
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(today_offset);

        prop_assert!(current_streak_days(&days, today) <= longest_streak_days(&days));
    }

    #[test]
    fn working_out_today_never_hurts_the_streak(
        offsets in prop::collection::vec(0i64..60, 0..40),
        today_offset in 0i64..62
    ) {
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(today_offset);
        let before = current_streak_days(&days, today);

        let mut with_today = days.clone();
        with_today.push(today);
        let after = current_streak_days(&with_today, today);

        prop_assert!(after >= before);
        prop_assert!(after >= 1);
    }

    #[test]
    fn metrics_ignore_history_order(
        offsets in prop::collection::vec(0i64..60, 0..40)
    ) {
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(60);

        let mut reversed = days.clone();
        reversed.reverse();

        prop_assert_eq!(
            longest_streak_days(&days),
            longest_streak_days(&reversed)
        );
        prop_assert_eq!(
            current_streak_days(&days, today),
            current_streak_days(&reversed, today)
        );
        prop_assert_eq!(
            consistent_weeks(&days, today),
            consistent_weeks(&reversed, today)
        );
    }

    #[test]
    fn metrics_are_translation_invariant(
        offsets in prop::collection::vec(0i64..60, 0..40),
        today_offset in 0i64..62,
        weeks_shifted in 0i64..10
    ) {
        let shift = Duration::days(7 * weeks_shifted);
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(today_offset);

        let shifted_days: Vec<NaiveDate> = days.iter().map(|&day| day + shift).collect();
        let shifted_today = today + shift;

        prop_assert_eq!(
            current_streak_days(&days, today),
            current_streak_days(&shifted_days, shifted_today)
        );
        prop_assert_eq!(
            longest_streak_days(&days),
            longest_streak_days(&shifted_days)
        );
        prop_assert_eq!(
            consistent_weeks(&days, today),
            consistent_weeks(&shifted_days, shifted_today)
        );
    }

    #[test]
    fn qualifying_weeks_need_three_sessions(
        offsets in prop::collection::vec(0i64..60, 0..40),
        today_offset in 0i64..62
    ) {
        let days = to_dates(&offsets);
        let today = base_date() + Duration::days(today_offset);

        // Each counted week holds at least 3 sessions, and weeks are disjoint
        prop_assert!(consistent_weeks(&days, today) <= days.len() as i64 / 3);
    }
}
