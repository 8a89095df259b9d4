//! Property-based tests for grid generation and block identifiers.

use chrono::{Days, Months};
use lifegrid_core::{
    generate, generate_from_str, locate, BlockId, Classification, Granularity, Horizon, LifeGrid,
};
use lifegrid_test_utils::{assertions, fixtures, generators};
use proptest::prelude::*;

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_year_grid_scenario() {
    let units = generate(
        fixtures::scenario_date_of_birth(),
        Granularity::Year,
        Horizon::default(),
        fixtures::scenario_today(),
    )
    .unwrap();

    assert_eq!(units.len(), 90);
    let current: Vec<_> = units
        .iter()
        .filter(|u| u.classification == Classification::Current)
        .collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].sequence_index, 24);
    assert_eq!(current[0].block_id.to_string(), "year_24");
    assert!(units[..24]
        .iter()
        .all(|u| u.classification == Classification::Past));
    assert!(units[25..]
        .iter()
        .all(|u| u.classification == Classification::Future));
}

#[test]
fn test_string_entry_point_matches_typed() {
    let from_str = generate_from_str(
        "2000-01-01",
        "Months",
        Horizon::default(),
        fixtures::scenario_today(),
    )
    .unwrap();
    let typed = generate(
        fixtures::scenario_date_of_birth(),
        Granularity::Month,
        Horizon::default(),
        fixtures::scenario_today(),
    )
    .unwrap();
    assert_eq!(from_str, typed);
}

#[test]
fn test_birth_after_today_rejected() {
    let result = generate(
        fixtures::date(2030, 1, 1),
        Granularity::Week,
        Horizon::default(),
        fixtures::scenario_today(),
    );
    assertions::assert_invalid_date(&result);
}

#[test]
fn test_life_grid_layout() {
    let grid = LifeGrid::build(
        fixtures::scenario_date_of_birth(),
        Granularity::Year,
        Horizon::default(),
        fixtures::scenario_today(),
    )
    .unwrap();
    assert_eq!(grid.columns(), 10);
    assert_eq!(grid.rows(), 9);
    assert_eq!(grid.position(&BlockId::year(24)), Some((2, 4)));
    assert_eq!(grid.summary().current, 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_grid_structure(
        (dob, today) in generators::arb_birth_and_today(),
        granularity in generators::arb_granularity(),
        horizon in generators::arb_horizon(),
    ) {
        let units = generate(dob, granularity, horizon, today).unwrap();
        assertions::assert_grid_invariants(&units, granularity, horizon);
        prop_assert_eq!(units[0].period_start, dob);
    }

    #[test]
    fn prop_single_current_inside_window(
        (dob, today) in generators::arb_birth_and_today(),
        granularity in generators::arb_granularity(),
    ) {
        let horizon = Horizon::default();
        let units = generate(dob, granularity, horizon, today).unwrap();
        let current = units
            .iter()
            .filter(|u| u.classification == Classification::Current)
            .count();
        let inside = units.last().map(|u| today < u.period_end).unwrap_or(false);
        prop_assert_eq!(current, usize::from(inside));
    }

    #[test]
    fn prop_block_id_text_roundtrip(id in generators::arb_block_id()) {
        let parsed = BlockId::parse(&id.to_string()).unwrap();
        prop_assert_eq!(parsed, id);
        prop_assert_eq!(parsed.granularity(), id.granularity());
        prop_assert_eq!(parsed.sequence_index(), id.sequence_index());
    }

    #[test]
    fn prop_units_resolve_to_their_periods(
        dob in generators::arb_date_of_birth(),
        granularity in generators::arb_granularity(),
    ) {
        let horizon = Horizon::default();
        let units = generate(dob, granularity, horizon, dob).unwrap();
        for unit in &units {
            let id = BlockId::parse(&unit.block_id.to_string()).unwrap();
            let period = Some((unit.period_start, unit.period_end));
            prop_assert_eq!(id.period(dob, horizon), period);
            prop_assert_eq!(locate(dob, granularity, horizon, unit.period_start), Some(id));
            let last_day = unit.period_end - Days::new(1);
            prop_assert_eq!(locate(dob, granularity, horizon, last_day), Some(id));
        }
        let after = units.last().map(|u| u.period_end).unwrap();
        prop_assert_eq!(locate(dob, granularity, horizon, after), None);
    }

    #[test]
    fn prop_locate_before_birth_is_none(
        dob in generators::arb_date_of_birth(),
        granularity in generators::arb_granularity(),
        back in 1u64..5000,
    ) {
        let before = dob - Days::new(back);
        prop_assert_eq!(locate(dob, granularity, Horizon::default(), before), None);
    }

    #[test]
    fn prop_week_age_matches_birthdays(
        dob in generators::arb_date_of_birth(),
        age in 0u32..90,
    ) {
        let horizon = Horizon::default();
        let birthday = dob.checked_add_months(Months::new(age * 12)).unwrap();

        let id = locate(dob, Granularity::Week, horizon, birthday).unwrap();
        prop_assert_eq!(id.age(), age);
        prop_assert_eq!(id.unit_in_year(), Some(0));
        prop_assert_eq!(id.period(dob, horizon).map(|(start, _)| start), Some(birthday));

        if age > 0 {
            let eve = birthday - Days::new(1);
            let id = locate(dob, Granularity::Week, horizon, eve).unwrap();
            prop_assert_eq!(id.age(), age - 1);
            prop_assert_eq!(id.unit_in_year(), Some(51));
        }
    }
}
