//! Life grid generation
//!
//! Every unit's period is computed from the date of birth directly, never by
//! accumulating the previous unit, so month-end clamping cannot drift:
//! months start at `dob + i months`, years at `dob + 12·i months`.
//!
//! Weeks are anchored to birthdays. Week `w` of year of life `a` starts at
//! `dob + a years + 7·w days`; the 52nd week runs on to the next birthday,
//! so it lasts 8 or 9 days. Each year holds exactly 52 weeks and the
//! `<age>` coordinate of a week id is the age on every day of that week.

use crate::{BlockId, Classification, Granularity, GridError, LifegridResult};
use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Lifespan covered by the grid when nothing else is configured.
pub const DEFAULT_HORIZON_YEARS: u32 = 90;

/// Upper bound for a configurable horizon.
pub const MAX_HORIZON_YEARS: u32 = 1000;

// ============================================================================
// HORIZON
// ============================================================================

/// Number of whole years the grid covers. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Horizon(NonZeroU32);

impl Horizon {
    /// `None` for zero or anything above [`MAX_HORIZON_YEARS`].
    pub fn new(years: u32) -> Option<Self> {
        if years > MAX_HORIZON_YEARS {
            return None;
        }
        NonZeroU32::new(years).map(Horizon)
    }

    pub fn years(&self) -> u32 {
        self.0.get()
    }

    /// Total units in the sequence at this granularity.
    pub fn unit_count(&self, granularity: Granularity) -> u32 {
        self.years() * granularity.units_per_year()
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon(NonZeroU32::new(DEFAULT_HORIZON_YEARS).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<u32> for Horizon {
    type Error = String;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        Horizon::new(years)
            .ok_or_else(|| format!("horizon must be between 1 and {} years", MAX_HORIZON_YEARS))
    }
}

impl From<Horizon> for u32 {
    fn from(horizon: Horizon) -> u32 {
        horizon.years()
    }
}

// ============================================================================
// TIME UNIT
// ============================================================================

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeUnit {
    pub granularity: Granularity,
    pub sequence_index: u32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub period_start: NaiveDate,
    /// Exclusive; equal to the next unit's `period_start`.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub period_end: NaiveDate,
    pub classification: Classification,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "week_34_12"))]
    pub block_id: BlockId,
}

impl TimeUnit {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.period_start <= date && date < self.period_end
    }

    pub fn is_current(&self) -> bool {
        self.classification == Classification::Current
    }
}

/// Start of the unit at `index`, or `None` past the supported calendar range.
pub fn period_start(
    date_of_birth: NaiveDate,
    granularity: Granularity,
    index: u32,
) -> Option<NaiveDate> {
    match granularity {
        Granularity::Week => {
            let per_year = Granularity::Week.units_per_year();
            let birthday = anniversary(date_of_birth, index / per_year)?;
            birthday.checked_add_days(Days::new(7 * u64::from(index % per_year)))
        }
        Granularity::Month => date_of_birth.checked_add_months(Months::new(index)),
        Granularity::Year => anniversary(date_of_birth, index),
    }
}

/// Birthday at `age`; Feb 29 births clamp to Feb 28 in common years.
fn anniversary(date_of_birth: NaiveDate, age: u32) -> Option<NaiveDate> {
    date_of_birth.checked_add_months(Months::new(age.checked_mul(12)?))
}

fn classify(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Classification {
    if end <= today {
        Classification::Past
    } else if start <= today {
        Classification::Current
    } else {
        Classification::Future
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// Generate the full ordered sequence of time units.
///
/// Fails with [`GridError::InvalidDate`] when the birth date is after
/// `today` or the horizon runs past the supported calendar range.
pub fn generate(
    date_of_birth: NaiveDate,
    granularity: Granularity,
    horizon: Horizon,
    today: NaiveDate,
) -> LifegridResult<Vec<TimeUnit>> {
    if date_of_birth > today {
        return Err(GridError::InvalidDate {
            input: date_of_birth.to_string(),
            reason: format!("date of birth is after {}", today),
        }
        .into());
    }

    let count = horizon.unit_count(granularity);
    let mut units = Vec::with_capacity(count as usize);
    let mut start = date_of_birth;

    for index in 0..count {
        let end = period_start(date_of_birth, granularity, index + 1).ok_or_else(|| {
            GridError::InvalidDate {
                input: date_of_birth.to_string(),
                reason: format!(
                    "{}-year horizon exceeds the supported date range",
                    horizon.years()
                ),
            }
        })?;
        units.push(TimeUnit {
            granularity,
            sequence_index: index,
            period_start: start,
            period_end: end,
            classification: classify(start, end, today),
            block_id: BlockId::from_index(granularity, index),
        });
        start = end;
    }

    Ok(units)
}

/// [`generate`] from raw user input (`YYYY-MM-DD`, `weeks`/`month`/...).
pub fn generate_from_str(
    date_of_birth: &str,
    granularity: &str,
    horizon: Horizon,
    today: NaiveDate,
) -> LifegridResult<Vec<TimeUnit>> {
    let date_of_birth = parse_date_of_birth(date_of_birth)?;
    let granularity = Granularity::from_db_str(granularity)?;
    generate(date_of_birth, granularity, horizon, today)
}

/// [`generate`] against the local calendar date.
pub fn generate_today(
    date_of_birth: NaiveDate,
    granularity: Granularity,
    horizon: Horizon,
) -> LifegridResult<Vec<TimeUnit>> {
    generate(date_of_birth, granularity, horizon, Local::now().date_naive())
}

/// Parse a `YYYY-MM-DD` date of birth.
pub fn parse_date_of_birth(input: &str) -> Result<NaiveDate, GridError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| GridError::InvalidDate {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// LOOKUP
// ============================================================================

fn months_between(from: NaiveDate, to: NaiveDate) -> Option<u32> {
    let months = (to.year() - from.year()) * 12 + (to.month0() as i32 - from.month0() as i32);
    u32::try_from(months).ok()
}

/// Whole months from `date_of_birth` to `date`.
fn completed_months(date_of_birth: NaiveDate, date: NaiveDate) -> Option<u32> {
    let months = months_between(date_of_birth, date)?;
    // An earlier day-of-month than the birth day still belongs to the
    // previous month.
    if months > 0 && date_of_birth.checked_add_months(Months::new(months))? > date {
        return Some(months - 1);
    }
    Some(months)
}

/// Identifier of the unit whose period contains `date`.
///
/// `None` before the date of birth or beyond the horizon.
pub fn locate(
    date_of_birth: NaiveDate,
    granularity: Granularity,
    horizon: Horizon,
    date: NaiveDate,
) -> Option<BlockId> {
    if date < date_of_birth {
        return None;
    }

    let per_year = granularity.units_per_year();
    let index = match granularity {
        Granularity::Week => {
            let age = completed_months(date_of_birth, date)? / 12;
            let birthday = anniversary(date_of_birth, age)?;
            let week = u32::try_from((date - birthday).num_days() / 7).ok()?;
            age.checked_mul(per_year)?.checked_add(week.min(per_year - 1))?
        }
        Granularity::Month => completed_months(date_of_birth, date)?,
        Granularity::Year => completed_months(date_of_birth, date)? / 12,
    };
    if index >= horizon.unit_count(granularity) {
        return None;
    }

    Some(BlockId::from_index(granularity, index))
}

impl BlockId {
    /// Period `[start, end)` this id addresses for a given date of birth.
    ///
    /// `None` when the id lies beyond the horizon.
    pub fn period(
        &self,
        date_of_birth: NaiveDate,
        horizon: Horizon,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let granularity = self.granularity();
        let index = self.sequence_index();
        if index >= horizon.unit_count(granularity) {
            return None;
        }
        let start = period_start(date_of_birth, granularity, index)?;
        let end = period_start(date_of_birth, granularity, index + 1)?;
        Some((start, end))
    }
}

// ============================================================================
// LIFE GRID
// ============================================================================

/// Counts of units per classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridSummary {
    pub past: usize,
    pub current: usize,
    pub future: usize,
}

/// A generated sequence plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeGrid {
    date_of_birth: NaiveDate,
    granularity: Granularity,
    horizon: Horizon,
    today: NaiveDate,
    units: Vec<TimeUnit>,
}

impl LifeGrid {
    pub fn build(
        date_of_birth: NaiveDate,
        granularity: Granularity,
        horizon: Horizon,
        today: NaiveDate,
    ) -> LifegridResult<Self> {
        let units = generate(date_of_birth, granularity, horizon, today)?;
        Ok(Self {
            date_of_birth,
            granularity,
            horizon,
            today,
            units,
        })
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn units(&self) -> &[TimeUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<TimeUnit> {
        self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The unit containing today, if today is inside the lifespan window.
    pub fn current(&self) -> Option<&TimeUnit> {
        self.units.iter().find(|u| u.is_current())
    }

    pub fn get(&self, id: &BlockId) -> Option<&TimeUnit> {
        if id.granularity() != self.granularity {
            return None;
        }
        self.units.get(id.sequence_index() as usize)
    }

    /// Unit containing an arbitrary date.
    pub fn locate(&self, date: NaiveDate) -> Option<&TimeUnit> {
        let id = locate(self.date_of_birth, self.granularity, self.horizon, date)?;
        self.get(&id)
    }

    /// Cells per display row.
    pub fn columns(&self) -> usize {
        self.granularity.columns()
    }

    pub fn rows(&self) -> usize {
        self.units.len().div_ceil(self.columns())
    }

    /// `(row, column)` of a unit in the display layout.
    pub fn position(&self, id: &BlockId) -> Option<(usize, usize)> {
        let unit = self.get(id)?;
        let index = unit.sequence_index as usize;
        Some((index / self.columns(), index % self.columns()))
    }

    pub fn summary(&self) -> GridSummary {
        self.units
            .iter()
            .fold(GridSummary::default(), |mut acc, unit| {
                match unit.classification {
                    Classification::Past => acc.past += 1,
                    Classification::Current => acc.current += 1,
                    Classification::Future => acc.future += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifegridError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_years_scenario_current_is_age_24() {
        let units = generate(
            date(2000, 1, 1),
            Granularity::Year,
            Horizon::default(),
            date(2024, 6, 15),
        )
        .unwrap();

        assert_eq!(units.len(), 90);
        assert_eq!(units[24].classification, Classification::Current);
        assert_eq!(units[24].block_id.to_string(), "year_24");
        assert_eq!(units[23].classification, Classification::Past);
        assert_eq!(units[25].classification, Classification::Future);
        assert_eq!(units.iter().filter(|u| u.is_current()).count(), 1);
    }

    #[test]
    fn test_lengths_per_granularity() {
        let dob = date(1990, 5, 17);
        let today = date(2024, 1, 1);
        for (g, expected) in [
            (Granularity::Week, 90 * 52),
            (Granularity::Month, 90 * 12),
            (Granularity::Year, 90),
        ] {
            let units = generate(dob, g, Horizon::default(), today).unwrap();
            assert_eq!(units.len(), expected);
        }
    }

    #[test]
    fn test_weeks_start_on_birth_date_and_step_seven_days() {
        let dob = date(1990, 5, 17);
        let units = generate(dob, Granularity::Week, Horizon::default(), dob).unwrap();
        assert_eq!(units[0].period_start, dob);
        assert_eq!(units[1].period_start, date(1990, 5, 24));
        assert_eq!(units[0].classification, Classification::Current);
    }

    #[test]
    fn test_week_years_restart_on_birthdays() {
        let dob = date(1990, 5, 17);
        let units = generate(dob, Granularity::Week, Horizon::default(), dob).unwrap();

        // The last week of a year absorbs the days up to the next birthday.
        assert_eq!(units[51].period_start, date(1991, 5, 9));
        assert_eq!(units[51].period_end, date(1991, 5, 17));
        assert_eq!(units[52].block_id.to_string(), "week_1_0");
        assert_eq!(units[52].period_start, date(1991, 5, 17));

        let id = BlockId::parse("week_24_0").unwrap();
        assert_eq!(id.period(dob, Horizon::default()).unwrap().0, date(2014, 5, 17));
    }

    #[test]
    fn test_locate_week_tracks_age() {
        let dob = date(1990, 5, 17);
        let h = Horizon::default();

        let before_birthday = locate(dob, Granularity::Week, h, date(2030, 5, 1)).unwrap();
        assert_eq!(before_birthday.to_string(), "week_39_49");
        assert_eq!(before_birthday.age(), 39);

        let eve = locate(dob, Granularity::Week, h, date(2030, 5, 16)).unwrap();
        assert_eq!(eve.to_string(), "week_39_51");

        let birthday = locate(dob, Granularity::Week, h, date(2030, 5, 17)).unwrap();
        assert_eq!(birthday.to_string(), "week_40_0");
    }

    #[test]
    fn test_leap_day_birth_weeks() {
        let dob = date(2000, 2, 29);
        let h = Horizon::default();
        let units = generate(dob, Granularity::Week, h, dob).unwrap();
        assert_eq!(units[52].period_start, date(2001, 2, 28));
        assert_eq!(units[208].period_start, date(2004, 2, 29));
        assert_eq!(
            locate(dob, Granularity::Week, h, date(2001, 2, 28)).unwrap().to_string(),
            "week_1_0"
        );
    }

    #[test]
    fn test_months_clamp_without_drift() {
        let dob = date(2000, 1, 31);
        let units = generate(dob, Granularity::Month, Horizon::default(), dob).unwrap();
        assert_eq!(units[1].period_start, date(2000, 2, 29));
        assert_eq!(units[2].period_start, date(2000, 3, 31));
        assert_eq!(units[13].period_start, date(2001, 2, 28));
        assert_eq!(units[14].period_start, date(2001, 3, 31));
    }

    #[test]
    fn test_leap_day_birth_years() {
        let dob = date(2000, 2, 29);
        let today = date(2001, 2, 28);
        let units = generate(dob, Granularity::Year, Horizon::default(), today).unwrap();
        assert_eq!(units[1].period_start, date(2001, 2, 28));
        assert_eq!(units[4].period_start, date(2004, 2, 29));
        assert_eq!(units[1].classification, Classification::Current);
    }

    #[test]
    fn test_period_end_is_next_start() {
        let units = generate(
            date(1985, 8, 31),
            Granularity::Month,
            Horizon::default(),
            date(2020, 1, 1),
        )
        .unwrap();
        for pair in units.windows(2) {
            assert_eq!(pair[0].period_end, pair[1].period_start);
            assert!(pair[0].period_start < pair[1].period_start);
        }
    }

    #[test]
    fn test_no_current_beyond_horizon() {
        let units = generate(
            date(1900, 1, 1),
            Granularity::Year,
            Horizon::default(),
            date(2024, 1, 1),
        )
        .unwrap();
        assert!(units.iter().all(|u| u.classification == Classification::Past));
    }

    #[test]
    fn test_future_birth_date_is_invalid() {
        let err = generate(
            date(2030, 1, 1),
            Granularity::Week,
            Horizon::default(),
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, LifegridError::Grid(GridError::InvalidDate { .. })));
    }

    #[test]
    fn test_out_of_range_horizon_is_invalid_date() {
        let err = generate(NaiveDate::MAX, Granularity::Year, Horizon::default(), NaiveDate::MAX)
            .unwrap_err();
        assert!(matches!(err, LifegridError::Grid(GridError::InvalidDate { .. })));
    }

    #[test]
    fn test_generate_from_str_errors() {
        let today = date(2024, 1, 1);
        let err = generate_from_str("2000-02-30", "weeks", Horizon::default(), today).unwrap_err();
        assert!(matches!(err, LifegridError::Grid(GridError::InvalidDate { .. })));

        let err =
            generate_from_str("2000-02-01", "decades", Horizon::default(), today).unwrap_err();
        assert!(matches!(err, LifegridError::Grid(GridError::InvalidGranularity { .. })));

        let units = generate_from_str(" 2000-02-01 ", "Months", Horizon::default(), today).unwrap();
        assert_eq!(units.len(), 1080);
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(Horizon::new(0).is_none());
        assert!(Horizon::new(MAX_HORIZON_YEARS + 1).is_none());
        assert_eq!(Horizon::new(1).unwrap().unit_count(Granularity::Week), 52);
        assert_eq!(Horizon::default().years(), 90);
    }

    #[test]
    fn test_locate_handles_day_of_month() {
        let dob = date(1990, 5, 17);
        let h = Horizon::default();
        let at = |g: Granularity, day: NaiveDate| locate(dob, g, h, day).map(|id| id.to_string());

        assert_eq!(at(Granularity::Month, date(1990, 6, 16)).unwrap(), "month_0_0");
        assert_eq!(at(Granularity::Month, date(1990, 6, 17)).unwrap(), "month_0_1");
        assert_eq!(at(Granularity::Year, date(2024, 5, 16)).unwrap(), "year_33");
        assert_eq!(at(Granularity::Year, date(2024, 5, 17)).unwrap(), "year_34");
        assert_eq!(at(Granularity::Week, date(1990, 5, 23)).unwrap(), "week_0_0");
        assert_eq!(at(Granularity::Week, date(1990, 5, 24)).unwrap(), "week_0_1");
        assert!(at(Granularity::Week, date(1990, 5, 16)).is_none());
        assert!(at(Granularity::Year, date(2080, 5, 17)).is_none());
    }

    #[test]
    fn test_block_id_period_roundtrip() {
        let dob = date(1990, 5, 17);
        let h = Horizon::default();
        let id = BlockId::parse("month_1_2").unwrap();
        assert_eq!(id.period(dob, h), Some((date(1991, 7, 17), date(1991, 8, 17))));
        assert!(BlockId::year(90).period(dob, h).is_none());
    }

    #[test]
    fn test_life_grid_layout_and_summary() {
        let grid = LifeGrid::build(
            date(2000, 1, 1),
            Granularity::Year,
            Horizon::default(),
            date(2024, 6, 15),
        )
        .unwrap();

        assert_eq!(grid.columns(), 10);
        assert_eq!(grid.rows(), 9);
        assert_eq!(grid.current().unwrap().sequence_index, 24);
        assert_eq!(grid.position(&BlockId::year(24)), Some((2, 4)));
        assert!(grid.get(&BlockId::week(0, 0).unwrap()).is_none());
        assert_eq!(
            grid.summary(),
            GridSummary {
                past: 24,
                current: 1,
                future: 65
            }
        );
        assert_eq!(grid.locate(date(2010, 3, 1)).unwrap().block_id, BlockId::year(10));
    }
}
