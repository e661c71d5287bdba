//! Business calendar used for every day boundary in the crate
//!
//! Transactions carry UTC instants; the business day they belong to is
//! decided here, in one fixed offset supplied by configuration rather than
//! the host's locale.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::types::*;
use crate::utils::validation::validate_date_range;

/// America/Sao_Paulo has observed a fixed UTC-3 since daylight saving was abolished in 2019
pub const SAO_PAULO_UTC_OFFSET: &str = "-03:00";

/// Maps instants to business days in a fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar for Sao Paulo business days
    pub fn sao_paulo() -> Self {
        Self::new(FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix()))
    }

    /// Build a calendar from an offset string such as `-03:00`, `+0530` or `Z`
    pub fn from_utc_offset(offset: &str) -> ReconciliationResult<Self> {
        parse_utc_offset(offset).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Business day an instant falls on
    pub fn business_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Current business day
    pub fn today(&self) -> NaiveDate {
        self.business_date(&Utc::now())
    }

    /// Half-open UTC interval `[start, end)` covering one business day.
    ///
    /// Fails with `Validation` for dates at the edge of the representable range.
    pub fn day_bounds(&self, date: NaiveDate) -> ReconciliationResult<(DateTime<Utc>, DateTime<Utc>)> {
        let out_of_range =
            || ReconciliationError::Validation(format!("Date {} is out of range", date));

        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_midnight = local_midnight
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
            .ok_or_else(out_of_range)?;
        let next_midnight = utc_midnight
            .checked_add_signed(Duration::days(1))
            .ok_or_else(out_of_range)?;

        Ok((
            Utc.from_utc_datetime(&utc_midnight),
            Utc.from_utc_datetime(&next_midnight),
        ))
    }

    /// Half-open UTC interval covering every day from `start_date` to `end_date` inclusive
    pub fn range_bounds(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<(DateTime<Utc>, DateTime<Utc>)> {
        validate_date_range(start_date, end_date)?;
        let (start, _) = self.day_bounds(start_date)?;
        let (_, end) = self.day_bounds(end_date)?;
        Ok((start, end))
    }

    /// Whether an instant falls on the given business day
    pub fn contains(&self, date: NaiveDate, instant: &DateTime<Utc>) -> bool {
        self.business_date(instant) == date
    }

    /// Every business day from `start_date` to `end_date` inclusive
    pub fn days_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<Vec<NaiveDate>> {
        validate_date_range(start_date, end_date)?;
        Ok(start_date
            .iter_days()
            .take_while(|day| *day <= end_date)
            .collect())
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::sao_paulo()
    }
}

fn parse_utc_offset(offset: &str) -> ReconciliationResult<FixedOffset> {
    let invalid = || ReconciliationError::Config(format!("Invalid UTC offset: {:?}", offset));

    let trimmed = offset.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_business_date_uses_offset() {
        let calendar = BusinessCalendar::sao_paulo();

        // 01:30 UTC is still the previous evening in Sao Paulo
        assert_eq!(
            calendar.business_date(&utc(2024, 3, 2, 1, 30)),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            calendar.business_date(&utc(2024, 3, 2, 3, 0)),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_day_bounds() {
        let calendar = BusinessCalendar::sao_paulo();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = calendar.day_bounds(date).unwrap();

        assert_eq!(start, utc(2024, 3, 1, 3, 0));
        assert_eq!(end, utc(2024, 3, 2, 3, 0));
        assert!(calendar.contains(date, &start));
        assert!(!calendar.contains(date, &end));
    }

    #[test]
    fn test_day_bounds_at_calendar_edges() {
        let west = BusinessCalendar::sao_paulo();
        let east = BusinessCalendar::from_utc_offset("+05:30").unwrap();

        assert!(matches!(
            west.day_bounds(NaiveDate::MAX),
            Err(ReconciliationError::Validation(_))
        ));
        assert!(matches!(
            east.day_bounds(NaiveDate::MIN),
            Err(ReconciliationError::Validation(_))
        ));
        assert!(matches!(
            west.range_bounds(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), NaiveDate::MAX),
            Err(ReconciliationError::Validation(_))
        ));
    }

    #[test]
    fn test_days_in_range() {
        let calendar = BusinessCalendar::default();
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let days = calendar.days_in_range(start, end).unwrap();
        assert_eq!(days.len(), 3); // leap year
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert!(matches!(
            calendar.days_in_range(end, start),
            Err(ReconciliationError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            BusinessCalendar::from_utc_offset("-03:00").unwrap(),
            BusinessCalendar::sao_paulo()
        );
        assert_eq!(
            BusinessCalendar::from_utc_offset("+0530")
                .unwrap()
                .offset()
                .local_minus_utc(),
            5 * 3600 + 30 * 60
        );
        assert_eq!(
            BusinessCalendar::from_utc_offset("Z")
                .unwrap()
                .offset()
                .local_minus_utc(),
            0
        );
        assert!(BusinessCalendar::from_utc_offset("America/Sao_Paulo").is_err());
        assert!(BusinessCalendar::from_utc_offset("-25:00").is_err());
    }
}
