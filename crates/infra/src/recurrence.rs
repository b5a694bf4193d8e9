use chrono::{DateTime, Duration, Months, Utc};

/// Hard cap on occurrences generated for one series.
pub const MAX_OCCURRENCES: u32 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Frequency::Weekly),
            "biweekly" => Some(Frequency::Biweekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }
}

/// Expands a series into concrete kick-off times.
///
/// Occurrence `i` (zero-based) is offset from `start`, never from the
/// previous occurrence: weekly adds `i` weeks, biweekly `2 * i` weeks,
/// monthly `i` calendar months. Month addition lands on the same day of
/// month, clamped to the last day when the target month is shorter
/// (Jan 31 + 1 month = Feb 29 in a leap year). The first occurrence is
/// always exactly `start`; `count == 0` yields an empty sequence.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use infra::recurrence::{occurrences, Frequency};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 19, 0, 0).unwrap();
/// let dates = occurrences(start, Frequency::Weekly, 4);
/// assert_eq!(dates[3], Utc.with_ymd_and_hms(2024, 1, 22, 19, 0, 0).unwrap());
/// ```
pub fn occurrences(start: DateTime<Utc>, frequency: Frequency, count: u32) -> Vec<DateTime<Utc>> {
    let count = count.min(MAX_OCCURRENCES);
    let mut dates = Vec::with_capacity(count as usize);
    for i in 0..count {
        let date = match frequency {
            Frequency::Weekly => Some(start + Duration::weeks(i as i64)),
            Frequency::Biweekly => Some(start + Duration::weeks(2 * i as i64)),
            Frequency::Monthly => start.checked_add_months(Months::new(i)),
        };
        match date {
            Some(d) => dates.push(d),
            None => break,
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn weekly_spreads_seven_days_apart() {
        let start = ymd_hm(2024, 1, 1, 19, 0);
        let dates = occurrences(start, Frequency::Weekly, 4);
        assert_eq!(
            dates,
            vec![
                ymd_hm(2024, 1, 1, 19, 0),
                ymd_hm(2024, 1, 8, 19, 0),
                ymd_hm(2024, 1, 15, 19, 0),
                ymd_hm(2024, 1, 22, 19, 0),
            ]
        );
    }

    #[test]
    fn biweekly_strides_fourteen_days() {
        let start = ymd_hm(2024, 3, 5, 20, 30);
        let dates = occurrences(start, Frequency::Biweekly, 3);
        assert_eq!(dates[1] - dates[0], Duration::days(14));
        assert_eq!(dates[2] - dates[0], Duration::days(28));
        assert_eq!(dates[2], ymd_hm(2024, 4, 2, 20, 30));
    }

    #[test]
    fn monthly_clamps_to_shorter_months() {
        let start = ymd_hm(2024, 1, 31, 18, 0);
        let dates = occurrences(start, Frequency::Monthly, 3);
        assert_eq!(
            dates,
            vec![
                ymd_hm(2024, 1, 31, 18, 0),
                // 2024 is a leap year; Feb clamps to the 29th
                ymd_hm(2024, 2, 29, 18, 0),
                // offsets come from the start date, so March is back on the 31st
                ymd_hm(2024, 3, 31, 18, 0),
            ]
        );
    }

    #[test]
    fn monthly_keeps_time_of_day() {
        let start = ymd_hm(2024, 5, 15, 7, 45);
        let dates = occurrences(start, Frequency::Monthly, 2);
        assert_eq!(dates[1], ymd_hm(2024, 6, 15, 7, 45));
    }

    #[test]
    fn first_occurrence_is_the_start() {
        let start = ymd_hm(2025, 2, 10, 21, 0);
        for freq in [Frequency::Weekly, Frequency::Biweekly, Frequency::Monthly] {
            assert_eq!(occurrences(start, freq, 1), vec![start]);
        }
    }

    #[test]
    fn zero_count_yields_nothing() {
        let start = ymd_hm(2024, 1, 1, 19, 0);
        assert!(occurrences(start, Frequency::Weekly, 0).is_empty());
    }

    #[test]
    fn count_is_capped() {
        let start = ymd_hm(2024, 1, 1, 19, 0);
        let dates = occurrences(start, Frequency::Weekly, 500);
        assert_eq!(dates.len(), MAX_OCCURRENCES as usize);
    }
}
