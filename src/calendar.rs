//! Week-ending math and value formatting for the scorecard grids.
//!
//! All dates are plain calendar dates; weeks are labeled by the date of
//! their configured ending weekday (Friday unless a group overrides it).

use crate::models::{DataType, WeekDay};
use chrono::{Datelike, Days, NaiveDate, Utc};

/// The date of the next occurrence of `week_day` on or after `date`.
/// A date already on that weekday is returned unchanged.
pub fn week_ending(date: NaiveDate, week_day: WeekDay) -> NaiveDate {
    let current = date.weekday().num_days_from_sunday();
    let diff = (week_day.index() + 7 - current) % 7;
    date + Days::new(u64::from(diff))
}

/// Ordered, deduplicated week-ending dates intersecting the given month
/// (`month0` is zero-based). The closing days of a month belong to a week
/// whose ending label may fall in the next month; that week is still
/// listed here.
pub fn week_endings_for_month(year: i32, month0: u32, week_day: WeekDay) -> Vec<NaiveDate> {
    let Some(first_day) = NaiveDate::from_ymd_opt(year, month0 + 1, 1) else {
        return Vec::new();
    };
    let last_day = match NaiveDate::from_ymd_opt(
        if month0 == 11 { year + 1 } else { year },
        if month0 == 11 { 1 } else { month0 + 2 },
        1,
    ) {
        Some(next_first) => next_first.pred_opt().unwrap_or(first_day),
        None => return Vec::new(),
    };

    let mut weeks = Vec::new();
    let mut current = week_ending(first_day, week_day);
    if current < first_day {
        current = current + Days::new(7);
    }
    while current <= last_day {
        weeks.push(current);
        current = current + Days::new(7);
    }

    let last_week_ending = week_ending(last_day, week_day);
    if !weeks.contains(&last_week_ending) {
        weeks.push(last_week_ending);
    }

    weeks
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Column caption for a week-ending date, e.g. "Feb 7".
pub fn format_week_header(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Quarter label for a date, e.g. "2026-Q1".
pub fn quarter_label_for(date: NaiveDate) -> String {
    format!("{}-Q{}", date.year(), date.month0() / 3 + 1)
}

pub fn current_quarter_label() -> String {
    quarter_label_for(Utc::now().date_naive())
}

/// Display form of a numeric value for its declared data type. `None`
/// renders as an empty cell.
pub fn format_value(value: Option<f64>, data_type: DataType) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match data_type {
        DataType::Currency => {
            if value >= 1000.0 {
                let thousands = value / 1000.0;
                if value % 1000.0 == 0.0 {
                    format!("${:.0}k", thousands)
                } else {
                    format!("${:.1}k", thousands)
                }
            } else {
                format!("${}", group_thousands(value))
            }
        }
        DataType::Percentage => format!("{:.1}%", value * 100.0),
        DataType::Decimal => format!("{:.2}", value),
        DataType::Count => group_thousands(value),
    }
}

/// Full currency rendering with no thousands abbreviation, used by the
/// line-item panel where exact figures matter.
pub fn format_currency_full(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("${}", group_thousands(value)),
        None => String::new(),
    }
}

/// Parse operator input back to a number. Strips `$`, `,`, `%`, and
/// whitespace, honors a trailing `k`/`K` thousands suffix so abbreviated
/// currency round-trips, and treats empty or unparseable input as "no
/// value" rather than zero or an error.
pub fn parse_input_value(input: &str, data_type: DataType) -> Option<f64> {
    let mut cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();

    let mut multiplier = 1.0;
    if cleaned.ends_with('k') || cleaned.ends_with('K') {
        cleaned.pop();
        multiplier = 1000.0;
    }

    if cleaned.is_empty() {
        return None;
    }
    let parsed: f64 = cleaned.parse().ok()?;
    let value = parsed * multiplier;

    if data_type == DataType::Percentage {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

/// `total / goal`, with a zero goal mapping to 0 rather than a
/// divide-by-zero fault.
pub fn percent_to_goal(total: f64, goal: f64) -> f64 {
    if goal == 0.0 {
        return 0.0;
    }
    let percent = total / goal;
    if percent.is_finite() {
        percent
    } else {
        0.0
    }
}

/// Thousands-grouped rendering: integer part grouped by commas, fraction
/// kept to at most three digits with trailing zeros trimmed.
fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let integer = rounded.trunc() as u64;
    let fraction = rounded - rounded.trunc();

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction > 0.0 {
        let mut tail = format!("{:.3}", fraction);
        // "0.xyz" -> ".xyz" with trailing zeros dropped
        tail.remove(0);
        while tail.ends_with('0') {
            tail.pop();
        }
        grouped.push_str(&tail);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, WeekDay};
    use chrono::{Datelike, NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn week_ending_lands_on_requested_weekday_within_a_week() {
        let start = date(2026, 1, 1);
        for offset in 0..30u64 {
            let day = start + chrono::Days::new(offset);
            for target in [WeekDay::Sunday, WeekDay::Wednesday, WeekDay::Friday] {
                let ending = week_ending(day, target);
                assert!(ending >= day);
                assert!(ending <= day + chrono::Days::new(6));
                assert_eq!(ending.weekday().num_days_from_sunday(), target.index());
            }
        }
    }

    #[test]
    fn week_ending_is_identity_on_the_ending_day() {
        let friday = date(2026, 1, 2);
        assert_eq!(friday.weekday(), Weekday::Fri);
        assert_eq!(week_ending(friday, WeekDay::Friday), friday);
    }

    #[test]
    fn month_weeks_cover_both_boundaries() {
        // January 2026 starts on a Thursday; the last Friday label for its
        // closing days falls in February.
        let weeks = week_endings_for_month(2026, 0, WeekDay::Friday);
        assert_eq!(
            weeks,
            vec![
                date(2026, 1, 2),
                date(2026, 1, 9),
                date(2026, 1, 16),
                date(2026, 1, 23),
                date(2026, 1, 30),
                date(2026, 2, 6),
            ]
        );
    }

    #[test]
    fn month_weeks_are_strictly_increasing_seven_apart() {
        for month0 in 0..12u32 {
            for day in [WeekDay::Sunday, WeekDay::Tuesday, WeekDay::Friday] {
                let weeks = week_endings_for_month(2026, month0, day);
                assert!(!weeks.is_empty());
                let first = date(2026, month0 + 1, 1);
                assert!(weeks[0] >= first);
                for pair in weeks.windows(2) {
                    assert_eq!((pair[1] - pair[0]).num_days(), 7);
                }
                // The final label covers the month's last day.
                let last = weeks.last().expect("at least one week");
                assert!((*last - first).num_days() >= 27);
            }
        }
    }

    #[test]
    fn december_rolls_into_january() {
        let weeks = week_endings_for_month(2026, 11, WeekDay::Friday);
        let last = *weeks.last().expect("december weeks");
        assert_eq!(last, date(2027, 1, 1));
    }

    #[test]
    fn currency_formatting_abbreviates_thousands() {
        assert_eq!(format_value(Some(2500.0), DataType::Currency), "$2.5k");
        assert_eq!(format_value(Some(2000.0), DataType::Currency), "$2k");
        assert_eq!(format_value(Some(999.0), DataType::Currency), "$999");
        assert_eq!(format_value(Some(1234567.0), DataType::Currency), "$1234.6k");
    }

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(format_value(Some(1234.0), DataType::Count), "1,234");
        assert_eq!(format_value(Some(1234567.0), DataType::Count), "1,234,567");
        assert_eq!(format_value(Some(7.0), DataType::Count), "7");
        assert_eq!(format_value(None, DataType::Count), "");
    }

    #[test]
    fn percentage_and_decimal_formatting() {
        assert_eq!(format_value(Some(0.456), DataType::Percentage), "45.6%");
        assert_eq!(format_value(Some(3.14159), DataType::Decimal), "3.14");
    }

    #[test]
    fn parse_strips_symbols_and_honors_thousands_suffix() {
        assert_eq!(parse_input_value("$2.5k", DataType::Currency), Some(2500.0));
        assert_eq!(parse_input_value("1,234", DataType::Count), Some(1234.0));
        assert_eq!(parse_input_value(" 45.6% ", DataType::Percentage), Some(0.456));
        assert_eq!(parse_input_value("3.14", DataType::Decimal), Some(3.14));
    }

    #[test]
    fn parse_treats_garbage_and_blank_as_no_value() {
        assert_eq!(parse_input_value("", DataType::Count), None);
        assert_eq!(parse_input_value("   ", DataType::Count), None);
        assert_eq!(parse_input_value("n/a", DataType::Currency), None);
        assert_eq!(parse_input_value("$", DataType::Currency), None);
    }

    #[test]
    fn format_parse_round_trip_per_type() {
        let cases = [
            (1234.0, DataType::Count, 0.0),
            (2500.0, DataType::Currency, 1.0),
            (0.456, DataType::Percentage, 0.001),
            (3.14, DataType::Decimal, 0.0),
        ];
        for (value, data_type, tolerance) in cases {
            let rendered = format_value(Some(value), data_type);
            let recovered = parse_input_value(&rendered, data_type).expect("round trip");
            assert!(
                (recovered - value).abs() <= tolerance,
                "{value} -> {rendered} -> {recovered}"
            );
        }
    }

    #[test]
    fn full_currency_never_abbreviates() {
        assert_eq!(format_currency_full(Some(2500.0)), "$2,500");
        assert_eq!(format_currency_full(Some(499.99)), "$499.99");
        assert_eq!(format_currency_full(None), "");
    }

    #[test]
    fn current_quarter_label_has_the_expected_shape() {
        let label = current_quarter_label();
        assert!(label.contains("-Q"), "unexpected label {label}");
    }

    #[test]
    fn percent_to_goal_never_faults_on_zero_goal() {
        assert_eq!(percent_to_goal(500.0, 0.0), 0.0);
        assert_eq!(percent_to_goal(0.0, 0.0), 0.0);
        assert_eq!(percent_to_goal(500.0, 1000.0), 0.5);
    }

    #[test]
    fn quarter_labels() {
        assert_eq!(quarter_label_for(date(2026, 1, 15)), "2026-Q1");
        assert_eq!(quarter_label_for(date(2026, 6, 30)), "2026-Q2");
        assert_eq!(quarter_label_for(date(2026, 12, 31)), "2026-Q4");
    }

    #[test]
    fn week_header_caption() {
        assert_eq!(format_week_header(date(2026, 2, 7)), "Feb 7");
    }
}
