/*!
Pure calendar-date resolvers, one per anchor variant.

Each resolver answers "what is the next date on or after the input that
satisfies this anchor rule?" Time of day and time zone are not applied
here; that happens later, in `project`. A resolver returns `None` when the
rule is not satisfiable within its current month or period (e.g. the 5th
Monday of a month with only four), in which case the cursor advances and
asks again.
*/

use jiff::{
    ToSpan,
    civil::{Date, Weekday},
};

use crate::spec::{Anchor, Frequency, Nth};

/// Returns the next date on or after `date` satisfying `anchor`.
///
/// `frequency` is only consulted for `Anchor::PeriodNth`, where it fixes
/// the period length.
pub(crate) fn next_on_or_after(
    anchor: &Anchor,
    frequency: Frequency,
    date: Date,
) -> Option<Date> {
    match *anchor {
        Anchor::Daily => Some(date),
        Anchor::Weekly { weekday } => weekday_on_or_after(date, weekday),
        Anchor::BiWeekly { weekday, epoch } => {
            bi_weekly(date, weekday, epoch)
        }
        Anchor::MonthlyDay { day } => monthly_day(date, day),
        Anchor::MonthlyNth { nth, weekday } => {
            nth_in_month(date, nth, weekday).filter(|&c| c >= date)
        }
        Anchor::PeriodNth { nth, weekday, anchor_month } => {
            period_nth(date, frequency, nth, weekday, anchor_month)
        }
    }
}

/// The smallest date greater than or equal to `date` falling on `weekday`.
pub(crate) fn weekday_on_or_after(
    date: Date,
    weekday: Weekday,
) -> Option<Date> {
    if date.weekday() == weekday {
        Some(date)
    } else {
        // `nth_weekday` never includes the date itself.
        date.nth_weekday(1, weekday).ok()
    }
}

/// As `weekday_on_or_after`, but only on weeks whose parity matches the
/// epoch. Weeks are counted in whole 7-day blocks from the epoch, so the
/// "on" weeks stay fixed regardless of what weekday the epoch itself falls
/// on. Since the weekday recurs every 7 days and parity alternates, a
/// rejected candidate is fixed by a single 7-day bump.
fn bi_weekly(date: Date, weekday: Weekday, epoch: Date) -> Option<Date> {
    let candidate = weekday_on_or_after(date, weekday)?;
    let days = i64::from(candidate.since(epoch).ok()?.get_days());
    if days.div_euclid(7).rem_euclid(2) == 0 {
        Some(candidate)
    } else {
        candidate.checked_add(7.days()).ok()
    }
}

/// The configured day of `date`'s month, clamped to the month's length
/// (day 31 in February yields the 28th, or the 29th in a leap year). If
/// that date has already passed, the day is taken in the following month
/// instead. Clamping never skips a month.
fn monthly_day(date: Date, day: i8) -> Option<Date> {
    let in_month = |first: Date| -> Option<Date> {
        Date::new(first.year(), first.month(), day.min(first.days_in_month()))
            .ok()
    };
    let candidate = in_month(date.first_of_month())?;
    if candidate >= date {
        Some(candidate)
    } else {
        in_month(date.first_of_month().checked_add(1.month()).ok()?)
    }
}

/// The nth `weekday` of `date`'s month, or `None` when that month has no
/// nth occurrence. `Nth::Last` counts from the end and always exists.
fn nth_in_month(date: Date, nth: Nth, weekday: Weekday) -> Option<Date> {
    date.first_of_month().nth_weekday_of_month(nth.to_signed(), weekday).ok()
}

/// The nth `weekday` within the period containing `date`.
///
/// The period's first month is tried first; when it has no nth occurrence,
/// the second month is tried before the period is given up on entirely. A
/// candidate that already passed within the period is not made up for in a
/// later month; the period's occurrence is simply gone and `None` tells
/// the cursor to move to the next period.
fn period_nth(
    date: Date,
    frequency: Frequency,
    nth: Nth,
    weekday: Weekday,
    anchor_month: i8,
) -> Option<Date> {
    let start = period_start(frequency, anchor_month, date)?;
    let months = [start, start.checked_add(1.month()).ok()?];
    for month in months {
        if let Some(candidate) = nth_in_month(month, nth, weekday) {
            return (candidate >= date).then_some(candidate);
        }
    }
    None
}

/// The first day of the period containing `date`, for a period scheme
/// whose periods are `frequency.period_months()` long and start in
/// `anchor_month` of some year.
pub(crate) fn period_start(
    frequency: Frequency,
    anchor_month: i8,
    date: Date,
) -> Option<Date> {
    let len = frequency.period_months()?;
    // Work in a flat month index so the modular arithmetic doesn't care
    // about year boundaries.
    let index = i32::from(date.year()) * 12 + i32::from(date.month()) - 1;
    let anchor = i32::from(anchor_month) - 1;
    let start = index - (index - anchor).rem_euclid(len);
    let year = i16::try_from(start.div_euclid(12)).ok()?;
    let month = (start.rem_euclid(12) + 1) as i8;
    Date::new(year, month, 1).ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn weekly_lands_on_or_after() {
        // 2025-01-01 is a Wednesday.
        let wed = date(2025, 1, 1);
        assert_eq!(
            weekday_on_or_after(wed, Weekday::Wednesday),
            Some(wed),
        );
        assert_eq!(
            weekday_on_or_after(wed, Weekday::Monday),
            Some(date(2025, 1, 6)),
        );
        assert_eq!(
            weekday_on_or_after(wed, Weekday::Thursday),
            Some(date(2025, 1, 2)),
        );
    }

    #[test]
    fn bi_weekly_parity_from_epoch() {
        // 2024-01-01 was a Monday, so "on" Mondays are Jan 1, 15, 29, ...
        let epoch = date(2024, 1, 1);
        let anchor = Anchor::BiWeekly { weekday: Weekday::Monday, epoch };
        let next = |d: Date| {
            next_on_or_after(&anchor, Frequency::BiWeekly, d).unwrap()
        };
        assert_eq!(next(date(2024, 1, 1)), date(2024, 1, 1));
        // Jan 8 is an "off" Monday; the next "on" one is Jan 15.
        assert_eq!(next(date(2024, 1, 2)), date(2024, 1, 15));
        assert_eq!(next(date(2024, 1, 8)), date(2024, 1, 15));
        assert_eq!(next(date(2024, 1, 16)), date(2024, 1, 29));
    }

    #[test]
    fn bi_weekly_epoch_weekday_mismatch_is_total() {
        // The epoch needn't fall on the configured weekday. Weeks are
        // counted in 7-day blocks from the epoch, so a Wednesday epoch
        // still yields every other Monday rather than no Mondays at all.
        let epoch = date(2024, 1, 3);
        let anchor = Anchor::BiWeekly { weekday: Weekday::Monday, epoch };
        let next = |d: Date| {
            next_on_or_after(&anchor, Frequency::BiWeekly, d).unwrap()
        };
        // Jan 8 is 5 days (week 0) after the epoch, so it is "on".
        assert_eq!(next(date(2024, 1, 4)), date(2024, 1, 8));
        assert_eq!(next(date(2024, 1, 9)), date(2024, 1, 22));
    }

    #[test]
    fn monthly_day_clamps_short_months() {
        let anchor = Anchor::MonthlyDay { day: 31 };
        let next =
            |d: Date| next_on_or_after(&anchor, Frequency::Monthly, d).unwrap();
        assert_eq!(next(date(2025, 2, 1)), date(2025, 2, 28));
        assert_eq!(next(date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(next(date(2025, 4, 1)), date(2025, 4, 30));
        assert_eq!(next(date(2025, 1, 1)), date(2025, 1, 31));
        // Already past the clamped day: roll into the next month.
        assert_eq!(next(date(2025, 2, 28)), date(2025, 2, 28));
        assert_eq!(next(date(2025, 3, 1)), date(2025, 3, 31));
    }

    #[test]
    fn monthly_nth_picks_the_nth() {
        let anchor =
            Anchor::MonthlyNth { nth: Nth::Second, weekday: Weekday::Tuesday };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Monthly, date(2025, 1, 1)),
            Some(date(2025, 1, 14)),
        );
        // Already past the 2nd Tuesday: unsatisfiable this month.
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Monthly, date(2025, 1, 15)),
            None,
        );
    }

    #[test]
    fn monthly_last_friday() {
        // March 2024 has five Fridays; the last is the 29th.
        let anchor =
            Anchor::MonthlyNth { nth: Nth::Last, weekday: Weekday::Friday };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Monthly, date(2024, 3, 1)),
            Some(date(2024, 3, 29)),
        );
    }

    #[test]
    fn monthly_fifth_weekday_is_unsatisfiable_some_months() {
        // January 2025 has only four Mondays.
        let anchor =
            Anchor::MonthlyNth { nth: Nth::Fifth, weekday: Weekday::Monday };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Monthly, date(2025, 1, 1)),
            None,
        );
        // March 2025 has five.
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Monthly, date(2025, 3, 1)),
            Some(date(2025, 3, 31)),
        );
    }

    #[test]
    fn period_start_wraps_years() {
        // Quarters anchored at February: Feb, May, Aug, Nov.
        let start = |d: Date| {
            period_start(Frequency::Quarterly, 2, d).unwrap()
        };
        assert_eq!(start(date(2025, 2, 10)), date(2025, 2, 1));
        assert_eq!(start(date(2025, 4, 30)), date(2025, 2, 1));
        assert_eq!(start(date(2025, 5, 1)), date(2025, 5, 1));
        // January 2025 belongs to the quarter that started in Nov 2024.
        assert_eq!(start(date(2025, 1, 15)), date(2024, 11, 1));

        // Annual periods anchored at September.
        let start =
            |d: Date| period_start(Frequency::Annual, 9, d).unwrap();
        assert_eq!(start(date(2025, 10, 1)), date(2025, 9, 1));
        assert_eq!(start(date(2025, 3, 1)), date(2024, 9, 1));
    }

    #[test]
    fn period_nth_falls_forward_one_month() {
        // Quarters anchored at January. January 2025 has four Mondays, so
        // a 5th-Monday rule is unsatisfiable there; February also has
        // four, so the whole quarter is skipped.
        let anchor = Anchor::PeriodNth {
            nth: Nth::Fifth,
            weekday: Weekday::Monday,
            anchor_month: 1,
        };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Quarterly, date(2025, 1, 1)),
            None,
        );

        // But a 5th-Thursday rule lands in January 2025 (Thursdays on the
        // 2nd, 9th, 16th, 23rd and 30th).
        let anchor = Anchor::PeriodNth {
            nth: Nth::Fifth,
            weekday: Weekday::Thursday,
            anchor_month: 1,
        };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Quarterly, date(2025, 1, 1)),
            Some(date(2025, 1, 30)),
        );

        // Fall-forward: April 2025 has four Fridays, but May has five,
        // so a 5th-Friday rule in the quarter anchored at April resolves
        // to the quarter's second month.
        let anchor = Anchor::PeriodNth {
            nth: Nth::Fifth,
            weekday: Weekday::Friday,
            anchor_month: 4,
        };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Quarterly, date(2025, 4, 1)),
            Some(date(2025, 5, 30)),
        );
    }

    #[test]
    fn period_nth_does_not_make_up_missed_occurrences() {
        // 3rd Tuesday of the quarter anchored at January is Jan 21, 2025.
        // Asking from February must not substitute a February date.
        let anchor = Anchor::PeriodNth {
            nth: Nth::Third,
            weekday: Weekday::Tuesday,
            anchor_month: 1,
        };
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Quarterly, date(2025, 1, 1)),
            Some(date(2025, 1, 21)),
        );
        assert_eq!(
            next_on_or_after(&anchor, Frequency::Quarterly, date(2025, 2, 1)),
            None,
        );
    }
}
