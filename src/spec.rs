use {
    jiff::{
        Zoned,
        civil::{Date, Time, Weekday},
        tz::TimeZone,
    },
    serde::{Deserialize, Serialize},
};

use crate::cursor::{self, Error, Occurrence, Occurrences};

/// How often a team meets.
///
/// The frequency selects which anchor shape is legal. The anchor payload
/// itself lives in `Anchor`, so that validation can check the pairing
/// explicitly instead of trusting whichever fields happen to be set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frequency {
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Annual,
}

impl Frequency {
    fn parse(s: &str) -> Result<Frequency, SpecError> {
        use self::Frequency::*;

        Ok(match &*s.to_lowercase() {
            "daily" | "day" => Daily,
            "weekly" | "week" => Weekly,
            "biweekly" | "bi-weekly" | "fortnightly" => BiWeekly,
            "monthly" | "month" => Monthly,
            "quarterly" | "quarter" => Quarterly,
            "half-yearly" | "halfyearly" | "semiannual" => HalfYearly,
            "annual" | "annually" | "yearly" | "year" => Annual,
            _ => return Err(SpecError::UnknownFrequency(s.to_string())),
        })
    }

    pub(crate) fn as_str(self) -> &'static str {
        use self::Frequency::*;

        match self {
            Daily => "daily",
            Weekly => "weekly",
            BiWeekly => "bi-weekly",
            Monthly => "monthly",
            Quarterly => "quarterly",
            HalfYearly => "half-yearly",
            Annual => "annual",
        }
    }

    /// The number of months in one period, for the period-anchored
    /// frequencies. `None` for everything else.
    pub(crate) fn period_months(self) -> Option<i32> {
        match self {
            Frequency::Quarterly => Some(3),
            Frequency::HalfYearly => Some(6),
            Frequency::Annual => Some(12),
            _ => None,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which occurrence of a weekday within a month is meant.
///
/// `Fifth` is accepted even though many months don't have a fifth
/// occurrence of a given weekday. Such months simply don't satisfy the
/// rule and are skipped, rather than substituting some other date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Nth {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl Nth {
    /// The signed index understood by `Date::nth_weekday_of_month`, where
    /// `-1` counts from the end of the month.
    pub(crate) fn to_signed(self) -> i8 {
        match self {
            Nth::First => 1,
            Nth::Second => 2,
            Nth::Third => 3,
            Nth::Fourth => 4,
            Nth::Fifth => 5,
            Nth::Last => -1,
        }
    }
}

impl std::fmt::Display for Nth {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match *self {
            Nth::First => "1st",
            Nth::Second => "2nd",
            Nth::Third => "3rd",
            Nth::Fourth => "4th",
            Nth::Fifth => "5th",
            Nth::Last => "last",
        };
        write!(f, "{label}")
    }
}

/// The frequency-specific rule pinning occurrences to calendar positions.
///
/// Exactly one variant is legal for a given frequency, enforced by
/// `CadenceSpec::validate`. Quarterly, half-yearly and annual cadences all
/// share `PeriodNth`; the period length comes from the frequency.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    Daily,
    Weekly { weekday: Weekday },
    BiWeekly { weekday: Weekday, epoch: Date },
    MonthlyDay { day: i8 },
    MonthlyNth { nth: Nth, weekday: Weekday },
    PeriodNth { nth: Nth, weekday: Weekday, anchor_month: i8 },
}

/// The serde-facing wire form of a cadence configuration.
///
/// This is the flat JSON shape produced by the admin UI: a frequency name,
/// a wall-clock time, an IANA time zone identifier and whichever anchor
/// fields the frequency calls for. It is deliberately loose; all invariant
/// checking happens in `CadenceSpec::validate` so that every rejection is
/// a `SpecError` rather than a deserialization failure.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawCadence {
    pub frequency: String,
    pub hour: i64,
    pub minute: i64,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<RawNth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_anchor_month: Option<i64>,
}

/// An "nth" value as it appears on the wire: `1` through `5`, or the
/// string `"last"`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawNth {
    Number(i64),
    Name(String),
}

impl std::fmt::Display for RawNth {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RawNth::Number(n) => write!(f, "{n}"),
            RawNth::Name(ref name) => write!(f, "{name}"),
        }
    }
}

/// An error rejecting a raw cadence configuration.
///
/// Every variant is caller-fixable by correcting the configuration. None
/// of them are ever retried automatically.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error(
        "unrecognized frequency: `{0}` (expected one of daily, weekly, \
         bi-weekly, monthly, quarterly, half-yearly or annual)"
    )]
    UnknownFrequency(String),
    #[error("{frequency} cadence has a missing or conflicting anchor: {detail}")]
    MissingOrConflictingAnchor { frequency: Frequency, detail: String },
    #[error(
        "invalid day of the month `{0}` (values must be in range 1..=31)"
    )]
    DayOfMonthOutOfRange(i64),
    #[error("invalid nth value `{0}` (expected 1 through 5, or \"last\")")]
    InvalidNth(String),
    #[error(
        "bi-weekly cadence requires an explicit epoch date to fix which \
         weeks are \"on\""
    )]
    MissingEpochForBiWeekly,
    #[error("unrecognized weekday: `{0}`")]
    UnknownWeekday(String),
    #[error(
        "invalid time of day `{hour}:{minute:02}` (hour must be in range \
         0..=23 and minute in range 0..=59)"
    )]
    TimeOfDayOutOfRange { hour: i64, minute: i64 },
    #[error("unrecognized time zone identifier: `{0}`")]
    UnknownTimeZone(String),
    #[error(
        "invalid period anchor month `{0}` (values must be in range 1..=12)"
    )]
    AnchorMonthOutOfRange(i64),
}

/// A validated, immutable cadence configuration.
///
/// A `CadenceSpec` is only ever built through `validate`, so holding one
/// means the frequency/anchor pairing and all field ranges are known good.
/// The time zone is resolved from its IANA identifier at validation time;
/// generation never touches the time zone database again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CadenceSpec {
    pub(crate) frequency: Frequency,
    pub(crate) anchor: Anchor,
    pub(crate) time: Time,
    pub(crate) tz: TimeZone,
}

impl CadenceSpec {
    /// Validate a raw configuration into a `CadenceSpec`.
    ///
    /// This checks every invariant in one pass: the frequency name, the
    /// time-of-day ranges, the time zone identifier (against the
    /// statically bundled tzdb, never the clock) and the presence of
    /// exactly the anchor fields the frequency calls for.
    pub fn validate(raw: &RawCadence) -> Result<CadenceSpec, SpecError> {
        let frequency = Frequency::parse(&raw.frequency)?;
        let time = parse_time_of_day(raw.hour, raw.minute)?;
        let tz = jiff::tz::db()
            .get(&raw.timezone)
            .map_err(|_| SpecError::UnknownTimeZone(raw.timezone.clone()))?;
        let anchor = parse_anchor(frequency, raw)?;
        Ok(CadenceSpec { frequency, anchor, time, tz })
    }

    /// Returns the configured frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns the configured anchor rule.
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Returns the configured local wall-clock time of day.
    pub fn time_of_day(&self) -> Time {
        self.time
    }

    /// Returns the resolved time zone.
    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }

    /// Generate the next `count` occurrences strictly after `reference`.
    ///
    /// See `cursor::generate`.
    pub fn generate(
        &self,
        reference: &Zoned,
        count: usize,
    ) -> Result<Vec<Occurrence>, Error> {
        cursor::generate(self, reference, count)
    }

    /// Returns a lazy iterator over occurrences strictly after
    /// `reference`.
    ///
    /// See `cursor::occurrences`.
    pub fn occurrences(&self, reference: &Zoned) -> Occurrences {
        cursor::occurrences(self, reference)
    }
}

fn parse_time_of_day(hour: i64, minute: i64) -> Result<Time, SpecError> {
    let out_of_range = SpecError::TimeOfDayOutOfRange { hour, minute };
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
        return Err(out_of_range);
    }
    Time::new(hour as i8, minute as i8, 0, 0).map_err(|_| out_of_range)
}

fn parse_weekday(s: &str) -> Result<Weekday, SpecError> {
    use jiff::civil::Weekday::*;

    Ok(match &*s.to_lowercase() {
        "sunday" | "sun" | "su" => Sunday,
        "monday" | "mon" | "mo" => Monday,
        "tuesday" | "tues" | "tue" | "tu" => Tuesday,
        "wednesday" | "wed" | "we" => Wednesday,
        "thursday" | "thurs" | "thu" | "th" => Thursday,
        "friday" | "fri" | "fr" => Friday,
        "saturday" | "sat" | "sa" => Saturday,
        _ => return Err(SpecError::UnknownWeekday(s.to_string())),
    })
}

fn parse_nth(raw: &RawNth) -> Result<Nth, SpecError> {
    match *raw {
        RawNth::Number(1) => Ok(Nth::First),
        RawNth::Number(2) => Ok(Nth::Second),
        RawNth::Number(3) => Ok(Nth::Third),
        RawNth::Number(4) => Ok(Nth::Fourth),
        RawNth::Number(5) => Ok(Nth::Fifth),
        RawNth::Name(ref name) if name.eq_ignore_ascii_case("last") => {
            Ok(Nth::Last)
        }
        _ => Err(SpecError::InvalidNth(raw.to_string())),
    }
}

/// Check that exactly the anchor fields required by `frequency` are set,
/// and build the corresponding `Anchor` variant.
fn parse_anchor(
    frequency: Frequency,
    raw: &RawCadence,
) -> Result<Anchor, SpecError> {
    let conflict = |detail: String| SpecError::MissingOrConflictingAnchor {
        frequency,
        detail,
    };
    let forbid = |set: &[(&str, bool)]| -> Result<(), SpecError> {
        for &(name, is_set) in set {
            if is_set {
                return Err(conflict(format!(
                    "the `{name}` field does not apply at this frequency"
                )));
            }
        }
        Ok(())
    };
    let weekday = || -> Result<Weekday, SpecError> {
        match raw.weekday {
            Some(ref s) => parse_weekday(s),
            None => Err(conflict("a `weekday` field is required".to_string())),
        }
    };
    let nth = || -> Result<Nth, SpecError> {
        match raw.nth {
            Some(ref n) => parse_nth(n),
            None => Err(conflict("an `nth` field is required".to_string())),
        }
    };

    match frequency {
        Frequency::Daily => {
            forbid(&[
                ("weekday", raw.weekday.is_some()),
                ("epoch", raw.epoch.is_some()),
                ("day_of_month", raw.day_of_month.is_some()),
                ("nth", raw.nth.is_some()),
                ("period_anchor_month", raw.period_anchor_month.is_some()),
            ])?;
            Ok(Anchor::Daily)
        }
        Frequency::Weekly => {
            forbid(&[
                ("epoch", raw.epoch.is_some()),
                ("day_of_month", raw.day_of_month.is_some()),
                ("nth", raw.nth.is_some()),
                ("period_anchor_month", raw.period_anchor_month.is_some()),
            ])?;
            Ok(Anchor::Weekly { weekday: weekday()? })
        }
        Frequency::BiWeekly => {
            forbid(&[
                ("day_of_month", raw.day_of_month.is_some()),
                ("nth", raw.nth.is_some()),
                ("period_anchor_month", raw.period_anchor_month.is_some()),
            ])?;
            let weekday = weekday()?;
            let epoch =
                raw.epoch.ok_or(SpecError::MissingEpochForBiWeekly)?;
            Ok(Anchor::BiWeekly { weekday, epoch })
        }
        Frequency::Monthly => {
            forbid(&[
                ("epoch", raw.epoch.is_some()),
                ("period_anchor_month", raw.period_anchor_month.is_some()),
            ])?;
            match (raw.day_of_month, raw.nth.is_some()) {
                (Some(day), false) => {
                    forbid(&[("weekday", raw.weekday.is_some())])?;
                    if !(1..=31).contains(&day) {
                        return Err(SpecError::DayOfMonthOutOfRange(day));
                    }
                    Ok(Anchor::MonthlyDay { day: day as i8 })
                }
                (None, true) => {
                    Ok(Anchor::MonthlyNth { nth: nth()?, weekday: weekday()? })
                }
                (Some(_), true) => Err(conflict(
                    "`day_of_month` and `nth` are mutually exclusive"
                        .to_string(),
                )),
                (None, false) => Err(conflict(
                    "either a `day_of_month` field or an `nth` plus \
                     `weekday` pair is required"
                        .to_string(),
                )),
            }
        }
        Frequency::Quarterly | Frequency::HalfYearly | Frequency::Annual => {
            forbid(&[
                ("epoch", raw.epoch.is_some()),
                ("day_of_month", raw.day_of_month.is_some()),
            ])?;
            let nth = nth()?;
            let weekday = weekday()?;
            let anchor_month = raw.period_anchor_month.ok_or_else(|| {
                conflict("a `period_anchor_month` field is required".to_string())
            })?;
            if !(1..=12).contains(&anchor_month) {
                return Err(SpecError::AnchorMonthOutOfRange(anchor_month));
            }
            Ok(Anchor::PeriodNth {
                nth,
                weekday,
                anchor_month: anchor_month as i8,
            })
        }
    }
}
