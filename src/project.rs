use jiff::{
    Zoned,
    civil::{Date, Time},
    tz::{AmbiguousOffset, TimeZone},
};

/// Turns a local calendar date and wall-clock time into a precise instant.
///
/// The engine only ever consumes this interface; it never implements zone
/// rule tables itself. The one implementation that matters in production
/// is `TzdbProjector`, backed by the time zone database jiff loads once at
/// startup. Tests substitute their own to exercise the cursor in
/// isolation.
pub trait Projector {
    /// Projects `date` at `time` in `tz` to an instant.
    ///
    /// Returns `None` only when the resulting instant is outside the
    /// representable range of a timestamp.
    fn project(&self, date: Date, time: Time, tz: &TimeZone) -> Option<Zoned>;
}

/// The tzdb-backed projector, with a fixed DST policy:
///
/// * A local time inside a spring-forward gap rolls forward to the first
///   valid instant after the gap. A 02:30 meeting on a day where the
///   clock jumps from 02:00 to 03:00 happens at 03:30.
/// * A local time inside a fall-back fold resolves to the earlier of the
///   two valid instants.
#[derive(Clone, Copy, Debug, Default)]
pub struct TzdbProjector;

impl Projector for TzdbProjector {
    fn project(&self, date: Date, time: Time, tz: &TimeZone) -> Option<Zoned> {
        let dt = date.to_datetime(time);
        let offset = match tz.to_ambiguous_zoned(dt).offset() {
            AmbiguousOffset::Unambiguous { offset } => offset,
            // In a gap, the offset in force before the transition maps
            // the (nonexistent) civil time to the first instant after
            // the gap.
            AmbiguousOffset::Gap { before, .. } => before,
            // In a fold, the offset before the transition yields the
            // earlier of the two instants.
            AmbiguousOffset::Fold { before, .. } => before,
        };
        let ts = offset.to_timestamp(dt).ok()?;
        Some(ts.to_zoned(tz.clone()))
    }
}
