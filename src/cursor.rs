/*!
The look-ahead cursor driving occurrence generation.

The cursor owns no clock and no shared state: generation is a pure
function of `(spec, reference, count)`. It repeatedly asks the anchor
resolver for the next candidate date, projects it to an instant, filters
out anything not strictly in the future, and advances past the candidate
by the frequency's minimum step so the same date can never match twice.
A hard iteration ceiling turns a resolver that fails to advance into an
explicit error instead of an infinite loop.
*/

use jiff::{Span, ToSpan, Zoned, civil::Date};

use crate::{
    project::{Projector, TzdbProjector},
    resolve,
    spec::{Anchor, CadenceSpec, Frequency},
};

/// The most resolver iterations allowed per requested occurrence.
///
/// Exceeding this means a resolver failed to advance, which is a defect
/// in the engine rather than a property of the spec.
const MAX_STEPS_PER_OCCURRENCE: usize = 50;

/// One concrete future instant satisfying a cadence spec.
///
/// Occurrences are derived on demand and never persisted by this crate; a
/// downstream booking collaborator turns one into a durable meeting
/// record.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Occurrence {
    /// The projected instant, in the spec's time zone.
    pub zoned: Zoned,
    /// Position in the generated sequence, starting at 0.
    pub index: usize,
}

impl std::fmt::Display for Occurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.zoned)
    }
}

/// An error from occurrence generation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The spec was rejected before any generation was attempted.
    #[error(transparent)]
    Spec(#[from] crate::spec::SpecError),
    /// The cursor hit its iteration ceiling without producing enough
    /// occurrences. This is an internal-invariant violation, not a
    /// transient condition; it is never retried and never truncated to a
    /// partial result.
    #[error(
        "cadence generation stalled after {iterations} iterations without \
         advancing"
    )]
    Stalled { iterations: usize },
}

/// Generate the next `count` occurrences of `spec` strictly after
/// `reference`, using the tzdb-backed projector.
///
/// The result is all-or-nothing: exactly `count` occurrences, strictly
/// increasing and all strictly greater than `reference`, or an error.
/// Identical arguments always produce identical output.
pub fn generate(
    spec: &CadenceSpec,
    reference: &Zoned,
    count: usize,
) -> Result<Vec<Occurrence>, Error> {
    generate_with(spec, reference, count, TzdbProjector)
}

/// Like `generate`, but with an explicit projector.
pub fn generate_with<P: Projector>(
    spec: &CadenceSpec,
    reference: &Zoned,
    count: usize,
    projector: P,
) -> Result<Vec<Occurrence>, Error> {
    let ceiling = MAX_STEPS_PER_OCCURRENCE.saturating_mul(count);
    let mut cursor = occurrences_with(spec, reference, projector);
    let mut occurrences = Vec::with_capacity(count);
    let mut steps = 0;
    while occurrences.len() < count {
        steps += 1;
        if steps > ceiling {
            log::error!(
                "cadence generation for {frequency} spec stalled after \
                 {ceiling} iterations with only {got} of {count} \
                 occurrences; this is a bug in a resolver",
                frequency = spec.frequency(),
                got = occurrences.len(),
            );
            return Err(Error::Stalled { iterations: ceiling });
        }
        match cursor.step() {
            Step::Emit(occurrence) => occurrences.push(occurrence),
            Step::Skip => {}
            Step::Dead => {
                log::error!(
                    "cadence generation for {frequency} spec ran out of \
                     representable dates after {steps} iterations",
                    frequency = spec.frequency(),
                );
                return Err(Error::Stalled { iterations: steps });
            }
        }
    }
    Ok(occurrences)
}

/// Returns a lazy iterator over occurrences of `spec` strictly after
/// `reference`, using the tzdb-backed projector.
///
/// The iterator is "infinite" in the sense that it keeps producing
/// occurrences up to jiff's maximum datetime. It yields
/// `Err(Error::Stalled)` once and then fuses if the engine ever fails to
/// advance.
pub fn occurrences(
    spec: &CadenceSpec,
    reference: &Zoned,
) -> Occurrences {
    occurrences_with(spec, reference, TzdbProjector)
}

/// Like `occurrences`, but with an explicit projector.
pub fn occurrences_with<P: Projector>(
    spec: &CadenceSpec,
    reference: &Zoned,
    projector: P,
) -> Occurrences<P> {
    let cursor = reference.with_time_zone(spec.time_zone().clone()).date();
    Occurrences {
        spec: spec.clone(),
        projector,
        reference: reference.clone(),
        cursor: Some(cursor),
        last: None,
        index: 0,
    }
}

/// A lazy sequence of occurrences. See `occurrences`.
#[derive(Clone, Debug)]
pub struct Occurrences<P = TzdbProjector> {
    spec: CadenceSpec,
    projector: P,
    reference: Zoned,
    /// The next date to hand to the resolver. `None` once the iterator
    /// has died, either from exhausting representable dates or from
    /// reporting a stall.
    cursor: Option<Date>,
    /// The last accepted instant, used to reject duplicates.
    last: Option<Zoned>,
    index: usize,
}

/// The outcome of one cursor step.
enum Step {
    /// A new occurrence was accepted.
    Emit(Occurrence),
    /// The candidate was rejected (not future, duplicate or the rule is
    /// unsatisfiable where the cursor currently points), but the cursor
    /// advanced.
    Skip,
    /// The cursor cannot advance any further.
    Dead,
}

impl<P: Projector> Occurrences<P> {
    fn step(&mut self) -> Step {
        let Some(cursor) = self.cursor else { return Step::Dead };
        let spec = &self.spec;
        let candidate = match resolve::next_on_or_after(
            spec.anchor(),
            spec.frequency(),
            cursor,
        ) {
            Some(candidate) => candidate,
            None => {
                // Unsatisfiable where the cursor points (e.g. a month
                // with no 5th Monday). Move to the next month or period
                // and try again.
                return match advance_unmatched(spec, cursor) {
                    Some(next) => {
                        self.cursor = Some(next);
                        Step::Skip
                    }
                    None => {
                        self.cursor = None;
                        Step::Dead
                    }
                };
            }
        };
        // Advance past the candidate before filtering, so that a rejected
        // candidate can never be re-matched forever.
        self.cursor = advance_past(spec, candidate);
        let Some(zoned) =
            self.projector.project(candidate, spec.time_of_day(), spec.time_zone())
        else {
            return Step::Skip;
        };
        if zoned <= self.reference {
            return Step::Skip;
        }
        if self.last.as_ref() == Some(&zoned) {
            return Step::Skip;
        }
        log::trace!(
            "accepted {frequency} occurrence #{index} at {zoned}",
            frequency = spec.frequency(),
            index = self.index,
        );
        self.last = Some(zoned.clone());
        let occurrence = Occurrence { zoned, index: self.index };
        self.index += 1;
        Step::Emit(occurrence)
    }
}

impl<P: Projector> Iterator for Occurrences<P> {
    type Item = Result<Occurrence, Error>;

    fn next(&mut self) -> Option<Result<Occurrence, Error>> {
        self.cursor?;
        for _ in 0..MAX_STEPS_PER_OCCURRENCE {
            match self.step() {
                Step::Emit(occurrence) => return Some(Ok(occurrence)),
                Step::Skip => continue,
                Step::Dead => break,
            }
        }
        self.cursor = None;
        Some(Err(Error::Stalled { iterations: MAX_STEPS_PER_OCCURRENCE }))
    }
}

/// The cursor position after accepting (or rejecting) `candidate`: one
/// minimum frequency step past it, so the resolver can never return the
/// same date again.
fn advance_past(spec: &CadenceSpec, candidate: Date) -> Option<Date> {
    let step: Span = match spec.frequency() {
        Frequency::Daily => 1.day(),
        Frequency::Weekly => 7.days(),
        Frequency::BiWeekly => 14.days(),
        Frequency::Monthly => {
            return candidate.first_of_month().checked_add(1.month()).ok();
        }
        Frequency::Quarterly | Frequency::HalfYearly | Frequency::Annual => {
            return next_period_start(spec, candidate);
        }
    };
    candidate.checked_add(step).ok()
}

/// The cursor position after a month or period in which the anchor rule
/// was unsatisfiable.
fn advance_unmatched(spec: &CadenceSpec, cursor: Date) -> Option<Date> {
    match *spec.anchor() {
        Anchor::MonthlyNth { .. } => {
            cursor.first_of_month().checked_add(1.month()).ok()
        }
        Anchor::PeriodNth { .. } => next_period_start(spec, cursor),
        // The remaining anchors are satisfiable from any date, so their
        // resolvers never report an unsatisfiable position. Take the
        // smallest possible step; the iteration ceiling catches the bug
        // if this is ever reached.
        _ => cursor.checked_add(1.day()).ok(),
    }
}

fn next_period_start(spec: &CadenceSpec, date: Date) -> Option<Date> {
    let Anchor::PeriodNth { anchor_month, .. } = *spec.anchor() else {
        return None;
    };
    let months = spec.frequency().period_months()?;
    resolve::period_start(spec.frequency(), anchor_month, date)?
        .checked_add(months.months())
        .ok()
}
