/*!
A recurring meeting cadence engine.

Given a team's cadence configuration (daily, weekly, bi-weekly, monthly,
quarterly, half-yearly or annual, with weekday, day-of-month or
nth-weekday anchors, a wall-clock time of day and an IANA time zone),
this crate computes the deterministic sequence of future meeting
occurrences.

The work splits into four pieces:

* [`RawCadence`] and [`CadenceSpec`]: the JSON wire form of a
  configuration and its validated counterpart.
* `resolve`: pure calendar arithmetic, one resolver per anchor variant.
* [`Projector`]: the seam through which local dates become instants,
  with a fixed DST policy implemented by [`TzdbProjector`].
* [`generate`] and [`occurrences`]: the look-ahead cursor producing
  strictly-future, strictly-increasing occurrences with a hard
  iteration ceiling.

The engine holds no mutable state and never reads the clock; identical
inputs always produce identical output, so the same spec can be used
concurrently for UI previews and booking-time lookups without any
coordination.

```no_run
use cadence::{CadenceSpec, RawCadence};

fn main() -> anyhow::Result<()> {
    let raw: RawCadence = serde_json::from_str(
        r#"{
            "frequency": "weekly",
            "weekday": "monday",
            "hour": 10,
            "minute": 0,
            "timezone": "America/New_York"
        }"#,
    )?;
    let spec = CadenceSpec::validate(&raw)?;
    let now = jiff::Zoned::now();
    for occurrence in spec.generate(&now, 8)? {
        println!("{occurrence}");
    }
    Ok(())
}
```
*/

pub use crate::{
    cursor::{
        Error, Occurrence, Occurrences, generate, generate_with, occurrences,
        occurrences_with,
    },
    project::{Projector, TzdbProjector},
    spec::{
        Anchor, CadenceSpec, Frequency, Nth, RawCadence, RawNth, SpecError,
    },
};

mod cursor;
mod project;
mod resolve;
mod spec;
