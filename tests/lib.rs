use std::{ffi::OsStr, sync::LazyLock};

use jiff::Timestamp;

mod preview;

static NOW: LazyLock<Timestamp> =
    LazyLock::new(|| "2025-01-01T05:00:00Z".parse().unwrap());

/// Return a command for the `cadence` binary and no arguments.
fn cadence_bare() -> crate::command::Command {
    crate::command::bin("cadence")
        .env("TZ", "America/New_York")
        .env("CADENCE_NOW", NOW.to_string())
        .env_remove("RUST_BACKTRACE")
}

/// Return a command for the `cadence` binary with the given arguments
/// appended to it.
fn cadence<T: AsRef<OsStr>>(
    args: impl IntoIterator<Item = T>,
) -> crate::command::Command {
    cadence_bare().args(args)
}
