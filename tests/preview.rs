use crate::{cadence, cadence_bare, command::assert_cmd_snapshot};

const WEEKLY: &str = r#"{
    "frequency": "weekly",
    "weekday": "monday",
    "hour": 10,
    "minute": 0,
    "timezone": "UTC"
}"#;

const DAILY: &str = r#"{
    "frequency": "daily",
    "hour": 9,
    "minute": 0,
    "timezone": "UTC"
}"#;

#[test]
fn weekly_preview_from_explicit_reference() {
    assert_cmd_snapshot!(
        cadence(["-c3", "-r", "2025-01-01T12:00[UTC]"]).stdin(WEEKLY),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    2025-01-06T10:00:00+00:00[UTC]
    2025-01-13T10:00:00+00:00[UTC]
    2025-01-20T10:00:00+00:00[UTC]

    ----- stderr -----
    ",
    );
}

/// With no `-r`, the reference comes from `CADENCE_NOW`
/// (2025-01-01T05:00:00Z here), and the default count is 8.
#[test]
fn default_reference_and_count() {
    assert_cmd_snapshot!(
        cadence_bare().stdin(DAILY),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    2025-01-01T09:00:00+00:00[UTC]
    2025-01-02T09:00:00+00:00[UTC]
    2025-01-03T09:00:00+00:00[UTC]
    2025-01-04T09:00:00+00:00[UTC]
    2025-01-05T09:00:00+00:00[UTC]
    2025-01-06T09:00:00+00:00[UTC]
    2025-01-07T09:00:00+00:00[UTC]
    2025-01-08T09:00:00+00:00[UTC]

    ----- stderr -----
    ",
    );
}

#[test]
fn timestamps_flag_prints_instants() {
    assert_cmd_snapshot!(
        cadence(["-c2", "-r", "2025-01-01T12:00[UTC]", "--timestamps"])
            .stdin(WEEKLY),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    2025-01-06T10:00:00Z
    2025-01-13T10:00:00Z

    ----- stderr -----
    ",
    );
}

#[test]
fn quarterly_preview_crosses_a_dst_transition() {
    let spec = r#"{
        "frequency": "quarterly",
        "nth": 3,
        "weekday": "tuesday",
        "period_anchor_month": 1,
        "hour": 9,
        "minute": 30,
        "timezone": "America/New_York"
    }"#;
    assert_cmd_snapshot!(
        cadence(["-c4", "-r", "2025-01-01T00:00[America/New_York]"])
            .stdin(spec),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----
    2025-01-21T09:30:00-05:00[America/New_York]
    2025-04-15T09:30:00-04:00[America/New_York]
    2025-07-15T09:30:00-04:00[America/New_York]
    2025-10-21T09:30:00-04:00[America/New_York]

    ----- stderr -----
    ",
    );
}

#[test]
fn invalid_spec_is_rejected() {
    let spec = r#"{
        "frequency": "sometimes",
        "hour": 9,
        "minute": 0,
        "timezone": "UTC"
    }"#;
    assert_cmd_snapshot!(
        cadence(["-c3"]).stdin(spec),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    invalid cadence spec: unrecognized frequency: `sometimes` (expected one of daily, weekly, bi-weekly, monthly, quarterly, half-yearly or annual)
    ",
    );
}

/// A `RUST_BACKTRACE=1` in the test runner's own environment must not
/// leak into the binary, which renders errors with a backtrace when it
/// sees that variable set.
#[test]
fn inherited_backtrace_var_does_not_change_error_output() {
    // SAFETY: concurrent tests only read the environment when spawning
    // children, and every child has this variable removed again.
    unsafe { std::env::set_var("RUST_BACKTRACE", "1") }
    let spec = r#"{
        "frequency": "sometimes",
        "hour": 9,
        "minute": 0,
        "timezone": "UTC"
    }"#;
    assert_cmd_snapshot!(
        cadence(["-c3"]).stdin(spec),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    invalid cadence spec: unrecognized frequency: `sometimes` (expected one of daily, weekly, bi-weekly, monthly, quarterly, half-yearly or annual)
    ",
    );
}

#[test]
fn missing_epoch_is_rejected() {
    let spec = r#"{
        "frequency": "bi-weekly",
        "weekday": "monday",
        "hour": 9,
        "minute": 0,
        "timezone": "UTC"
    }"#;
    assert_cmd_snapshot!(
        cadence(["-c3"]).stdin(spec),
        @r#"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    invalid cadence spec: bi-weekly cadence requires an explicit epoch date to fix which weeks are "on"
    "#,
    );
}
