use std::{env, io::Write, path::PathBuf, process::ExitCode, sync::LazyLock};

use {
    anyhow::Context,
    jiff::{Timestamp, Zoned, tz::TimeZone},
    lexopt::prelude::*,
};

use cadence::{CadenceSpec, RawCadence};

mod logger;

static TZ: LazyLock<TimeZone> = LazyLock::new(|| TimeZone::system());

static NOW: LazyLock<Zoned> = LazyLock::new(|| {
    let ts = match read_env_cadence_now() {
        Ok(Some(ts)) => {
            log::trace!(
                "setting current time to `{ts}` from `CADENCE_NOW` \
                 environment variable",
            );
            ts
        }
        Ok(None) => {
            let now = Timestamp::now();
            log::trace!(
                "`CADENCE_NOW` environment variable not set, using \
                 current time `{now}`",
            );
            now
        }
        Err(err) => {
            let now = Timestamp::now();
            log::warn!(
                "reading `CADENCE_NOW` failed, using current time \
                 `{now}`: {err:#}",
            );
            now
        }
    };
    ts.to_zoned(TZ.clone())
});

const USAGE: &str = r#"
Print upcoming occurrences for a recurring meeting cadence.

A cadence spec is read as JSON from the given file, or from stdin when no
file is given. Occurrences strictly after the reference time are printed
one per line as RFC 9557 zoned timestamps in the spec's time zone.

USAGE:
    cadence [options] [<spec-path>]

OPTIONS:
    -c, --count <N>
        The number of occurrences to print. Defaults to 8.

    -r, --reference <datetime>
        Generate occurrences strictly after this time instead of now.
        Accepts an RFC 9557 zoned datetime (e.g.
        `2025-06-02T10:00[America/New_York]`) or an RFC 3339 timestamp
        (e.g. `2025-06-02T14:00:00Z`).

    --timestamps
        Print instants as RFC 3339 timestamps in UTC instead of zoned
        datetimes.

    -h, --help
        Print this help message.

ENVIRONMENT:
    CADENCE_NOW
        An RFC 3339 timestamp to use as "now" in lieu of the system
        clock, mostly useful for tests.

    CADENCE_LOG
        A log level: off, error, warn, info, debug or trace.

EXAMPLE:
    $ echo '{
        "frequency": "weekly", "weekday": "monday",
        "hour": 10, "minute": 0, "timezone": "UTC"
      }' | cadence -c3 -r 2025-01-01T12:00[UTC]
    2025-01-06T10:00:00+00:00[UTC]
    2025-01-13T10:00:00+00:00[UTC]
    2025-01-20T10:00:00+00:00[UTC]
"#;

fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    // Look for a broken pipe error. In this case, we generally want
    // to exit "gracefully" with a success exit code. This matches
    // existing Unix convention. We need to handle this explicitly
    // since the Rust runtime doesn't ask for PIPE signals, and thus
    // we get an I/O error instead.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
        // `serde_json` swallows any `std::io::Error` it may hit when
        // serializing JSON via `to_writer`. So to deal with broken pipe
        // errors, we need to explicitly check it.
        if let Some(err) = cause.downcast_ref::<serde_json::Error>() {
            if let Some(kind) = err.io_error_kind() {
                if kind == std::io::ErrorKind::BrokenPipe {
                    return ExitCode::from(0);
                }
            }
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1") {
        writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
    } else {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
    }
    ExitCode::from(1)
}

fn run() -> anyhow::Result<ExitCode> {
    let rustlog = env::var("CADENCE_LOG").unwrap_or_else(|_| String::new());
    let level = match &*rustlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // Initialize the logger without a time zone first so that the
    // `TimeZone::system()` lookup below can itself emit log messages
    // (in UTC); after that, log timestamps become local.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(TZ.clone());

    let Some(args) = Args::parse(&mut lexopt::Parser::from_env())? else {
        writeln!(&mut std::io::stdout(), "{}", USAGE.trim())?;
        return Ok(ExitCode::SUCCESS);
    };

    let raw = args.read_raw_cadence()?;
    let spec = CadenceSpec::validate(&raw).context("invalid cadence spec")?;
    let reference = args.reference.clone().unwrap_or_else(|| NOW.clone());
    let occurrences = cadence::generate(&spec, &reference, args.count)
        .context("failed to generate occurrences")?;

    let mut wtr = std::io::stdout().lock();
    for occurrence in occurrences {
        if args.timestamps {
            writeln!(wtr, "{}", occurrence.zoned.timestamp())?;
        } else {
            writeln!(wtr, "{}", occurrence.zoned)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Default)]
struct Args {
    spec_path: Option<PathBuf>,
    count: usize,
    reference: Option<Zoned>,
    timestamps: bool,
}

impl Args {
    /// Parse command line arguments. `None` means help was requested.
    fn parse(p: &mut lexopt::Parser) -> anyhow::Result<Option<Args>> {
        let mut args = Args { count: 8, ..Args::default() };
        while let Some(arg) = p.next()? {
            match arg {
                Short('c') | Long("count") => {
                    args.count = p
                        .value()?
                        .parse()
                        .context("invalid value for -c/--count")?;
                }
                Short('r') | Long("reference") => {
                    let value = p.value()?.string()?;
                    args.reference = Some(parse_reference(&value).with_context(
                        || format!("invalid reference time `{value}`"),
                    )?);
                }
                Long("timestamps") => args.timestamps = true,
                Short('h') | Long("help") => return Ok(None),
                Value(value) => {
                    anyhow::ensure!(
                        args.spec_path.is_none(),
                        "expected at most one <spec-path> argument",
                    );
                    args.spec_path = Some(PathBuf::from(value));
                }
                arg => return Err(arg.unexpected().into()),
            }
        }
        Ok(Some(args))
    }

    fn read_raw_cadence(&self) -> anyhow::Result<RawCadence> {
        match self.spec_path {
            Some(ref path) => {
                let file = std::fs::File::open(path).with_context(|| {
                    format!("failed to open {}", path.display())
                })?;
                serde_json::from_reader(std::io::BufReader::new(file))
                    .with_context(|| {
                        format!(
                            "failed to read cadence spec from {}",
                            path.display(),
                        )
                    })
            }
            None => serde_json::from_reader(std::io::stdin().lock())
                .context("failed to read cadence spec from stdin"),
        }
    }
}

/// Parses a reference time as either an RFC 9557 zoned datetime or an
/// RFC 3339 timestamp. Plain timestamps are rendered in the system time
/// zone, although that choice is cosmetic: occurrences are always emitted
/// in the spec's own zone.
fn parse_reference(s: &str) -> anyhow::Result<Zoned> {
    if let Ok(zdt) = s.parse::<Zoned>() {
        return Ok(zdt);
    }
    let ts = s.parse::<Timestamp>()?;
    Ok(ts.to_zoned(TZ.clone()))
}

fn read_env_cadence_now() -> anyhow::Result<Option<Timestamp>> {
    let Some(val) = std::env::var_os("CADENCE_NOW") else { return Ok(None) };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`CADENCE_NOW` environment variable is not valid UTF-8: {val:?}"
        )
    };
    val.parse::<Timestamp>()
        .context(
            "`CADENCE_NOW` environment variable is not a valid \
             RFC 3339 timestamp",
        )
        .map(Some)
}
