//! Tracing helpers
// (c) 2026 The unirpc developers

use std::{
    io::IsTerminal as _,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::{Deserialize, Serialize, de};
use strum::VariantNames as _;
use tracing_subscriber::{
    EnvFilter,
    fmt::time::{ChronoLocal, ChronoUtc},
    prelude::*,
};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRIENDLY_FORMAT_LOCAL: &str = "%Y-%m-%d %H:%M:%SL";
const FRIENDLY_FORMAT_UTC: &str = "%Y-%m-%d %H:%M:%SZ";

/// Environment variable that controls what gets logged
const STANDARD_ENV_VAR: &str = "RUST_LOG";

/// Crates whose events are logged when the environment does not say otherwise
const OUR_CRATES: &[&str] = &["unirpc", "unirpct"];

/// Computes the trace level for a pair of verbosity flags
#[must_use]
pub fn trace_level(debug: bool, quiet: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    }
}

/// How log lines are time-stamped
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    /// Local time, as `2025-06-01 13:45:00L`
    #[default]
    Local,
    /// UTC, as `2025-06-01 12:45:00Z`
    Utc,
    /// Local time with offset, per [RFC 3339](https://datatracker.ietf.org/doc/html/rfc3339)
    /// (`2025-06-01T13:45:00.123456+01:00`)
    Rfc3339,
}

impl<'de> Deserialize<'de> for TimeFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // case insensitive, so "UTC" works
        let s = String::deserialize(deserializer)?;
        s.to_ascii_lowercase()
            .parse()
            .map_err(|_| de::Error::unknown_variant(&s, TimeFormat::VARIANTS))
    }
}

/// Log filter setup:
/// Use `RUST_LOG` if set; if not, log only our own crates at a given trace level.
///
/// Returns the filter, and whether it came from the environment.
fn filter_for(trace_level: &str) -> anyhow::Result<(EnvFilter, bool)> {
    EnvFilter::try_from_env(STANDARD_ENV_VAR)
        .map(|filter| (filter, true))
        .or_else(|e| {
            // The env var was unset or invalid. Which is it?
            if std::env::var(STANDARD_ENV_VAR).is_ok() {
                anyhow::bail!("{STANDARD_ENV_VAR} (set in environment) was not understood: {e}");
            }
            let directives = OUR_CRATES
                .iter()
                .map(|c| format!("{c}={trace_level}"))
                .collect::<Vec<_>>()
                .join(",");
            Ok((EnvFilter::try_new(directives)?, false))
        })
}

type BoxedLayer = Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Creates the console layer, which writes to stderr
fn make_layer(trace_level: &str, time_format: TimeFormat) -> anyhow::Result<BoxedLayer> {
    let (filter, used_env) = filter_for(trace_level)?;
    // If we used the environment variable, show log targets; if we did not, we're only logging our own crates.
    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(used_env)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    // The timer changes the layer's type, so each arm finishes the job
    Ok(match time_format {
        TimeFormat::Local => layer
            .with_timer(ChronoLocal::new(FRIENDLY_FORMAT_LOCAL.into()))
            .with_filter(filter)
            .boxed(),
        TimeFormat::Utc => layer
            .with_timer(ChronoUtc::new(FRIENDLY_FORMAT_UTC.into()))
            .with_filter(filter)
            .boxed(),
        TimeFormat::Rfc3339 => layer
            .with_timer(ChronoLocal::rfc_3339())
            .with_filter(filter)
            .boxed(),
    })
}

/// Installs a global subscriber that logs to stderr.
///
/// Unless `RUST_LOG` says otherwise, only events from this workspace's crates are logged,
/// at `trace_level` or above.
/// See [the `EnvFilter` documentation](https://docs.rs/tracing-subscriber/0.3.19/tracing_subscriber/filter/struct.EnvFilter.html)
/// for the `RUST_LOG` syntax.
///
/// Only the first successful call in a process has any effect. If this fails, nothing is
/// installed, so the caller has to report the error some other way.
pub fn setup(trace_level: &str, time_format: TimeFormat) -> anyhow::Result<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::AcqRel) {
        tracing::debug!("tracing already set up");
        return Ok(());
    }
    let result = make_layer(trace_level, time_format)
        .and_then(|layer| Ok(tracing_subscriber::registry().with(layer).try_init()?));
    if result.is_err() {
        TRACING_INITIALIZED.store(false, Ordering::Release);
    }
    result
}

/// Returns whether tracing has been initialized
#[must_use]
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::Acquire)
}
