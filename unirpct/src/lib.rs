// (c) 2026 The unirpc developers

//! `unirpct` is a small utility for exercising [unirpc] by hand.
//!
//! * `unirpct loopback` runs one [greeter] call entirely in-process and reports what a client would have seen.
//! * `unirpct serve` serves one greeter call using the stream protocol on stdin and stdout.
//!
//! Options may be tuned with a configuration file (`--config`) or the environment;
//! see [`unirpc::config`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod cli;
pub use cli::{cli, run};

pub mod greeter;
