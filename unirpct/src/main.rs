//! unirpc utility - main entrypoint
// (c) 2026 The unirpc developers

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process::ExitCode;

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    unirpct::cli(std::env::args_os())
}
