//! General utility code that didn't fit anywhere else
// (c) 2026 The unirpc developers

mod tracing;
pub use tracing::{TimeFormat, is_initialized as tracing_is_initialised, setup as setup_tracing, trace_level};
