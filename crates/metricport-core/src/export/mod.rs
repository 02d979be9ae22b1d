//! Export-side naming rules.
//!
//! - `name`: decode `"<name>[<tags>]"` metric names (panic-free, best effort).
//! - `tags`: base tags contributed by process configuration.
//! - `flatten`: per-kind expansion of a sample into scalar sub-metrics.
//!
//! Together these fix the exact series names and tag order the collector sees,
//! so any change here is a change to the exported contract.

pub mod flatten;
pub mod name;
pub mod tags;
