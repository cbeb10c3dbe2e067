//! Configuration for planstack.
//!
//! `config.kdl` lives in the data directory next to the persisted state and
//! holds user preferences:
//!
//! - `output-format` - "json" or "human"
//! - `code-sequence` - "length" or "monotonic"
//!
//! Use the [`resolver`] module to combine it with CLI flags.

pub mod resolver;
pub mod schema;

pub use resolver::{ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve_config};
pub use schema::{OutputFormat, PlanstackConfig};
