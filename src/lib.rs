//! Declarative configuration that binds one schema to CLI flags, environment
//! variables, and a JSON config file, and remembers where every value came
//! from.
//!
//! ```ignore
//! let config = Wryfig::builder::<ServerConfig>()
//!     .config_file("server.json")
//!     .load()?;
//!
//! println!("port {} came from {}", config.port, config.source("port"));
//! ```
//!
//! # Why wryfig
//!
//! Command-line tools tend to grow the same plumbing: a flag per setting, an
//! environment variable per setting, a config file that can set any of them,
//! and a precedence rule nobody wrote down. Wryfig replaces that plumbing
//! with a [`Schema`]: one declaration of the fields, their types, defaults,
//! constraints, and descriptions. Flags, env var names, help text, the
//! `--show-env-vars` table, and validation all derive from it.
//!
//! # Layer precedence
//!
//! ```text
//! Defaults              Field::default_value / default_factory
//!        ↑ overridden by
//! Environment vars      PREFIX + FIELD (alias wins over name)
//!        ↑ overridden by
//! Config file           one JSON object, --config PATH
//!        ↑ overridden by
//! CLI                   flags the user actually typed
//! ```
//!
//! Every layer is sparse. Each value in the result is tagged with the
//! [`Source`] that supplied it, and [`Sourced`] keeps those tags next to the
//! typed value without leaking them into its serialization.
//!
//! A CLI value only counts when the user typed it. Parsers report this with a
//! [`ParameterSource`] hint; without a hint the value counts when it differs
//! from what the lower layers produced. This is what lets a config file beat
//! a flag's default.
//!
//! # Core library with no CLI framework
//!
//! The core does not depend on any argument parser. Hand values to the
//! builder with [`cli_value`](WryfigBuilder::cli_value),
//! [`cli_value_from`](WryfigBuilder::cli_value_from), or
//! [`cli_values_from`](WryfigBuilder::cli_values_from), or drive the pure
//! [`resolve`] pipeline yourself with a [`ResolveInput`]. Environment
//! variables can be injected with [`env_vars`](WryfigBuilder::env_vars), so
//! nothing has to touch the process environment.
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default) the [`cli`] module adds one
//! argument per field to a `clap::Command`:
//!
//! - `--field VALUE` for scalars, with the declared type checked on parse,
//! - `--flag` / `--no-flag` pairs (or a single `--flag`) for booleans,
//! - `--tag a --tag b` or `--tags a,b` for lists,
//! - positional arguments for fields marked with [`Field::argument`],
//! - the reserved `--config PATH` and `--show-env-vars` options.
//!
//! Then pass the parsed matches to
//! [`arg_matches`](WryfigBuilder::arg_matches). Clap's own value sources
//! become the provenance hints.
//!
//! # Environment variables
//!
//! With prefix `APP_`, a field `db_url` aliased `database_url` reads
//! `APP_DATABASE_URL`. Names are uppercased with `-` replaced by `_`. Booleans
//! accept `true/false`, `1/0`, `yes/no`, `on/off` in any case. Lists are
//! split on commas when the field or schema asks for comma-separated lists.
//! A value that does not convert is passed through as text and rejected by
//! validation.
//!
//! # Strict mode
//!
//! Strict mode is off by default. When on, a config file key that names no
//! field fails with [`WryfigError::UnknownKeys`], and an unknown CLI key
//! fails with [`WryfigError::ExtraFields`].
//!
//! # Error handling
//!
//! Fallible operations return [`WryfigError`]. Validation failures carry a
//! [`ValidationErrors`] that lists every failing field. Enable the
//! `rich-errors` feature for miette diagnostics.

pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
pub mod cli;
pub mod convert;
pub mod env;
pub mod extract;
mod field;
pub mod file;
pub mod flag;
pub mod list;
pub mod merge;
pub mod multi;
pub mod ops;
pub mod persist;
pub mod resolve;
mod schema;
mod sourced;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Wryfig, WryfigBuilder};
#[cfg(feature = "clap")]
pub use cli::ConfigArgs;
pub use error::WryfigError;
pub use extract::CliInput;
pub use field::{Constraints, DefaultValue, Field, Marker, OptionSpec};
pub use file::ConfigFile;
pub use flag::BoolFlag;
pub use list::ListMode;
pub use ops::EnvVarListing;
pub use resolve::{ResolveInput, ResolvedConfig};
pub use schema::{Binding, Schema, SchemaBuilder};
pub use sourced::Sourced;
pub use types::{DeclaredType, ParameterSource, Source, TrackedValue};
pub use validate::{FieldError, Model, ValidationErrors};
