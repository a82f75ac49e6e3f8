//! Clap adapter for wryfig.
//!
//! This module is the **optional integration layer** between wryfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! - [`augment_command`] adds one argument per exposed schema field, plus the
//!   reserved `--config PATH` and `--show-env-vars` options (once per command).
//! - [`extract_matches`] turns parsed [`ArgMatches`] back into a [`CliInput`]:
//!   values decoded (on/off pairs to `bool`, lists split or collected) and
//!   tagged with clap's own [`ValueSource`].
//! - [`ConfigArgs`] is a derive alternative for the reserved options.
//!
//! Field arguments are never marked required at the clap level and carry no
//! clap default: a required field may still be satisfied by the config file or
//! the environment, which is only known after the merge.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Command};
use serde_json::Value;

use crate::convert::coerce_scalar;
use crate::error::WryfigError;
use crate::extract::CliInput;
use crate::field::{DefaultValue, Field};
use crate::flag::BoolFlag;
use crate::list::{self, ListMode};
use crate::ops;
use crate::schema::{Binding, Schema};
use crate::types::{DeclaredType, ParameterSource};

/// Argument id of the reserved `--config` option.
pub const CONFIG_ID: &str = "config";
/// Argument id of the reserved `--show-env-vars` flag.
pub const SHOW_ENV_VARS_ID: &str = "show_env_vars";

/// Clap-derived reserved options.
///
/// Flatten this into your parser instead of letting [`augment_command`] add
/// the options:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     config: ConfigArgs,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ConfigArgs {
    /// Load configuration from a JSON file.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show environment variables supported by this command and exit.
    #[arg(long = "show-env-vars")]
    pub show_env_vars: bool,
}

/// Add the arguments for `schema` to `cmd`.
///
/// Call once per schema when several schemas share one command. An argument
/// whose id or long name is already registered is skipped with a warning.
pub fn augment_command(mut cmd: Command, schema: &Schema) -> Command {
    for (field, binding) in schema.exposed() {
        for arg in field_args(schema, field, binding) {
            if has_arg(&cmd, &arg) {
                tracing::warn!(
                    schema = schema.name(),
                    "argument '{}' is already registered; skipping duplicate",
                    arg.get_id()
                );
                continue;
            }
            cmd = cmd.arg(arg);
        }
    }
    add_reserved_args(cmd)
}

/// Add `--config` and `--show-env-vars` unless the command already has them.
pub fn add_reserved_args(mut cmd: Command) -> Command {
    if !has_id(&cmd, CONFIG_ID) {
        let mut arg = Arg::new(CONFIG_ID)
            .long("config")
            .value_name("PATH")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Load configuration from a JSON file");
        if !cmd.get_arguments().any(|a| a.get_short() == Some('c')) {
            arg = arg.short('c');
        }
        cmd = cmd.arg(arg);
    }
    if !has_id(&cmd, SHOW_ENV_VARS_ID) {
        cmd = cmd.arg(
            Arg::new(SHOW_ENV_VARS_ID)
                .long("show-env-vars")
                .action(ArgAction::SetTrue)
                .help("Show environment variables supported by this command and exit"),
        );
    }
    cmd
}

/// The `--config` path, if one was given.
pub fn config_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.try_get_one::<PathBuf>(CONFIG_ID).ok().flatten().cloned()
}

/// Whether `--show-env-vars` was passed.
pub fn show_env_vars(matches: &ArgMatches) -> bool {
    matches
        .try_get_one::<bool>(SHOW_ENV_VARS_ID)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// The environment variable tables for `schemas`, separated by blank lines.
/// Print this and exit 0 when [`show_env_vars`] is true.
pub fn render_env_vars(schemas: &[&Schema]) -> String {
    schemas
        .iter()
        .map(|s| ops::env_var_listing(s).to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Read the values for `schema` back out of parsed matches.
///
/// Only arguments that clap saw are included, each with its
/// [`ParameterSource`]. Values that do not convert to the field's declared
/// type fail with [`WryfigError::InvalidValue`] naming the flag.
pub fn extract_matches(schema: &Schema, matches: &ArgMatches) -> Result<CliInput, WryfigError> {
    let mut input = CliInput::new();

    for (field, binding) in schema.exposed() {
        match binding {
            Binding::Excluded => {}
            Binding::Option {
                bool_flag: Some(flag),
                ..
            } => {
                if let Some(value) = decode_bool(matches, field.name(), flag) {
                    input.insert_with_source(field.name(), value, ParameterSource::CommandLine);
                }
            }
            Binding::Option {
                long, list_mode, ..
            } => extract_values(matches, field, &format!("--{long}"), *list_mode, &mut input)?,
            Binding::Argument { name, list, .. } => {
                let mode = list.then_some(ListMode::Repeated);
                extract_values(matches, field, &name.to_uppercase(), mode, &mut input)?
            }
        }
    }

    Ok(input)
}

/// Report a resolution error as a clap usage error on `cmd`.
///
/// Config-file errors are reported against `--config`. The resulting error
/// exits non-zero.
pub fn to_clap_error(cmd: &mut Command, err: &WryfigError) -> clap::Error {
    if err.is_config_file_error() {
        cmd.error(ErrorKind::InvalidValue, format!("invalid value for '--config': {err}"))
    } else {
        cmd.error(ErrorKind::ValueValidation, err.to_string())
    }
}

fn off_id(id: &str) -> String {
    format!("{id}__off")
}

fn field_args(schema: &Schema, field: &Field, binding: &Binding) -> Vec<Arg> {
    let id = field.name().to_string();
    let help = help_text(schema, field, binding);

    match binding {
        Binding::Excluded => Vec::new(),
        Binding::Option {
            bool_flag: Some(flag),
            ..
        } => {
            let on = Arg::new(id.clone())
                .long(flag.on().to_string())
                .action(ArgAction::SetTrue)
                .help(help);
            match flag.off() {
                Some(off) => vec![
                    on,
                    Arg::new(off_id(&id))
                        .long(off.to_string())
                        .action(ArgAction::SetTrue)
                        .help(format!("Turn off --{}", flag.on())),
                ],
                None => vec![on],
            }
        }
        Binding::Option {
            long, list_mode, ..
        } => {
            let action = match list_mode {
                Some(ListMode::Repeated) => ArgAction::Append,
                _ => ArgAction::Set,
            };
            vec![
                Arg::new(id)
                    .long(long.clone())
                    .value_name(value_name(field.declared_type(), *list_mode))
                    .action(action)
                    .help(help),
            ]
        }
        Binding::Argument { name, list, .. } => {
            let mut arg = Arg::new(id).value_name(name.to_uppercase()).help(help);
            if *list {
                arg = arg.num_args(1..).action(ArgAction::Append);
            } else {
                arg = arg.action(ArgAction::Set);
            }
            vec![arg]
        }
    }
}

fn value_name(ty: &DeclaredType, mode: Option<ListMode>) -> String {
    let base = match ty.element().unwrap_or(ty).base() {
        DeclaredType::Integer => "INTEGER",
        DeclaredType::Float => "FLOAT",
        DeclaredType::Boolean => "BOOLEAN",
        _ => "TEXT",
    };
    match mode {
        Some(ListMode::CommaSeparated) => format!("{base},..."),
        _ => base.to_string(),
    }
}

fn help_text(schema: &Schema, field: &Field, binding: &Binding) -> String {
    let mut parts = Vec::new();
    if let Some(description) = field.help() {
        parts.push(description.to_string());
    }
    let constraints = field.constraint_set().help_text();
    if !constraints.is_empty() {
        parts.push(format!("[{}]", constraints.join(", ")));
    }
    if let Some(ListMode::CommaSeparated) = binding.list_mode() {
        parts.push("[comma-separated]".to_string());
    }
    parts.push(format!("[env: {}]", schema.env_var_name(field)));
    if let DefaultValue::Literal(v) = field.default()
        && !v.is_null()
    {
        parts.push(format!("[default: {}]", display_default(v)));
    }
    let required = match binding {
        Binding::Option { required, .. } | Binding::Argument { required, .. } => *required,
        Binding::Excluded => false,
    };
    if required {
        parts.push("[required]".to_string());
    }
    parts.join(" ")
}

fn display_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_default).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn has_id(cmd: &Command, id: &str) -> bool {
    cmd.get_arguments().any(|a| a.get_id() == id)
}

fn has_arg(cmd: &Command, arg: &Arg) -> bool {
    cmd.get_arguments().any(|a| {
        a.get_id() == arg.get_id() || (arg.get_long().is_some() && a.get_long() == arg.get_long())
    })
}

/// Whether `id` is known to these matches. Guards the accessors that panic
/// on unknown ids.
fn present(matches: &ArgMatches, id: &str) -> bool {
    matches.ids().any(|i| i.as_str() == id)
}

/// Position of a flag typed on the command line.
fn cli_index(matches: &ArgMatches, id: &str) -> Option<usize> {
    if !present(matches, id) || matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    Some(matches.index_of(id).unwrap_or(0))
}

/// The last of the on/off flags typed wins; `None` when neither was typed.
fn decode_bool(matches: &ArgMatches, id: &str, flag: &BoolFlag) -> Option<bool> {
    let on = cli_index(matches, id);
    let off = flag.off().and_then(|_| cli_index(matches, &off_id(id)));
    match (on, off) {
        (Some(on), Some(off)) => Some(on > off),
        (Some(_), None) => Some(true),
        (None, Some(_)) => Some(false),
        (None, None) => None,
    }
}

fn hint(source: Option<ValueSource>) -> ParameterSource {
    match source {
        Some(ValueSource::CommandLine) => ParameterSource::CommandLine,
        Some(ValueSource::EnvVariable) => ParameterSource::Environment,
        _ => ParameterSource::Default,
    }
}

fn extract_values(
    matches: &ArgMatches,
    field: &Field,
    param: &str,
    mode: Option<ListMode>,
    input: &mut CliInput,
) -> Result<(), WryfigError> {
    let id = field.name();
    let Ok(Some(raw)) = matches.try_get_many::<String>(id) else {
        return Ok(());
    };
    let raw: Vec<&str> = raw.map(String::as_str).collect();
    let Some(last) = raw.last().copied() else {
        return Ok(());
    };

    let ty = field.declared_type();
    let value = match (ty.element(), mode) {
        (Some(element), Some(ListMode::CommaSeparated)) => {
            list::decode_list(&Value::String(last.to_string()), ListMode::CommaSeparated, element)
        }
        (Some(element), _) => list::decode_repeated(raw.iter().copied(), element),
        (None, _) => coerce_scalar(last, ty).map_err(|reason| WryfigError::InvalidValue {
            param: param.to_string(),
            value: last.to_string(),
            reason,
        }),
    }
    .map_err(|e| match e {
        WryfigError::InvalidValue { value, reason, .. } => WryfigError::InvalidValue {
            param: param.to_string(),
            value,
            reason,
        },
        other => other,
    })?;

    input.insert_with_source(id, value, hint(matches.value_source(id)));
    Ok(())
}
