//! Core resolution pipeline: merge the four sources and produce a typed config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Defaults for every field that has one (factories invoked once per call)
//! 2. Environment values on top, tagged `Env`
//! 3. Config-file values on top, matched by name then alias, tagged `ConfigFile`
//! 4. CLI values that count as command-line input on top, tagged `Cli`
//! 5. Fields still missing are left out; validation reports them
//!
//! The result is a pure function of the inputs: running it twice gives the
//! same map.

use serde_json::{Map, Value};

use crate::env;
use crate::error::WryfigError;
use crate::extract::{self, CliInput};
use crate::file::ConfigFile;
use crate::merge::{self, TrackedMap};
use crate::schema::Schema;
use crate::sourced::Sourced;
use crate::types::{Source, TrackedValue};
use crate::validate::{self, Model};

/// All pre-loaded data needed to resolve a config. No I/O happens here.
#[derive(Debug, Clone, Default)]
pub struct ResolveInput {
    /// Raw environment variable pairs. `None` disables the environment layer.
    pub env_vars: Option<Vec<(String, String)>>,
    /// The parsed config file, if one was given.
    pub config_file: Option<ConfigFile>,
    /// Values and provenance hints from the CLI adapter.
    pub cli: CliInput,
}

/// Field name to value and source, for one resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: TrackedMap,
}

impl ResolvedConfig {
    pub fn get(&self, field: &str) -> Option<&TrackedValue> {
        self.values.get(field)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).map(|tv| &tv.value)
    }

    pub fn source(&self, field: &str) -> Option<Source> {
        self.get(field).map(|tv| tv.source)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TrackedValue)> {
        self.values.iter()
    }

    /// Values without their tags.
    pub fn values(&self) -> Map<String, Value> {
        merge::untracked(&self.values)
    }

    pub fn sources(&self) -> std::collections::BTreeMap<String, Source> {
        merge::sources_of(&self.values)
    }

    pub fn into_inner(self) -> TrackedMap {
        self.values
    }
}

/// Merge defaults, environment, config file and CLI values for `schema`.
///
/// Missing required fields are simply absent from the result. Errors come
/// only from strict mode: unknown config-file keys or unknown CLI keys.
pub fn merge(schema: &Schema, input: &ResolveInput) -> Result<ResolvedConfig, WryfigError> {
    let mut values = TrackedMap::new();

    // 1: Defaults
    merge::apply_layer(&mut values, defaults(schema), Source::Default);

    // 2: Environment
    if let Some(vars) = &input.env_vars {
        let env_values = env::resolve_env(schema, vars.iter().cloned());
        let n = merge::apply_layer(&mut values, env_values, Source::Env);
        tracing::debug!(schema = schema.name(), fields = n, "applied environment layer");
    }

    // 3: Config file
    if let Some(file) = &input.config_file {
        let file_values = file_values(schema, file)?;
        let n = merge::apply_layer(&mut values, file_values, Source::ConfigFile);
        tracing::debug!(schema = schema.name(), fields = n, "applied config file layer");
    }

    // 4: CLI (highest priority)
    let cli_values = extract::extract_cli_values(schema, &input.cli, &values)?;
    let n = merge::apply_layer(&mut values, cli_values, Source::Cli);
    tracing::debug!(schema = schema.name(), fields = n, "applied cli layer");

    Ok(ResolvedConfig { values })
}

/// Merge and validate into `T`, keeping the source map alongside.
pub fn resolve<T: Model>(schema: &Schema, input: &ResolveInput) -> Result<Sourced<T>, WryfigError> {
    let resolved = merge(schema, input)?;
    let config: T = validate::instantiate(schema, &resolved.values(), |f| resolved.source(f))?;
    Ok(Sourced::new(config, resolved.sources()))
}

/// Default values for every field that has one.
pub fn defaults(schema: &Schema) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .filter_map(|f| f.default().produce().map(|v| (f.name().to_string(), v)))
        .collect()
}

/// Pick the config-file values that belong to exposed fields, keyed by
/// canonical name.
///
/// The canonical name is accepted for aliased fields only when the schema
/// populates by name; when a file holds both keys the canonical name wins.
/// In strict mode keys matching no field are an error, and so is the
/// canonical name of an aliased field when the schema does not populate by
/// name.
pub fn file_values(schema: &Schema, file: &ConfigFile) -> Result<Map<String, Value>, WryfigError> {
    if schema.strict() {
        let mut unknown: Vec<String> = file
            .values
            .keys()
            .filter(|k| !accepts_file_key(schema, k))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            return Err(WryfigError::UnknownKeys {
                path: file.path.clone(),
                keys: unknown,
            });
        }
    }

    let mut out = Map::new();
    for (field, _) in schema.exposed() {
        let name = field.name();
        let by_name = match field.alias_name() {
            Some(_) if !schema.populate_by_name() => None,
            _ => file.values.get(name),
        };
        let by_alias = field.alias_name().and_then(|a| file.values.get(a));

        if let (Some(a), Some(b)) = (by_name, by_alias)
            && a != b
        {
            tracing::warn!(
                field = name,
                path = %file.path.display(),
                "config file sets both '{}' and '{}'; using '{}'",
                name,
                field.external_name(),
                name
            );
        }

        if let Some(value) = by_name.or(by_alias) {
            out.insert(name.to_string(), value.clone());
        }
    }

    Ok(out)
}

/// Whether a config file may use `key`. Without `populate_by_name`, an
/// aliased field is only reachable through its alias.
fn accepts_file_key(schema: &Schema, key: &str) -> bool {
    schema.fields().iter().any(|f| f.alias_name() == Some(key))
        || schema
            .field(key)
            .is_some_and(|f| schema.populate_by_name() || f.alias_name().is_none())
}
