use std::marker::PhantomData;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::WryfigError;
use crate::extract::CliInput;
use crate::file::ConfigFile;
use crate::ops::{self, EnvVarListing};
use crate::resolve::{self, ResolveInput, ResolvedConfig};
use crate::schema::Schema;
use crate::sourced::Sourced;
use crate::types::ParameterSource;
use crate::validate::Model;

/// Entry point for building a wryfig configuration.
pub struct Wryfig;

impl Wryfig {
    pub fn builder<T: Model>() -> WryfigBuilder<T> {
        WryfigBuilder::new()
    }
}

/// Builder that gathers the I/O inputs (process environment, config file, CLI
/// values) and hands them to the pure [`resolve`](crate::resolve) pipeline.
pub struct WryfigBuilder<T: Model> {
    schema: Option<Schema>,
    env_prefix: Option<String>,
    env_enabled: bool,
    env_vars: Option<Vec<(String, String)>>,
    config_file: Option<PathBuf>,
    cli: CliInput,
    auto_values: Map<String, Value>,
    strict: Option<bool>,
    deferred: Option<WryfigError>,
    #[cfg(feature = "clap")]
    matches: Option<clap::ArgMatches>,
    _phantom: PhantomData<T>,
}

impl<T: Model> WryfigBuilder<T> {
    fn new() -> Self {
        Self {
            schema: None,
            env_prefix: None,
            env_enabled: true,
            env_vars: None,
            config_file: None,
            cli: CliInput::new(),
            auto_values: Map::new(),
            strict: None,
            deferred: None,
            #[cfg(feature = "clap")]
            matches: None,
            _phantom: PhantomData,
        }
    }

    /// Use `schema` instead of `T::schema()`.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Override the schema's environment variable prefix.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read these pairs instead of `std::env::vars()`.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    /// Load this JSON config file. A missing file is an error.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Like [`config_file`](Self::config_file), but `None` is ignored (useful
    /// for an optional `--config` argument).
    pub fn config_file_opt(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        if let Some(p) = path {
            self.config_file = Some(p.into());
        }
        self
    }

    /// Override the schema's strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Add a CLI value with no provenance. `None` values are ignored (useful
    /// for optional clap args). Counts as CLI input only when it differs from
    /// the lower layers.
    pub fn cli_value<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli.insert(key, v);
        }
        self
    }

    /// Add a CLI value together with where the CLI framework says it came from.
    pub fn cli_value_from<V: Into<Value>>(mut self, key: &str, value: V, source: ParameterSource) -> Self {
        self.cli.insert_with_source(key, value, source);
        self
    }

    /// Add everything from an adapter-built [`CliInput`]. Later entries win.
    pub fn cli_input(mut self, input: CliInput) -> Self {
        self.cli.values.extend(input.values);
        self.cli.hints.extend(input.hints);
        self
    }

    /// Add CLI values from any serializable source, auto-matching by field name
    /// or alias.
    ///
    /// Serializes `source` into a flat object, skips `null` values, and keeps
    /// only keys the schema knows. Non-matching keys are silently ignored, so
    /// clap-only fields like `command` or `verbose` are automatically excluded.
    ///
    /// Works with clap-derived structs, maps, or anything implementing `Serialize`.
    pub fn cli_values_from<S: Serialize>(mut self, source: &S) -> Self {
        match serde_json::to_value(source) {
            Ok(Value::Object(map)) => {
                self.auto_values
                    .extend(map.into_iter().filter(|(_, v)| !v.is_null()));
            }
            Ok(_) => {}
            Err(e) => self.deferred = Some(WryfigError::Serialize(e)),
        }
        self
    }

    /// Take CLI values and the `--config` path from parsed clap matches.
    ///
    /// Requires the command to have been augmented with
    /// [`cli::augment_command`](crate::cli::augment_command) for this schema.
    #[cfg(feature = "clap")]
    pub fn arg_matches(mut self, matches: &clap::ArgMatches) -> Self {
        self.matches = Some(matches.clone());
        self
    }

    /// The effective schema: `T::schema()` or the override, with builder
    /// settings applied.
    fn effective_schema(&self) -> Result<Schema, WryfigError> {
        let mut schema = match &self.schema {
            Some(s) => s.clone(),
            None => T::schema()?,
        };
        if let Some(prefix) = &self.env_prefix {
            schema = schema.with_env_prefix(prefix);
        }
        if let Some(strict) = self.strict {
            schema = schema.with_strict(strict);
        }
        Ok(schema)
    }

    fn effective_env_vars(&self) -> Option<Vec<(String, String)>> {
        if !self.env_enabled {
            return None;
        }
        Some(
            self.env_vars
                .clone()
                .unwrap_or_else(|| std::env::vars().collect()),
        )
    }

    /// Build the `ResolveInput` from current builder state.
    fn into_input(mut self, schema: &Schema) -> Result<ResolveInput, WryfigError> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }

        let mut cli = CliInput::new();
        for (key, value) in &self.auto_values {
            if schema.is_known_key(key) {
                cli.insert(key, value.clone());
            }
        }

        let mut config_path = self.config_file.take();
        self.apply_matches(schema, &mut cli, &mut config_path)?;

        cli.values.extend(std::mem::take(&mut self.cli.values));
        cli.hints.extend(std::mem::take(&mut self.cli.hints));

        let config_file = config_path.map(ConfigFile::load).transpose()?;

        Ok(ResolveInput {
            env_vars: self.effective_env_vars(),
            config_file,
            cli,
        })
    }

    #[cfg(feature = "clap")]
    fn apply_matches(
        &self,
        schema: &Schema,
        cli: &mut CliInput,
        config_path: &mut Option<PathBuf>,
    ) -> Result<(), WryfigError> {
        let Some(matches) = &self.matches else {
            return Ok(());
        };
        let input = crate::cli::extract_matches(schema, matches)?;
        cli.values.extend(input.values);
        cli.hints.extend(input.hints);
        if config_path.is_none() {
            *config_path = crate::cli::config_path(matches);
        }
        Ok(())
    }

    #[cfg(not(feature = "clap"))]
    fn apply_matches(
        &self,
        _schema: &Schema,
        _cli: &mut CliInput,
        _config_path: &mut Option<PathBuf>,
    ) -> Result<(), WryfigError> {
        Ok(())
    }

    /// Merge all layers without validating.
    pub fn merge(self) -> Result<ResolvedConfig, WryfigError> {
        let schema = self.effective_schema()?;
        let input = self.into_input(&schema)?;
        resolve::merge(&schema, &input)
    }

    /// Load, merge and validate the configuration.
    pub fn load(self) -> Result<Sourced<T>, WryfigError> {
        let schema = self.effective_schema()?;
        let input = self.into_input(&schema)?;
        resolve::resolve(&schema, &input)
    }

    /// The environment variables the effective schema reads.
    pub fn env_var_listing(&self) -> Result<EnvVarListing, WryfigError> {
        Ok(ops::env_var_listing(&self.effective_schema()?))
    }
}
