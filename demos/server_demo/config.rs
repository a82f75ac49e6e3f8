//! Configuration model for the wryfig demo application.
//!
//! [`ServerConfig`] is a plain serde struct; its [`Model`] impl supplies the
//! schema that drives the CLI flags, the env vars, and validation.
//!
//! # Env var mapping
//!
//! | Env var               | Field      |
//! |-----------------------|------------|
//! | `DEMO_HOST`           | `host`     |
//! | `DEMO_PORT`           | `port`     |
//! | `DEMO_WORKERS`        | `workers`  |
//! | `DEMO_VERBOSE`        | `verbose`  |
//! | `DEMO_TAGS`           | `tags`     |
//! | `DEMO_DATABASE_URL`   | `db_url`   |

use serde::{Deserialize, Serialize};
use serde_json::json;
use wryfig::{
    Constraints, DeclaredType, Field, FieldError, Model, OptionSpec, Schema, ValidationErrors,
    WryfigError,
};

#[derive(Serialize, Deserialize, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: i64,
    pub workers: i64,
    pub verbose: bool,
    pub tags: Vec<String>,
    pub db_url: String,
    /// Never read from the outside; always its default.
    pub build_id: String,
}

impl Model for ServerConfig {
    fn schema() -> Result<Schema, WryfigError> {
        Schema::builder("ServerConfig")
            .env_prefix("DEMO_")
            .field(
                Field::new("host", DeclaredType::String)
                    .default_value("127.0.0.1")
                    .description("Address to bind"),
            )
            .field(
                Field::new("port", DeclaredType::Integer)
                    .default_value(8080)
                    .description("Port to listen on")
                    .constraints(Constraints::new().ge(1).le(65535)),
            )
            .field(
                Field::new("workers", DeclaredType::Integer)
                    .default_value(4)
                    .description("Worker threads")
                    .constraints(Constraints::new().gt(0)),
            )
            .field(
                Field::new("verbose", DeclaredType::Boolean)
                    .default_value(false)
                    .description("Enable verbose output"),
            )
            .field(
                Field::new("tags", DeclaredType::list(DeclaredType::String))
                    .default_factory(|| json!([]))
                    .description("Labels attached to this server")
                    .option(OptionSpec::new().comma_separated()),
            )
            .field(
                Field::new("db_url", DeclaredType::String)
                    .alias("database_url")
                    .description("Database connection string")
                    .option(OptionSpec::new().required()),
            )
            .field(
                Field::new("build_id", DeclaredType::String)
                    .default_value("dev")
                    .exclude(),
            )
            .build()
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.port < 1024 && self.host != "127.0.0.1" {
            return Err(ValidationErrors::new(
                "ServerConfig",
                vec![FieldError::new(
                    "port",
                    "privileged ports are only allowed on 127.0.0.1",
                )],
            ));
        }
        Ok(())
    }
}
