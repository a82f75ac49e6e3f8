#[cfg(test)]
pub mod test {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value, json};
    use tracing_subscriber::fmt::MakeWriter;

    use crate::error::WryfigError;
    use crate::field::{Constraints, Field, OptionSpec};
    use crate::schema::Schema;
    use crate::types::DeclaredType;
    use crate::validate::{FieldError, Model, ValidationErrors};

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct ServerConfig {
        pub name: String,
        pub port: i64,
        pub debug: bool,
        pub tags: Vec<String>,
        pub db_url: String,
        pub internal: String,
    }

    impl Model for ServerConfig {
        fn schema() -> Result<Schema, WryfigError> {
            Ok(server_schema())
        }
    }

    /// `name` required, `port` 8080, `debug` on/off flag, comma-separated
    /// `tags`, `db_url` aliased to `database_url`, `internal` excluded.
    pub fn server_schema() -> Schema {
        Schema::builder("ServerConfig")
            .env_prefix("APP_")
            .field(Field::new("name", DeclaredType::String).description("Server name"))
            .field(
                Field::new("port", DeclaredType::Integer)
                    .default_value(8080)
                    .description("Port to listen on")
                    .constraints(Constraints::new().ge(1).le(65535)),
            )
            .field(
                Field::new("debug", DeclaredType::Boolean)
                    .default_value(false)
                    .description("Enable debug output"),
            )
            .field(
                Field::new("tags", DeclaredType::list(DeclaredType::String))
                    .default_factory(|| json!([]))
                    .option(OptionSpec::new().comma_separated()),
            )
            .field(
                Field::new("db_url", DeclaredType::String)
                    .alias("database_url")
                    .default_value("sqlite://memory"),
            )
            .field(
                Field::new("internal", DeclaredType::String)
                    .default_value("hidden")
                    .exclude(),
            )
            .build()
            .expect("fixture schema builds")
    }

    /// Rejects debug mode on privileged ports.
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct CheckedConfig {
        pub port: i64,
        pub debug: bool,
    }

    impl Model for CheckedConfig {
        fn schema() -> Result<Schema, WryfigError> {
            Schema::builder("CheckedConfig")
                .field(Field::new("port", DeclaredType::Integer).default_value(8080))
                .field(Field::new("debug", DeclaredType::Boolean).default_value(false))
                .build()
        }

        fn validate(&self) -> Result<(), ValidationErrors> {
            if self.debug && self.port < 1024 {
                return Err(ValidationErrors::new(
                    "CheckedConfig",
                    vec![FieldError::new("debug", "debug mode needs an unprivileged port")],
                ));
            }
            Ok(())
        }
    }

    pub fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    /// In-memory log sink for asserting on `tracing` output.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with a thread-local subscriber and return its result together
    /// with everything logged at `WARN` and above.
    pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (result, logs)
    }

    #[test]
    fn captured_warnings_only() {
        let ((), logs) = capture_warnings(|| {
            tracing::debug!("quiet");
            tracing::warn!("loud");
        });
        assert!(logs.contains("loud"));
        assert!(!logs.contains("quiet"));
    }

    #[test]
    fn server_schema_shape() {
        let schema = server_schema();
        assert_eq!(schema.len(), 6);
        assert_eq!(schema.exposed().count(), 5);
        assert_eq!(schema.env_prefix(), "APP_");
    }
}
