/// Default configuration constants used across the system.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8081;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default log level for this crate's targets.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the SQLite file inside the app directory.
pub const DATABASE_FILE_NAME: &str = "database.sqlite";

/// Directory (inside the app directory) holding per-user files.
pub const FILES_DIR_NAME: &str = "files";

/// Name of the app directory under the user's home.
pub const APP_DIR_NAME: &str = ".agentstudio";

/// Origins the builder UI is served from during local development.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "http://127.0.0.1:8000",
    "http://localhost:8001",
    "http://localhost:8081",
];

/// Timeout for model connectivity tests, in seconds.
pub const DEFAULT_MODEL_TEST_TIMEOUT_SECS: u64 = 30;

/// Base URL used for model tests when a model config has none.
pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
