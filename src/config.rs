use std::path::PathBuf;

const DEFAULT_MODEL_PATH: &str = "models/gaussnb_iris.json";
const MODEL_PATH_ENV: &str = "IRISSERVE_MODEL";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Largest `/predict` body accepted, about 400k feature rows.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Location of the model artifact, overridable through `IRISSERVE_MODEL`.
pub fn default_model_path() -> PathBuf {
    std::env::var(MODEL_PATH_ENV)
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
        .into()
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl ServerConfig {
    pub fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: None,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
