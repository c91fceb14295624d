use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 443;
const DEFAULT_CERT_FILE: &str = "tls/server.pem";
const DEFAULT_KEY_FILE: &str = "tls/server.key";

/// Server configuration, read from the environment.
///
/// `PORT` selects the listening port (default 443). The certificate and
/// private-key locations default to the repository-local `tls/` files and
/// can be overridden with `TLS_CERT_FILE` / `TLS_KEY_FILE`.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let cert_file = env::var("TLS_CERT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CERT_FILE));
        let key_file = env::var("TLS_KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEY_FILE));
        Self {
            port,
            cert_file,
            key_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        // Exercised in one test to avoid races on process-wide env state.
        env::remove_var("PORT");
        let config = ServerConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cert_file, PathBuf::from(DEFAULT_CERT_FILE));

        env::set_var("PORT", "8443");
        assert_eq!(ServerConfig::from_env().port, 8443);

        env::set_var("PORT", "not-a-port");
        assert_eq!(ServerConfig::from_env().port, DEFAULT_PORT);
        env::remove_var("PORT");
    }
}
