//! Gateway configuration.
//!
//! A JSON5 file with camelCase keys, resolved from `--config`, then
//! `$OFFSWITCH_CONFIG`, then the user config directory. A missing file means
//! defaults. `OFFSWITCH_PORT`, `OFFSWITCH_BIND` and `OFFSWITCH_TOKEN_FILE`
//! override the file.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Token file used when none is configured, relative to the working
/// directory.
pub const DEFAULT_TOKEN_FILE: &str = "AUTH_TOKEN";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const CONFIG_ENV: &str = "OFFSWITCH_CONFIG";
pub const PORT_ENV: &str = "OFFSWITCH_PORT";
pub const BIND_ENV: &str = "OFFSWITCH_BIND";
pub const TOKEN_FILE_ENV: &str = "OFFSWITCH_TOKEN_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("invalid bind address {addr:?}: {source}")]
    InvalidBind {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Raw file shape: everything optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSection {
    pub level: Option<String>,
}

/// Fully resolved settings the process runs with. Carries no secrets: the
/// token itself never leaves its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub port: u16,
    pub bind: String,
    pub token_file: PathBuf,
    pub log_level: String,
}

impl Settings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                addr: self.bind.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Resolve the config file path: explicit flag, then env, then user config
/// directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offswitch")
        .join("offswitch.json5")
}

/// Load the raw config; a missing file is an empty config.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    json5::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply defaults and environment overrides to a raw config.
pub fn resolve(config: &Config) -> Settings {
    resolve_with_env(config, |name| std::env::var(name).ok())
}

fn resolve_with_env(config: &Config, env: impl Fn(&str) -> Option<String>) -> Settings {
    let server = config.server.clone().unwrap_or_default();

    let port = env(PORT_ENV)
        .and_then(|raw| raw.parse::<u16>().ok())
        .or(server.port)
        .unwrap_or(DEFAULT_PORT);

    let bind = env(BIND_ENV)
        .filter(|raw| !raw.is_empty())
        .or(server.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let token_file = env(TOKEN_FILE_ENV)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .or(server.token_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));

    let log_level = config
        .logging
        .clone()
        .unwrap_or_default()
        .level
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Settings {
        port,
        bind,
        token_file,
        log_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_name: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_when_config_is_empty() {
        let settings = resolve_with_env(&Config::default(), no_env);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.bind, DEFAULT_BIND);
        assert_eq!(settings.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
        assert_eq!(settings.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config: Config = json5::from_str(
            r#"{
                // local overrides
                server: {
                    port: 9000,
                    bind: "127.0.0.1",
                    tokenFile: "/etc/offswitch/token",
                },
                logging: { level: "debug" },
            }"#,
        )
        .unwrap();

        let settings = resolve_with_env(&config, no_env);
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.bind, "127.0.0.1");
        assert_eq!(settings.token_file, PathBuf::from("/etc/offswitch/token"));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_env_overrides_file() {
        let config: Config = json5::from_str(r#"{ server: { port: 9000 } }"#).unwrap();
        let settings = resolve_with_env(&config, |name| match name {
            PORT_ENV => Some("9100".to_string()),
            TOKEN_FILE_ENV => Some("/run/token".to_string()),
            _ => None,
        });
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.token_file, PathBuf::from("/run/token"));
    }

    #[test]
    fn test_unparseable_env_port_is_ignored() {
        let config: Config = json5::from_str(r#"{ server: { port: 9000 } }"#).unwrap();
        let settings = resolve_with_env(&config, |name| match name {
            PORT_ENV => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(settings.port, 9000);
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json5")).unwrap();
        assert!(config.server.is_none());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offswitch.json5");
        std::fs::write(&path, "{ server: ").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_socket_addr() {
        let mut settings = resolve_with_env(&Config::default(), no_env);
        settings.bind = "127.0.0.1".to_string();
        settings.port = 9000;
        assert_eq!(
            settings.socket_addr().unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );

        settings.bind = "not-an-address".to_string();
        assert!(matches!(
            settings.socket_addr(),
            Err(ConfigError::InvalidBind { .. })
        ));
    }

    #[test]
    fn test_config_path_explicit_wins() {
        let path = config_path(Some(Path::new("/tmp/custom.json5")));
        assert_eq!(path, PathBuf::from("/tmp/custom.json5"));
    }
}
