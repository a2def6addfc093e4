use crate::crypto::SecretCipher;
use crate::database::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus};
use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

pub struct NetinvConfig {
    /// Path to the directory holding the inventory database
    pub data_dir: String,

    /// Address the REST server binds to
    pub address: String,

    /// Port the REST server listens on
    pub port: u16,

    /// Passphrase the secret-field key is derived from
    pub secret_passphrase: Option<String>,
}

const EMPTY_CONFIG: &str = r#"### netinv configuration file

### directory for the inventory database
# data_dir = "~/.netinv"

### REST server bind address and port
# address = "127.0.0.1"
# port = 8080

### passphrase for credential secrets stored at rest
### changing it makes every stored secret unreadable
### can also be set with the NETINV_SECRET_PASSPHRASE environment variable
# secret_passphrase = ""
"#;

fn home_dir() -> Result<String> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))
        .map(|s| s.to_owned())
}

impl Default for NetinvConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.netinv", home_dir),
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            secret_passphrase: None,
        }
    }
}

impl NetinvConfig {
    /// Load configuration from `path`, or from `$HOME/.netinv/netinv.toml`.
    ///
    /// A missing configuration file is created from a commented template.
    /// Environment variables prefixed with `NETINV_` override file settings.
    pub fn new(path: &Option<String>) -> Result<NetinvConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let netinv_dir = format!("{}/.netinv", home_dir()?);
                std::fs::create_dir_all(netinv_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create netinv directory: {}", e))?;
                let p = format!("{}/netinv.toml", netinv_dir);
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `NETINV_PORT=9000 netinv serve` overrides the port
        builder = builder.add_source(config::Environment::with_prefix("NETINV"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<NetinvConfig> {
        let data_dir = match config.get("data_dir") {
            Some(p) => expand_home(p)?,
            None => format!("{}/.netinv", home_dir()?),
        };

        let address = config
            .get("address")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let port = match config.get("port") {
            Some(p) => p
                .parse()
                .map_err(|e| anyhow!("Invalid port '{}': {}", p, e))?,
            None => DEFAULT_PORT,
        };

        let secret_passphrase = config
            .get("secret_passphrase")
            .filter(|s| !s.is_empty())
            .cloned();

        Ok(NetinvConfig {
            data_dir,
            address,
            port,
            secret_passphrase,
        })
    }

    /// Get the path to the SQLite database file
    pub fn sqlite_path(&self) -> String {
        let data_dir = self.data_dir.trim_end_matches('/');
        format!("{}/netinv.sqlite3", data_dir)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Build the secret cipher from the configured passphrase.
    pub fn secret_cipher(&self) -> Result<SecretCipher> {
        let passphrase = self.secret_passphrase.as_deref().ok_or_else(|| {
            anyhow!("secret_passphrase is not configured (set it in the config file or NETINV_SECRET_PASSPHRASE)")
        })?;
        SecretCipher::new(passphrase).map_err(|e| anyhow!("Failed to initialize cipher: {}", e))
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let passphrase = if self.secret_passphrase.is_some() {
            "set"
        } else {
            "NOT SET"
        };
        [
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.sqlite_path()),
            format!("Listen Address:     {}", self.bind_address()),
            format!("Secret Passphrase:  {}", passphrase),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.netinv/netinv.toml", home_dir)
    }
}

fn expand_home(path: &str) -> Result<String> {
    match path.strip_prefix("~") {
        Some(rest) => Ok(format!("{}{}", home_dir()?, rest)),
        None => Ok(path.to_string()),
    }
}

// =============================================================================
// Database info (used by the config command)
// =============================================================================

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub rows: u64,
}

/// Information about the SQLite database
#[derive(Debug, Serialize, Clone)]
pub struct SqliteDatabaseInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub schema_initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    pub tables: Vec<TableInfo>,
}

/// Inspect the database without initializing or resetting it.
pub fn get_sqlite_info(config: &NetinvConfig) -> SqliteDatabaseInfo {
    let sqlite_path = config.sqlite_path();
    let exists = Path::new(&sqlite_path).exists();
    let size_bytes = if exists {
        std::fs::metadata(&sqlite_path).ok().map(|m| m.len())
    } else {
        None
    };

    let mut info = SqliteDatabaseInfo {
        path: sqlite_path,
        exists,
        size_bytes,
        schema_initialized: false,
        schema_version: None,
        tables: Vec::new(),
    };
    if !exists {
        return info;
    }

    let db = match DatabaseConn::open_path(&info.path) {
        Ok(db) => db,
        Err(_) => return info,
    };

    let (initialized, version) = match SchemaManager::new(&db.conn).check_status() {
        Ok(SchemaStatus::Current) => (true, Some(crate::database::SCHEMA_VERSION)),
        Ok(SchemaStatus::NeedsMigration { from, .. }) => (true, Some(from)),
        Ok(SchemaStatus::Incompatible {
            database_version, ..
        }) => (true, Some(database_version)),
        Ok(SchemaStatus::NotInitialized) | Ok(SchemaStatus::Corrupted) | Err(_) => (false, None),
    };
    info.schema_initialized = initialized;
    info.schema_version = version;

    if initialized {
        for (name, _) in SchemaDefinitions::TABLES {
            if let Ok(rows) = db.table_count(name) {
                info.tables.push(TableInfo {
                    name: name.to_string(),
                    rows,
                });
            }
        }
    }

    info
}
