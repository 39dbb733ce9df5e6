
//! Bot configuration
//!
//! Built from defaults, then an optional TOML file, then environment
//! variables (a `.env` file in the working directory is loaded first).
//! Secrets are only ever read from the environment.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::api::SapEnvironment;
use crate::paths::Layout;
use crate::sap::ScreenIds;

/// Default install location of SAP Logon 800
const SAPLOGON_PATH: &str = r"C:\Program Files\SAP\FrontEnd\SAPGUI\saplogon.exe";
/// Where the label print spool drops its PDFs, under the user's profile
const LABEL_SUBDIR: &str = r"Documents\Etiquetas Entregas Entrantes Farmanet";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    FileRead { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid value for {key}: <{value}>")]
    InvalidValue { key: String, value: String },
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// SAP system to log into
    pub environment: SapEnvironment,
    /// Folder holding `no_procesados`, `Errores`, ...
    pub base_dir: PathBuf,
    /// Folder where SAP writes the label PDFs
    pub label_dir: Option<PathBuf>,

    pub sap: SapConfig,
    pub pacing: Pacing,
    pub poll: PollConfig,
    pub screen: ScreenIds,

    #[serde(skip)]
    pub credentials: Credentials,
    #[serde(skip)]
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: SapEnvironment::default(),
            base_dir: PathBuf::from("."),
            label_dir: None,
            sap: SapConfig::default(),
            pacing: Pacing::default(),
            poll: PollConfig::default(),
            screen: ScreenIds::default(),
            credentials: Credentials::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load `.env`, the optional config file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("loaded {}", env_file.display());
        }

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.with_env(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Override settings from environment variables, looked up through `var`
    pub fn with_env<F>(mut self, var: F) -> Result<Self, ConfigError>
        where
            F: Fn(&str) -> Option<String>
    {
        if let Some(env) = var("SAP_ENV") {
            self.environment = env.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SAP_ENV".into(),
                value: env,
            })?;
        }
        if let Some(dir) = var("SAP_BASE_DIR") {
            self.base_dir = dir.into();
        }
        if let Some(dir) = var("SAP_LABEL_DIR") {
            self.label_dir = Some(dir.into());
        }
        if let Some(path) = var("SAP_LOGON_PATH") {
            self.sap.logon_path = path.into();
        }

        // SAP logon
        if let Some(user) = var("SAP_USER") {
            self.credentials.user = user;
        }
        if let Some(password) = var("SAP_PASSWORD") {
            self.credentials.password = password;
        }

        // HANA, per landscape
        self.database.qas = DbCredentials::from_env(&var, SapEnvironment::Qas.db_env_suffix());
        self.database.prd = DbCredentials::from_env(&var, SapEnvironment::Prd.db_env_suffix());

        // only the label folder falls back to the user's profile
        if self.label_dir.is_none() {
            self.label_dir = var("USERPROFILE").map(|profile| Path::new(&profile).join(LABEL_SUBDIR));
        }

        Ok(self)
    }

    /// Fail early when the bot could not log in
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.user.is_empty() {
            return Err(ConfigError::Missing("SAP_USER"));
        }
        if self.credentials.password.is_empty() {
            return Err(ConfigError::Missing("SAP_PASSWORD"));
        }

        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.base_dir)
    }

    pub fn label_dir(&self) -> PathBuf {
        self.label_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("Etiquetas"))
    }

    pub fn db_credentials(&self) -> &DbCredentials {
        match self.environment {
            SapEnvironment::Qas => &self.database.qas,
            SapEnvironment::Prd => &self.database.prd,
        }
    }
}

/// Resolved settings with secrets masked
impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let db = self.db_credentials();

        writeln!(f, "environment     = {} ({})", self.environment, self.environment.connection_name())?;
        writeln!(f, "base_dir        = {}", self.base_dir.display())?;
        writeln!(f, "label_dir       = {}", self.label_dir().display())?;
        writeln!(f, "saplogon        = {}", self.sap.logon_path.display())?;
        writeln!(f, "sap user        = {}", or_unset(&self.credentials.user))?;
        writeln!(f, "sap password    = {}", mask(&self.credentials.password))?;
        writeln!(f, "db host         = {}:{}", or_unset(db.host.as_deref().unwrap_or_default()), or_unset(db.port.as_deref().unwrap_or_default()))?;
        writeln!(f, "db user         = {}", or_unset(db.user.as_deref().unwrap_or_default()))?;
        writeln!(f, "db password     = {}", mask(db.password.as_deref().unwrap_or_default()))?;
        writeln!(f, "poll interval   = {}s (checked every {}s)", self.poll.interval_secs, self.poll.check_secs)?;
        write!(f, "grid            = {}", self.screen.grid)
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "<unset>" } else { value }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "********" }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbCredentials {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DbCredentials {
    /// `HOST_{suffix}`, `PORT_{suffix}`, `USER_{suffix}` and `PASS_{suffix}`
    fn from_env<F>(var: &F, suffix: &str) -> Self
        where
            F: Fn(&str) -> Option<String>
    {
        Self {
            host: var(&format!("HOST_{}", suffix)),
            port: var(&format!("PORT_{}", suffix)),
            user: var(&format!("USER_{}", suffix)),
            password: var(&format!("PASS_{}", suffix)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub qas: DbCredentials,
    pub prd: DbCredentials,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SapConfig {
    pub logon_path: PathBuf,
    /// Attempts to reach the scripting engine after launching SAP Logon
    pub max_retries: u32,
    pub retry_interval_secs: u64,
    pub session_index: u32,
}

impl Default for SapConfig {
    fn default() -> Self {
        Self {
            logon_path: PathBuf::from(SAPLOGON_PATH),
            max_retries: 10,
            retry_interval_secs: 2,
            session_index: 0,
        }
    }
}

impl SapConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

/// Waits between UI steps, SAP GUI gives no completion signal
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pacing {
    /// After each field or cell write
    pub field_ms: u64,
    /// After navigation and button presses
    pub step_ms: u64,
    /// After adding a grid row
    pub add_row_ms: u64,
    /// Before looking for the label PDF
    pub pdf_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            field_ms: 500,
            step_ms: 1000,
            add_row_ms: 3000,
            pdf_ms: 3000,
        }
    }
}

impl Pacing {
    /// No waits at all
    pub fn none() -> Self {
        Self { field_ms: 0, step_ms: 0, add_row_ms: 0, pdf_ms: 0 }
    }

    pub fn field_delay(&self) -> Duration {
        Duration::from_millis(self.field_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    pub fn add_row_delay(&self) -> Duration {
        Duration::from_millis(self.add_row_ms)
    }

    pub fn pdf_delay(&self) -> Duration {
        Duration::from_millis(self.pdf_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Time between two processing cycles
    pub interval_secs: u64,
    /// How often the loop wakes up to check
    pub check_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            check_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.environment, SapEnvironment::Prd);
        assert_eq!(config.poll.interval_secs, 300);
        assert_eq!(config.sap.max_retries, 10);
        assert_eq!(config.screen.columns.ean, "ZZEAN13");
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_overrides() {
        let config = Config::default()
            .with_env(env(&[
                ("SAP_ENV", "qas"),
                ("SAP_USER", "bot"),
                ("SAP_PASSWORD", "secret"),
                ("SAP_BASE_DIR", "/srv/bot"),
                ("HOST_LAB", "hana-qas"),
                ("PASS_LAB", "dbsecret"),
                ("HOST_RISE", "hana-prd"),
            ]))
            .unwrap();

        assert_eq!(config.environment, SapEnvironment::Qas);
        assert_eq!(config.base_dir, PathBuf::from("/srv/bot"));
        assert_eq!(config.db_credentials().host.as_deref(), Some("hana-qas"));
        assert_eq!(config.database.prd.host.as_deref(), Some("hana-prd"));
        assert_eq!(config.label_dir(), PathBuf::from("/srv/bot").join("Etiquetas"));
        assert!(config.validate().is_ok());

        let shown = config.to_string();
        assert!(shown.contains("sap user        = bot"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn invalid_environment() {
        let res = Config::default().with_env(env(&[("SAP_ENV", "DEV")]));

        assert!(matches!(res, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn label_dir_under_user_profile() {
        let config = Config::default()
            .with_env(env(&[("USERPROFILE", "/home/recepcion")]))
            .unwrap();

        assert_eq!(config.label_dir(), Path::new("/home/recepcion").join(LABEL_SUBDIR));
    }

    #[test]
    fn from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sap-inbound.toml");
        std::fs::write(&path, r#"
environment = "QAS"
base_dir = "D:/bot"

[pacing]
field_ms = 100

[screen]
grid = "wnd[0]/usr/cntlGRID2/shellcont/shell"

[screen.columns]
pending = "MENGE"
"#).unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.environment, SapEnvironment::Qas);
        assert_eq!(config.pacing.field_ms, 100);
        assert_eq!(config.pacing.step_ms, 1000);
        assert_eq!(config.screen.grid, "wnd[0]/usr/cntlGRID2/shellcont/shell");
        assert_eq!(config.screen.columns.pending, "MENGE");
        assert_eq!(config.screen.columns.ean, "ZZEAN13");
        assert_eq!(config.screen.po_filter, "wnd[0]/usr/ctxtSO_EBELN-LOW");
    }
}
