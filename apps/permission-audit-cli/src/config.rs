//! Layered configuration for the audit CLI.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. YAML file given with `--config`
//! 3. Environment variables `PERMISSION_AUDIT_*`, nested keys split on `__`
//!    (e.g. `PERMISSION_AUDIT_AUDIT__BATCH_SIZE=250`)
//! 4. Command-line flags

use std::path::Path;

use anyhow::{Context, Result, ensure};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use permission_audit::AuditConfig;
use serde::{Deserialize, Serialize};
use static_content_plugin::StaticContentConfig;

pub const ENV_PREFIX: &str = "PERMISSION_AUDIT_";

/// Read by clap directly, never part of the layered config.
pub const TOKEN_ENV: &str = "PERMISSION_AUDIT_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub audit: AuditConfig,
    /// Site tree served by the static content backend.
    pub static_content: StaticContentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub site_url: Option<String>,
    pub target_user: Option<String>,
    pub all_items: bool,
    pub batch_size: Option<u32>,
    pub max_depth: Option<usize>,
    pub log_format: Option<LogFormat>,
}

impl CliOverrides {
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(site) = &self.site_url {
            cfg.audit.site_url.clone_from(site);
        }
        if let Some(user) = &self.target_user {
            cfg.audit.target_user.clone_from(user);
        }
        if self.all_items {
            cfg.audit.folders_only = false;
        }
        if let Some(batch) = self.batch_size {
            cfg.audit.batch_size = batch;
        }
        if self.max_depth.is_some() {
            cfg.audit.max_depth = self.max_depth;
        }
        if let Some(format) = self.log_format {
            cfg.logging.format = format;
        }
    }
}

impl AppConfig {
    /// Merge every source and validate the result.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or malformed, a key is unknown, or the
    /// merged configuration does not validate.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            ensure!(path.is_file(), "config file {} not found", path.display());
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["token"]));

        let mut cfg: Self = figment.extract().context("failed to load configuration")?;
        overrides.apply(&mut cfg);

        cfg.audit.validate().context("invalid audit configuration")?;
        cfg.static_content
            .validate()
            .context("invalid static_content configuration")?;
        Ok(cfg)
    }
}
