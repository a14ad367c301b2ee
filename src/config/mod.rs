//! Configuration layer: an immutable snapshot resolved with layered precedence
//! (built-in defaults → properties file → command-line flags).
//!
//! Every layer is a [`RawConfiguration`], a partial record whose set fields
//! override the layer below. [`ConfigBuilder`] folds the layers over a defaults
//! snapshot and produces the final [`Configuration`].
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

pub mod args;
pub mod properties;

pub use args::{parse_args, usage};
pub use properties::Properties;

const DEFAULT_WORKSPACE: &str = ".";

/// Resolved runner configuration. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    workspace: PathBuf,
    engine_home: Option<PathBuf>,
    resource_path: Option<PathBuf>,
    script_lib: Option<PathBuf>,
    do_not_run: bool,
    report_format: Option<String>,
    base_image_url: Option<String>,
    database: DatabaseSettings,
}

/// Pass-through credentials for the job-list provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub driver: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(serialize_with = "redact")]
    pub password: Option<String>,
}

fn redact<S>(value: &Option<String>, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(_) => s.serialize_str("********"),
        None => s.serialize_none(),
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
            engine_home: None,
            resource_path: None,
            script_lib: None,
            do_not_run: false,
            report_format: None,
            base_image_url: None,
            database: DatabaseSettings::default(),
        }
    }
}

impl Configuration {
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn engine_home(&self) -> Option<&Path> {
        self.engine_home.as_deref()
    }

    pub fn resource_path(&self) -> Option<&Path> {
        self.resource_path.as_deref()
    }

    pub fn script_lib(&self) -> Option<&Path> {
        self.script_lib.as_deref()
    }

    pub fn do_not_run(&self) -> bool {
        self.do_not_run
    }

    /// Batch-level default format; `None` when unset or blank.
    pub fn report_format(&self) -> Option<&str> {
        self.report_format
            .as_deref()
            .filter(|f| !f.trim().is_empty())
    }

    pub fn base_image_url(&self) -> Option<&str> {
        self.base_image_url.as_deref()
    }

    pub fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    /// JSON dump for the setup log line, password redacted.
    pub fn log_values(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

/// A partial configuration: every field is optional, set fields win on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfiguration {
    pub workspace: Option<PathBuf>,
    pub engine_home: Option<PathBuf>,
    pub resource_path: Option<PathBuf>,
    pub script_lib: Option<PathBuf>,
    pub do_not_run: Option<bool>,
    pub report_format: Option<String>,
    pub base_image_url: Option<String>,
    pub db_driver: Option<String>,
    pub db_url: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
}

impl RawConfiguration {
    /// Overlay `other` onto `self`: fields set in `other` overwrite, unset
    /// fields leave `self` alone.
    pub fn apply(&mut self, other: &RawConfiguration) {
        fn over<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if let Some(v) = src {
                *dst = Some(v.clone());
            }
        }
        over(&mut self.workspace, &other.workspace);
        over(&mut self.engine_home, &other.engine_home);
        over(&mut self.resource_path, &other.resource_path);
        over(&mut self.script_lib, &other.script_lib);
        over(&mut self.do_not_run, &other.do_not_run);
        over(&mut self.report_format, &other.report_format);
        over(&mut self.base_image_url, &other.base_image_url);
        over(&mut self.db_driver, &other.db_driver);
        over(&mut self.db_url, &other.db_url);
        over(&mut self.db_username, &other.db_username);
        over(&mut self.db_password, &other.db_password);
    }
}

/// Builds a [`Configuration`] from a defaults snapshot and ordered override layers.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    defaults: Configuration,
    overrides: RawConfiguration,
}

impl ConfigBuilder {
    pub fn new(defaults: Configuration) -> Self {
        Self {
            defaults,
            overrides: RawConfiguration::default(),
        }
    }

    /// Apply a more specific layer on top of everything applied so far.
    pub fn layer(mut self, raw: &RawConfiguration) -> Self {
        self.overrides.apply(raw);
        self
    }

    pub fn build(self) -> Configuration {
        let d = self.defaults;
        let o = self.overrides;
        Configuration {
            workspace: o.workspace.unwrap_or(d.workspace),
            engine_home: o.engine_home.or(d.engine_home),
            resource_path: o.resource_path.or(d.resource_path),
            script_lib: o.script_lib.or(d.script_lib),
            do_not_run: o.do_not_run.unwrap_or(d.do_not_run),
            report_format: o.report_format.or(d.report_format),
            base_image_url: o.base_image_url.or(d.base_image_url),
            database: DatabaseSettings {
                driver: o.db_driver.or(d.database.driver),
                url: o.db_url.or(d.database.url),
                username: o.db_username.or(d.database.username),
                password: o.db_password.or(d.database.password),
            },
        }
    }
}

/// Resolve the effective configuration.
///
/// Layers, lowest to highest: `defaults` (built-in defaults when `None`),
/// `file_properties`, then `args` scanned left to right.
pub fn resolve<S: AsRef<str>>(
    args: &[S],
    file_properties: Option<&Properties>,
    defaults: Option<&Configuration>,
) -> Result<Configuration> {
    let mut builder = ConfigBuilder::new(defaults.cloned().unwrap_or_default());
    if let Some(props) = file_properties {
        builder = builder.layer(&props.to_raw_configuration());
    }
    let flags = parse_args(args)?;
    Ok(builder.layer(&flags).build())
}
