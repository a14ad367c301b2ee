//! Reader for `key=value` properties files and the `birt.runner.*` key namespace.
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

use super::RawConfiguration;

pub const KEY_WORKSPACE: &str = "birt.runner.workspace";
pub const KEY_RUNTIME: &str = "birt.runner.runtime";
pub const KEY_RESOURCES: &str = "birt.runner.resources";
pub const KEY_SCRIPTLIB: &str = "birt.runner.scriptlib";
pub const KEY_REPORT_FORMAT: &str = "birt.runner.reportFormat";
pub const KEY_BASE_IMAGE_URL: &str = "birt.runner.baseImageURL";
pub const KEY_DB_DRIVER: &str = "birt.runner.db.driver";
pub const KEY_DB_URL: &str = "birt.runner.db.url";
pub const KEY_DB_USERNAME: &str = "birt.runner.db.username";
pub const KEY_DB_PASSWORD: &str = "birt.runner.db.password";

/// Parsed contents of a properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// Read a properties file. Both an unopenable file and unparseable
    /// contents are reported as [`Error::ConfigFileUnreadable`].
    pub fn load(path: &Path) -> Result<Self> {
        let unreadable = |source: io::Error| Error::ConfigFileUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(unreadable)?;
        let entries = java_properties::read(BufReader::new(file))
            .map_err(|e| unreadable(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;
        debug!("Loaded {} properties from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Parse properties text in the standard `.properties` format.
    pub fn parse(text: &str) -> Result<Self> {
        let entries = java_properties::read(text.as_bytes())?;
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map recognised keys onto a partial configuration; unknown keys are ignored.
    pub fn to_raw_configuration(&self) -> RawConfiguration {
        let get = |key: &str| self.get(key).map(str::to_string);
        RawConfiguration {
            workspace: get(KEY_WORKSPACE).map(Into::into),
            engine_home: get(KEY_RUNTIME).map(Into::into),
            resource_path: get(KEY_RESOURCES).map(Into::into),
            script_lib: get(KEY_SCRIPTLIB).map(Into::into),
            do_not_run: None,
            report_format: get(KEY_REPORT_FORMAT),
            base_image_url: get(KEY_BASE_IMAGE_URL),
            db_driver: get(KEY_DB_DRIVER),
            db_url: get(KEY_DB_URL),
            db_username: get(KEY_DB_USERNAME),
            db_password: get(KEY_DB_PASSWORD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_comments_and_continuations() {
        let props = Properties::parse(
            "# comment\n\
             ! also a comment\n\
             birt.runner.workspace = /srv/reports\n\
             birt.runner.runtime:/opt/birt\n\
             birt.runner.reportFormat HTML\n\
             birt.runner.db.url=jdbc:sqlite:\\\n    /var/jobs.db\n\
             path=C:\\\\reports\\tout\n\
             unicode=\\u0041BC\n",
        )
        .unwrap();
        assert_eq!(props.get(KEY_WORKSPACE), Some("/srv/reports"));
        assert_eq!(props.get(KEY_RUNTIME), Some("/opt/birt"));
        assert_eq!(props.get(KEY_REPORT_FORMAT), Some("HTML"));
        assert_eq!(props.get(KEY_DB_URL), Some("jdbc:sqlite:/var/jobs.db"));
        assert_eq!(props.get("path"), Some("C:\\reports\tout"));
        assert_eq!(props.get("unicode"), Some("ABC"));
        assert_eq!(props.len(), 6);
    }

    #[test]
    fn unknown_keys_do_not_reach_configuration() {
        let props = Properties::parse("birt.runner.db.driver=sqlite\nsomething.else=1\n").unwrap();
        let raw = props.to_raw_configuration();
        assert_eq!(raw.db_driver.as_deref(), Some("sqlite"));
        assert!(raw.workspace.is_none());
        assert!(raw.report_format.is_none());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = Properties::load(Path::new("/definitely/not/here.properties")).unwrap_err();
        assert!(matches!(err, Error::ConfigFileUnreadable { .. }));
    }

    #[test]
    fn malformed_escape_is_rejected() {
        let err = Properties::parse("birt.runner.workspace=\\uZZZZ\n").unwrap_err();
        assert!(matches!(err, Error::MalformedProperties(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.properties");
        std::fs::write(&path, "birt.runner.workspace=\\uZZZZ\n").unwrap();
        let err = Properties::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigFileUnreadable { .. }));
    }
}
