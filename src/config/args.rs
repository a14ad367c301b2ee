//! Command-line flag scanning.
//!
//! Flags are single-dash, case-insensitive tokens (`-W`, `-dd`, ...). Each one is
//! looked up in a dispatch table and consumes exactly one following token,
//! except `-H` which consumes none. Scanning is a single left-to-right pass, so
//! a later flag overrides an earlier one and `-C <file>` merges the file at the
//! point where it appears.
use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{Error, Result};

use super::RawConfiguration;
use super::properties::Properties;

/// Cursor over the argument tokens, positioned after the current flag.
pub struct ArgCursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
    flag: &'a str,
}

impl<'a> ArgCursor<'a> {
    /// Consume the value token that follows the current flag.
    fn value(&mut self) -> Result<&'a str> {
        let value = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::invalid_argument(self.flag, "missing value"))?;
        self.pos += 1;
        Ok(value)
    }
}

type FlagHandler = fn(&mut ArgCursor<'_>, &mut RawConfiguration) -> Result<()>;

fn workspace(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.workspace = Some(c.value()?.into());
    Ok(())
}

fn engine_home(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.engine_home = Some(c.value()?.into());
    Ok(())
}

fn resource_path(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.resource_path = Some(c.value()?.into());
    Ok(())
}

fn script_lib(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.script_lib = Some(c.value()?.into());
    Ok(())
}

fn report_format(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.report_format = Some(c.value()?.to_string());
    Ok(())
}

fn base_image_url(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.base_image_url = Some(c.value()?.to_string());
    Ok(())
}

fn db_driver(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.db_driver = Some(c.value()?.to_string());
    Ok(())
}

fn db_url(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.db_url = Some(c.value()?.to_string());
    Ok(())
}

fn db_username(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.db_username = Some(c.value()?.to_string());
    Ok(())
}

fn db_password(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.db_password = Some(c.value()?.to_string());
    Ok(())
}

fn config_file(c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    let properties = Properties::load(Path::new(c.value()?))?;
    raw.apply(&properties.to_raw_configuration());
    Ok(())
}

fn help(_c: &mut ArgCursor<'_>, raw: &mut RawConfiguration) -> Result<()> {
    raw.do_not_run = Some(true);
    Ok(())
}

static FLAGS: Lazy<HashMap<&'static str, FlagHandler>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, FlagHandler> = HashMap::new();
    map.insert("W", workspace);
    map.insert("B", engine_home);
    map.insert("R", resource_path);
    map.insert("S", script_lib);
    map.insert("F", report_format);
    map.insert("I", base_image_url);
    map.insert("DD", db_driver);
    map.insert("DU", db_url);
    map.insert("DN", db_username);
    map.insert("DP", db_password);
    map.insert("C", config_file);
    map.insert("H", help);
    map
});

/// Scan flags into a partial configuration layer.
///
/// Fails with [`Error::InvalidArgument`] on an unrecognised flag or a flag
/// missing its value, and with [`Error::ConfigFileUnreadable`] when a `-C`
/// file cannot be read.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<RawConfiguration> {
    let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let mut raw = RawConfiguration::default();
    let mut pos = 0;

    while pos < tokens.len() {
        let token = tokens[pos];
        pos += 1;

        let Some(name) = token.strip_prefix('-') else {
            debug!("Ignoring positional argument {:?}", token);
            continue;
        };
        let option = name.to_ascii_uppercase();
        let handler = FLAGS.get(option.as_str()).ok_or_else(|| {
            Error::invalid_argument(token, format!("Unrecognized option: {}", option))
        })?;

        let mut cursor = ArgCursor {
            tokens: &tokens,
            pos,
            flag: token,
        };
        handler(&mut cursor, &mut raw)?;
        pos = cursor.pos;
    }

    Ok(raw)
}

/// Usage text printed for `-H`.
pub fn usage() -> String {
    [
        "Usage: rptbatch [options]",
        "Options:",
        " -H display this message",
        " -W <workspacedir> specify the workspace location",
        " -B <runtimehome> specify the report engine runtime home location",
        " -R <resourcepath> specify the resource location",
        " -S <scriptlib> specify the script library location",
        " -F <format> specify the default report format (PDF, HTML, XLS, DOC)",
        " -I <url> specify the base image URL for HTML output",
        " -DD <drivername> specify the database driver name",
        " -DU <url> specify the database URL",
        " -DN <username> specify the database username",
        " -DP <password> specify the database password",
        " -C <filename> specify a configuration properties file",
    ]
    .join("\n")
}
