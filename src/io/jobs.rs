//! Job-list providers. The batch only needs an ordered list of raw rows; the
//! SQLite provider reads them from the `SR_BIRT_PARAM` table.
use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::config::Configuration;
use crate::core::job::JobRow;
use crate::error::{Error, Result};

pub const JOB_QUERY: &str =
    "select RPT_DESIGNFILE, RPT_FORMAT, RPT_OUTPUTFILE, RPT_PARAMETERS from SR_BIRT_PARAM";

const SQLITE_DRIVERS: [&str; 2] = ["sqlite", "org.sqlite.JDBC"];
const JDBC_SQLITE_PREFIX: &str = "jdbc:sqlite:";

/// Source of report-job rows, returned in execution order.
pub trait JobSource {
    fn fetch_rows(&self) -> Result<Vec<JobRow>>;
}

impl JobSource for Vec<JobRow> {
    fn fetch_rows(&self) -> Result<Vec<JobRow>> {
        Ok(self.clone())
    }
}

/// Reads job rows from a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteJobSource {
    path: PathBuf,
}

impl SqliteJobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build from the configured driver and URL. Both are required; the URL may
    /// be a plain path or a `jdbc:sqlite:` URL.
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let db = config.database();
        let driver = db.driver.as_deref().ok_or_else(|| Error::MissingArgument {
            arg: "dbDriver".to_string(),
        })?;
        let url = db.url.as_deref().ok_or_else(|| Error::MissingArgument {
            arg: "dbUrl".to_string(),
        })?;

        if !SQLITE_DRIVERS.iter().any(|d| d.eq_ignore_ascii_case(driver)) {
            return Err(Error::invalid_argument(
                "dbDriver",
                format!("unsupported database driver: {}", driver),
            ));
        }
        if db.username.is_some() || db.password.is_some() {
            debug!("SQLite ignores the configured database credentials");
        }

        let path = url.strip_prefix(JDBC_SQLITE_PREFIX).unwrap_or(url);
        Ok(Self::new(path))
    }
}

impl JobSource for SqliteJobSource {
    fn fetch_rows(&self) -> Result<Vec<JobRow>> {
        // The connection lives only for this call and is closed before any job runs.
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let rows = {
            let mut stmt = conn.prepare(JOB_QUERY)?;
            let mapped = stmt.query_map([], |row| {
                Ok(JobRow {
                    design_file: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    format: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    output_file: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    parameters: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };
        conn.close().map_err(|(_, e)| Error::Database(e))?;

        info!("Loaded {} report jobs from {:?}", rows.len(), self.path);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, RawConfiguration};

    fn config(driver: Option<&str>, url: Option<&str>) -> Configuration {
        ConfigBuilder::new(Configuration::default())
            .layer(&RawConfiguration {
                db_driver: driver.map(str::to_string),
                db_url: url.map(str::to_string),
                ..Default::default()
            })
            .build()
    }

    fn seed(path: &std::path::Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "create table SR_BIRT_PARAM (
                RPT_DESIGNFILE text, RPT_FORMAT text, RPT_OUTPUTFILE text, RPT_PARAMETERS text);
             insert into SR_BIRT_PARAM
                 values ('sales.rptdesign', 'PDF', 'out/sales.pdf', 'year=2024');
             insert into SR_BIRT_PARAM values ('stock.rptdesign', null, 'out/stock.pdf', null);",
        )
        .unwrap();
    }

    #[test]
    fn requires_driver_and_url() {
        assert!(matches!(
            SqliteJobSource::from_config(&config(None, Some("x.db"))),
            Err(Error::MissingArgument { .. })
        ));
        assert!(matches!(
            SqliteJobSource::from_config(&config(Some("sqlite"), None)),
            Err(Error::MissingArgument { .. })
        ));
        assert!(matches!(
            SqliteJobSource::from_config(&config(Some("oracle.jdbc.OracleDriver"), Some("x"))),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn reads_rows_in_table_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("jobs.db");
        seed(&db);

        let url = format!("jdbc:sqlite:{}", db.display());
        let config = config(Some("org.sqlite.JDBC"), Some(url.as_str()));
        let source = SqliteJobSource::from_config(&config).unwrap();
        let rows = source.fetch_rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], JobRow::new("sales.rptdesign", "PDF", "out/sales.pdf", "year=2024"));
        assert_eq!(rows[1], JobRow::new("stock.rptdesign", "", "out/stock.pdf", ""));
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteJobSource::new(dir.path().join("absent.db"));
        assert!(matches!(source.fetch_rows(), Err(Error::Database(_))));
    }
}
