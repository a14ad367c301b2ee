use std::env;
use std::path::Path;

use tracing::info;

use rptbatch::api::run_from_source;
use rptbatch::config::{self, Properties};
use rptbatch::io::{GenReportEngine, SqliteJobSource};
use rptbatch::{Result, logging};

/// Environment variable naming a properties file loaded beneath the flags.
pub const CONFIG_ENV: &str = "BIRT_RUNNER_CONFIG";

pub fn run(args: &[String]) -> Result<()> {
    logging::init();

    let file_properties = match env::var_os(CONFIG_ENV) {
        Some(path) => Some(Properties::load(Path::new(&path))?),
        None => None,
    };
    let config = config::resolve(args, file_properties.as_ref(), None)?;

    if config.do_not_run() {
        println!("{}", config::usage());
        return Ok(());
    }

    let source = SqliteJobSource::from_config(&config)?;
    let report = run_from_source(&config, &source, &GenReportEngine)?;
    if report.failed > 0 {
        info!("{} report(s) failed; see the log above", report.failed);
    }
    Ok(())
}
