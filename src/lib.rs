#![doc = r#"
rptbatch — a batch runner for report-rendering engines.

The runner reads report jobs from a database table, decodes each job's compact
parameter string into typed values, picks the output format, and drives an
external report engine to produce PDF, HTML, XLS or DOC files. Jobs run one at a
time in table order; a failing report is logged and the batch moves on.

Configuration
-------------
Settings are layered: built-in defaults, then an optional properties file, then
command-line flags scanned left to right (`-C <file>` merges a file in place).

```rust
use rptbatch::config::{self, Properties};

fn main() -> rptbatch::Result<()> {
    let file = Properties::parse("birt.runner.reportFormat=HTML\n")?;
    let config = config::resolve(&["-W", "/srv/reports", "-F", "XLS"], Some(&file), None)?;
    assert_eq!(config.report_format(), Some("XLS"));
    Ok(())
}
```

Parameter strings
-----------------
```rust
use rptbatch::{ParamValue, decode};

fn main() -> rptbatch::Result<()> {
    let params = decode("region=\"EMEA, APAC\", year=2024, ids={1, 2, 3}")?;
    assert_eq!(params["year"], ParamValue::Int(2024));
    assert_eq!(params["region"], ParamValue::Str("EMEA, APAC".into()));
    Ok(())
}
```

Running a batch
---------------
```rust,no_run
use rptbatch::{GenReportEngine, SqliteJobSource, config, run_from_source};

fn main() -> rptbatch::Result<()> {
    let config = config::resolve(
        &["-B", "/opt/birt", "-DD", "sqlite", "-DU", "/var/lib/reports/jobs.db"],
        None,
        None,
    )?;
    let source = SqliteJobSource::from_config(&config)?;
    let report = run_from_source(&config, &source, &GenReportEngine)?;
    println!("succeeded={} failed={} skipped={}", report.succeeded, report.failed, report.skipped);
    Ok(())
}
```

Useful modules
--------------
- [`config`] — configuration snapshot, flags and properties files.
- [`core`] — parameter decoder and report runs.
- [`io`] — job-list providers and the report-engine seam.
- [`api`] — the batch orchestrator.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod types;

pub use config::{Configuration, Properties};
pub use crate::core::job::{JobRow, ReportRun, build_jobs, build_jobs_lenient};
pub use crate::core::params::{Parameters, decode};
pub use error::{Error, Result};
pub use types::{ParamValue, ReportFormat};

pub use io::{
    GenReportEngine, JobSource, RenderOptions, RenderOutcome, RenderRequest, Renderer,
    RendererProvider, RendererSession, SqliteJobSource,
};

pub use api::{
    BatchReport, JobOutcome, JobStatus, build_render_options, resolve_format, run_batch,
    run_from_source,
};
