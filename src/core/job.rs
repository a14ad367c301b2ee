//! Report runs: one decoded job per row returned by the job-list provider.
use crate::core::params::{self, Parameters};
use crate::error::{Error, Result};

/// A raw job row as stored by the job-list provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRow {
    pub design_file: String,
    /// Empty means "use the batch default".
    pub format: String,
    pub output_file: String,
    pub parameters: String,
}

impl JobRow {
    pub fn new(
        design_file: impl Into<String>,
        format: impl Into<String>,
        output_file: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        Self {
            design_file: design_file.into(),
            format: format.into(),
            output_file: output_file.into(),
            parameters: parameters.into(),
        }
    }
}

/// One report to render, ready for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    /// Design file, relative to the workspace.
    pub design_file: String,
    pub format: String,
    pub output_file: String,
    pub parameters: Parameters,
}

impl ReportRun {
    pub fn from_row(row: JobRow) -> Result<Self> {
        let parameters = params::decode(&row.parameters)?;
        Ok(Self {
            design_file: row.design_file,
            format: row.format,
            output_file: row.output_file,
            parameters,
        })
    }
}

impl std::fmt::Display for ReportRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.parameters.keys().collect();
        names.sort();
        write!(
            f,
            "ReportRun, designFile = {}, format = {}, outputFile = {}, parameters = {{",
            self.design_file, self.format, self.output_file
        )?;
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, self.parameters[name])?;
        }
        write!(f, "}}")
    }
}

/// A row that could not be turned into a report run.
#[derive(Debug)]
pub struct SkippedRow {
    pub design_file: String,
    pub error: Error,
}

/// Build report runs in provider order; the first malformed row fails the whole list.
pub fn build_jobs(rows: impl IntoIterator<Item = JobRow>) -> Result<Vec<ReportRun>> {
    rows.into_iter().map(ReportRun::from_row).collect()
}

/// Build report runs in provider order, setting malformed rows aside instead of failing.
pub fn build_jobs_lenient(
    rows: impl IntoIterator<Item = JobRow>,
) -> (Vec<ReportRun>, Vec<SkippedRow>) {
    let mut runs = Vec::new();
    let mut skipped = Vec::new();
    for row in rows {
        let design_file = row.design_file.clone();
        match ReportRun::from_row(row) {
            Ok(run) => runs.push(run),
            Err(error) => skipped.push(SkippedRow { design_file, error }),
        }
    }
    (runs, skipped)
}
