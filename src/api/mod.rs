//! Batch orchestration: resolve each job's format and render options, submit it to
//! the renderer session, and contain per-job failures so that one bad report
//! never stops the rest of the batch.
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use crate::config::Configuration;
use crate::core::job::{ReportRun, build_jobs_lenient};
use crate::error::{Error, Result};
use crate::io::jobs::JobSource;
use crate::io::renderer::{
    ActionHandler, HTML_IMAGE_DIRECTORY, HtmlOptions, ImageHandler, RenderOptions, RenderOutcome,
    RenderRequest, Renderer, RendererProvider, RendererSession,
};
use crate::types::ReportFormat;

/// Effective format: the job's own format, else the batch default, else PDF.
/// Blank strings count as unset.
pub fn resolve_format(job_format: &str, batch_default: Option<&str>) -> Result<ReportFormat> {
    let requested = Some(job_format)
        .filter(|f| !f.trim().is_empty())
        .or(batch_default.filter(|f| !f.trim().is_empty()));
    match requested {
        Some(tag) => ReportFormat::parse(tag),
        None => Ok(ReportFormat::FALLBACK),
    }
}

/// Render options for `format`. HTML additionally gets the action and image
/// handlers, the base image URL and an `images` directory beside the output.
pub fn build_render_options(
    format: ReportFormat,
    output_file: &Path,
    config: &Configuration,
) -> Result<RenderOptions> {
    let output_file = std::path::absolute(output_file)?;
    let html = match format {
        ReportFormat::Html => Some(HtmlOptions {
            action_handler: ActionHandler::Html,
            image_handler: ImageHandler::Complete,
            base_image_url: config.base_image_url().map(str::to_string),
            image_directory: output_file
                .parent()
                .map(|p| p.join(HTML_IMAGE_DIRECTORY))
                .unwrap_or_else(|| PathBuf::from(HTML_IMAGE_DIRECTORY)),
        }),
        ReportFormat::Pdf | ReportFormat::Xls | ReportFormat::Doc => None,
    };
    Ok(RenderOptions {
        format,
        output_file,
        html,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Success { engine_errors: Vec<String> },
    Failure { message: String },
}

/// Outcome of one job in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub design_file: String,
    /// `None` when the job failed before its format was resolved.
    pub format: Option<ReportFormat>,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Success { .. })
    }
}

#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Rows set aside before the batch because their parameters were malformed.
    pub skipped: usize,
    pub outcomes: Vec<JobOutcome>,
}

fn finished() {
    info!("Finished {}", Local::now().format("%a %b %e %H:%M:%S %Y"));
}

/// Run every job in order against one renderer session.
///
/// Only a failure to acquire the renderer is returned as an error; job failures
/// are logged and recorded in the report. The session is released and the
/// completion line emitted on every path.
pub fn run_batch<P: RendererProvider>(
    jobs: &[ReportRun],
    config: &Configuration,
    provider: &P,
) -> Result<BatchReport> {
    let mut session = match RendererSession::open(provider, config) {
        Ok(session) => session,
        Err(e) => {
            error!("Trapped exception: {}", e);
            finished();
            return Err(e);
        }
    };

    let mut report = BatchReport::default();
    for job in jobs {
        info!("Executing {}", job);
        let (format, result) = match resolve_format(&job.format, config.report_format()) {
            Ok(format) => (Some(format), run_job(&mut session, job, format, config)),
            Err(e) => (None, Err(e)),
        };
        match result {
            Ok(outcome) => {
                info!("Success : {}", job.design_file);
                report.succeeded += 1;
                report.outcomes.push(JobOutcome {
                    design_file: job.design_file.clone(),
                    format,
                    status: JobStatus::Success {
                        engine_errors: outcome.engine_errors,
                    },
                });
            }
            Err(e) => {
                warn!("Report Failure {}: {}", job.design_file, e);
                report.failed += 1;
                report.outcomes.push(JobOutcome {
                    design_file: job.design_file.clone(),
                    format,
                    status: JobStatus::Failure {
                        message: e.to_string(),
                    },
                });
            }
        }
    }

    drop(session);
    finished();
    Ok(report)
}

/// Fetch the job list, build report runs, and run the batch.
///
/// The job-list fetch completes before the renderer is acquired. Rows with a
/// malformed parameter string are logged, counted as skipped, and left out.
pub fn run_from_source<J, P>(
    config: &Configuration,
    source: &J,
    provider: &P,
) -> Result<BatchReport>
where
    J: JobSource + ?Sized,
    P: RendererProvider,
{
    info!("BIRT SETUP: {}", config.log_values());
    let rows = source.fetch_rows()?;
    let (jobs, skipped) = build_jobs_lenient(rows);
    for row in &skipped {
        warn!("Skipped {}: {}", row.design_file, row.error);
    }

    let mut report = run_batch(&jobs, config, provider)?;
    report.skipped = skipped.len();
    info!(
        "Succeeded: {}, failed: {}, skipped: {}",
        report.succeeded, report.failed, report.skipped
    );
    Ok(report)
}

fn run_job<R: Renderer>(
    session: &mut RendererSession<R>,
    job: &ReportRun,
    format: ReportFormat,
    config: &Configuration,
) -> Result<RenderOutcome> {
    if job.output_file.trim().is_empty() {
        return Err(Error::JobExecution {
            design: job.design_file.clone(),
            message: "no output file given".to_string(),
        });
    }
    let design = config.workspace().join(&job.design_file);
    info!("design file: {}", design.display());

    let options = build_render_options(format, Path::new(&job.output_file), config)?;
    info!("Building {}", options.output_file.display());

    let outcome = session.render(&RenderRequest {
        design: &design,
        parameters: &job.parameters,
        options: &options,
    })?;
    for message in &outcome.engine_errors {
        warn!("ERROR:\t{}", message);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, RawConfiguration};

    fn config_with(format: Option<&str>, image_url: Option<&str>) -> Configuration {
        ConfigBuilder::new(Configuration::default())
            .layer(&RawConfiguration {
                report_format: format.map(str::to_string),
                base_image_url: image_url.map(str::to_string),
                ..Default::default()
            })
            .build()
    }

    #[test]
    fn format_precedence() {
        assert_eq!(resolve_format("", Some("HTML")).unwrap(), ReportFormat::Html);
        assert_eq!(resolve_format("XLS", Some("HTML")).unwrap(), ReportFormat::Xls);
        assert_eq!(resolve_format("  ", None).unwrap(), ReportFormat::Pdf);
        assert_eq!(resolve_format("", Some("")).unwrap(), ReportFormat::Pdf);
        assert_eq!(resolve_format("doc", None).unwrap(), ReportFormat::Doc);
        assert!(resolve_format("PPT", Some("PDF")).is_err());
    }

    #[test]
    fn html_options_carry_handlers_and_images() {
        let config = config_with(None, Some("http://reports/img"));
        let options =
            build_render_options(ReportFormat::Html, Path::new("/out/sales.html"), &config)
                .unwrap();
        let html = options.html.expect("html options");
        assert_eq!(html.action_handler, ActionHandler::Html);
        assert_eq!(html.image_handler, ImageHandler::Complete);
        assert_eq!(html.base_image_url.as_deref(), Some("http://reports/img"));
        assert_eq!(html.image_directory, PathBuf::from("/out/images"));
    }

    #[test]
    fn non_html_options_only_need_path_and_format() {
        let config = config_with(None, Some("http://ignored"));
        for format in [ReportFormat::Pdf, ReportFormat::Xls, ReportFormat::Doc] {
            let options = build_render_options(format, Path::new("rel/out.bin"), &config).unwrap();
            assert_eq!(options.format, format);
            assert!(options.html.is_none());
            assert!(options.output_file.is_absolute());
            assert!(options.output_file.ends_with("rel/out.bin"));
        }
    }
}
