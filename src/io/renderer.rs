//! Report-engine seam: render options, the `Renderer`/`RendererProvider` traits,
//! the scoped session guard, and a process-backed adapter for the engine's
//! `genReport` launcher script.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::config::Configuration;
use crate::core::params::Parameters;
use crate::error::{Error, Result};
use crate::types::ReportFormat;

/// Sub-directory (next to the output file) that receives HTML images.
pub const HTML_IMAGE_DIRECTORY: &str = "images";

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ActionHandler {
    /// Hyperlinks rendered as plain HTML anchors.
    Html,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ImageHandler {
    /// Images written to disk and referenced through the base image URL.
    Complete,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HtmlOptions {
    pub action_handler: ActionHandler,
    pub image_handler: ImageHandler,
    pub base_image_url: Option<String>,
    pub image_directory: PathBuf,
}

/// Per-format settings handed to the engine with each job.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RenderOptions {
    pub format: ReportFormat,
    pub output_file: PathBuf,
    /// Present only for HTML output.
    pub html: Option<HtmlOptions>,
}

/// Everything the engine needs for one job.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub design: &'a Path,
    pub parameters: &'a Parameters,
    pub options: &'a RenderOptions,
}

/// What the engine reported for a job that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Validation or rendering messages; these do not fail the job.
    pub engine_errors: Vec<String>,
}

/// An acquired report engine.
///
/// `render` opens the design, creates a run-and-render task, sets and validates
/// the parameters, and renders to the requested output.
pub trait Renderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<RenderOutcome>;

    /// Release engine resources. Called exactly once by [`RendererSession`].
    fn shutdown(&mut self) {}
}

/// Starts a renderer for a batch.
pub trait RendererProvider {
    type Renderer: Renderer;

    fn acquire(&self, config: &Configuration) -> Result<Self::Renderer>;
}

/// Owns a renderer for the length of a batch and shuts it down on every exit path.
pub struct RendererSession<R: Renderer> {
    renderer: R,
}

impl<R: Renderer> RendererSession<R> {
    pub fn open<P>(provider: &P, config: &Configuration) -> Result<Self>
    where
        P: RendererProvider<Renderer = R>,
    {
        let renderer = provider
            .acquire(config)
            .map_err(|e| match e {
                Error::RendererUnavailable(_) => e,
                other => Error::RendererUnavailable(other.to_string()),
            })?;
        Ok(Self { renderer })
    }

    pub fn render(&mut self, request: &RenderRequest<'_>) -> Result<RenderOutcome> {
        self.renderer.render(request)
    }
}

impl<R: Renderer> Drop for RendererSession<R> {
    fn drop(&mut self) {
        debug!("Shutting down report engine");
        self.renderer.shutdown();
    }
}

/// Provider for the engine's command-line launcher under the engine home.
#[derive(Debug, Clone, Default)]
pub struct GenReportEngine;

impl GenReportEngine {
    pub fn script_path(engine_home: &Path) -> PathBuf {
        let script = if cfg!(windows) { "genReport.bat" } else { "genReport.sh" };
        engine_home.join("ReportEngine").join(script)
    }
}

impl RendererProvider for GenReportEngine {
    type Renderer = GenReportRenderer;

    fn acquire(&self, config: &Configuration) -> Result<GenReportRenderer> {
        let home = config.engine_home().ok_or_else(|| {
            Error::RendererUnavailable("engine runtime home (-B) is not configured".to_string())
        })?;
        let script = Self::script_path(home);
        if !script.is_file() {
            return Err(Error::RendererUnavailable(format!(
                "launcher not found: {}",
                script.display()
            )));
        }
        Ok(GenReportRenderer {
            home: home.to_path_buf(),
            script,
            resource_path: config.resource_path().map(Path::to_path_buf),
            script_lib: config.script_lib().map(Path::to_path_buf),
        })
    }
}

/// Runs one `genReport` process per job.
#[derive(Debug, Clone)]
pub struct GenReportRenderer {
    home: PathBuf,
    script: PathBuf,
    resource_path: Option<PathBuf>,
    script_lib: Option<PathBuf>,
}

impl GenReportRenderer {
    fn command(&self, request: &RenderRequest<'_>) -> Command {
        let options = request.options;
        let mut cmd = Command::new(&self.script);
        cmd.env("BIRT_HOME", &self.home)
            .arg("-m")
            .arg("runrender")
            .arg("-f")
            .arg(options.format.tag())
            .arg("-o")
            .arg(&options.output_file);

        let mut names: Vec<_> = request.parameters.keys().collect();
        names.sort();
        for name in names {
            cmd.arg("-p")
                .arg(format!("{}={}", name, request.parameters[name]));
        }

        if let Some(path) = &self.resource_path {
            cmd.env("BIRT_RESOURCE_PATH", path);
        }
        if let Some(path) = &self.script_lib {
            cmd.env("BIRT_SCRIPTLIB", path);
        }
        if let Some(html) = &options.html {
            cmd.env("BIRT_IMAGE_DIR", &html.image_directory);
            if let Some(url) = &html.base_image_url {
                cmd.env("BIRT_BASE_IMAGE_URL", url);
            }
        }

        cmd.arg(request.design);
        cmd
    }
}

impl Renderer for GenReportRenderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> Result<RenderOutcome> {
        let design = request.design.display().to_string();
        if !request.design.is_file() {
            return Err(Error::JobExecution {
                design,
                message: "design file not found".to_string(),
            });
        }

        if let Some(parent) = request.options.output_file.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(html) = &request.options.html {
            fs::create_dir_all(&html.image_directory)?;
        }

        let output = self.command(request).output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let engine_errors: Vec<String> = stderr
            .lines()
            .filter(|l| l.contains("ERROR"))
            .map(|l| l.trim().to_string())
            .collect();

        if !output.status.success() {
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("engine exited with {}", output.status));
            return Err(Error::JobExecution { design, message });
        }
        if !request.options.output_file.exists() {
            warn!("Engine reported success but wrote no {:?}", request.options.output_file);
        }

        Ok(RenderOutcome { engine_errors })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::{ConfigBuilder, RawConfiguration};

    struct CountingRenderer {
        shutdowns: Rc<Cell<usize>>,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, _request: &RenderRequest<'_>) -> Result<RenderOutcome> {
            Ok(RenderOutcome::default())
        }

        fn shutdown(&mut self) {
            self.shutdowns.set(self.shutdowns.get() + 1);
        }
    }

    struct CountingProvider {
        shutdowns: Rc<Cell<usize>>,
    }

    impl RendererProvider for CountingProvider {
        type Renderer = CountingRenderer;

        fn acquire(&self, _config: &Configuration) -> Result<CountingRenderer> {
            Ok(CountingRenderer {
                shutdowns: self.shutdowns.clone(),
            })
        }
    }

    #[test]
    fn session_shuts_down_once_on_drop() {
        let shutdowns = Rc::new(Cell::new(0));
        let provider = CountingProvider {
            shutdowns: shutdowns.clone(),
        };
        {
            let _session = RendererSession::open(&provider, &Configuration::default()).unwrap();
            assert_eq!(shutdowns.get(), 0);
        }
        assert_eq!(shutdowns.get(), 1);
    }

    #[test]
    fn gen_report_requires_engine_home() {
        let err = GenReportEngine.acquire(&Configuration::default()).unwrap_err();
        assert!(matches!(err, Error::RendererUnavailable(_)));

        let dir = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new(Configuration::default())
            .layer(&RawConfiguration {
                engine_home: Some(dir.path().to_path_buf()),
                ..Default::default()
            })
            .build();
        let err = GenReportEngine.acquire(&config).unwrap_err();
        assert!(matches!(err, Error::RendererUnavailable(_)));

        fs::create_dir_all(dir.path().join("ReportEngine")).unwrap();
        fs::write(GenReportEngine::script_path(dir.path()), "").unwrap();
        assert!(GenReportEngine.acquire(&config).is_ok());
    }

    #[test]
    fn command_carries_format_output_and_sorted_parameters() {
        let renderer = GenReportRenderer {
            home: PathBuf::from("/opt/birt"),
            script: PathBuf::from("/opt/birt/ReportEngine/genReport.sh"),
            resource_path: None,
            script_lib: None,
        };
        let mut parameters = Parameters::new();
        parameters.insert("b".into(), crate::types::ParamValue::Int(2));
        parameters.insert("a".into(), crate::types::ParamValue::Bool(true));
        let options = RenderOptions {
            format: ReportFormat::Xls,
            output_file: PathBuf::from("/out/r.xls"),
            html: None,
        };
        let request = RenderRequest {
            design: Path::new("/ws/r.rptdesign"),
            parameters: &parameters,
            options: &options,
        };

        let cmd = renderer.command(&request);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-m", "runrender", "-f", "xls", "-o", "/out/r.xls", "-p", "a=true", "-p", "b=2",
                "/ws/r.rptdesign"
            ]
        );
    }
}
