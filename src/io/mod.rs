//! External collaborators: the job-list provider (`jobs`) and the report
//! engine (`renderer`).
pub mod jobs;
pub use jobs::{JobSource, SqliteJobSource};

pub mod renderer;
pub use renderer::{
    GenReportEngine, RenderOptions, RenderOutcome, RenderRequest, Renderer, RendererProvider,
    RendererSession,
};
