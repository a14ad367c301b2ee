//! Job-definition building blocks: the parameter decoder and report runs
//! built from job-list rows. Consumed by the batch orchestrator in `api`.
pub mod job;
pub mod params;
