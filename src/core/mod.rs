pub mod etl;
pub mod indicators;
pub mod intraday;
pub mod job;
pub mod report;
pub mod schedule;
pub mod swing;

pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
pub use job::{dispatch, run_daemon, Job, JobKind, PreparedJob};
pub use schedule::{CronSchedule, Trigger};
