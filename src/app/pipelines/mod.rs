pub mod intraday_pipeline;
pub mod swing_pipeline;

pub use intraday_pipeline::IntradayPipeline;
pub use swing_pipeline::{load_instruments, SwingPipeline};

use crate::utils::error::Result;
use serde::Serialize;

/// Header row plus one row per item.
pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}
