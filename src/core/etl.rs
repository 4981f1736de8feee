use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order; the first error stops the run.
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();

        tracing::info!("📥 Fetching market data...");
        let raw_data = self.pipeline.extract().await?;

        tracing::info!("🔎 Screening...");
        let transformed = self.pipeline.transform(raw_data).await?;

        tracing::info!("📤 Delivering results...");
        let summary = self.pipeline.load(transformed).await?;

        tracing::info!("⏱️ Finished in {:?}", started.elapsed());
        Ok(summary)
    }
}
