// Application layer: pipelines wiring the screens to their data sources.

pub mod pipelines;
