// Domain layer: market models and the ports the pipelines talk through.

pub mod model;
pub mod ports;
