// Domain layer: core models and ports (interfaces). No HTTP or config types here.

pub mod model;
pub mod ports;
