// Domain layer: subject models, outcome types and ports (interfaces).

pub mod model;
pub mod ports;
