// Domain layer: the service tree, the normalized inventory and the ports the pipeline talks through.

pub mod model;
pub mod ports;
