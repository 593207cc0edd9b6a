// Domain layer - Pure telemetry types and derivations
pub mod accelerometer;
pub mod fault;
pub mod geo;
pub mod telemetry;
pub mod vehicle;
pub mod zone;
