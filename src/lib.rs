pub mod configuration;
pub mod domain;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;

pub use configuration::get_configuration;
pub use telemetry::{get_subscriber, init_subscriber};
