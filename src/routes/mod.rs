mod export;
pub mod health_check;
pub mod subscribe;

pub use export::export_emails;
pub use health_check::*;
pub use subscribe::{error_chain_fmt, subscribe_preflight};

/// The capture form is embedded on arbitrary origins, so every response
/// under `/api` advertises a wildcard origin.
pub(crate) const CORS_ALLOW_ANY_ORIGIN: (&str, &str) = ("Access-Control-Allow-Origin", "*");
