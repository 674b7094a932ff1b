pub mod backend;
pub mod build_info;
pub mod config;
pub mod error;
pub mod local_backend;
pub mod metrics;
pub mod rpc;
mod serde_helpers;
pub mod telemetry;
pub mod types;
pub mod validator;
