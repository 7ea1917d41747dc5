pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod registry;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use registry::{PatientRegistry, RegistryError, SortKey, SortOrder};
pub use server::{AppState, CarebookServer, ServerBuilder, build_app, router};
