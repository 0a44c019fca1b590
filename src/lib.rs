pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod proxy;
pub mod router;
pub mod server;
pub mod translate;

pub use config::{FileConfig, ShimConfig};
pub use error::{ApiError, Result, ShimError};
pub use http::{HttpRequest, HttpResponse, ResponseBody};
pub use router::route;
pub use server::{build_router, AppState};
