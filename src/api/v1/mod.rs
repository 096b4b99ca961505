mod context;
mod cookie;
mod error;
mod handler;
mod router;
mod strategy;

pub use context::{ApiReply, RequestContext};
pub use cookie::*;
pub use error::{ApiErrorCode, ApiResponse, recover_error};
pub use handler::*;
pub use router::routes;
pub use strategy::*;
