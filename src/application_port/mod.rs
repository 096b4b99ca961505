mod auth_service;
mod credential;
mod token_codec;

pub use auth_service::*;
pub use credential::*;
pub use token_codec::*;
