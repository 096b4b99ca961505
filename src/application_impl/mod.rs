mod auth_service_impl;
mod credential_validator_impl;
mod jwt_codec;
mod password_hasher;

pub use auth_service_impl::*;
pub use credential_validator_impl::*;
pub use jwt_codec::*;
pub use password_hasher::*;
