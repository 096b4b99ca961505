// store

mod refresh_token_store;

pub use refresh_token_store::*;

// repo

mod user_repo;

mod repo_tx;

pub use user_repo::*;

pub use repo_tx::*;
