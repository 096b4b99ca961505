use std::any::Any;

/// Begins a unit of work against the backing store.
#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>>;
}

/// An open unit of work. Dropping it without `commit` discards every
/// statement executed inside it.
#[async_trait::async_trait]
pub trait StorageTx: Send {
    /// Lets an adapter recover its own transaction type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
