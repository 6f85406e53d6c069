//! Transaction boundary consumed by the lifecycle engine.

use async_trait::async_trait;

use crate::result::AppResult;

/// One open transaction.
///
/// A unit of work is owned by exactly one operation and ends with exactly
/// one call to [`commit`](UnitOfWork::commit) or
/// [`rollback`](UnitOfWork::rollback). Dropping it without either must
/// behave like a rollback.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    /// Make every change performed through this unit of work durable.
    async fn commit(self) -> AppResult<()>;

    /// Discard every change performed through this unit of work.
    async fn rollback(self) -> AppResult<()>;
}

/// Opens units of work.
///
/// Read units are used by `Get` and `Validate`; write units by `Save` and
/// `ScheduleEntity`. Implementations may use the same type for both.
#[async_trait]
pub trait UnitOfWorkProvider: Send + Sync + 'static {
    /// Read-scoped unit of work.
    type Read: UnitOfWork;
    /// Writable unit of work.
    type Write: UnitOfWork;

    /// Open a read-scoped unit of work.
    async fn begin_read(&self) -> AppResult<Self::Read>;

    /// Open a writable unit of work.
    async fn begin_write(&self) -> AppResult<Self::Write>;
}
