use std::{future::Future, pin::Pin};

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::AppError;

pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

#[derive(Debug)]
pub struct DatabaseTransaction;

impl DatabaseTransaction {
    /// Run a closure inside a transaction. Commits on `Ok`, rolls back on `Err`.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE`, so it holds the write
    /// lock from its first read and concurrent writers wait on `busy_timeout`.
    pub async fn run<T, F>(pool: &SqlitePool, f: F) -> Result<T, AppError>
    where
        F: for<'a> FnOnce(&'a mut Transaction<'static, Sqlite>) -> TxFuture<'a, T>,
        T: Send,
    {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Transaction failed with error: {}, rolling back", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "Rollback failed after error (orig: {}, rollback: {})",
                        err,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}
