// --- File: crates/sheetbook_common/src/services.rs ---
//! Service abstractions shared by the store and payment crates.

use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;
