use thiserror::Error;

/// Misuse of a promise, or a promise that can no longer settle.
///
/// Failures of the deferred computation itself never show up here; they
/// travel inside the payload (`Option` or [`Thunk`](crate::Thunk)).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A producer tried to fulfill a promise that already holds a value.
    #[error("promise was already fulfilled")]
    AlreadyFulfilled,
    /// Every producer was dropped while the promise was still empty.
    #[error("every producer was dropped before the promise was fulfilled")]
    Abandoned,
}
