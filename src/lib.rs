//! A thread-safe, single-assignment promise with monadic combinators.
//!
//! A [`Promise`] is filled exactly once by its [`Producer`], possibly on
//! another thread, and runs every callback registered through
//! [`Promise::get`] exactly once with the value. [`Promise::map`],
//! [`Promise::flat_map`] and [`Promise::apply`] build pipelines out of
//! promises without blocking. Failures travel through the same pipelines as
//! `Option` payloads or as [`Thunk`] accessors.
//!
//! The crate never spawns threads. All asynchrony comes from whoever holds
//! the producer.
//!
//! # Examples
//!
//! ```
//! use promise_cell::Promise;
//! use std::thread;
//!
//! fn async_get(value: i32) -> Promise<i32> {
//!     Promise::new(move |producer| {
//!         thread::spawn(move || producer.fulfill(value));
//!     })
//! }
//!
//! let a = async_get(2).flat_map(async_get).flat_map(async_get);
//! let b = async_get(3).map(|x| x * x);
//! let sum = a.flat_map(move |a0| b.flat_map(move |b0| Promise::fulfilled(a0 + b0)));
//! assert_eq!(sum.wait(), Ok(11));
//! ```
mod blocking;
pub mod combinators;
mod error;
pub mod fallible;
pub mod future;
mod promise;

pub use combinators::{curry, flatten, flip_flat_map, flip_flat_map_some, fmap, lift2, pure, Func};
pub use error::Error;
pub use fallible::Thunk;
pub use future::Consumer;
pub use promise::{Producer, Promise};
