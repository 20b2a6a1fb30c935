//! Awaiting a promise from async code.
//!
//! A [`Consumer`] is a `Future` over a [`Promise`]. It registers one
//! settlement callback on its first poll and wakes the latest waker when the
//! promise settles, so it works with any executor.
use crate::{Error, Promise};
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Resolves to the promise's value, or [`Error::Abandoned`].
///
/// # Examples
///
/// ```
/// use promise_cell::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let (producer, promise) = Promise::<String>::pending();
/// let task1 = thread::spawn(move || block_on(async {
///     promise.await
/// }));
/// producer.fulfill("Hi".into());
/// let received = task1.join().expect("The task1 thread has panicked.");
/// assert_eq!(received, Ok(String::from("Hi")));
/// ```
#[derive(Debug)]
pub struct Consumer<T> {
    promise: Promise<T>,
    slot: Option<Arc<Mutex<Slot<T>>>>,
}

#[derive(Debug)]
enum WakerState {
    Fresh,
    Settled,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<Result<T, Error>>,
    waker: Result<Waker, WakerState>,
}

impl<T: Clone + Send + 'static> Promise<T> {
    pub fn consumer(&self) -> Consumer<T> {
        Consumer {
            promise: self.clone(),
            slot: None,
        }
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Promise<T> {
    type Output = Result<T, Error>;
    type IntoFuture = Consumer<T>;

    fn into_future(self) -> Self::IntoFuture {
        Consumer {
            promise: self,
            slot: None,
        }
    }
}

impl<T: Clone + Send + 'static> Future for Consumer<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let slot = match this.slot {
            Some(ref slot) => slot.clone(),
            None => {
                let slot = Arc::new(Mutex::new(Slot {
                    value: None,
                    waker: Err(WakerState::Fresh),
                }));
                this.slot = Some(slot.clone());
                let settle = slot.clone();
                // May run right here if the promise is already settled.
                this.promise.subscribe(move |outcome| {
                    let mut slot = settle.lock();
                    slot.value = Some(outcome);
                    let waker = std::mem::replace(&mut slot.waker, Err(WakerState::Settled));
                    if let Ok(waker) = waker {
                        waker.wake()
                    }
                });
                slot
            }
        };
        let mut slot = slot.lock();
        match slot.value.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                slot.waker = Ok(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
