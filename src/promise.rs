//! The single-assignment cell every other module is built on.
//!
//! A [`Promise`] starts empty and is filled exactly once through one of its
//! [`Producer`]s. Callbacks registered with [`Promise::get`] before the fill
//! are queued and drained by the fulfillment; callbacks registered after it
//! run immediately. The lock only guards that bookkeeping, user code always
//! runs with the lock released.
use crate::Error;
use parking_lot::Mutex;
use std::any::type_name;
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Internal settlement callback. `Err` is only ever [`Error::Abandoned`].
pub(crate) type Settle<T> = Box<dyn FnOnce(Result<T, Error>) + Send + 'static>;

/// A value that becomes available later.
///
/// Handles are cheap to clone and all observe the same cell.
///
/// # Examples
///
/// ```
/// use promise_cell::Promise;
/// use std::thread;
///
/// let promise = Promise::new(|producer| {
///     thread::spawn(move || producer.fulfill(21));
/// });
/// let doubled = promise.map(|x| x * 2);
/// assert_eq!(doubled.wait(), Ok(42));
/// ```
pub struct Promise<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

/// The fulfillment side of a [`Promise`].
///
/// Cloning a producer is allowed, but only the first `fulfill` wins; any
/// later one is a programming error.
pub struct Producer<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

struct Inner<T> {
    value: Option<T>,
    waiters: Vec<Settle<T>>,
    producers: usize,
    abandoned: bool,
}

impl<T> Inner<T> {
    fn pending(producers: usize) -> Self {
        Inner {
            value: None,
            waiters: Vec::new(),
            producers,
            abandoned: false,
        }
    }
}

/// Runs every waiter even if one of them panics. The first panic is
/// re-raised once all waiters have run, unless the thread is already
/// unwinding.
fn notify<T, F>(waiters: Vec<Settle<T>>, mut outcome: F)
where
    F: FnMut() -> Result<T, Error>,
{
    let mut first_panic = None;
    for waiter in waiters {
        let outcome = outcome();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(move || waiter(outcome))) {
            first_panic.get_or_insert(payload);
        }
    }
    if let Some(payload) = first_panic {
        if !std::thread::panicking() {
            resume_unwind(payload);
        }
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// A promise that already holds `value`.
    pub fn fulfilled(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: Some(value),
                waiters: Vec::new(),
                producers: 0,
                abandoned: false,
            })),
        }
    }

    /// Creates an empty promise and hands its producer to `executor`.
    ///
    /// The executor runs synchronously, before `new` returns. It may fulfill
    /// right away or move the producer to another thread and fulfill later.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Producer<T>),
    {
        let (producer, promise) = Self::pending();
        executor(producer);
        promise
    }

    /// An empty promise together with its producer.
    pub fn pending() -> (Producer<T>, Self) {
        let inner = Arc::new(Mutex::new(Inner::pending(1)));
        (
            Producer {
                inner: inner.clone(),
            },
            Self { inner },
        )
    }

    /// Calls `handler` with the value once it is available.
    ///
    /// Runs `handler` on the calling thread if the promise is already
    /// fulfilled, otherwise on whichever thread fulfills it. The handler is
    /// invoked exactly once, or never if the promise is abandoned.
    pub fn get<F>(&self, handler: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.subscribe(move |outcome| {
            if let Ok(value) = outcome {
                handler(value)
            }
        });
    }

    /// Like [`get`](Self::get), but also told when the promise is abandoned.
    pub(crate) fn subscribe<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let outcome = if let Some(value) = inner.value.clone() {
            Ok(value)
        } else if inner.abandoned {
            Err(Error::Abandoned)
        } else {
            inner.waiters.push(Box::new(callback));
            tracing::trace!(waiters = inner.waiters.len(), "waiter registered");
            return;
        };
        drop(inner);
        callback(outcome);
    }

    /// The value, if the promise has been fulfilled.
    pub fn peek(&self) -> Option<T> {
        self.inner.lock().value.clone()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.inner.lock().value.is_some()
    }
}

impl<T: Clone + Send + 'static> Producer<T> {
    /// Fulfills the promise and notifies every waiter in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already fulfilled. The first value is kept
    /// and no waiter is notified a second time.
    ///
    /// Also re-raises the first panic of a waiter, after every other waiter
    /// has been notified.
    pub fn fulfill(&self, value: T) {
        if let Err(err) = self.try_fulfill(value) {
            tracing::error!(%err, value_type = type_name::<T>(), "double fulfillment");
            panic!("{err}");
        }
    }

    /// Fulfills the promise, or reports [`Error::AlreadyFulfilled`] without
    /// touching it.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::{Error, Promise};
    ///
    /// let (producer, promise) = Promise::pending();
    /// assert_eq!(producer.try_fulfill(1), Ok(()));
    /// assert_eq!(producer.try_fulfill(2), Err(Error::AlreadyFulfilled));
    /// assert_eq!(promise.peek(), Some(1));
    /// ```
    pub fn try_fulfill(&self, value: T) -> Result<(), Error> {
        let waiters = {
            let mut inner = self.inner.lock();
            if inner.value.is_some() {
                None
            } else {
                inner.value = Some(value.clone());
                Some(std::mem::take(&mut inner.waiters))
            }
        };
        // The rejected value is dropped with the lock released.
        let Some(waiters) = waiters else {
            return Err(Error::AlreadyFulfilled);
        };
        tracing::trace!(waiters = waiters.len(), "promise fulfilled");
        notify(waiters, || Ok(value.clone()));
        Ok(())
    }

    /// Whether any producer of this promise has fulfilled it.
    pub fn is_fulfilled(&self) -> bool {
        self.inner.lock().value.is_some()
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        self.inner.lock().producers += 1;
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for Producer<T> {
    /// The last producer of an empty promise abandons it.
    fn drop(&mut self) {
        let waiters = {
            let mut inner = self.inner.lock();
            inner.producers -= 1;
            if inner.producers > 0 || inner.value.is_some() {
                return;
            }
            inner.abandoned = true;
            std::mem::take(&mut inner.waiters)
        };
        tracing::debug!(
            waiters = waiters.len(),
            value_type = type_name::<T>(),
            "promise abandoned"
        );
        // Dropping `get` handlers here also drops any producer they captured,
        // so derived promises are abandoned in turn.
        notify(waiters, || Err(Error::Abandoned));
    }
}

impl<T: fmt::Display> fmt::Display for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.lock().value {
            Some(ref value) => write!(f, "Promise({value})"),
            None => write!(f, "Promise(<{}>)", type_name::<T>()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Promise")
            .field("value", &inner.value)
            .field("waiters", &inner.waiters.len())
            .field("abandoned", &inner.abandoned)
            .finish()
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("value_type", &type_name::<T>())
            .finish()
    }
}
