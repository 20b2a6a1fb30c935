//! Carrying domain failures through a promise chain.
//!
//! Instead of a second error channel on [`Promise`], a step that can fail
//! produces a [`Thunk`]: a zero-argument accessor that either returns the
//! value or re-raises the error. Once one step fails, every later step is
//! skipped and the first error comes out of the final accessor, whenever the
//! caller decides to invoke it.
use crate::Promise;
use std::fmt;
use std::sync::Arc;

/// A deferred, possibly failing value: `() -> Result<V, E>`.
pub struct Thunk<V, E> {
    accessor: Arc<dyn Fn() -> Result<V, E> + Send + Sync + 'static>,
}

impl<V, E> Clone for Thunk<V, E> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
        }
    }
}

impl<V, E> Thunk<V, E> {
    pub fn new<F>(accessor: F) -> Self
    where
        F: Fn() -> Result<V, E> + Send + Sync + 'static,
    {
        Self {
            accessor: Arc::new(accessor),
        }
    }

    /// Evaluates the accessor.
    pub fn call(&self) -> Result<V, E> {
        (self.accessor)()
    }
}

impl<V, E> Thunk<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// An accessor that always returns `result`.
    pub fn from_result(result: Result<V, E>) -> Self {
        Self::new(move || result.clone())
    }

    pub fn value(value: V) -> Self {
        Self::from_result(Ok(value))
    }

    pub fn error(error: E) -> Self {
        Self::from_result(Err(error))
    }
}

impl<V, E> From<Result<V, E>> for Thunk<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn from(result: Result<V, E>) -> Self {
        Self::from_result(result)
    }
}

impl<V, E> fmt::Debug for Thunk<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk")
    }
}

impl<V, E> Promise<Thunk<V, E>>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// A fulfilled promise whose accessor returns `value`.
    pub fn succeeded(value: V) -> Self {
        Promise::fulfilled(Thunk::value(value))
    }

    /// A fulfilled promise whose accessor fails with `error`.
    pub fn failed(error: E) -> Self {
        Promise::fulfilled(Thunk::error(error))
    }

    /// Applies a fallible `transform` to the upstream value.
    ///
    /// The upstream accessor is evaluated as soon as the upstream promise is
    /// fulfilled. An upstream error is kept and `transform` never runs;
    /// otherwise the transform's own outcome is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::{Promise, Thunk};
    ///
    /// let parsed = Promise::<Thunk<String, String>>::succeeded("42".into())
    ///     .try_map(|s| s.parse::<i32>().map_err(|e| e.to_string()));
    /// let halved = parsed.try_map(|n| Ok(n / 2));
    /// assert_eq!(halved.peek().map(|thunk| thunk.call()), Some(Ok(21)));
    /// ```
    pub fn try_map<W, F>(&self, transform: F) -> Promise<Thunk<W, E>>
    where
        W: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> Result<W, E> + Send + 'static,
    {
        self.map(move |thunk| Thunk::from_result(thunk.call().and_then(transform)))
    }

    /// Sequences a fallible deferred step.
    ///
    /// If the upstream accessor fails, the result resolves immediately to an
    /// accessor re-raising that error and the next step is never started. An
    /// error returned by `transform` itself is captured the same way.
    pub fn try_flat_map<W, F>(&self, transform: F) -> Promise<Thunk<W, E>>
    where
        W: Clone + Send + Sync + 'static,
        F: FnOnce(V) -> Result<Promise<Thunk<W, E>>, E> + Send + 'static,
    {
        self.flat_map(move |thunk| match thunk.call().and_then(transform) {
            Ok(next) => next,
            Err(error) => Promise::failed(error),
        })
    }

    /// Evaluates the accessor once the promise is fulfilled.
    pub fn into_result(&self) -> Promise<Result<V, E>> {
        self.map(|thunk| thunk.call())
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Lifts a plain promise into a fallible chain with a transform that may
    /// fail.
    pub fn map_fallible<W, E, F>(&self, transform: F) -> Promise<Thunk<W, E>>
    where
        W: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<W, E> + Send + 'static,
    {
        self.map(move |value| Thunk::from_result(transform(value)))
    }

    /// Like [`map_fallible`](Self::map_fallible), but the transform starts a
    /// further deferred computation when it succeeds.
    pub fn flat_map_fallible<W, E, F>(&self, transform: F) -> Promise<Thunk<W, E>>
    where
        W: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<Promise<W>, E> + Send + 'static,
    {
        self.flat_map(move |value| match transform(value) {
            Ok(next) => next.map(Thunk::<W, E>::value),
            Err(error) => Promise::failed(error),
        })
    }

    /// Starts a fallible chain from a plain promise: `transform` may fail
    /// itself, and the step it starts may fail later.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::{Promise, Thunk};
    ///
    /// let checked = Promise::fulfilled(10).flat_map_thunk(|x: i32| {
    ///     if x > 0 {
    ///         Ok(Promise::<Thunk<i32, String>>::failed(format!("{x} is too big")))
    ///     } else {
    ///         Err("not positive".to_string())
    ///     }
    /// });
    /// let outcome = checked.peek().map(|thunk| thunk.call());
    /// assert_eq!(outcome, Some(Err("10 is too big".to_string())));
    /// ```
    pub fn flat_map_thunk<W, E, F>(&self, transform: F) -> Promise<Thunk<W, E>>
    where
        W: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<Promise<Thunk<W, E>>, E> + Send + 'static,
    {
        self.flat_map(move |value| match transform(value) {
            Ok(next) => next,
            Err(error) => Promise::failed(error),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Thunk;
    use crate::Promise;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct E(i32);

    fn async_thunk(result: Result<i32, E>) -> Promise<Thunk<i32, E>> {
        Promise::new(move |producer| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                producer.fulfill(Thunk::from_result(result));
            });
        })
    }

    fn settle(promise: &Promise<Thunk<i32, E>>) -> Result<i32, E> {
        match promise.wait() {
            Ok(thunk) => thunk.call(),
            Err(err) => panic!("promise never settled: {err}"),
        }
    }

    #[test]
    fn test_first_error_short_circuits() {
        let a = async_thunk(Err(E(2)));
        let b = async_thunk(Ok(3));
        let touched = Arc::new(AtomicBool::new(false));
        let flag = touched.clone();
        let sum = a.try_flat_map(move |x| {
            Ok(b.try_map(move |y| {
                flag.store(true, Ordering::SeqCst);
                Ok(x + y)
            }))
        });
        assert_eq!(settle(&sum), Err(E(2)));
        assert!(!touched.load(Ordering::SeqCst));
    }

    #[test]
    fn test_success_threads_through() {
        let a = async_thunk(Ok(2));
        let b = async_thunk(Ok(3));
        let sum = a.try_flat_map(move |x| Ok(b.try_map(move |y| Ok(x + y))));
        assert_eq!(settle(&sum), Ok(5));
    }

    #[test]
    fn test_transform_error_is_captured() {
        let failed = async_thunk(Ok(1))
            .try_map(|_| Err::<i32, _>(E(7)))
            .try_map(|x| Ok(x + 100));
        assert_eq!(settle(&failed), Err(E(7)));

        let failed_step = async_thunk(Ok(1)).try_flat_map(|_| Err(E(8)));
        assert_eq!(settle(&failed_step), Err(E(8)));
    }

    #[test]
    fn test_error_surfaces_on_every_call() {
        let failed: Promise<Thunk<i32, E>> = Promise::failed(E(4));
        let thunk = failed.try_map(|x| Ok(x * 2)).peek().expect("fulfilled");
        assert_eq!(thunk.call(), Err(E(4)));
        assert_eq!(thunk.call(), Err(E(4)));
    }

    #[test]
    fn test_lift_plain_promise() {
        let parsed = Promise::fulfilled("12")
            .map_fallible(|s: &str| s.parse::<i32>().map_err(|_| E(0)));
        assert_eq!(settle(&parsed), Ok(12));

        let rejected = Promise::fulfilled(-1).flat_map_fallible(|x: i32| {
            if x < 0 {
                Err(E(x))
            } else {
                Ok(Promise::fulfilled(x))
            }
        });
        assert_eq!(settle(&rejected), Err(E(-1)));

        let accepted = Promise::fulfilled(5)
            .flat_map_fallible(|x: i32| Ok::<_, E>(Promise::fulfilled(x + 1)));
        assert_eq!(settle(&accepted), Ok(6));
    }

    #[test]
    fn test_flat_map_thunk_from_plain_promise() {
        let downstream_failed =
            Promise::fulfilled(2).flat_map_thunk(|x: i32| Ok(async_thunk(Err(E(x)))));
        assert_eq!(settle(&downstream_failed), Err(E(2)));

        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let rejected = Promise::fulfilled(3).flat_map_thunk(move |x: i32| {
            if x % 2 == 1 {
                return Err(E(x));
            }
            flag.store(true, Ordering::SeqCst);
            Ok(async_thunk(Ok(x)))
        });
        assert_eq!(settle(&rejected), Err(E(3)));
        assert!(!started.load(Ordering::SeqCst));

        let chained = Promise::fulfilled(4)
            .flat_map_thunk(|x: i32| Ok(async_thunk(Ok(x))))
            .try_map(|x| Ok(x * 10));
        assert_eq!(settle(&chained), Ok(40));
    }

    #[test]
    fn test_into_result() {
        let result = async_thunk(Err(E(3))).into_result();
        assert_eq!(result.wait(), Ok(Err(E(3))));
    }
}
