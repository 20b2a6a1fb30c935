//! Monadic combinators over [`Promise`].
//!
//! Everything here is written against [`Promise::get`] and the constructors
//! only. None of these functions block; each returns a new promise wired to
//! the fulfillment of its inputs.
use crate::Promise;
use std::sync::Arc;

/// A function stored inside a promise. Needs to be cloneable because every
/// waiter of the promise receives its own copy.
pub type Func<T, U> = Arc<dyn Fn(T) -> U + Send + Sync + 'static>;

impl<T: Clone + Send + 'static> Promise<T> {
    /// A promise fulfilled with `transform(value)` once this one is.
    pub fn map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.flat_map(move |value| Promise::fulfilled(transform(value)))
    }

    /// Sequences a second deferred computation after this one.
    ///
    /// `transform` is not called until this promise is fulfilled, so the
    /// computation it starts does not begin earlier either.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::Promise;
    /// use std::thread;
    ///
    /// fn later(value: i32) -> Promise<i32> {
    ///     Promise::new(move |producer| {
    ///         thread::spawn(move || producer.fulfill(value));
    ///     })
    /// }
    ///
    /// let chained = later(3).flat_map(|x| later(x * x));
    /// assert_eq!(chained.wait(), Ok(9));
    /// ```
    pub fn flat_map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        let source = self.clone();
        Promise::new(move |producer| {
            source.get(move |value| {
                transform(value).get(move |result| producer.fulfill(result));
            });
        })
    }

    /// Applicative application: fulfilled once both this promise and
    /// `transform` are, with the function applied to the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_cell::{curry, Promise};
    ///
    /// let a = Promise::fulfilled(2);
    /// let b = Promise::fulfilled(3);
    /// let sum = b.apply(&a.map(curry(|x: i32, y: i32| x + y)));
    /// assert_eq!(sum.peek(), Some(5));
    /// ```
    pub fn apply<U>(&self, transform: &Promise<Func<T, U>>) -> Promise<U>
    where
        U: Clone + Send + 'static,
    {
        let source = self.clone();
        transform.flat_map(move |f| source.map(move |value| f(value)))
    }
}

impl<A: Clone + Send + 'static> Promise<Option<A>> {
    /// Chains a step that may come back empty.
    ///
    /// Once the payload is `None` the chain resolves to `None` without calling
    /// any further `transform`.
    pub fn flat_map_some<B, F>(&self, transform: F) -> Promise<Option<B>>
    where
        B: Clone + Send + 'static,
        F: FnOnce(A) -> Promise<Option<B>> + Send + 'static,
    {
        self.flat_map(move |value| match value {
            Some(value) => transform(value),
            None => Promise::fulfilled(None),
        })
    }

    /// Like [`flat_map_some`](Self::flat_map_some), but `transform` sees the
    /// empty payload too and may decline to continue by returning `None`.
    pub fn flat_map_option<B, F>(&self, transform: F) -> Promise<Option<B>>
    where
        B: Clone + Send + 'static,
        F: FnOnce(Option<A>) -> Option<Promise<Option<B>>> + Send + 'static,
    {
        self.flat_map(move |value| transform(value).unwrap_or_else(|| Promise::fulfilled(None)))
    }
}

impl<T: Clone + Send + 'static> Promise<Promise<T>> {
    pub fn flatten(&self) -> Promise<T> {
        self.flat_map(|inner| inner)
    }
}

/// Monadic unit.
pub fn pure<T: Clone + Send + 'static>(value: T) -> Promise<T> {
    Promise::fulfilled(value)
}

/// Monadic join.
pub fn flatten<T: Clone + Send + 'static>(nested: &Promise<Promise<T>>) -> Promise<T> {
    nested.flatten()
}

/// [`Promise::map`] with the function first.
pub fn fmap<T, U, F>(transform: F, promise: &Promise<T>) -> Promise<U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: FnOnce(T) -> U + Send + 'static,
{
    promise.map(transform)
}

/// [`Promise::flat_map`] with the function first.
pub fn flip_flat_map<T, U, F>(transform: F, promise: &Promise<T>) -> Promise<U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: FnOnce(T) -> Promise<U> + Send + 'static,
{
    promise.flat_map(transform)
}

/// [`Promise::flat_map_some`] with the function first.
pub fn flip_flat_map_some<A, B, F>(
    transform: F,
    promise: &Promise<Option<A>>,
) -> Promise<Option<B>>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    F: FnOnce(A) -> Promise<Option<B>> + Send + 'static,
{
    promise.flat_map_some(transform)
}

/// Turns a binary function into one taking its arguments one at a time, the
/// shape [`Promise::apply`] expects.
pub fn curry<A, B, Z, F>(f: F) -> impl Fn(A) -> Func<B, Z> + Send + Sync + 'static
where
    A: Clone + Send + Sync + 'static,
    B: 'static,
    Z: 'static,
    F: Fn(A, B) -> Z + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |a: A| {
        let f = f.clone();
        Arc::new(move |b: B| f(a.clone(), b)) as Func<B, Z>
    }
}

/// Combines two independently resolving promises with `f`.
pub fn lift2<A, B, Z, F>(f: F, a: &Promise<A>, b: &Promise<B>) -> Promise<Z>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + 'static,
    Z: Clone + Send + 'static,
    F: Fn(A, B) -> Z + Send + Sync + 'static,
{
    b.apply(&a.map(curry(f)))
}
