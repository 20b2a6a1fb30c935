//! Blocking the current thread until a promise settles.
use crate::{Error, Promise};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

impl<T: Clone + Send + 'static> Promise<T> {
    /// Parks the calling thread until the promise is fulfilled or abandoned.
    ///
    /// Never returns for a promise whose producer is kept alive but never
    /// used. Do not call it from the thread that is expected to fulfill the
    /// promise.
    pub fn wait(&self) -> Result<T, Error> {
        let signal = Arc::new((Mutex::new(None), Condvar::new()));
        let notify = signal.clone();
        self.subscribe(move |outcome| {
            let (slot, settled) = &*notify;
            *slot.lock() = Some(outcome);
            settled.notify_all();
        });
        let (slot, settled) = &*signal;
        let mut slot = slot.lock();
        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }
            settled.wait(&mut slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Promise;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_on_fulfilled() {
        assert_eq!(Promise::fulfilled(1).wait(), Ok(1));
    }

    #[test]
    fn test_wait_for_other_thread() {
        let (producer, promise) = Promise::pending();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.fulfill("done");
        });
        assert_eq!(promise.wait(), Ok("done"));
        handle.join().expect("The producer thread has panicked");
    }
}
