use std::{
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
};

/// Scoped ownership of a resource acquired while setting up a probe.
///
/// If the setup is abandoned (early return, `?`) the guard runs its release
/// function when dropped. Once the setup succeeded, `handoff()` gives the
/// resource back to the caller and the release function never runs.
pub(crate) struct Scoped<T> {
    inner: ManuallyDrop<T>,
    release: fn(T),
}

impl<T> Scoped<T> {
    pub(crate) fn new(inner: T, release: fn(T)) -> Self {
        Self {
            inner: ManuallyDrop::new(inner),
            release,
        }
    }

    /// Disarm the guard and take the resource out.
    pub(crate) fn handoff(self) -> T {
        let mut this = ManuallyDrop::new(self);
        // `this` is never dropped, the inner value is taken exactly once.
        unsafe { ManuallyDrop::take(&mut this.inner) }
    }
}

impl<T> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T> Drop for Scoped<T> {
    fn drop(&mut self) {
        // Only reached when the guard was not handed off.
        let inner = unsafe { ManuallyDrop::take(&mut self.inner) };
        (self.release)(inner);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    thread_local! {
        static RELEASED: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
    }

    fn release(id: u32) {
        RELEASED.with(|r| r.borrow_mut().push(id));
    }

    fn released() -> Vec<u32> {
        RELEASED.with(|r| r.borrow().clone())
    }

    fn setup(id: u32, fail: bool) -> Result<u32, ()> {
        let mut guard = Scoped::new(id, release);
        *guard += 100;
        if fail {
            return Err(());
        }
        Ok(guard.handoff())
    }

    #[test]
    fn release_on_failure_path() {
        assert!(setup(1, true).is_err());
        assert_eq!(released(), vec![101]);
    }

    #[test]
    fn no_release_after_handoff() {
        assert_eq!(setup(2, false), Ok(102));
        assert!(released().is_empty());
    }

    #[test]
    fn release_exactly_once() {
        {
            let guard = Scoped::new(3, release);
            assert_eq!(*guard, 3);
        }
        assert_eq!(released(), vec![3]);
    }
}
