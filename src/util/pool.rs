/*!
A thread safe pool of reusable values.

The high level [`Regex`](crate::Regex) keeps its per-search scratch space
here so that the search APIs don't need to thread a cache parameter through
every call. Getting a value pops one off the free list or creates a fresh
one; dropping the guard pushes it back. Concurrent callers therefore never
share scratch space, at the cost of one short critical section per search.

Cloning a `Regex` gives it a fresh pool, which is the recommended way to
avoid contention when many threads hammer the same pattern.
*/

use std::sync::Mutex;

pub struct Pool<T> {
    /// Creates a fresh value when the free list is empty.
    create: Box<dyn Fn() -> T + Send + Sync>,
    stack: Mutex<Vec<T>>,
}

impl<T: Send> Pool<T> {
    pub fn new(create: impl Fn() -> T + Send + Sync + 'static) -> Pool<T> {
        Pool { create: Box::new(create), stack: Mutex::new(Vec::new()) }
    }

    /// Get a value from the pool, creating one if necessary.
    pub fn get(&self) -> PoolGuard<'_, T> {
        let value = self.lock().pop().unwrap_or_else(|| (self.create)());
        PoolGuard { pool: self, value: Some(value) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // A poisoned free list only contains values another thread panicked
        // while holding; they are still valid scratch space.
        match self.stack.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T> core::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Pool(..)")
    }
}

/// A value checked out of a [`Pool`]. Returns the value on drop.
pub struct PoolGuard<'a, T: Send> {
    pool: &'a Pool<T>,
    value: Option<T>,
}

impl<T: Send> core::ops::Deref for PoolGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // The option is only `None` during drop.
        self.value.as_ref().unwrap()
    }
}

impl<T: Send> core::ops::DerefMut for PoolGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().unwrap()
    }
}

impl<T: Send> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.lock().push(value);
        }
    }
}
