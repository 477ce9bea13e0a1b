//! Platform abstraction for the driver's locks.
//!
//! With the `std` feature the driver locks with `parking_lot::Mutex`; with
//! `lock-free` it uses `spin::Mutex` so it can run where no OS scheduler exists.
//! State that interrupt entry points touch lives in [`IrqCell`] or [`IrqMutex`],
//! which go through `critical-section` instead, so an interrupt can never spin
//! on a lock held by the worker it preempted.

use core::cell::{Cell, RefCell};

#[cfg(all(feature = "std", not(feature = "lock-free")))]
pub type MutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
#[cfg(feature = "lock-free")]
pub type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;

/// Mutex used for every piece of driver state.
///
/// Neither backend poisons, so a panicking notifier callback does not wedge
/// the driver.
pub struct Mutex<T> {
    #[cfg(all(feature = "std", not(feature = "lock-free")))]
    inner: parking_lot::Mutex<T>,
    #[cfg(feature = "lock-free")]
    inner: spin::Mutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new mutex protecting the given value.
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(all(feature = "std", not(feature = "lock-free")))]
            inner: parking_lot::Mutex::new(value),
            #[cfg(feature = "lock-free")]
            inner: spin::Mutex::new(value),
        }
    }

    /// Acquires the mutex, blocking until it becomes available.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Consumes the mutex, returning the protected value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// A copyable value shared between interrupt entry points and the worker.
pub struct IrqCell<T: Copy> {
    inner: critical_section::Mutex<Cell<T>>,
}

impl<T: Copy> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: critical_section::Mutex::new(Cell::new(value)),
        }
    }

    pub fn get(&self) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    pub fn set(&self, value: T) {
        critical_section::with(|cs| self.inner.borrow(cs).set(value));
    }

    /// Stores `value` and returns what was there before.
    pub fn replace(&self, value: T) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).replace(value))
    }
}

/// State shared between interrupt entry points and the worker.
///
/// Every access runs inside a critical section. Keep the closures short and
/// never nest two accesses to the same `IrqMutex`.
pub struct IrqMutex<T> {
    inner: critical_section::Mutex<RefCell<T>>,
}

impl<T> IrqMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: critical_section::Mutex::new(RefCell::new(value)),
        }
    }

    /// Runs `f` with exclusive access to the value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}
