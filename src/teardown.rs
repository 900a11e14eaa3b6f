use std::ops::Deref;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Clone, Debug, Default)]
/// A flag signaling that the owner of a tracker is gone
///
/// Copies share the flag, so completions holding a copy observe the teardown
/// of the tracker they were started from.
pub struct Teardown {
    flag: Arc<AtomicBool>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Calling this more than once has no further effect
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Checks if the teardown has been triggered
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A teardown that gets triggered on drop
///
/// This purposely doesn't implement Clone, but implements Deref, meaning
/// `.clone()` calls will return a plain [`Teardown`] that gets triggered
/// when the original `AutoTeardown` is dropped.
#[derive(Debug, Default)]
pub struct AutoTeardown(Teardown);

impl From<Teardown> for AutoTeardown {
    fn from(teardown: Teardown) -> Self {
        Self(teardown)
    }
}

impl Drop for AutoTeardown {
    fn drop(&mut self) {
        self.0.trigger();
    }
}

impl Deref for AutoTeardown {
    type Target = Teardown;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
