use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::source::FitsSource;

/// A FITS source shared between threads.
///
/// The source's current HDU is shared state: repositioning and then reading
/// must happen without another thread moving the cursor in between, so both
/// happen under one lock in [`with_extension`](Self::with_extension).
#[derive(Debug)]
pub struct SharedHandle<S> {
    inner: Mutex<S>,
}

impl<S: FitsSource> SharedHandle<S> {
    pub fn new(source: S) -> Self {
        SharedHandle {
            inner: Mutex::new(source),
        }
    }

    /// Make HDU `index` current and run `f` on the source, holding the lock
    /// for both steps. The lock is released on every return path.
    pub fn with_extension<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut S) -> fits_hdu::Result<T>,
    ) -> fits_hdu::Result<T> {
        let mut source = self.lock();
        source.move_to(index)?;
        f(&mut source)
    }

    /// A panic in another holder leaves the source usable: every operation
    /// repositions before it reads.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> S {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::{MockHdu, MockSource};

    fn two_images() -> SharedHandle<MockSource> {
        SharedHandle::new(MockSource::new(vec![
            MockHdu::image("A", 4, 4, 10.0),
            MockHdu::image("B", 4, 4, 20.0),
        ]))
    }

    #[test]
    fn repositions_before_running() {
        let handle = two_images();
        let mut out = [0.0f32; 2];
        handle
            .with_extension(2, |s| s.read_pixels(&[1, 1], &mut out, f32::NAN))
            .unwrap();
        assert_eq!(out, [20.0, 21.0]);
        handle
            .with_extension(1, |s| s.read_pixels(&[3, 1], &mut out, f32::NAN))
            .unwrap();
        assert_eq!(out, [12.0, 13.0]);
        assert_eq!(handle.into_inner().moves, vec![2, 1]);
    }

    #[test]
    fn failed_move_skips_closure() {
        let handle = two_images();
        let mut ran = false;
        let result = handle.with_extension(9, |_| {
            ran = true;
            Ok(())
        });
        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    fn lock_released_after_error() {
        let handle = two_images();
        let result: fits_hdu::Result<()> =
            handle.with_extension(1, |_| Err(fits_hdu::Error::UnexpectedEof));
        assert!(result.is_err());
        assert!(handle.inner.try_lock().is_ok());
    }

    #[test]
    fn survives_poisoning() {
        let handle = two_images();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = handle.lock();
            panic!("holder panicked");
        }));
        assert!(handle.inner.is_poisoned());
        let mut out = [0.0f32; 1];
        handle
            .with_extension(1, |s| s.read_pixels(&[1, 1], &mut out, f32::NAN))
            .unwrap();
        assert_eq!(out, [10.0]);
    }
}
