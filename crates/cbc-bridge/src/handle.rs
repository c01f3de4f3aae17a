//! Ownership of the opaque native solver pointer.
#![allow(unsafe_code)]

use crate::engine::NativeEngine;
use crate::error::BridgeError;
use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use tracing::{debug, warn};

/// Exclusively owned native solver instance.
///
/// The pointer is released exactly once, either by [`NativeHandle::release`]
/// or on drop. After release the handle holds nothing and [`get`](Self::get)
/// returns `None`.
pub(crate) struct NativeHandle<E: NativeEngine> {
    ptr: Option<NonNull<c_void>>,
    _engine: PhantomData<fn() -> E>,
}

// The native state is only reachable through this owner and is not shared,
// so moving it to another thread is fine. It is not Sync.
unsafe impl<E: NativeEngine> Send for NativeHandle<E> {}

impl<E: NativeEngine> NativeHandle<E> {
    pub(crate) fn create() -> Result<Self, BridgeError> {
        let Some(ptr) = NonNull::new(E::create()) else {
            warn!(
                component = "handle",
                operation = "create",
                status = "error",
                engine = E::NAME,
                "Native solver creation returned null"
            );
            return Err(BridgeError::CreationFailed);
        };
        debug!(
            component = "handle",
            operation = "create",
            status = "success",
            engine = E::NAME,
            "Created native solver"
        );
        Ok(NativeHandle {
            ptr: Some(ptr),
            _engine: PhantomData,
        })
    }

    /// Raw pointer for a native call, `None` once released.
    pub(crate) fn get(&self) -> Option<*mut c_void> {
        self.ptr.map(NonNull::as_ptr)
    }

    pub(crate) fn is_live(&self) -> bool {
        self.ptr.is_some()
    }

    /// Free the native state. Returns `false` if it was already released.
    pub(crate) fn release(&mut self) -> bool {
        let Some(ptr) = self.ptr.take() else {
            return false;
        };
        // SAFETY: `ptr` came from `E::create`, and taking it out of the
        // option guarantees this is the only release.
        unsafe { E::free(ptr.as_ptr()) };
        debug!(
            component = "handle",
            operation = "free",
            status = "success",
            engine = E::NAME,
            "Released native solver"
        );
        true
    }
}

impl<E: NativeEngine> Drop for NativeHandle<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E: NativeEngine> fmt::Debug for NativeHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("engine", &E::NAME)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, ScriptedEngine};

    #[test]
    fn test_release_is_exactly_once() {
        testkit::reset();
        let mut handle = NativeHandle::<ScriptedEngine>::create().unwrap();
        assert!(handle.is_live());
        assert!(handle.release());
        assert!(!handle.release());
        assert!(handle.get().is_none());
        drop(handle);
        assert_eq!(testkit::counters().created, 1);
        assert_eq!(testkit::counters().freed, 1);
    }

    #[test]
    fn test_drop_releases() {
        testkit::reset();
        {
            let _handle = NativeHandle::<ScriptedEngine>::create().unwrap();
        }
        assert_eq!(testkit::counters().freed, 1);
    }

    #[test]
    fn test_null_is_creation_failure() {
        testkit::reset();
        testkit::script(|s| s.fail_create = true);
        let err = NativeHandle::<ScriptedEngine>::create().unwrap_err();
        assert_eq!(err, BridgeError::CreationFailed);
        assert_eq!(testkit::counters().freed, 0);
    }
}
