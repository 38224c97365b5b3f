use core::fmt;

/// Opaque token identifying an application instance inside the native
/// runtime.
///
/// The runtime mints the handle from [`VrRuntime::create()`] and resolves it
/// back to its internal instance on every later call. The zero value is
/// reserved as the "no instance" sentinel; a handle is only meaningful
/// between creation and destruction.
///
/// This is deliberately not a plain integer so it can't end up in arithmetic
/// or get confused with other 64-bit values crossing the boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeHandle(i64);

impl RuntimeHandle {
    /// The sentinel for "no native instance".
    pub const INVALID: RuntimeHandle = RuntimeHandle(0);

    /// Wraps a raw handle value received across the FFI boundary.
    pub fn from_raw(raw: i64) -> Self {
        RuntimeHandle(raw)
    }

    /// The raw value to pass back across the FFI boundary.
    pub fn into_raw(self) -> i64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "RuntimeHandle({:#x})", self.0)
        } else {
            f.write_str("RuntimeHandle(INVALID)")
        }
    }
}

/// The foreign-function surface of the native VR runtime.
///
/// Every method is a direct, synchronous call across the FFI boundary: it
/// blocks until the runtime returns and carries no local logic beyond
/// argument marshaling. Nothing flows back to this side except the handle
/// returned by [`create()`]; runtime failures surface through the runtime's
/// own channels (logcat) and are invisible here. Calls are never retried or
/// cancelled.
///
/// [`ActivityShell`] depends on the runtime only through this trait, so the
/// forwarding rules can be exercised against a recording double without a
/// real runtime library linked in.
///
/// [`create()`]: VrRuntime::create
/// [`ActivityShell`]: crate::ActivityShell
pub trait VrRuntime {
    /// Process-level context handed to the runtime on creation. On Android
    /// this is the `ANativeActivity` instance, which carries everything the
    /// runtime needs to reach the JVM.
    type Context;

    /// The renderable target the runtime draws into while one is bound.
    type Surface;

    /// Creates the native application instance and returns its handle.
    ///
    /// Invoked once, before any other call. A [`RuntimeHandle::INVALID`]
    /// return means the runtime refused to come up.
    fn create(&mut self, ctx: Self::Context) -> RuntimeHandle;

    fn start(&mut self, app: RuntimeHandle);

    fn resume(&mut self, app: RuntimeHandle);

    fn pause(&mut self, app: RuntimeHandle);

    fn stop(&mut self, app: RuntimeHandle);

    /// Tears down the native application instance. Invoked once, terminally;
    /// the handle must not be used afterwards.
    fn destroy(&mut self, app: RuntimeHandle);

    /// A drawing surface became available.
    fn surface_created(&mut self, app: RuntimeHandle, surface: &Self::Surface);

    /// The surface geometry or format changed. Forwarded with the same shape
    /// as [`surface_created()`]; the runtime re-queries geometry itself.
    ///
    /// [`surface_created()`]: VrRuntime::surface_created
    fn surface_changed(&mut self, app: RuntimeHandle, surface: &Self::Surface);

    /// The surface is no longer available for rendering.
    fn surface_destroyed(&mut self, app: RuntimeHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel() {
        assert!(!RuntimeHandle::INVALID.is_valid());
        assert!(!RuntimeHandle::from_raw(0).is_valid());
        assert!(RuntimeHandle::from_raw(0x7f00_0042).is_valid());
    }

    #[test]
    fn raw_round_trip() {
        let handle = RuntimeHandle::from_raw(-1);
        assert!(handle.is_valid());
        assert_eq!(handle.into_raw(), -1);
        assert_eq!(RuntimeHandle::from_raw(handle.into_raw()), handle);
    }

    #[test]
    fn debug_marks_invalid() {
        assert_eq!(
            format!("{:?}", RuntimeHandle::INVALID),
            "RuntimeHandle(INVALID)"
        );
        assert_eq!(
            format!("{:?}", RuntimeHandle::from_raw(0x10)),
            "RuntimeHandle(0x10)"
        );
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn needs_send_sync<T: Send + Sync>() {}
        needs_send_sync::<RuntimeHandle>();
    }
}
