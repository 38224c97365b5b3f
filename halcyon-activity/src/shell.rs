use log::{debug, warn};

use crate::bridge::{RuntimeHandle, VrRuntime};
use crate::error::BridgeError;

/// Mirrors the activity and surface lifecycle into ordered runtime
/// notifications.
///
/// The shell holds the two pieces of state this layer owns: the application
/// handle returned by the runtime's create call and a transient reference to
/// the currently bound drawing surface. Everything else is forwarding, with
/// two rules layered on top of the toolkit's own ordering:
///
/// - every forward is guarded on handle validity, so events delivered before
///   creation or after destruction are dropped instead of reaching a
///   non-existent runtime instance;
/// - destruction releases a still-bound surface before tearing down the
///   application, so the runtime never loses its instance while it may still
///   hold the window.
///
/// All methods are expected to run on the toolkit's main thread, one event
/// at a time; the shell does no locking or queuing of its own.
pub struct ActivityShell<R: VrRuntime> {
    runtime: R,
    handle: RuntimeHandle,
    surface: Option<R::Surface>,
}

impl<R: VrRuntime> ActivityShell<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            handle: RuntimeHandle::INVALID,
            surface: None,
        }
    }

    /// Handle of the native application instance, if one is alive.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle
    }

    /// Whether a drawing surface is currently bound to the runtime.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Creates the native application instance and stores its handle.
    ///
    /// Must run before any other event is forwarded; events arriving earlier
    /// are dropped by the validity guards. The only observable failure is
    /// the runtime handing back the null handle, in which case the shell
    /// stays inert.
    pub fn on_create(&mut self, ctx: R::Context) -> crate::error::Result<()> {
        if self.handle.is_valid() {
            return Err(BridgeError::AlreadyCreated);
        }

        let handle = self.runtime.create(ctx);
        if !handle.is_valid() {
            return Err(BridgeError::CreateFailed);
        }

        debug!("Created native application: {handle:?}");
        self.handle = handle;
        Ok(())
    }

    pub fn on_start(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping start event, no live native application");
            return;
        }
        self.runtime.start(self.handle);
    }

    pub fn on_resume(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping resume event, no live native application");
            return;
        }
        self.runtime.resume(self.handle);
    }

    pub fn on_pause(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping pause event, no live native application");
            return;
        }
        self.runtime.pause(self.handle);
    }

    pub fn on_stop(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping stop event, no live native application");
            return;
        }
        self.runtime.stop(self.handle);
    }

    /// Tears down the native application and invalidates the handle.
    ///
    /// A surface that is still bound is released first: the activity can die
    /// before the toolkit delivers the surface-destroyed callback, and the
    /// runtime requires surface teardown to precede application teardown.
    /// Clearing the stored reference here also keeps a late
    /// [`surface_destroyed()`] from forwarding a second release, since by
    /// then the handle is invalid.
    ///
    /// [`surface_destroyed()`]: ActivityShell::surface_destroyed
    pub fn on_destroy(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping destroy event, no live native application");
            return;
        }

        if self.surface.take().is_some() {
            self.runtime.surface_destroyed(self.handle);
        }

        self.runtime.destroy(self.handle);
        self.handle = RuntimeHandle::INVALID;
        debug!("Native application destroyed");
    }

    /// A drawing surface became available; binds it to the runtime.
    pub fn surface_created(&mut self, surface: R::Surface) {
        if !self.handle.is_valid() {
            warn!("Dropping new surface, no live native application");
            return;
        }
        self.runtime.surface_created(self.handle, &surface);
        self.surface = Some(surface);
    }

    /// The surface geometry or format changed; re-binds it to the runtime.
    ///
    /// A resize is handled exactly like a fresh bind. The runtime re-queries
    /// geometry from the window itself, so nothing beyond the surface object
    /// is marshaled.
    pub fn surface_changed(&mut self, surface: R::Surface) {
        if !self.handle.is_valid() {
            warn!("Dropping surface change, no live native application");
            return;
        }
        self.runtime.surface_changed(self.handle, &surface);
        self.surface = Some(surface);
    }

    /// The surface is gone; releases it runtime-side and drops our reference.
    pub fn surface_destroyed(&mut self) {
        if !self.handle.is_valid() {
            warn!("Dropping surface teardown, no live native application");
            return;
        }
        self.runtime.surface_destroyed(self.handle);
        self.surface = None;
    }
}

impl<R: VrRuntime> Drop for ActivityShell<R> {
    fn drop(&mut self) {
        // Normal teardown arrives through on_destroy() and invalidates the
        // handle; this only covers a shell dropped while its native instance
        // is still alive, and keeps the surface-before-application ordering.
        if self.handle.is_valid() {
            self.on_destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Create,
        Start,
        Resume,
        Pause,
        Stop,
        Destroy,
        SurfaceCreated(u32),
        SurfaceChanged(u32),
        SurfaceDestroyed,
    }

    use Call::*;

    /// Stands in for the runtime library and records every call it receives,
    /// in order.
    struct Recorder {
        calls: Rc<RefCell<Vec<Call>>>,
        handle: RuntimeHandle,
    }

    impl Recorder {
        fn new() -> (Self, Rc<RefCell<Vec<Call>>>) {
            Self::with_handle(RuntimeHandle::from_raw(0x7a5d))
        }

        /// A runtime whose create call refuses to produce an instance.
        fn refusing() -> (Self, Rc<RefCell<Vec<Call>>>) {
            Self::with_handle(RuntimeHandle::INVALID)
        }

        fn with_handle(handle: RuntimeHandle) -> (Self, Rc<RefCell<Vec<Call>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            (
                Recorder {
                    calls: calls.clone(),
                    handle,
                },
                calls,
            )
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl VrRuntime for Recorder {
        type Context = ();
        type Surface = u32;

        fn create(&mut self, _ctx: ()) -> RuntimeHandle {
            self.record(Create);
            self.handle
        }

        fn start(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(Start);
        }

        fn resume(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(Resume);
        }

        fn pause(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(Pause);
        }

        fn stop(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(Stop);
        }

        fn destroy(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(Destroy);
        }

        fn surface_created(&mut self, app: RuntimeHandle, surface: &u32) {
            assert_eq!(app, self.handle);
            self.record(SurfaceCreated(*surface));
        }

        fn surface_changed(&mut self, app: RuntimeHandle, surface: &u32) {
            assert_eq!(app, self.handle);
            self.record(SurfaceChanged(*surface));
        }

        fn surface_destroyed(&mut self, app: RuntimeHandle) {
            assert_eq!(app, self.handle);
            self.record(SurfaceDestroyed);
        }
    }

    fn created_shell() -> (ActivityShell<Recorder>, Rc<RefCell<Vec<Call>>>) {
        let (runtime, calls) = Recorder::new();
        let mut shell = ActivityShell::new(runtime);
        shell.on_create(()).unwrap();
        (shell, calls)
    }

    #[test]
    fn full_session_mirrors_event_order() {
        let (mut shell, calls) = created_shell();

        shell.on_start();
        shell.on_resume();
        shell.surface_created(1);
        shell.surface_changed(1);
        shell.on_pause();
        shell.on_stop();
        shell.surface_destroyed();
        shell.on_destroy();

        assert_eq!(
            *calls.borrow(),
            [
                Create,
                Start,
                Resume,
                SurfaceCreated(1),
                SurfaceChanged(1),
                Pause,
                Stop,
                SurfaceDestroyed,
                Destroy,
            ]
        );
    }

    #[test]
    fn destroy_releases_surface_before_application() {
        let (mut shell, calls) = created_shell();

        shell.surface_created(7);
        shell.on_destroy();

        assert_eq!(
            *calls.borrow(),
            [Create, SurfaceCreated(7), SurfaceDestroyed, Destroy]
        );
        assert!(!shell.handle().is_valid());
        assert!(!shell.has_surface());
    }

    #[test]
    fn destroy_without_surface_skips_surface_teardown() {
        let (mut shell, calls) = created_shell();

        shell.on_start();
        shell.on_destroy();

        assert_eq!(*calls.borrow(), [Create, Start, Destroy]);
    }

    #[test]
    fn out_of_band_surface_teardown_is_not_repeated() {
        let (mut shell, calls) = created_shell();

        shell.surface_created(3);
        shell.surface_destroyed();
        shell.on_destroy();

        assert_eq!(
            *calls.borrow(),
            [Create, SurfaceCreated(3), SurfaceDestroyed, Destroy]
        );
    }

    #[test]
    fn events_after_destroy_are_dropped() {
        let (mut shell, calls) = created_shell();
        shell.on_destroy();

        shell.on_start();
        shell.on_resume();
        shell.surface_created(2);
        shell.surface_destroyed();
        shell.on_destroy();

        assert_eq!(*calls.borrow(), [Create, Destroy]);
    }

    #[test]
    fn surface_events_before_create_are_dropped() {
        let (runtime, calls) = Recorder::new();
        let mut shell = ActivityShell::new(runtime);

        shell.surface_created(9);
        shell.surface_changed(9);
        shell.surface_destroyed();

        assert!(calls.borrow().is_empty());
        assert!(!shell.has_surface());
    }

    #[test]
    fn lifecycle_events_before_create_are_dropped() {
        let (runtime, calls) = Recorder::new();
        let mut shell = ActivityShell::new(runtime);

        shell.on_start();
        shell.on_resume();
        shell.on_pause();
        shell.on_stop();

        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn pause_resume_cycle_is_mirrored() {
        let (mut shell, calls) = created_shell();

        shell.on_start();
        shell.on_resume();
        shell.on_pause();
        shell.on_resume();
        shell.on_pause();
        shell.on_stop();

        assert_eq!(
            *calls.borrow(),
            [Create, Start, Resume, Pause, Resume, Pause, Stop]
        );
    }

    #[test]
    fn second_create_is_rejected_without_reaching_runtime() {
        let (mut shell, calls) = created_shell();
        let handle = shell.handle();

        assert!(matches!(
            shell.on_create(()),
            Err(BridgeError::AlreadyCreated)
        ));
        assert_eq!(*calls.borrow(), [Create]);
        assert_eq!(shell.handle(), handle);
    }

    #[test]
    fn refused_create_leaves_shell_inert() {
        let (runtime, calls) = Recorder::refusing();
        let mut shell = ActivityShell::new(runtime);

        assert!(matches!(shell.on_create(()), Err(BridgeError::CreateFailed)));
        assert!(!shell.handle().is_valid());

        shell.on_start();
        shell.surface_created(4);

        // The refused create reached the runtime; nothing after it did.
        assert_eq!(*calls.borrow(), [Create]);
    }

    #[test]
    fn dropping_a_live_shell_forwards_teardown() {
        let (mut shell, calls) = created_shell();
        shell.surface_created(5);
        drop(shell);

        assert_eq!(
            *calls.borrow(),
            [Create, SurfaceCreated(5), SurfaceDestroyed, Destroy]
        );
    }

    #[test]
    fn dropping_a_destroyed_shell_forwards_nothing() {
        let (mut shell, calls) = created_shell();
        shell.on_destroy();
        drop(shell);

        assert_eq!(*calls.borrow(), [Create, Destroy]);
    }
}
