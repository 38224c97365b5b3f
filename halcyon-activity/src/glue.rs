#![cfg(target_os = "android")]

//! `NativeActivity` wiring for the Halcyon runtime.
//!
//! Android calls [`ANativeActivity_onCreate`] when the activity comes up; we
//! register the lifecycle callbacks there and park an [`ActivityShell`] in
//! the activity's instance slot. Each callback recovers the shell from the
//! slot and forwards its event. Everything runs on the main thread,
//! serialized by the framework.

use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::os::raw;
use std::os::unix::prelude::*;
use std::ptr::{self, NonNull};
use std::thread;

use log::{debug, error, Level};
use ndk::native_window::NativeWindow;

use crate::bridge::{RuntimeHandle, VrRuntime};
use crate::shell::ActivityShell;

/// Entry points of the runtime shared library.
///
/// These are the only symbols the runtime exports to the host side; it does
/// all further work (JNI included, via the activity it was handed) on its
/// own threads and reports failures through logcat.
mod ffi {
    #![allow(non_snake_case)]

    #[link(name = "halcyon_vr")]
    extern "C" {
        pub fn HvrApp_create(activity: *mut ndk_sys::ANativeActivity) -> i64;
        pub fn HvrApp_start(app: i64);
        pub fn HvrApp_resume(app: i64);
        pub fn HvrApp_pause(app: i64);
        pub fn HvrApp_stop(app: i64);
        pub fn HvrApp_destroy(app: i64);
        pub fn HvrApp_surfaceCreated(app: i64, window: *mut ndk_sys::ANativeWindow);
        pub fn HvrApp_surfaceChanged(app: i64, window: *mut ndk_sys::ANativeWindow);
        pub fn HvrApp_surfaceDestroyed(app: i64);
    }
}

/// [`VrRuntime`] backed by `libhalcyon_vr.so`.
struct HalcyonRuntime;

impl VrRuntime for HalcyonRuntime {
    type Context = NonNull<ndk_sys::ANativeActivity>;
    type Surface = NativeWindow;

    fn create(&mut self, activity: Self::Context) -> RuntimeHandle {
        RuntimeHandle::from_raw(unsafe { ffi::HvrApp_create(activity.as_ptr()) })
    }

    fn start(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_start(app.into_raw()) }
    }

    fn resume(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_resume(app.into_raw()) }
    }

    fn pause(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_pause(app.into_raw()) }
    }

    fn stop(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_stop(app.into_raw()) }
    }

    fn destroy(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_destroy(app.into_raw()) }
    }

    fn surface_created(&mut self, app: RuntimeHandle, window: &NativeWindow) {
        unsafe { ffi::HvrApp_surfaceCreated(app.into_raw(), window.ptr().as_ptr()) }
    }

    fn surface_changed(&mut self, app: RuntimeHandle, window: &NativeWindow) {
        unsafe { ffi::HvrApp_surfaceChanged(app.into_raw(), window.ptr().as_ptr()) }
    }

    fn surface_destroyed(&mut self, app: RuntimeHandle) {
        unsafe { ffi::HvrApp_surfaceDestroyed(app.into_raw()) }
    }
}

type Shell = ActivityShell<HalcyonRuntime>;

/// The instance slot is NULL until creation succeeds and is cleared again on
/// destroy, so late callbacks fall through here instead of touching a
/// torn-down shell.
unsafe fn shell_from_instance<'a>(activity: *mut ndk_sys::ANativeActivity) -> Option<&'a mut Shell> {
    ((*activity).instance as *mut Shell).as_mut()
}

unsafe extern "C" fn on_start(activity: *mut ndk_sys::ANativeActivity) {
    debug!("Start: {:p}", activity);
    if let Some(shell) = shell_from_instance(activity) {
        shell.on_start();
    }
}

unsafe extern "C" fn on_resume(activity: *mut ndk_sys::ANativeActivity) {
    debug!("Resume: {:p}", activity);
    if let Some(shell) = shell_from_instance(activity) {
        shell.on_resume();
    }
}

unsafe extern "C" fn on_pause(activity: *mut ndk_sys::ANativeActivity) {
    debug!("Pause: {:p}", activity);
    if let Some(shell) = shell_from_instance(activity) {
        shell.on_pause();
    }
}

unsafe extern "C" fn on_stop(activity: *mut ndk_sys::ANativeActivity) {
    debug!("Stop: {:p}", activity);
    if let Some(shell) = shell_from_instance(activity) {
        shell.on_stop();
    }
}

unsafe extern "C" fn on_destroy(activity: *mut ndk_sys::ANativeActivity) {
    debug!("Destroy: {:p}", activity);

    // Clear the slot before tearing down so any event the framework still
    // delivers finds no shell.
    let shell: *mut Shell = (*activity).instance.cast();
    (*activity).instance = ptr::null_mut();
    if !shell.is_null() {
        let mut shell = Box::from_raw(shell);
        shell.on_destroy();
    }

    ndk_context::release_android_context();
}

unsafe extern "C" fn on_native_window_created(
    activity: *mut ndk_sys::ANativeActivity,
    window: *mut ndk_sys::ANativeWindow,
) {
    debug!("NativeWindowCreated: {:p} -- {:p}", activity, window);
    if let Some(shell) = shell_from_instance(activity) {
        match NonNull::new(window) {
            // clone_from_ptr acquires a reference; the shell releases it when
            // the stored window is dropped or replaced.
            Some(window) => shell.surface_created(NativeWindow::clone_from_ptr(window)),
            None => error!("NativeWindowCreated delivered a NULL window (ignored)"),
        }
    }
}

unsafe extern "C" fn on_native_window_resized(
    activity: *mut ndk_sys::ANativeActivity,
    window: *mut ndk_sys::ANativeWindow,
) {
    debug!("NativeWindowResized: {:p} -- {:p}", activity, window);
    if let Some(shell) = shell_from_instance(activity) {
        match NonNull::new(window) {
            Some(window) => shell.surface_changed(NativeWindow::clone_from_ptr(window)),
            None => error!("NativeWindowResized delivered a NULL window (ignored)"),
        }
    }
}

unsafe extern "C" fn on_native_window_destroyed(
    activity: *mut ndk_sys::ANativeActivity,
    window: *mut ndk_sys::ANativeWindow,
) {
    debug!("NativeWindowDestroyed: {:p} -- {:p}", activity, window);
    if let Some(shell) = shell_from_instance(activity) {
        shell.surface_destroyed();
    }
}

/// `NativeActivity` entry point.
///
/// Saved state is not supported; the runtime rebuilds its world from scratch
/// on every create, so the bundle is ignored the same way the input queue
/// callbacks are left unregistered.
#[no_mangle]
unsafe extern "C" fn ANativeActivity_onCreate(
    activity: *mut ndk_sys::ANativeActivity,
    _saved_state: *const libc::c_void,
    _saved_state_size: libc::size_t,
) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_min_level(Level::Debug)
            .with_tag("HalcyonShell"),
    );
    forward_stdio_to_logcat();

    debug!("Creating: {:p}", activity);

    let callbacks = (*activity).callbacks;
    (*callbacks).onStart = Some(on_start);
    (*callbacks).onResume = Some(on_resume);
    (*callbacks).onPause = Some(on_pause);
    (*callbacks).onStop = Some(on_stop);
    (*callbacks).onDestroy = Some(on_destroy);
    (*callbacks).onNativeWindowCreated = Some(on_native_window_created);
    (*callbacks).onNativeWindowResized = Some(on_native_window_resized);
    (*callbacks).onNativeWindowDestroyed = Some(on_native_window_destroyed);

    // Publish the JVM and activity instance for runtime code that needs to
    // make JNI calls back into the platform.
    ndk_context::initialize_android_context((*activity).vm.cast(), (*activity).clazz.cast());

    let mut shell = ActivityShell::new(HalcyonRuntime);
    match shell.on_create(NonNull::new_unchecked(activity)) {
        Ok(()) => (*activity).instance = Box::into_raw(Box::new(shell)).cast(),
        Err(err) => {
            // Leave the slot NULL; every later callback will drop its event.
            error!("Failed to create native application: {err}");
        }
    }
}

fn android_log(level: Level, tag: &CStr, msg: &CStr) {
    let prio = match level {
        Level::Error => ndk_sys::android_LogPriority::ANDROID_LOG_ERROR,
        Level::Warn => ndk_sys::android_LogPriority::ANDROID_LOG_WARN,
        Level::Info => ndk_sys::android_LogPriority::ANDROID_LOG_INFO,
        Level::Debug => ndk_sys::android_LogPriority::ANDROID_LOG_DEBUG,
        Level::Trace => ndk_sys::android_LogPriority::ANDROID_LOG_VERBOSE,
    };
    unsafe {
        ndk_sys::__android_log_write(prio.0 as raw::c_int, tag.as_ptr(), msg.as_ptr());
    }
}

/// Redirects stdout/stderr into logcat so panic messages and stray prints
/// from Rust code in this process aren't lost.
fn forward_stdio_to_logcat() {
    let mut logpipe: [RawFd; 2] = Default::default();
    unsafe {
        libc::pipe(logpipe.as_mut_ptr());
        libc::dup2(logpipe[1], libc::STDOUT_FILENO);
        libc::dup2(logpipe[1], libc::STDERR_FILENO);
    }
    thread::spawn(move || {
        let tag = CStr::from_bytes_with_nul(b"HalcyonStdoutStderr\0").unwrap();
        let file = unsafe { File::from_raw_fd(logpipe[0]) };
        let mut reader = BufReader::new(file);
        let mut buffer = String::new();
        loop {
            buffer.clear();
            match reader.read_line(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if let Ok(msg) = CString::new(buffer.clone()) {
                        android_log(Level::Info, tag, &msg);
                    }
                }
            }
        }
    });
}
