//! Glue for running the Halcyon VR runtime behind an Android `NativeActivity`.
//!
//! The runtime (`libhalcyon_vr.so`) owns the rendering pipeline, device
//! tracking and frame scheduling. This crate only mirrors the activity and
//! surface lifecycle into it: every toolkit callback becomes one synchronous
//! call across the FFI boundary, keyed by the opaque application handle the
//! runtime returns on creation.
//!
//! The forwarding rules (ordering, validity guards) live in [`ActivityShell`]
//! and don't depend on Android at all; the shell talks to the runtime only
//! through the [`VrRuntime`] trait so it can be driven by a test double. The
//! Android side of the crate wires `ANativeActivity` callbacks into a shell
//! backed by the real runtime library.

mod bridge;
mod error;
mod shell;

#[cfg(target_os = "android")]
mod glue;

pub use bridge::{RuntimeHandle, VrRuntime};
pub use error::{BridgeError, Result};
pub use shell::ActivityShell;
