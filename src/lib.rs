//! Workspace façade crate.
//!
//! Re-exports the player crates behind feature flags so a host page or shell
//! can depend on `minitune` alone. `desktop-shims` pulls in the native
//! bridge adapters; `wasm` only exposes the portable core.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_playback as playback;
#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_runtime as runtime;
