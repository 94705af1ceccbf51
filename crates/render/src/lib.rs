//! Rendering Adapter: the collaborator side of the world kernel.
//!
//! # Invariants
//! - Renderer cannot mutate world truth directly.
//! - Render state derives from world state and the kernel's event log.
//!
//! # Workaround
//! Provides a trait-based renderer interface with a debug text renderer in
//! place of a mesh backend, plus a [`VisualMirror`] that rebuilds the set of
//! visible cells purely from notifications.

mod mirror;
mod renderer;

pub use mirror::VisualMirror;
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "blockworld-render v0.1.0"
}
