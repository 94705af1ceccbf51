//! Developer Tooling: world inspector over the kernel's deliberate
//! diagnostic surface.
//!
//! # Invariants
//! - Tools only read through public kernel APIs; no back doors into state.

mod inspector;

pub use inspector::{CellInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "blockworld-tools v0.1.0"
}
