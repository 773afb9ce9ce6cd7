//! Core data structures for cbuild.
//!
//! - Source languages and extension detection
//! - Extension module descriptors and macro definitions
//! - The Cbuild.toml manifest

pub mod extension;
pub mod language;
pub mod manifest;

pub use extension::{ExtensionDescriptor, MacroDef};
pub use language::Language;
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
