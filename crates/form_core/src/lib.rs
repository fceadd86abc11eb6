//! # form_core - Form Engine Core
//!
//! Foundational primitives shared by every other form crate:
//! - **Paths**: dotted addressing into the root data object
//! - **WidgetTree**: arena of live field handles keyed by path
//! - **Registry**: namespaced lookup of widgets, fields and components
//! - **Config**: per-form tunables
//!
//! Nothing in here is global. Each form owns its own tree and registry so
//! several forms can live side by side without sharing namespace.

pub mod config;
pub mod error;
pub mod path;
pub mod registry;
pub mod tree;

pub use config::FormConfig;
pub use error::{Error, PathError, Result};
pub use registry::{Registry, WidgetRef};
pub use tree::{WidgetNode, WidgetTree};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::FormConfig;
    pub use crate::error::{Error, Result};
    pub use crate::path;
    pub use crate::registry::{Registry, WidgetRef};
    pub use crate::tree::{WidgetNode, WidgetTree};
}
