//! # form_layout - Grid Layout
//!
//! Translates a declarative rows-of-props layout into grid container
//! templates. Rows with fewer cells than the widest row are stretched so
//! every level forms a full rectangle.
//!
//! ```
//! use form_layout::Layout;
//!
//! let layout = Layout::new([vec!["a", "b"]]).with_max_columns(4);
//! assert_eq!(layout.container.template_areas(), "\"a a b b\"");
//! ```

pub mod error;
pub mod grid;

pub use error::{LayoutError, LayoutResult};
pub use grid::{auto_fill_columns, GridContainer, GridPlacement, Layout, LayoutItem, EMPTY_CELL};
