#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod manifest;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use convert::{Diagram, convert, convert_file};
pub use error::{ConvertError, Result};
pub use ir::{EdgeKind, LineageGraph, NodeAttributes, NodeKind};
pub use layout::{FixedLayout, LayeredLayout, LayoutProvider, RawLayout};
pub use manifest::{Manifest, build_graph};
pub use render::render_drawio;
