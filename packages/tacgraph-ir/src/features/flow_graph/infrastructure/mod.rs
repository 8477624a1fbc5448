//! CFG construction, rendering, scoped extraction and the function registry

pub mod builder;
pub mod extract;
pub mod mermaid;
pub mod registry;
pub mod text;

pub use builder::{build_cfg, build_full_cfg, reachable_labels, CfgBuilder};
pub use extract::{extract_class, extract_function};
pub use mermaid::{render_mermaid, MermaidRenderer};
pub use registry::FunctionRegistry;
pub use text::render_text;
