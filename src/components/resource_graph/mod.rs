//! Resource dependency graph.
//!
//! The pipeline runs leaf first:
//! - [`types`]: nodes and edges as served by `GET /api/v1/graph`
//! - [`layers`] and [`infer`]: architectural layer per resource type and
//!   relationships synthesized from metadata
//! - [`health`] and [`elements`]: per-node presentation attributes and the
//!   deduplicated element set
//! - [`layout`]: position assignment for each layout mode
//! - [`surface`], [`state`], [`render`] and the canvas component: the
//!   interactive drawing surface
//!
//! # Example
//!
//! ```ignore
//! let elements = ElementSet::from_graph(&graph);
//! let selected = RwSignal::new(None);
//!
//! view! {
//!     <ResourceGraphCanvas elements=elements mode=LayoutMode::Layered selected=selected />
//! }
//! ```

mod component;
pub mod elements;
pub mod health;
pub mod infer;
pub mod layers;
pub mod layout;
mod panel;
mod render;
pub mod scale;
mod state;
pub mod style;
pub mod surface;
pub mod types;
mod view;

pub use component::ResourceGraphCanvas;
pub use elements::ElementSet;
pub use layout::LayoutMode;
pub use panel::NodeDetailsPanel;
pub use view::ResourceGraphView;
