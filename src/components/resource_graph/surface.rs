//! The capability a graph drawing backend exposes to the rest of the
//! dashboard. Classification, inference and layout never see the backend.

use super::elements::ElementSet;
use super::health::NodeView;
use super::layout::LayoutMode;

/// Called with the picked node, or `None` when the selection is cleared.
pub type SelectHandler = Box<dyn FnMut(Option<&NodeView>)>;

/// A drawing backend for the resource graph.
pub trait GraphSurface {
	/// Replaces everything on the surface with a new element set.
	fn set_elements(&mut self, elements: ElementSet);

	/// Re-lays out the current elements.
	fn set_layout(&mut self, mode: LayoutMode);

	/// Registers the selection callback, replacing any previous one.
	fn on_node_select(&mut self, handler: SelectHandler);
}
