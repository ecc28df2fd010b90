//! Dashboard views and the widgets they share.

pub mod charts;
pub mod drift_detail;
pub mod drift_table;
pub mod format;
pub mod overview;
pub mod resource_graph;
pub mod status;
pub mod trends;
