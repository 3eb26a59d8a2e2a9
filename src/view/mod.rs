mod relationship_panel;

pub use relationship_panel::*;
