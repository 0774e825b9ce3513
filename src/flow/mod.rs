pub mod detect;
pub mod editor;
pub mod graph;
pub mod model;
pub mod select_area;
pub mod simulate;
pub mod templates;
