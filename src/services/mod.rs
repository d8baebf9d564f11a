pub mod catalog;
pub mod loader;
pub mod recommendation;
