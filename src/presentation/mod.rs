// Presentation layer - HTTP surface for the map front-end
pub mod app_state;
pub mod handlers;
