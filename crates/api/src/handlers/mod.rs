pub mod download;
pub mod presets;
pub mod render;
pub mod upload;
