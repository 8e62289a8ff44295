pub mod gemini;
pub mod image;
pub mod settings;

pub use gemini::*;
pub use image::*;
pub use settings::*;
