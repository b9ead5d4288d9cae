pub mod engine;
pub mod utils;

pub use engine::{StretchOptions, stretch, stretch_with_options};
