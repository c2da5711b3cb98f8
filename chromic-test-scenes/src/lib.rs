pub mod expectations;
pub mod scenes;

pub use expectations::{check_pixels, PixelExpectation};
pub use scenes::{headless_context, CANVAS_HEIGHT, CANVAS_WIDTH};
