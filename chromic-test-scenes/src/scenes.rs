//! Source images and a headless context for pixel tests.

use chromic::{ContextOptions, RenderContext};
use futures::executor::block_on;
use image::{Rgba, RgbaImage};

pub const CANVAS_WIDTH: u32 = 64;
pub const CANVAS_HEIGHT: u32 = 48;

/// Opens a headless context over an 8-bit working texture, or `None` when the
/// machine has no usable adapter.
pub fn headless_context(size: (u32, u32)) -> Option<RenderContext<'static>> {
    block_on(RenderContext::try_new_headless(
        size,
        ContextOptions::default().with_float_textures(false),
    ))
}

pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Red top-left, green top-right, blue bottom-left, white bottom-right.
pub fn quadrants(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let color = match (x < width / 2, y < height / 2) {
            (true, true) => [255, 0, 0, 255],
            (false, true) => [0, 255, 0, 255],
            (true, false) => [0, 0, 255, 255],
            (false, false) => [255, 255, 255, 255],
        };
        Rgba(color)
    })
}

/// Black on the left half, white on the right half.
pub fn vertical_edge(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        let level = if x < width / 2 { 0 } else { 255 };
        Rgba([level, level, level, 255])
    })
}

pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        let level = if (x / cell + y / cell) % 2 == 0 { 0 } else { 255 };
        Rgba([level, level, level, 255])
    })
}
