/// One pixel that must read back close to an RGBA color after a render.
#[derive(Debug, Clone, Copy)]
pub struct PixelExpectation {
    pub x: u32,
    pub y: u32,
    pub rgba: [u8; 4],
    /// Per-channel tolerance (default 3). Effects with random jitter need more.
    pub tolerance: u8,
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn new(x: u32, y: u32, rgba: [u8; 4], label: &'static str) -> Self {
        Self {
            x,
            y,
            rgba,
            tolerance: 3,
            label,
        }
    }

    pub fn opaque(x: u32, y: u32, r: u8, g: u8, b: u8, label: &'static str) -> Self {
        Self::new(x, y, [r, g, b, 255], label)
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Reads the RGBA8 pixel at `(x, y)` from tightly packed rows.
pub fn pixel_at(pixels: &[u8], width: u32, x: u32, y: u32) -> Option<[u8; 4]> {
    let offset = (y as usize * width as usize + x as usize) * 4;
    pixels
        .get(offset..offset + 4)
        .map(|px| [px[0], px[1], px[2], px[3]])
}

/// Checks every expectation against RGBA8 read-back data, top row first.
///
/// Returns one message per failed expectation; empty means all passed.
pub fn check_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    expectations: &[PixelExpectation],
) -> Vec<String> {
    expectations
        .iter()
        .filter_map(|expectation| {
            let PixelExpectation {
                x,
                y,
                rgba,
                tolerance,
                label,
            } = *expectation;
            if x >= width || y >= height {
                return Some(format!(
                    "[{label}] pixel ({x},{y}) lies outside the {width}×{height} frame"
                ));
            }
            let Some(actual) = pixel_at(pixels, width, x, y) else {
                return Some(format!(
                    "[{label}] pixel ({x},{y}) is past the end of a {}-byte buffer",
                    pixels.len()
                ));
            };
            let close = actual
                .iter()
                .zip(rgba)
                .all(|(a, e)| a.abs_diff(e) <= tolerance);
            (!close).then(|| {
                format!("[{label}] pixel ({x},{y}) expected {rgba:?} ±{tolerance} but got {actual:?}")
            })
        })
        .collect()
}

/// Panics with every failure listed when any expectation fails.
pub fn assert_pixels(pixels: &[u8], width: u32, height: u32, expectations: &[PixelExpectation]) {
    let failures = check_pixels(pixels, width, height, expectations);
    if !failures.is_empty() {
        panic!(
            "{} pixel expectation(s) failed:\n{}",
            failures.len(),
            failures.join("\n"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_applies_per_channel() {
        let pixels = [10, 20, 30, 255, 0, 0, 0, 0];
        let near = PixelExpectation::opaque(0, 0, 12, 18, 30, "near");
        let far = PixelExpectation::opaque(0, 0, 10, 20, 40, "far");
        assert!(check_pixels(&pixels, 2, 1, &[near]).is_empty());
        assert_eq!(check_pixels(&pixels, 2, 1, &[far]).len(), 1);
    }

    #[test]
    fn out_of_frame_pixels_are_reported() {
        let failures = check_pixels(&[0; 4], 1, 1, &[PixelExpectation::opaque(3, 0, 0, 0, 0, "x")]);
        assert!(failures[0].contains("outside"));
    }
}
