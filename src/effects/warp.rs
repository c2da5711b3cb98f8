//! Coordinate warps. Positions are in pixels with the origin at the top left.

use smallvec::smallvec;

use super::EffectPlan;
use crate::math::{clamp, square_to_quad};
use crate::modifier::Corners;
use crate::shader::library::ShaderId;
use crate::shader::UniformValue;

fn tex_size(size: (u32, u32)) -> UniformValue {
    UniformValue::Vec2([size.0 as f32, size.1 as f32])
}

/// Rotates pixels inside `radius` around `center`, by `angle` radians at the
/// center and falling off quadratically to zero at the edge.
pub fn swirl(center: [f32; 2], radius: f32, angle: f32, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Swirl,
        smallvec![
            ("radius", UniformValue::Float(radius)),
            ("angle", UniformValue::Float(angle)),
            ("center", UniformValue::Vec2(center)),
            ("texSize", tex_size(size)),
        ],
    );
    plan
}

/// Bulges (positive strength) or pinches (negative) the disc of `radius`.
pub fn bulge_pinch(center: [f32; 2], radius: f32, strength: f32, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::BulgePinch,
        smallvec![
            ("radius", UniformValue::Float(radius)),
            ("strength", UniformValue::Float(clamp(-1.0, strength, 1.0))),
            ("center", UniformValue::Vec2(center)),
            ("texSize", tex_size(size)),
        ],
    );
    plan
}

fn to_f32(point: [f64; 2]) -> [f32; 2] {
    [point[0] as f32, point[1] as f32]
}

/// Maps the image rectangle onto the four corner cursors.
///
/// The uniform takes output pixels back to source pixels, so it is the image's
/// square map composed with the inverse of the cursors' square map. Corner sets
/// with three or more collinear points plan nothing.
pub fn perspective(corners: &Corners, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    let (width, height) = (size.0 as f32, size.1 as f32);
    let image = [[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]];
    let cursors = [
        to_f32(corners.top_left),
        to_f32(corners.top_right),
        to_f32(corners.bottom_right),
        to_f32(corners.bottom_left),
    ];

    let matrix = square_to_quad(image).zip(
        square_to_quad(cursors).and_then(|after| after.inverse()),
    );
    let Some((before, after_inverse)) = matrix else {
        tracing::warn!("skipping perspective with degenerate corners {corners:?}");
        return plan;
    };

    let matrix = before.mul(&after_inverse);
    plan.apply(
        ShaderId::MatrixWarp,
        smallvec![
            ("matrix", UniformValue::Mat3(matrix.to_column_major())),
            ("texSize", tex_size(size)),
        ],
    );
    plan
}
