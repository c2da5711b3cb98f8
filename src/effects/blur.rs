//! Blur effects. Angles are in radians, positions in pixels.

use std::f32::consts::TAU;

use smallvec::smallvec;

use super::{EffectPlan, PassStep};
use crate::context::TextureRole;
use crate::math::clamp;
use crate::shader::library::ShaderId;
use crate::shader::UniformValue;

fn tex_size(size: (u32, u32)) -> UniformValue {
    UniformValue::Vec2([size.0 as f32, size.1 as f32])
}

/// Separable triangle blur: one horizontal and one vertical pass.
pub fn triangle_blur(radius: f32, size: (u32, u32)) -> EffectPlan {
    let (width, height) = (size.0.max(1) as f32, size.1.max(1) as f32);
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::TriangleBlur,
        smallvec![("delta", UniformValue::Vec2([radius / width, 0.0]))],
    )
    .apply(
        ShaderId::TriangleBlur,
        smallvec![("delta", UniformValue::Vec2([0.0, radius / height]))],
    );
    plan
}

/// Radial blur away from `center`.
pub fn zoom_blur(center: [f32; 2], strength: f32, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::ZoomBlur,
        smallvec![
            ("center", UniformValue::Vec2(center)),
            ("strength", UniformValue::Float(strength)),
            ("texSize", tex_size(size)),
        ],
    );
    plan
}

/// Blurs away from the focus line through `cursor` at `angle`. The radius is
/// zero on the line and reaches `blur_radius` at `gradient_radius` pixels.
pub fn tilt_shift(
    cursor: [f32; 2],
    angle: f32,
    blur_radius: f32,
    gradient_radius: f32,
    size: (u32, u32),
) -> EffectPlan {
    let mut plan = EffectPlan::new();
    if blur_radius <= 0.0 {
        return plan;
    }

    let (dx, dy) = (angle.cos(), angle.sin());
    let start = cursor;
    let end = [cursor[0] + dx, cursor[1] + dy];
    for delta in [[dx, dy], [-dy, dx]] {
        plan.apply(
            ShaderId::TiltShift,
            smallvec![
                ("blurRadius", UniformValue::Float(blur_radius)),
                ("gradientRadius", UniformValue::Float(gradient_radius.max(1e-4))),
                ("start", UniformValue::Vec2(start)),
                ("end", UniformValue::Vec2(end)),
                ("delta", UniformValue::Vec2(delta)),
                ("texSize", tex_size(size)),
            ],
        );
    }
    plan
}

/// Per-pass sample offsets for the three rhombi, 120° apart.
fn lens_directions(radius: f32, angle: f32, size: (u32, u32)) -> [[f32; 2]; 3] {
    let (width, height) = (size.0.max(1) as f32, size.1.max(1) as f32);
    std::array::from_fn(|i| {
        let a = angle + i as f32 * TAU / 3.0;
        [radius * a.sin() / width, radius * a.cos() / height]
    })
}

/// Hexagonal bokeh built from three rhombus blurs. `brightness` in `[-1, 1]`
/// raises highlights before blurring so they bloom.
pub fn lens_blur(radius: f32, brightness: f32, angle: f32, size: (u32, u32)) -> EffectPlan {
    let [dir0, dir1, dir2] = lens_directions(radius, angle, size);
    let power = 10f32.powf(clamp(-1.0, brightness, 1.0));

    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::LensBlurPrePass,
        smallvec![("power", UniformValue::Float(power))],
    )
    .push(PassStep::EnsureScratch)
    .apply_between(
        ShaderId::LensBlur0,
        smallvec![("delta0", UniformValue::Vec2(dir0))],
        TextureRole::Current,
        TextureRole::Scratch,
    )
    .apply_between(
        ShaderId::LensBlur1,
        smallvec![
            ("delta0", UniformValue::Vec2(dir1)),
            ("delta1", UniformValue::Vec2(dir2)),
        ],
        TextureRole::Scratch,
        TextureRole::Scratch,
    )
    .apply(
        ShaderId::LensBlur0,
        smallvec![("delta0", UniformValue::Vec2(dir1))],
    )
    .push(PassStep::BindUnit {
        role: TextureRole::Scratch,
        unit: 1,
    })
    .apply(
        ShaderId::LensBlur2,
        smallvec![
            ("delta0", UniformValue::Vec2(dir2)),
            ("power", UniformValue::Float(1.0 / power)),
        ],
    )
    .with_textures(&[("texture0", 0), ("texture1", 1)])
    .push(PassStep::UnbindUnit { unit: 1 });
    plan
}
