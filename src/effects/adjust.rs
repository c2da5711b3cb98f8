//! Color adjustments, denoise and unsharp masking.

use smallvec::smallvec;

use super::{blur, EffectPlan, PassStep};
use crate::context::TextureRole;
use crate::math::clamp;
use crate::shader::library::ShaderId;
use crate::shader::UniformValue;

/// Additive brightness and multiplicative contrast, both in `[-1, 1]`.
pub fn brightness_contrast(brightness: f32, contrast: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::BrightnessContrast,
        smallvec![
            ("brightness", UniformValue::Float(clamp(-1.0, brightness, 1.0))),
            ("contrast", UniformValue::Float(clamp(-1.0, contrast, 1.0))),
        ],
    );
    plan
}

/// Hue rotation and saturation, both in `[-1, 1]`.
pub fn hue_saturation(hue: f32, saturation: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::HueSaturation,
        smallvec![
            ("hue", UniformValue::Float(clamp(-1.0, hue, 1.0))),
            ("saturation", UniformValue::Float(clamp(-1.0, saturation, 1.0))),
        ],
    );
    plan
}

pub fn exposure(amount: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Exposure,
        smallvec![("amount", UniformValue::Float(clamp(-1.0, amount, 1.0)))],
    );
    plan
}

/// Saturates muted colors more than saturated ones.
pub fn vibrance(amount: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Vibrance,
        smallvec![("amount", UniformValue::Float(clamp(-1.0, amount, 1.0)))],
    );
    plan
}

pub fn sepia(amount: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Sepia,
        smallvec![("amount", UniformValue::Float(clamp(0.0, amount, 1.0)))],
    );
    plan
}

pub fn vignette(size: f32, amount: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Vignette,
        smallvec![
            ("size", UniformValue::Float(clamp(0.0, size, 1.0))),
            ("amount", UniformValue::Float(clamp(0.0, amount, 1.0))),
        ],
    );
    plan
}

pub fn noise(amount: f32) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.apply(
        ShaderId::Noise,
        smallvec![("amount", UniformValue::Float(clamp(0.0, amount, 1.0)))],
    );
    plan
}

/// Two rounds of a 9×9 similarity-weighted box filter. An exponent of zero is a
/// plain box blur; larger exponents preserve more edges.
pub fn denoise(exponent: f32, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    let tex_size = [size.0 as f32, size.1 as f32];
    for _ in 0..2 {
        plan.apply(
            ShaderId::Denoise,
            smallvec![
                ("exponent", UniformValue::Float(exponent.max(0.0))),
                ("texSize", UniformValue::Vec2(tex_size)),
            ],
        );
    }
    plan
}

/// Scales pixels away from a triangle-blurred copy of the image.
pub fn unsharp_mask(radius: f32, strength: f32, size: (u32, u32)) -> EffectPlan {
    let mut plan = EffectPlan::new();
    plan.push(PassStep::EnsureScratch)
        .push(PassStep::Snapshot {
            from: TextureRole::Current,
            to: TextureRole::Scratch,
        })
        .push(PassStep::BindUnit {
            role: TextureRole::Scratch,
            unit: 1,
        })
        .extend(blur::triangle_blur(radius, size));
    plan.apply(
        ShaderId::UnsharpMask,
        smallvec![("strength", UniformValue::Float(strength))],
    )
    .with_textures(&[("blurredTexture", 0), ("originalTexture", 1)])
    .push(PassStep::UnbindUnit { unit: 1 });
    plan
}
