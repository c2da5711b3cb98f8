//! Effect library: maps a modifier to the passes that render it.
//!
//! Planning is pure. [`plan_for`] turns an element and the frame size into an
//! [`EffectPlan`]; [`apply_modifier`] and [`apply_stack`] run those plans on a
//! [`RenderContext`].

use crate::catalog::EffectKind;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::modifier::{Config, ConfigValue, Corners, ModifierElement, ModifierStack};
use crate::texture::Texture;

pub mod adjust;
pub mod blur;
mod plan;
pub mod warp;

pub use plan::{EffectPlan, PassStep, TextureBindings};

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("unknown effect \"{0}\"")]
    UnknownEffect(String),
    #[error("invalid config for {effect}: \"{key}\" {reason}")]
    InvalidConfig {
        effect: &'static str,
        key: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Typed access to an element's config.
struct ConfigReader<'c> {
    effect: &'static str,
    config: &'c Config,
}

impl<'c> ConfigReader<'c> {
    fn value(&self, key: &'static str) -> Result<&'c ConfigValue, EffectError> {
        self.config.get(key).ok_or(EffectError::InvalidConfig {
            effect: self.effect,
            key,
            reason: "is missing",
        })
    }

    fn scalar(&self, key: &'static str) -> Result<f32, EffectError> {
        match self.value(key)? {
            ConfigValue::Scalar(value) => Ok(*value as f32),
            _ => Err(self.mistyped(key, "must be a number")),
        }
    }

    fn pair(&self, key: &'static str) -> Result<[f32; 2], EffectError> {
        match self.value(key)? {
            ConfigValue::Pair([x, y]) => Ok([*x as f32, *y as f32]),
            _ => Err(self.mistyped(key, "must be a number pair")),
        }
    }

    fn corners(&self, key: &'static str) -> Result<Corners, EffectError> {
        match self.value(key)? {
            ConfigValue::Corners(corners) => Ok(*corners),
            _ => Err(self.mistyped(key, "must be a corner set")),
        }
    }

    fn mistyped(&self, key: &'static str, reason: &'static str) -> EffectError {
        EffectError::InvalidConfig {
            effect: self.effect,
            key,
            reason,
        }
    }
}

/// Builds the pass plan for `kind` with `config` over a frame of `size` pixels.
pub fn plan_for_kind(
    kind: EffectKind,
    config: &Config,
    size: (u32, u32),
) -> Result<EffectPlan, EffectError> {
    let read = ConfigReader {
        effect: kind.display_name(),
        config,
    };
    let plan = match kind {
        EffectKind::HueSaturation => {
            adjust::hue_saturation(read.scalar("hue")?, read.scalar("saturation")?)
        }
        EffectKind::BrightnessContrast => {
            adjust::brightness_contrast(read.scalar("brightness")?, read.scalar("contrast")?)
        }
        EffectKind::Vibrance => adjust::vibrance(read.scalar("amount")?),
        EffectKind::Exposure => adjust::exposure(read.scalar("amount")?),
        EffectKind::Denoise => adjust::denoise(read.scalar("exponent")?, size),
        EffectKind::Sharpness => {
            adjust::unsharp_mask(read.scalar("radius")?, read.scalar("strength")?, size)
        }
        EffectKind::Noise => adjust::noise(read.scalar("amount")?),
        EffectKind::Sepia => adjust::sepia(read.scalar("amount")?),
        EffectKind::Vignette => adjust::vignette(read.scalar("size")?, read.scalar("amount")?),
        EffectKind::TriangleBlur => blur::triangle_blur(read.scalar("radius")?, size),
        EffectKind::ZoomBlur => {
            blur::zoom_blur(read.pair("cursorAt")?, read.scalar("strength")?, size)
        }
        EffectKind::TiltShiftBlur => blur::tilt_shift(
            read.pair("cursorAt")?,
            read.scalar("angle")?,
            read.scalar("blurRadius")?,
            read.scalar("gradientRadius")?,
            size,
        ),
        EffectKind::LensBlur => blur::lens_blur(
            read.scalar("radius")?,
            read.scalar("brightness")?,
            read.scalar("angle")?,
            size,
        ),
        EffectKind::Swirl => warp::swirl(
            read.pair("cursorAt")?,
            read.scalar("radius")?,
            read.scalar("angle")?,
            size,
        ),
        EffectKind::BulgePinch => warp::bulge_pinch(
            read.pair("cursorAt")?,
            read.scalar("radius")?,
            read.scalar("strength")?,
            size,
        ),
        EffectKind::Perspective => warp::perspective(&read.corners("cursorsAt")?, size),
    };
    Ok(plan)
}

/// Builds the pass plan for one stack element.
pub fn plan_for(element: &ModifierElement, size: (u32, u32)) -> Result<EffectPlan, EffectError> {
    let kind = element
        .kind()
        .ok_or_else(|| EffectError::UnknownEffect(element.name.clone()))?;
    plan_for_kind(kind, &element.config, size)
}

/// Renders one element on top of the context's current texture.
pub fn apply_modifier(
    context: &mut RenderContext<'_>,
    element: &ModifierElement,
) -> Result<(), EffectError> {
    let plan = plan_for(element, context.size())?;
    tracing::debug!(
        "applying {} ({}) in {} passes",
        element.name,
        element.id,
        plan.pass_count()
    );
    context.execute(&plan)?;
    Ok(())
}

/// Renders every element of `stack` in order on top of the current texture.
pub fn apply_stack(
    context: &mut RenderContext<'_>,
    stack: &ModifierStack,
) -> Result<(), EffectError> {
    for element in stack {
        apply_modifier(context, element)?;
    }
    Ok(())
}

/// Draws `source` into the context and renders `stack` over it.
pub fn render_stack(
    context: &mut RenderContext<'_>,
    source: &Texture,
    stack: &ModifierStack,
) -> Result<(), EffectError> {
    context.draw(source)?;
    apply_stack(context, stack)
}
