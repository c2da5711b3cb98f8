use smallvec::SmallVec;

use crate::context::TextureRole;
use crate::shader::library::ShaderId;
use crate::shader::Uniforms;

/// Texture slot → unit overrides for one pass.
pub type TextureBindings = SmallVec<[(&'static str, u32); 2]>;

/// One step of an effect's pass plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PassStep {
    /// Render `input` through `shader` into the spare texture, then exchange spare with `output`.
    Apply {
        shader: ShaderId,
        uniforms: Uniforms,
        textures: TextureBindings,
        input: TextureRole,
        output: TextureRole,
    },
    /// Allocate the scratch texture or conform it to the current texture's spec.
    EnsureScratch,
    /// Copy `from` into `to` with the pass-through program.
    Snapshot { from: TextureRole, to: TextureRole },
    BindUnit { role: TextureRole, unit: u32 },
    UnbindUnit { unit: u32 },
}

/// The ordered steps an effect compiles to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectPlan {
    steps: Vec<PassStep>,
}

impl EffectPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single pass from current to current.
    pub fn apply(&mut self, shader: ShaderId, uniforms: Uniforms) -> &mut Self {
        self.apply_between(shader, uniforms, TextureRole::Current, TextureRole::Current)
    }

    pub fn apply_between(
        &mut self,
        shader: ShaderId,
        uniforms: Uniforms,
        input: TextureRole,
        output: TextureRole,
    ) -> &mut Self {
        self.steps.push(PassStep::Apply {
            shader,
            uniforms,
            textures: TextureBindings::new(),
            input,
            output,
        });
        self
    }

    /// Overrides texture slots of the most recently added pass.
    pub fn with_textures(&mut self, bindings: &[(&'static str, u32)]) -> &mut Self {
        if let Some(PassStep::Apply { textures, .. }) = self.steps.last_mut() {
            textures.extend_from_slice(bindings);
        }
        self
    }

    pub fn push(&mut self, step: PassStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn extend(&mut self, other: EffectPlan) -> &mut Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn steps(&self) -> &[PassStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps that render, pass applications and snapshots.
    pub fn pass_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, PassStep::Apply { .. } | PassStep::Snapshot { .. }))
            .count()
    }

    /// Shaders of the `Apply` steps in order.
    pub fn shaders(&self) -> Vec<ShaderId> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PassStep::Apply { shader, .. } => Some(*shader),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::shader::UniformValue;

    #[test]
    fn texture_overrides_attach_to_the_last_pass() {
        let mut plan = EffectPlan::new();
        plan.apply(ShaderId::Sepia, smallvec![("amount", UniformValue::Float(1.0))])
            .apply(ShaderId::UnsharpMask, smallvec![])
            .with_textures(&[("originalTexture", 1)]);

        match &plan.steps()[0] {
            PassStep::Apply { textures, .. } => assert!(textures.is_empty()),
            step => panic!("unexpected step {step:?}"),
        }
        match &plan.steps()[1] {
            PassStep::Apply { textures, .. } => {
                assert_eq!(textures.as_slice(), &[("originalTexture", 1)])
            }
            step => panic!("unexpected step {step:?}"),
        }
    }

    #[test]
    fn pass_count_ignores_binding_steps() {
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
            .apply(ShaderId::TriangleBlur, smallvec![("delta", UniformValue::Vec2([0.1, 0.0]))])
            .push(PassStep::UnbindUnit { unit: 1 });
        assert_eq!(plan.pass_count(), 2);
        assert_eq!(plan.shaders(), vec![ShaderId::TriangleBlur]);
    }
}
