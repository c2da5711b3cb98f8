use smallvec::SmallVec;

use super::*;
use crate::effects::{EffectPlan, PassStep};
use crate::shader::library::ShaderId;
use crate::shader::UniformValue;
use crate::texture::render_to_view;

/// Where a pass writes.
#[derive(Clone, Copy)]
pub(super) enum PassTarget<'t> {
    Arena(TextureHandle),
    Detached(&'t Texture),
}

impl<'a> RenderContext<'a> {
    /// Renders one full-screen pass into `target`. Texture slots sample the unit
    /// table, except unit 0 which samples `external_input` when one is given.
    pub(super) fn render_into(
        &mut self,
        shader: ShaderId,
        uniforms: &[(&str, UniformValue)],
        textures: &[(&str, u32)],
        external_input: Option<&Texture>,
        target: PassTarget<'_>,
    ) -> Result<(), RenderError> {
        let (target_handle, target_texture) = match target {
            PassTarget::Arena(handle) => {
                let texture = self.arena.get(handle).ok_or_else(|| {
                    RenderError::IncompleteFramebuffer(format!("stale handle {handle:?}"))
                })?;
                (Some(handle), texture)
            }
            PassTarget::Detached(texture) => (None, texture),
        };
        let format = target_texture.spec().wgpu_format()?;

        let device = &self.device;
        let queue = &self.queue;
        let quad = self.quad.get_or_insert_with(|| QuadBuffers::new(device));
        let program = self.registry.get_or_compile(device, shader, format)?;
        program.set_uniforms(uniforms)?;
        program.bind_textures(textures);

        let mut views: SmallVec<[&wgpu::TextureView; 2]> = SmallVec::new();
        for unit in program.texture_units() {
            if let (0, Some(input)) = (unit, external_input) {
                views.push(input.view());
                continue;
            }
            let handle = *self
                .units
                .get(&unit)
                .ok_or(RenderError::UnboundTextureUnit(unit))?;
            if Some(handle) == target_handle {
                return Err(RenderError::IncompleteFramebuffer(format!(
                    "{} samples its own render target through unit {unit}",
                    program.label()
                )));
            }
            let texture = self
                .arena
                .get(handle)
                .ok_or(RenderError::UnboundTextureUnit(unit))?;
            views.push(texture.view());
        }

        let bind_group = program.create_textures_bind_group(device, &self.sampler, &views);
        let viewport = (target_texture.width(), target_texture.height());
        let program = &*program;
        tracing::debug!(
            "pass {} into {}x{} {:?}",
            program.label(),
            viewport.0,
            viewport.1,
            format
        );
        target_texture.render_to(device, queue, program.label(), |pass| {
            program.draw_rect(pass, queue, quad, &bind_group, None, viewport)
        })
    }

    /// Runs `shader` from current to current.
    pub fn apply(
        &mut self,
        shader: ShaderId,
        uniforms: &[(&str, UniformValue)],
    ) -> Result<(), RenderError> {
        self.apply_between(
            shader,
            uniforms,
            &[],
            TextureRole::Current,
            TextureRole::Current,
        )
    }

    /// Renders `input` through `shader` into the spare texture, then exchanges
    /// spare with `output`.
    pub fn apply_between(
        &mut self,
        shader: ShaderId,
        uniforms: &[(&str, UniformValue)],
        textures: &[(&str, u32)],
        input: TextureRole,
        output: TextureRole,
    ) -> Result<(), RenderError> {
        let current_spec = self.texture_for(self.handle(TextureRole::Current)?)?.spec();
        let spare = self.handle(TextureRole::Spare)?;
        let input = self.handle(input)?;
        if let Some(texture) = self.arena.get_mut(spare) {
            texture.ensure_format(&self.device, &current_spec)?;
        }

        self.units.insert(0, input);
        self.render_into(shader, uniforms, textures, None, PassTarget::Arena(spare))?;

        if !self.roles.exchange(TextureRole::Spare, output) {
            return Err(RenderError::UnassignedRole(output));
        }
        Ok(())
    }

    /// Allocates the scratch texture on first use and keeps it matching the current texture.
    pub fn ensure_scratch(&mut self) -> Result<(), RenderError> {
        let spec = self.texture_for(self.handle(TextureRole::Current)?)?.spec();
        match self.roles.get(TextureRole::Scratch) {
            Some(handle) => {
                if let Some(texture) = self.arena.get_mut(handle) {
                    texture.ensure_format(&self.device, &spec)?;
                }
            }
            None => {
                let texture = Texture::allocate(&self.device, spec, "scratch_texture")?;
                let handle = self.arena.insert(texture);
                self.roles.assign(TextureRole::Scratch, handle);
            }
        }
        Ok(())
    }

    /// Copies `from` into `to` without touching the role table.
    pub fn snapshot(&mut self, from: TextureRole, to: TextureRole) -> Result<(), RenderError> {
        let source = self.handle(from)?;
        let destination = self.handle(to)?;
        let spec = self.texture_for(source)?.spec();
        if let Some(texture) = self.arena.get_mut(destination) {
            texture.ensure_format(&self.device, &spec)?;
        }
        self.units.insert(0, source);
        self.render_into(
            ShaderId::Passthrough,
            &[],
            &[],
            None,
            PassTarget::Arena(destination),
        )
    }

    /// Makes the texture behind `role` sampleable at `unit`.
    pub fn bind_unit(&mut self, role: TextureRole, unit: u32) -> Result<(), RenderError> {
        let handle = self.handle(role)?;
        self.units.insert(unit, handle);
        Ok(())
    }

    pub fn unbind_unit(&mut self, unit: u32) {
        self.units.remove(&unit);
    }

    /// Copies `source` into the current texture, resizing the context first when
    /// the sizes differ.
    pub fn draw(&mut self, source: &Texture) -> Result<(), RenderError> {
        if (source.width(), source.height()) != self.size {
            self.resize(source.width(), source.height())?;
        }
        let current = self.handle(TextureRole::Current)?;
        self.render_into(
            ShaderId::Passthrough,
            &[],
            &[],
            Some(source),
            PassTarget::Arena(current),
        )
    }

    /// Runs every step of `plan` in order.
    pub fn execute(&mut self, plan: &EffectPlan) -> Result<(), RenderError> {
        for step in plan.steps() {
            match step {
                PassStep::Apply {
                    shader,
                    uniforms,
                    textures,
                    input,
                    output,
                } => self.apply_between(*shader, uniforms, textures, *input, *output)?,
                PassStep::EnsureScratch => self.ensure_scratch()?,
                PassStep::Snapshot { from, to } => self.snapshot(*from, *to)?,
                PassStep::BindUnit { role, unit } => self.bind_unit(*role, *unit)?,
                PassStep::UnbindUnit { unit } => self.unbind_unit(*unit),
            }
        }
        Ok(())
    }

    /// Draws the current texture to the window surface.
    pub fn present(&mut self) -> Result<(), RenderError> {
        let current = self.handle(TextureRole::Current)?;
        let Some(state) = self.surface.as_ref() else {
            return Err(RenderError::NoSurface);
        };

        let frame = state
            .surface
            .get_current_texture()
            .map_err(|error| RenderError::Surface(error.to_string()))?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let size = (state.config.width, state.config.height);

        let device = &self.device;
        let queue = &self.queue;
        let quad = self.quad.get_or_insert_with(|| QuadBuffers::new(device));
        let program = self
            .registry
            .get_or_compile(device, ShaderId::Passthrough, state.config.format)?;
        let source = self
            .arena
            .get(current)
            .ok_or(RenderError::UnassignedRole(TextureRole::Current))?;
        let bind_group = program.create_textures_bind_group(device, &self.sampler, &[source.view()]);
        let program = &*program;

        render_to_view(device, queue, &view, size, "present", |pass| {
            program.draw_rect(pass, queue, quad, &bind_group, None, size)
        });
        frame.present();
        Ok(())
    }
}
