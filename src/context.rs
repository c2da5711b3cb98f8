//! The ping-pong render context.
//!
//! Textures live in an arena and are addressed through a role table
//! (current, spare, scratch). A pass samples its input through the texture
//! unit table, renders into the spare texture and then exchanges the spare's
//! handle with its output role, so no pass ever reads the texture it writes.

use ahash::{HashMap, HashMapExt};

use crate::error::RenderError;
use crate::shader::library::ShaderRegistry;
use crate::shader::QuadBuffers;
use crate::texture::{PixelFormat, SampleType, Texture, TextureSpec};

mod construction;
mod passes;
mod readback;

/// Construction-time configuration of a [`RenderContext`].
#[derive(Debug, Clone, Copy)]
pub struct ContextOptions {
    pub power_preference: wgpu::PowerPreference,
    /// Use half-float working textures when the adapter can render to and filter them.
    pub prefer_float_textures: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_float_textures: true,
        }
    }
}

impl ContextOptions {
    pub fn with_power_preference(mut self, power_preference: wgpu::PowerPreference) -> Self {
        self.power_preference = power_preference;
        self
    }

    pub fn with_float_textures(mut self, prefer_float_textures: bool) -> Self {
        self.prefer_float_textures = prefer_float_textures;
        self
    }
}

/// Named slots of the role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Holds the image as processed so far.
    Current,
    /// Receives the output of the pass in flight.
    Spare,
    /// Auxiliary storage for multi-pass effects.
    Scratch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TextureHandle(usize);

#[derive(Default)]
pub(crate) struct TextureArena {
    textures: Vec<Texture>,
}

impl TextureArena {
    pub(crate) fn insert(&mut self, texture: Texture) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle(self.textures.len() - 1)
    }

    pub(crate) fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0)
    }

    pub(crate) fn get_mut(&mut self, handle: TextureHandle) -> Option<&mut Texture> {
        self.textures.get_mut(handle.0)
    }

    pub(crate) fn replace(&mut self, handle: TextureHandle, texture: Texture) {
        if let Some(slot) = self.textures.get_mut(handle.0) {
            *slot = texture;
        }
    }
}

/// Role → arena handle assignments. Exchanging roles swaps handles only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoleTable {
    current: TextureHandle,
    spare: TextureHandle,
    scratch: Option<TextureHandle>,
}

impl RoleTable {
    pub(crate) fn new(current: TextureHandle, spare: TextureHandle) -> Self {
        Self {
            current,
            spare,
            scratch: None,
        }
    }

    pub(crate) fn get(&self, role: TextureRole) -> Option<TextureHandle> {
        match role {
            TextureRole::Current => Some(self.current),
            TextureRole::Spare => Some(self.spare),
            TextureRole::Scratch => self.scratch,
        }
    }

    pub(crate) fn assign(&mut self, role: TextureRole, handle: TextureHandle) {
        match role {
            TextureRole::Current => self.current = handle,
            TextureRole::Spare => self.spare = handle,
            TextureRole::Scratch => self.scratch = Some(handle),
        }
    }

    /// Swaps the handles of two roles. Returns `false` when either role is unassigned.
    pub(crate) fn exchange(&mut self, a: TextureRole, b: TextureRole) -> bool {
        let (Some(first), Some(second)) = (self.get(a), self.get(b)) else {
            return false;
        };
        self.assign(a, second);
        self.assign(b, first);
        true
    }
}

struct SurfaceState<'a> {
    surface: wgpu::Surface<'a>,
    config: wgpu::SurfaceConfiguration,
}

/// Owns the GPU device, the texture arena and every compiled program.
pub struct RenderContext<'a> {
    surface: Option<SurfaceState<'a>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: (u32, u32),
    sample_type: SampleType,
    arena: TextureArena,
    roles: RoleTable,
    units: HashMap<u32, TextureHandle>,
    sampler: wgpu::Sampler,
    quad: Option<QuadBuffers>,
    registry: ShaderRegistry,
    readback_bytes: Vec<u8>,
}

impl<'a> RenderContext<'a> {
    /// Width and height of the working textures.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn is_headless(&self) -> bool {
        self.surface.is_none()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Number of programs compiled so far.
    pub fn compiled_programs(&self) -> usize {
        self.registry.len()
    }

    /// The texture currently assigned to `role`, if any.
    pub fn texture(&self, role: TextureRole) -> Option<&Texture> {
        self.roles
            .get(role)
            .and_then(|handle| self.arena.get(handle))
    }

    /// Uploads `image` into a standalone RGBA8 texture owned by the caller.
    pub fn create_texture_from_image(
        &self,
        image: &image::RgbaImage,
    ) -> Result<Texture, RenderError> {
        Texture::from_image(&self.device, &self.queue, image)
    }

    fn working_spec(&self, width: u32, height: u32) -> TextureSpec {
        TextureSpec {
            width,
            height,
            format: PixelFormat::Rgba,
            sample_type: self.sample_type,
        }
    }

    fn handle(&self, role: TextureRole) -> Result<TextureHandle, RenderError> {
        self.roles
            .get(role)
            .ok_or(RenderError::UnassignedRole(role))
    }

    fn texture_for(&self, handle: TextureHandle) -> Result<&Texture, RenderError> {
        self.arena
            .get(handle)
            .ok_or_else(|| RenderError::IncompleteFramebuffer(format!("stale handle {handle:?}")))
    }
}

fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("pass_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
