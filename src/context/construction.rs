use wgpu::{InstanceDescriptor, SurfaceTarget};

use super::*;

const FLOAT_WORKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Picks half-float working textures when requested and the adapter can both
/// render to and filter them.
fn choose_sample_type(adapter: &wgpu::Adapter, options: &ContextOptions) -> SampleType {
    if !options.prefer_float_textures {
        return SampleType::UnsignedByte;
    }
    let features = adapter.get_texture_format_features(FLOAT_WORKING_FORMAT);
    let renderable = features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT);
    let filterable = features
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
    if renderable && filterable {
        SampleType::HalfFloat
    } else {
        SampleType::UnsignedByte
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("chromic_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        })
        .await?;
    Ok((device, queue))
}

impl<'a> RenderContext<'a> {
    /// Creates a context presenting to `window`.
    pub async fn new(
        window: impl Into<SurfaceTarget<'a>>,
        physical_size: (u32, u32),
        options: ContextOptions,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|error| RenderError::Surface(error.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::NoAdapter)?;

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Passes write linear values, so present through a non-sRGB format when one exists.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical_size.0.max(1),
            height: physical_size.1.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_type = choose_sample_type(&adapter, &options);
        Self::build_from_device(
            Some(SurfaceState { surface, config }),
            device,
            queue,
            physical_size,
            sample_type,
        )
    }

    /// Creates a context without a window surface.
    ///
    /// Results are read back with [`Self::pixels`] or [`Self::contents`];
    /// [`Self::present`] fails with [`RenderError::NoSurface`].
    pub async fn new_headless(
        physical_size: (u32, u32),
        options: ContextOptions,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::NoAdapter)?;

        let (device, queue) = request_device(&adapter).await?;
        let sample_type = choose_sample_type(&adapter, &options);

        Self::build_from_device(None, device, queue, physical_size, sample_type)
    }

    /// Like [`Self::new_headless`] but returns `None` when no adapter or device is
    /// available, so tests on machines without a GPU can skip.
    pub async fn try_new_headless(
        physical_size: (u32, u32),
        options: ContextOptions,
    ) -> Option<Self> {
        match Self::new_headless(physical_size, options).await {
            Ok(context) => Some(context),
            Err(error) => {
                tracing::info!("headless context unavailable: {error}");
                None
            }
        }
    }

    fn build_from_device(
        surface: Option<SurfaceState<'a>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        physical_size: (u32, u32),
        sample_type: SampleType,
    ) -> Result<Self, RenderError> {
        tracing::info!(
            "render context {}x{} using {:?} working textures",
            physical_size.0,
            physical_size.1,
            sample_type
        );

        let sampler = create_sampler(&device);
        let mut arena = TextureArena::default();
        let spec = TextureSpec {
            width: physical_size.0,
            height: physical_size.1,
            format: PixelFormat::Rgba,
            sample_type,
        };
        let current = arena.insert(Texture::allocate(&device, spec, "current_texture")?);
        let spare = arena.insert(Texture::allocate(&device, spec, "spare_texture")?);

        Ok(Self {
            surface,
            device,
            queue,
            size: physical_size,
            sample_type,
            arena,
            roles: RoleTable::new(current, spare),
            units: HashMap::new(),
            sampler,
            quad: None,
            registry: ShaderRegistry::new(),
            readback_bytes: Vec::new(),
        })
    }

    /// Recreates the current and spare textures at a new size. Their contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        tracing::debug!(
            "resizing render context {}x{} -> {}x{}",
            self.size.0,
            self.size.1,
            width,
            height
        );
        let spec = self.working_spec(width, height);
        let current = self.handle(TextureRole::Current)?;
        let spare = self.handle(TextureRole::Spare)?;
        self.arena
            .replace(current, Texture::allocate(&self.device, spec, "current_texture")?);
        self.arena
            .replace(spare, Texture::allocate(&self.device, spec, "spare_texture")?);
        self.units.clear();
        self.size = (width, height);

        if let Some(state) = self.surface.as_mut() {
            if width > 0 && height > 0 {
                state.config.width = width;
                state.config.height = height;
                state.surface.configure(&self.device, &state.config);
            }
        }
        Ok(())
    }
}
