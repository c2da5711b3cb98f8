/// Failures raised by the GPU side: context construction, shader programs,
/// render targets and pass configuration.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter is available")]
    NoAdapter,
    #[error("failed to open a GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("the render context has no presentation surface")]
    NoSurface,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("compile error in {label}: {diagnostics}")]
    ShaderCompilation { label: String, diagnostics: String },
    #[error("link error in {label}: {diagnostics}")]
    ShaderLink { label: String, diagnostics: String },
    #[error("incomplete framebuffer: {0}")]
    IncompleteFramebuffer(String),
    #[error("unsupported texture format {0}")]
    UnsupportedFormat(String),
    #[error("don't know how to load uniform \"{name}\" of length {len}")]
    UnsupportedUniformArity { name: String, len: usize },
    #[error("attempted to set uniform \"{name}\" to invalid value: {reason}")]
    InvalidUniform { name: String, reason: String },
    #[error("invalid texture data: {0}")]
    InvalidTextureData(String),
    #[error("no texture is assigned to the {0:?} role")]
    UnassignedRole(crate::context::TextureRole),
    #[error("texture unit {0} has no texture bound")]
    UnboundTextureUnit(u32),
    #[error("read-back failed: {0}")]
    Readback(String),
}
