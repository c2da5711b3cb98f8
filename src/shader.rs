//! Shader programs for full-screen quad passes.
//!
//! A program is a WGSL fragment stage linked against the shared quad vertex
//! stage. Uniforms are declared up front as an ordered list of named values;
//! the `Params` struct in WGSL and the byte layout on the CPU are both derived
//! from that list so they cannot drift apart. Textures are declared as named
//! slots, each fed from a texture unit of the render context.

use futures::executor::block_on;
use smallvec::SmallVec;
use wgpu::util::DeviceExt;

use crate::error::RenderError;

pub mod library;

/// Vertex stage shared by every program.
///
/// Quad `y = 0` is mapped to the top of the target so passes preserve row
/// order in texture space; `tex_coord` is forwarded untouched.
pub(crate) const QUAD_VERTEX_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
};

@vertex
fn vs_main(@location(0) vertex: vec2<f32>, @location(1) tex_coord: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.tex_coord = tex_coord;
    out.position = vec4<f32>(vertex.x * 2.0 - 1.0, 1.0 - vertex.y * 2.0, 0.0, 1.0);
    return out;
}
"#;

/// Hash-based jitter used by the blur passes to hide their fixed tap count.
const RANDOM_WGSL: &str = r#"
fn random(frag_coord: vec3<f32>, scale: vec3<f32>, seed: f32) -> f32 {
    return fract(sin(dot(frag_coord + seed, scale)) * 43758.5453 + seed);
}
"#;

/// The shape of a declared uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformKind {
    fn wgsl_type(self) -> &'static str {
        match self {
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat3 => "mat3x3<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }

    fn align(self) -> usize {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat3 | UniformKind::Mat4 => 16,
        }
    }

    fn size(self) -> usize {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }
}

/// A uniform value. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

impl UniformValue {
    /// Picks the value shape from the slice length: 1-4 are float vectors,
    /// 9 and 16 are 3×3 and 4×4 matrices.
    pub fn from_slice(name: &str, values: &[f32]) -> Result<Self, RenderError> {
        let value = match values.len() {
            1 => UniformValue::Float(values[0]),
            2 => UniformValue::Vec2([values[0], values[1]]),
            3 => UniformValue::Vec3([values[0], values[1], values[2]]),
            4 => UniformValue::Vec4([values[0], values[1], values[2], values[3]]),
            9 => {
                let mut matrix = [0.0; 9];
                matrix.copy_from_slice(values);
                UniformValue::Mat3(matrix)
            }
            16 => {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(values);
                UniformValue::Mat4(matrix)
            }
            len => {
                return Err(RenderError::UnsupportedUniformArity {
                    name: name.to_string(),
                    len,
                })
            }
        };
        Ok(value)
    }

    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn write_into(&self, out: &mut [u8]) {
        match self {
            UniformValue::Float(value) => out[..4].copy_from_slice(bytemuck::bytes_of(value)),
            UniformValue::Vec2(value) => out[..8].copy_from_slice(bytemuck::cast_slice(value)),
            UniformValue::Vec3(value) => out[..12].copy_from_slice(bytemuck::cast_slice(value)),
            UniformValue::Vec4(value) => out[..16].copy_from_slice(bytemuck::cast_slice(value)),
            UniformValue::Mat3(value) => {
                // each column occupies a 16-byte slot
                for (column, chunk) in value.chunks(3).enumerate() {
                    let offset = column * 16;
                    out[offset..offset + 12].copy_from_slice(bytemuck::cast_slice(chunk));
                }
            }
            UniformValue::Mat4(value) => out[..64].copy_from_slice(bytemuck::cast_slice(value)),
        }
    }
}

impl TryFrom<&[f32]> for UniformValue {
    type Error = RenderError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        UniformValue::from_slice("<anonymous>", values)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

/// Named uniform assignments for one pass.
pub type Uniforms = SmallVec<[(&'static str, UniformValue); 8]>;

#[derive(Debug, Clone)]
struct UniformEntry {
    name: &'static str,
    kind: UniformKind,
    offset: usize,
}

/// Byte layout of a program's `Params` uniform block.
#[derive(Debug, Clone)]
pub struct UniformLayout {
    entries: Vec<UniformEntry>,
    size: usize,
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

impl UniformLayout {
    pub fn new(declarations: &[(&'static str, UniformKind)]) -> Self {
        let mut entries = Vec::with_capacity(declarations.len());
        let mut cursor = 0;
        for &(name, kind) in declarations {
            let offset = round_up(cursor, kind.align());
            entries.push(UniformEntry { name, kind, offset });
            cursor = offset + kind.size();
        }
        Self {
            entries,
            size: round_up(cursor, 16),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.offset)
    }

    fn wgsl_block(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut block = String::from("struct Params {\n");
        for entry in &self.entries {
            block.push_str(&format!("    {}: {},\n", entry.name, entry.kind.wgsl_type()));
        }
        block.push_str("};\n@group(1) @binding(0) var<uniform> params: Params;\n");
        block
    }

    /// Writes `values` into `staged`. Names the layout does not declare are
    /// skipped, like uniforms a GL program optimized away.
    fn stage(&self, staged: &mut [u8], values: &[(&str, UniformValue)]) -> Result<(), RenderError> {
        for (name, value) in values {
            let Some(entry) = self.entries.iter().find(|entry| entry.name == *name) else {
                continue;
            };
            if entry.kind != value.kind() {
                return Err(RenderError::InvalidUniform {
                    name: name.to_string(),
                    reason: format!("expected {:?}, got {:?}", entry.kind, value.kind()),
                });
            }
            value.write_into(&mut staged[entry.offset..entry.offset + entry.kind.size()]);
        }
        Ok(())
    }
}

/// Static description of a program: fragment stage, uniforms and texture slots.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource {
    pub label: &'static str,
    /// WGSL defining `@fragment fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32>`.
    pub fragment: &'static str,
    pub uniforms: &'static [(&'static str, UniformKind)],
    /// Texture slot names with the unit each one samples by default.
    pub textures: &'static [(&'static str, u32)],
}

impl ProgramSource {
    fn assemble(&self, vertex_source: &str, layout: &UniformLayout) -> String {
        let mut wgsl = String::from(vertex_source);
        wgsl.push_str("\n@group(0) @binding(0) var input_sampler: sampler;\n");
        for (slot, (name, _)) in self.textures.iter().enumerate() {
            wgsl.push_str(&format!(
                "@group(0) @binding({}) var {name}: texture_2d<f32>;\n",
                slot + 1
            ));
        }
        wgsl.push_str(&layout.wgsl_block());
        wgsl.push_str(RANDOM_WGSL);
        wgsl.push_str(self.fragment);
        wgsl
    }
}

/// Normalized sub-rectangle of the viewport, in target pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl QuadRect {
    fn normalized(rect: Option<QuadRect>, viewport: (u32, u32)) -> [f32; 4] {
        match rect {
            None => [0.0, 0.0, 1.0, 1.0],
            Some(rect) => {
                let (width, height) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
                [
                    rect.left / width,
                    rect.top / height,
                    rect.right / width,
                    rect.bottom / height,
                ]
            }
        }
    }
}

/// Unit-quad vertex and texture-coordinate buffers shared by all programs of a context.
pub(crate) struct QuadBuffers {
    vertices: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
}

const QUAD_TEX_COORDS: [f32; 8] = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];

impl QuadBuffers {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertex_buffer"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let tex_coords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_tex_coord_buffer"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertices,
            tex_coords,
        }
    }

    /// Uploads the corner positions for the next draw. Only one draw may be
    /// recorded per submission since the write lands before the whole submission.
    fn write_rect(&self, queue: &wgpu::Queue, rect: [f32; 4]) {
        let [left, top, right, bottom] = rect;
        let corners = [left, top, left, bottom, right, top, right, bottom];
        queue.write_buffer(&self.vertices, 0, bytemuck::cast_slice(&corners));
    }
}

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x2,
    offset: 0,
    shader_location: 0,
}];

const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x2,
    offset: 0,
    shader_location: 1,
}];

struct ParamsBinding {
    layout: UniformLayout,
    staged: Vec<u8>,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A linked program targeting one texture format.
pub struct ShaderProgram {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    textures_bind_group_layout: wgpu::BindGroupLayout,
    texture_slots: Vec<(&'static str, u32)>,
    params: Option<ParamsBinding>,
}

fn compile_error_text(info: &wgpu::CompilationInfo, fallback: &wgpu::Error) -> String {
    let messages: Vec<String> = info
        .messages
        .iter()
        .filter(|message| matches!(message.message_type, wgpu::CompilationMessageType::Error))
        .map(|message| match message.location {
            Some(location) => format!(
                "{}:{}: {}",
                location.line_number, location.line_position, message.message
            ),
            None => message.message.clone(),
        })
        .collect();
    if messages.is_empty() {
        fallback.to_string()
    } else {
        messages.join("\n")
    }
}

impl ShaderProgram {
    /// Compiles `source` against `vertex_source` (the shared quad stage when `None`)
    /// and links a pipeline rendering into `target_format`.
    pub fn compile_and_link(
        device: &wgpu::Device,
        source: &ProgramSource,
        vertex_source: Option<&str>,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let layout = UniformLayout::new(source.uniforms);
        let wgsl = source.assemble(vertex_source.unwrap_or(QUAD_VERTEX_WGSL), &layout);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });
        let compilation_info = block_on(module.get_compilation_info());
        if let Some(error) = block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilation {
                label: source.label.to_string(),
                diagnostics: compile_error_text(&compilation_info, &error),
            });
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let textures_bind_group_layout = create_textures_bind_group_layout(device, source);
        let params_bind_group_layout =
            (!layout.is_empty()).then(|| create_params_bind_group_layout(device));

        let mut bind_group_layouts = vec![&textures_bind_group_layout];
        if let Some(params_layout) = params_bind_group_layout.as_ref() {
            bind_group_layouts.push(params_layout);
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(source.label),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(source.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 8,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &QUAD_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 8,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &TEX_COORD_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                // Passes overwrite their target, no blending.
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let params = params_bind_group_layout.map(|params_layout| {
            let staged = vec![0u8; layout.size()];
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("pass_params_buffer"),
                contents: &staged,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pass_params_bg"),
                layout: &params_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            ParamsBinding {
                layout,
                staged,
                buffer,
                bind_group,
            }
        });

        if let Some(error) = block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderLink {
                label: source.label.to_string(),
                diagnostics: error.to_string(),
            });
        }

        tracing::debug!("linked program {} for {:?}", source.label, target_format);

        Ok(Self {
            label: source.label,
            pipeline,
            textures_bind_group_layout,
            texture_slots: source.textures.to_vec(),
            params,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stages uniform values. They persist until overwritten and are uploaded on draw.
    pub fn set_uniforms(
        &mut self,
        values: &[(&str, UniformValue)],
    ) -> Result<&mut Self, RenderError> {
        if let Some(params) = self.params.as_mut() {
            params.layout.stage(&mut params.staged, values)?;
        }
        Ok(self)
    }

    /// Re-points texture slots at different units. Unknown slot names are ignored.
    pub fn bind_textures(&mut self, mapping: &[(&str, u32)]) -> &mut Self {
        for (name, unit) in mapping {
            if let Some(slot) = self
                .texture_slots
                .iter_mut()
                .find(|(slot_name, _)| slot_name == name)
            {
                slot.1 = *unit;
            }
        }
        self
    }

    /// Texture units sampled by this program, in slot order.
    pub fn texture_units(&self) -> impl Iterator<Item = u32> + '_ {
        self.texture_slots.iter().map(|(_, unit)| *unit)
    }

    /// Builds the group(0) bind group from views given in slot order.
    pub(crate) fn create_textures_bind_group(
        &self,
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        views: &[&wgpu::TextureView],
    ) -> wgpu::BindGroup {
        let mut entries: SmallVec<[wgpu::BindGroupEntry<'_>; 4]> = SmallVec::new();
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        for (slot, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: slot as u32 + 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pass_textures_bg"),
            layout: &self.textures_bind_group_layout,
            entries: &entries,
        })
    }

    /// Uploads staged uniforms and draws two triangles over `rect` (the whole viewport when `None`).
    pub(crate) fn draw_rect(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        queue: &wgpu::Queue,
        quad: &QuadBuffers,
        textures_bind_group: &wgpu::BindGroup,
        rect: Option<QuadRect>,
        viewport: (u32, u32),
    ) {
        quad.write_rect(queue, QuadRect::normalized(rect, viewport));

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, textures_bind_group, &[]);
        if let Some(params) = self.params.as_ref() {
            queue.write_buffer(&params.buffer, 0, &params.staged);
            pass.set_bind_group(1, &params.bind_group, &[]);
        }
        pass.set_vertex_buffer(0, quad.vertices.slice(..));
        pass.set_vertex_buffer(1, quad.tex_coords.slice(..));
        pass.draw(0..4, 0..1);
    }
}

fn create_textures_bind_group_layout(
    device: &wgpu::Device,
    source: &ProgramSource,
) -> wgpu::BindGroupLayout {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }];
    for slot in 0..source.textures.len() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot as u32 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("pass_textures_bgl"),
        entries: &entries,
    })
}

fn create_params_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("pass_params_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
