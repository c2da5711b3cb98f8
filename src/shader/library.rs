//! WGSL sources for every effect pass and the lazily populated program registry.

use ahash::{HashMap, HashMapExt};

use super::{ProgramSource, ShaderProgram, UniformKind};
use crate::error::RenderError;

/// Identifies one distinct pass program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    Passthrough,
    BrightnessContrast,
    HueSaturation,
    Exposure,
    Vibrance,
    Sepia,
    Vignette,
    Noise,
    Denoise,
    TriangleBlur,
    TiltShift,
    ZoomBlur,
    LensBlurPrePass,
    LensBlur0,
    LensBlur1,
    LensBlur2,
    UnsharpMask,
    Swirl,
    BulgePinch,
    MatrixWarp,
}

const SINGLE_INPUT: &[(&str, u32)] = &[("input_texture", 0)];

const PASSTHROUGH_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    return textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
}
"#;

const BRIGHTNESS_CONTRAST_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    var color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    var rgb = color.rgb + vec3<f32>(params.brightness);
    if (params.contrast > 0.0) {
        rgb = (rgb - 0.5) / (1.0 - params.contrast) + 0.5;
    } else {
        rgb = (rgb - 0.5) * (1.0 + params.contrast) + 0.5;
    }
    return vec4<f32>(rgb, color.a);
}
"#;

const HUE_SATURATION_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);

    // rotation about the gray axis
    let angle = params.hue * 3.14159265;
    let s = sin(angle);
    let c = cos(angle);
    let weights = (vec3<f32>(2.0 * c, -sqrt(3.0) * s - c, sqrt(3.0) * s - c) + 1.0) / 3.0;
    var rgb = vec3<f32>(
        dot(color.rgb, weights.xyz),
        dot(color.rgb, weights.zxy),
        dot(color.rgb, weights.yzx),
    );

    let average = (rgb.r + rgb.g + rgb.b) / 3.0;
    if (params.saturation > 0.0) {
        rgb += (average - rgb) * (1.0 - 1.0 / (1.001 - params.saturation));
    } else {
        rgb += (average - rgb) * (-params.saturation);
    }
    return vec4<f32>(rgb, color.a);
}
"#;

const EXPOSURE_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    return vec4<f32>(color.rgb * pow(2.0, params.amount), color.a);
}
"#;

const VIBRANCE_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    let average = (color.r + color.g + color.b) / 3.0;
    let mx = max(color.r, max(color.g, color.b));
    let amt = (mx - average) * (-params.amount * 3.0);
    return vec4<f32>(mix(color.rgb, vec3<f32>(mx), amt), color.a);
}
"#;

const SEPIA_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    let r = color.r;
    let g = color.g;
    let b = color.b;
    let amount = params.amount;
    return vec4<f32>(
        min(1.0, (r * (1.0 - (0.607 * amount))) + (g * (0.769 * amount)) + (b * (0.189 * amount))),
        min(1.0, (r * 0.349 * amount) + (g * (1.0 - (0.314 * amount))) + (b * 0.168 * amount)),
        min(1.0, (r * 0.272 * amount) + (g * 0.534 * amount) + (b * (1.0 - (0.869 * amount)))),
        color.a,
    );
}
"#;

const VIGNETTE_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    let dist = distance(frag.tex_coord, vec2<f32>(0.5, 0.5));
    let falloff = smoothstep(0.8, params.size * 0.799, dist * (params.amount + params.size));
    return vec4<f32>(color.rgb * falloff, color.a);
}
"#;

const NOISE_FRAGMENT: &str = r#"
fn rand(co: vec2<f32>) -> f32 {
    return fract(sin(dot(co, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    let diff = (rand(frag.tex_coord) - 0.5) * params.amount;
    return vec4<f32>(color.rgb + vec3<f32>(diff), color.a);
}
"#;

// 9x9 box filter weighted by color similarity
const DENOISE_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let center = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    var color = vec4<f32>(0.0);
    var total = 0.0;
    for (var x = -4.0; x <= 4.0; x += 1.0) {
        for (var y = -4.0; y <= 4.0; y += 1.0) {
            let tap = textureSampleLevel(
                input_texture,
                input_sampler,
                frag.tex_coord + vec2<f32>(x, y) / params.texSize,
                0.0,
            );
            var weight = 1.0 - abs(dot(tap.rgb - center.rgb, vec3<f32>(0.25)));
            weight = pow(weight, params.exponent);
            color += tap * weight;
            total += weight;
        }
    }
    return color / total;
}
"#;

const TRIANGLE_BLUR_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    var total = 0.0;

    // jitter hides the fixed tap count
    let offset = random(frag.position.xyz, vec3<f32>(12.9898, 78.233, 151.7182), 0.0);

    for (var t = -30.0; t <= 30.0; t += 1.0) {
        let percent = (t + offset - 0.5) / 30.0;
        let weight = 1.0 - abs(percent);
        var tap = textureSampleLevel(
            input_texture,
            input_sampler,
            frag.tex_coord + params.delta * percent,
            0.0,
        );
        tap = vec4<f32>(tap.rgb * tap.a, tap.a);
        color += tap * weight;
        total += weight;
    }

    color = color / total;
    return vec4<f32>(color.rgb / (color.a + 0.00001), color.a);
}
"#;

const TILT_SHIFT_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    var total = 0.0;

    let offset = random(frag.position.xyz, vec3<f32>(12.9898, 78.233, 151.7182), 0.0);

    let normal = normalize(vec2<f32>(params.start.y - params.end.y, params.end.x - params.start.x));
    let radius = smoothstep(
        0.0,
        1.0,
        abs(dot(frag.tex_coord * params.texSize - params.start, normal)) / params.gradientRadius,
    ) * params.blurRadius;
    for (var t = -30.0; t <= 30.0; t += 1.0) {
        let percent = (t + offset - 0.5) / 30.0;
        let weight = 1.0 - abs(percent);
        var tap = textureSampleLevel(
            input_texture,
            input_sampler,
            frag.tex_coord + params.delta / params.texSize * percent * radius,
            0.0,
        );
        tap = vec4<f32>(tap.rgb * tap.a, tap.a);
        color += tap * weight;
        total += weight;
    }

    color = color / total;
    return vec4<f32>(color.rgb / (color.a + 0.00001), color.a);
}
"#;

const ZOOM_BLUR_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(0.0);
    var total = 0.0;
    let to_center = params.center - frag.tex_coord * params.texSize;

    let offset = random(frag.position.xyz, vec3<f32>(12.9898, 78.233, 151.7182), 0.0);

    for (var t = 0.0; t <= 40.0; t += 1.0) {
        let percent = (t + offset) / 40.0;
        let weight = 4.0 * (percent - percent * percent);
        var tap = textureSampleLevel(
            input_texture,
            input_sampler,
            frag.tex_coord + to_center * percent * params.strength / params.texSize,
            0.0,
        );
        tap = vec4<f32>(tap.rgb * tap.a, tap.a);
        color += tap * weight;
        total += weight;
    }

    color = color / total;
    return vec4<f32>(color.rgb / (color.a + 0.00001), color.a);
}
"#;

const LENS_BLUR_PRE_PASS_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(input_texture, input_sampler, frag.tex_coord, 0.0);
    return pow(color, vec4<f32>(params.power));
}
"#;

/// Shared rhombus sampler for the lens blur passes: 31 jittered taps along `delta`.
macro_rules! lens_blur_fragment {
    ($main:literal) => {
        concat!(
            r#"
fn rhombus_tap(frag_coord: vec3<f32>, tex_coord: vec2<f32>, delta: vec2<f32>) -> vec4<f32> {
    let offset = random(frag_coord, vec3<f32>(delta, 151.7182), 0.0);
    var color = vec4<f32>(0.0);
    var total = 0.0;
    for (var t = 0.0; t <= 30.0; t += 1.0) {
        let percent = (t + offset) / 30.0;
        color += textureSampleLevel(texture0, input_sampler, tex_coord + delta * percent, 0.0);
        total += 1.0;
    }
    return color / total;
}
"#,
            $main
        )
    };
}

const LENS_BLUR_0_FRAGMENT: &str = lens_blur_fragment!(
    r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    return rhombus_tap(frag.position.xyz, frag.tex_coord, params.delta0);
}
"#
);

const LENS_BLUR_1_FRAGMENT: &str = lens_blur_fragment!(
    r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    return (rhombus_tap(frag.position.xyz, frag.tex_coord, params.delta0)
        + rhombus_tap(frag.position.xyz, frag.tex_coord, params.delta1)) * 0.5;
}
"#
);

const LENS_BLUR_2_FRAGMENT: &str = lens_blur_fragment!(
    r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let color = (rhombus_tap(frag.position.xyz, frag.tex_coord, params.delta0)
        + 2.0 * textureSampleLevel(texture1, input_sampler, frag.tex_coord, 0.0)) / 3.0;
    return pow(color, vec4<f32>(params.power));
}
"#
);

const UNSHARP_MASK_FRAGMENT: &str = r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    let blurred = textureSampleLevel(blurredTexture, input_sampler, frag.tex_coord, 0.0);
    let original = textureSampleLevel(originalTexture, input_sampler, frag.tex_coord, 0.0);
    return mix(blurred, original, 1.0 + params.strength);
}
"#;

/// Wraps a coordinate warp in pixel space. Samples outside the image fade to transparent.
macro_rules! warp_fragment {
    ($warp:literal) => {
        concat!(
            r#"
@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    var coord = frag.tex_coord * params.texSize;
"#,
            $warp,
            r#"
    var color = textureSampleLevel(input_texture, input_sampler, coord / params.texSize, 0.0);
    let clamped = clamp(coord, vec2<f32>(0.0), params.texSize);
    if (any(coord != clamped)) {
        color.a *= max(0.0, 1.0 - length(coord - clamped));
    }
    return color;
}
"#
        )
    };
}

const SWIRL_FRAGMENT: &str = warp_fragment!(
    r#"
    coord -= params.center;
    let dist = length(coord);
    if (dist < params.radius) {
        let percent = (params.radius - dist) / params.radius;
        let theta = percent * percent * params.angle;
        let s = sin(theta);
        let c = cos(theta);
        coord = vec2<f32>(coord.x * c - coord.y * s, coord.x * s + coord.y * c);
    }
    coord += params.center;
"#
);

const BULGE_PINCH_FRAGMENT: &str = warp_fragment!(
    r#"
    coord -= params.center;
    let dist = length(coord);
    if (dist < params.radius && dist > 0.0) {
        let percent = dist / params.radius;
        if (params.strength > 0.0) {
            coord *= mix(1.0, smoothstep(0.0, params.radius / dist, percent), params.strength * 0.75);
        } else {
            coord *= mix(
                1.0,
                pow(percent, 1.0 + params.strength * 0.75) * params.radius / dist,
                1.0 - percent,
            );
        }
    }
    coord += params.center;
"#
);

const MATRIX_WARP_FRAGMENT: &str = warp_fragment!(
    r#"
    let warped = params.matrix * vec3<f32>(coord, 1.0);
    coord = warped.xy / warped.z;
"#
);

impl ShaderId {
    pub fn source(self) -> ProgramSource {
        use UniformKind::*;

        match self {
            ShaderId::Passthrough => ProgramSource {
                label: "passthrough",
                fragment: PASSTHROUGH_FRAGMENT,
                uniforms: &[],
                textures: SINGLE_INPUT,
            },
            ShaderId::BrightnessContrast => ProgramSource {
                label: "brightness_contrast",
                fragment: BRIGHTNESS_CONTRAST_FRAGMENT,
                uniforms: &[("brightness", Float), ("contrast", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::HueSaturation => ProgramSource {
                label: "hue_saturation",
                fragment: HUE_SATURATION_FRAGMENT,
                uniforms: &[("hue", Float), ("saturation", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Exposure => ProgramSource {
                label: "exposure",
                fragment: EXPOSURE_FRAGMENT,
                uniforms: &[("amount", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Vibrance => ProgramSource {
                label: "vibrance",
                fragment: VIBRANCE_FRAGMENT,
                uniforms: &[("amount", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Sepia => ProgramSource {
                label: "sepia",
                fragment: SEPIA_FRAGMENT,
                uniforms: &[("amount", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Vignette => ProgramSource {
                label: "vignette",
                fragment: VIGNETTE_FRAGMENT,
                uniforms: &[("size", Float), ("amount", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Noise => ProgramSource {
                label: "noise",
                fragment: NOISE_FRAGMENT,
                uniforms: &[("amount", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::Denoise => ProgramSource {
                label: "denoise",
                fragment: DENOISE_FRAGMENT,
                uniforms: &[("exponent", Float), ("texSize", Vec2)],
                textures: SINGLE_INPUT,
            },
            ShaderId::TriangleBlur => ProgramSource {
                label: "triangle_blur",
                fragment: TRIANGLE_BLUR_FRAGMENT,
                uniforms: &[("delta", Vec2)],
                textures: SINGLE_INPUT,
            },
            ShaderId::TiltShift => ProgramSource {
                label: "tilt_shift",
                fragment: TILT_SHIFT_FRAGMENT,
                uniforms: &[
                    ("blurRadius", Float),
                    ("gradientRadius", Float),
                    ("start", Vec2),
                    ("end", Vec2),
                    ("delta", Vec2),
                    ("texSize", Vec2),
                ],
                textures: SINGLE_INPUT,
            },
            ShaderId::ZoomBlur => ProgramSource {
                label: "zoom_blur",
                fragment: ZOOM_BLUR_FRAGMENT,
                uniforms: &[("center", Vec2), ("strength", Float), ("texSize", Vec2)],
                textures: SINGLE_INPUT,
            },
            ShaderId::LensBlurPrePass => ProgramSource {
                label: "lens_blur_pre_pass",
                fragment: LENS_BLUR_PRE_PASS_FRAGMENT,
                uniforms: &[("power", Float)],
                textures: SINGLE_INPUT,
            },
            ShaderId::LensBlur0 => ProgramSource {
                label: "lens_blur_0",
                fragment: LENS_BLUR_0_FRAGMENT,
                uniforms: &[("delta0", Vec2)],
                textures: &[("texture0", 0)],
            },
            ShaderId::LensBlur1 => ProgramSource {
                label: "lens_blur_1",
                fragment: LENS_BLUR_1_FRAGMENT,
                uniforms: &[("delta0", Vec2), ("delta1", Vec2)],
                textures: &[("texture0", 0)],
            },
            ShaderId::LensBlur2 => ProgramSource {
                label: "lens_blur_2",
                fragment: LENS_BLUR_2_FRAGMENT,
                uniforms: &[("delta0", Vec2), ("power", Float)],
                textures: &[("texture0", 0), ("texture1", 1)],
            },
            ShaderId::UnsharpMask => ProgramSource {
                label: "unsharp_mask",
                fragment: UNSHARP_MASK_FRAGMENT,
                uniforms: &[("strength", Float)],
                textures: &[("blurredTexture", 0), ("originalTexture", 1)],
            },
            ShaderId::Swirl => ProgramSource {
                label: "swirl",
                fragment: SWIRL_FRAGMENT,
                uniforms: &[
                    ("radius", Float),
                    ("angle", Float),
                    ("center", Vec2),
                    ("texSize", Vec2),
                ],
                textures: SINGLE_INPUT,
            },
            ShaderId::BulgePinch => ProgramSource {
                label: "bulge_pinch",
                fragment: BULGE_PINCH_FRAGMENT,
                uniforms: &[
                    ("radius", Float),
                    ("strength", Float),
                    ("center", Vec2),
                    ("texSize", Vec2),
                ],
                textures: SINGLE_INPUT,
            },
            ShaderId::MatrixWarp => ProgramSource {
                label: "matrix_warp",
                fragment: MATRIX_WARP_FRAGMENT,
                uniforms: &[("matrix", Mat3), ("texSize", Vec2)],
                textures: SINGLE_INPUT,
            },
        }
    }
}

/// One linked program per pass and target format, compiled on first request.
pub struct ShaderRegistry {
    programs: HashMap<(ShaderId, wgpu::TextureFormat), ShaderProgram>,
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self {
            programs: HashMap::new(),
        }
    }

    pub fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        id: ShaderId,
        format: wgpu::TextureFormat,
    ) -> Result<&mut ShaderProgram, RenderError> {
        use std::collections::hash_map::Entry;

        match self.programs.entry((id, format)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let program = ShaderProgram::compile_and_link(device, &id.source(), None, format)?;
                Ok(entry.insert(program))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ShaderId; 20] = [
        ShaderId::Passthrough,
        ShaderId::BrightnessContrast,
        ShaderId::HueSaturation,
        ShaderId::Exposure,
        ShaderId::Vibrance,
        ShaderId::Sepia,
        ShaderId::Vignette,
        ShaderId::Noise,
        ShaderId::Denoise,
        ShaderId::TriangleBlur,
        ShaderId::TiltShift,
        ShaderId::ZoomBlur,
        ShaderId::LensBlurPrePass,
        ShaderId::LensBlur0,
        ShaderId::LensBlur1,
        ShaderId::LensBlur2,
        ShaderId::UnsharpMask,
        ShaderId::Swirl,
        ShaderId::BulgePinch,
        ShaderId::MatrixWarp,
    ];

    #[test]
    fn every_declared_uniform_is_read_by_its_fragment() {
        for id in ALL {
            let source = id.source();
            for (name, _) in source.uniforms {
                assert!(
                    source.fragment.contains(&format!("params.{name}")),
                    "{} never reads {name}",
                    source.label
                );
            }
            for (name, _) in source.textures {
                assert!(
                    source.fragment.contains(name),
                    "{} never samples {name}",
                    source.label
                );
            }
            assert!(source.fragment.contains("fn fs_main"));
        }
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = ALL.iter().map(|id| id.source().label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ALL.len());
    }

    #[test]
    fn two_input_passes_default_their_second_slot_to_unit_one() {
        assert_eq!(ShaderId::LensBlur2.source().textures[1], ("texture1", 1));
        assert_eq!(
            ShaderId::UnsharpMask.source().textures[1],
            ("originalTexture", 1)
        );
    }
}
