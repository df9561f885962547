/// WGSL shader drawing each point as a camera-facing sprite.
///
/// Points arrive as per-instance positions; the six quad corners come from
/// the vertex index. Sprite size follows perspective like GL point sprites
/// (`size * viewport_height / 2 / depth`), never smaller than `min_pixels`.
pub const POINTS_SHADER: &str = r#"
struct CloudUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    // x: point size, y: min size in pixels, zw: framebuffer size
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> cloud: CloudUniforms;
@group(0) @binding(1)
var sprite: texture_2d<f32>;
@group(0) @binding(2)
var sprite_sampler: sampler;

struct PointInput {
    @location(0) position: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_points(@builtin(vertex_index) vertex_index: u32, point: PointInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];
    let viewport = cloud.params.zw;

    var clip = cloud.view_proj * cloud.model * vec4<f32>(point.position, 1.0);
    let depth = max(clip.w, 1e-4);
    let pixels = max(cloud.params.x * viewport.y * 0.5 / depth, cloud.params.y);
    clip = vec4<f32>(clip.xy + corner * pixels / viewport * clip.w, clip.zw);

    var out: VertexOutput;
    out.clip_position = clip;
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    return out;
}

@fragment
fn fs_points(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(sprite, sprite_sampler, in.uv);
    let color = cloud.color * texel;
    if (color.a < 0.01) {
        discard;
    }
    return color;
}
"#;
