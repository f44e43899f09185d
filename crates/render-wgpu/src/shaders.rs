/// WGSL program for grid lines. `color.a` is the LOD opacity already computed
/// on the CPU; the shader only repeats the discard threshold.
pub const GRID_SHADER: &str = r#"
struct GridUniforms {
    mvp: mat4x4<f32>,
    color: vec4<f32>,
    zoom: f32,
    discard_below: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> grid: GridUniforms;

@vertex
fn vs_grid(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return grid.mvp * vec4<f32>(position, 0.0, 1.0);
}

@fragment
fn fs_grid() -> @location(0) vec4<f32> {
    if (grid.zoom < grid.discard_below) {
        discard;
    }
    return grid.color;
}
"#;

/// WGSL program for instanced highlight quads. Slot 0 is the quad template
/// vertex, slot 1 the per-instance cell offset.
pub const HIGHLIGHT_SHADER: &str = r#"
struct HighlightUniforms {
    mvp: mat4x4<f32>,
    // The `highlightColor` uniform.
    highlight_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> highlight: HighlightUniforms;

@vertex
fn vs_highlight(
    @location(0) vertex_pos: vec2<f32>,
    @location(1) cell_offset: vec2<f32>,
) -> @builtin(position) vec4<f32> {
    let world = cell_offset + vertex_pos;
    return highlight.mvp * vec4<f32>(world, 0.0, 1.0);
}

@fragment
fn fs_highlight() -> @location(0) vec4<f32> {
    return highlight.highlight_color;
}
"#;
