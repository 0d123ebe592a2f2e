//! Pass-through widget, one overload per type so anything can flow through a
//! named node unchanged.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Buffer
//! .category: basic
//! .description: Passes its input through unchanged.
//! v.name: Input
float buffer(float v) { return v; }
vec2 buffer(vec2 v) { return v; }
vec3 buffer(vec3 v) { return v; }
vec4 buffer(vec4 v) { return v; }
";
