//! Componentwise addition over every type pairing.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Add
//! .category: math
//! .description: Adds its two inputs componentwise.
//! a.name: A
//! b.name: B
float add(float a, float b) { return a + b; }
vec2 add(vec2 a, vec2 b) { return a + b; }
vec3 add(vec3 a, vec3 b) { return a + b; }
vec4 add(vec4 a, vec4 b) { return a + b; }
";
