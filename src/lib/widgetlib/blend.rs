//! Linear blend with the mix amount on a slider.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Blend
//! .category: mix
//! .description: Linear blend between two inputs.
//! a.name: A
//! b.name: B
//! amount.name: Amount
//! amount.control: slider
float blend(float a, float b, float amount) { return mix(a, b, amount); }
vec2 blend(vec2 a, vec2 b, float amount) { return mix(a, b, amount); }
vec3 blend(vec3 a, vec3 b, float amount) { return mix(a, b, amount); }
vec4 blend(vec4 a, vec4 b, float amount) { return mix(a, b, amount); }
";
