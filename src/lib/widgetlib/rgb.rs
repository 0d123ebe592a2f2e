//! Builds a color from three scalar channels.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: RGB
//! .category: color
//! .description: Builds a color from red, green and blue channels.
//! .alt: color channels
//! r.name: Red
//! g.name: Green
//! b.name: Blue
vec3 rgb(float r, float g, float b) { return vec3(r, g, b); }
";
