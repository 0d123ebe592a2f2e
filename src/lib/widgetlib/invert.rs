//! Color inversion behind a checkbox.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Invert
//! .category: color
//! .description: Inverts a color when enabled.
//! v.name: Color
//! enabled.name: Enabled
//! enabled.control: checkbox
vec3 invert(vec3 v, int enabled) {
    if (enabled == 0) { return v; }
    return vec3(1.0) - v;
}
";
