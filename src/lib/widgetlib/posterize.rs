//! Quantizes a color to a bounded number of levels.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Posterize
//! .category: color
//! .description: Quantizes each channel to a fixed number of levels.
//! v.name: Color
//! levels.name: Levels
//! levels.control: int(2, 16)
vec3 posterize(vec3 v, int levels) {
    float n = float(levels);
    return floor(v * n) / n;
}
";
