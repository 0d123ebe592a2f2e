//! Position distortion built on the [rot2](super::rot2) helper.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Swirl
//! .category: distort
//! .description: Rotates positions around the origin by their distance.
//! .require: rot2
//! v.name: Position
//! v.default: .pos
//! strength.name: Strength
//! strength.control: slider
vec2 swirl(vec2 v, float strength) {
    return rot2(v, strength * 6.2831853 * length(v));
}
";
