//! 2D rotation helper other widgets pull in through `.require`.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Rotate 2D
//! .category: math
//! .description: Rotates a 2D vector by an angle in radians.
//! .alt: rotation
//! v.name: Vector
//! angle.name: Angle
vec2 rot2(vec2 v, float angle) {
    float c = cos(angle);
    float s = sin(angle);
    return vec2(v.x * c - v.y * s, v.x * s + v.y * c);
}
";
