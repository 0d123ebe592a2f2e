//! Periodic wave generator with a selectable shape.

/// Annotated source block.
pub const SOURCE: &str = "\
//! .name: Wave
//! .category: generator
//! .description: Periodic wave over its phase input.
//! .alt: oscillator sine saw square
//! phase.name: Phase
//! phase.default: .time
//! shape.name: Shape
//! shape.control: select(sine, saw, square)

// Shape indices match the select options.
float wave(float phase, int shape) {
    float t = fract(phase);
    if (shape == 1) { return t * 2.0 - 1.0; }
    if (shape == 2) { return step(0.5, t) * 2.0 - 1.0; }
    return sin(phase * 6.2831853);
}
";
