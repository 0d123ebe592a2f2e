//! Built-in widget sources, one annotated block per module.
//!
//! Every block goes through [parse_definition](
//! crate::widget::parsing::parse_definition) at startup; a block that fails
//! to parse is logged and left out of [WIDGETLIB] without aborting the rest.

pub mod add;
pub mod blend;
pub mod buffer;
pub mod invert;
pub mod posterize;
pub mod rgb;
pub mod rot2;
pub mod swirl;
pub mod wave;

use crate::registry::Registry;

macro_rules! create_widgetlib {
    ($($widget:ident),+ $(,)?) => {
        /// Annotated source blocks of every built-in widget.
        pub fn sources() -> Vec<&'static str> {
            vec![
                $($widget::SOURCE),+
            ]
        }
    };
}

create_widgetlib! {
    // Generators
    wave,

    // Converters
    buffer,
    rgb,

    // Mixers
    blend,

    // Color filters
    invert,
    posterize,

    // Distortion
    rot2,
    swirl,

    // Math
    add,
}

lazy_static::lazy_static! {
    /// Registry over every built-in widget, parsed once.
    pub static ref WIDGETLIB: Registry = Registry::from_sources(sources());
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_builtin_parses() {
        let registry = Registry::from_sources(sources());
        assert_eq!(registry.len(), sources().len());
    }

    #[test]
    fn requirements_stay_resolvable() {
        for widget in WIDGETLIB.iter() {
            for required in &widget.requires {
                assert!(
                    WIDGETLIB.get(required).is_some(),
                    "`{}` requires missing `{required}`",
                    widget.id
                );
            }
        }
    }
}
