//! Shape recognition for raw widget input expressions.
//!
//! Input boxes accept a tiny grammar: numeric literals, comma-joined vector
//! constructions, `#rgb`-style hex colors, leading-dot builtins like `.time`,
//! trailing swizzles like `.xy`, and bare widget-instance names. Recognition
//! is purely syntactic and ordered (first matching shape wins); dependency
//! resolution and code emission happen later in [crate::compiler].

/// Parse result alias for this module.
pub type PResult<T> = Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
/// Shape-level rejection of a raw input expression.
pub enum Error {
    #[error("empty input")]
    /// Nothing left after trimming whitespace.
    Empty,

    #[error("`{0}` ends with a dot")]
    /// A trailing `.` with no swizzle or builtin behind it.
    TrailingDot(String),

    #[error("`{0}` is not a valid hex color")]
    /// A `#` literal with the wrong digit count or non-hex digits.
    BadHex(String),
}

#[derive(Clone, Debug, PartialEq)]
/// One recognized expression shape.
pub enum Expr {
    /// Numeric literal, always typed `float`.
    Number(f64),
    /// Top-level comma list building a vector from its parts.
    Vector(Vec<Expr>),
    /// Hex color literal; alpha present only in the 4- and 8-digit forms.
    Color {
        /// Red, green and blue channels in `[0, 1]`.
        rgb: [f32; 3],
        /// Alpha channel in `[0, 1]`, if the literal carries one.
        alpha: Option<f32>,
    },
    /// Leading-dot builtin such as `.pos` or `.time` (name stored without the
    /// dot).
    Builtin(String),
    /// Component selection over a base expression; `fields` holds the raw
    /// swizzle characters, all drawn from `xyzw`.
    Swizzle {
        /// Expression the components are selected from.
        base: Box<Expr>,
        /// Swizzle characters in selection order.
        fields: String,
    },
    /// Anything else: a reference to a named widget instance.
    Widget(String),
}

/// Recognize the shape of a raw input expression.
///
/// # Example
/// ```
/// use fraglab::expr::{parse, Expr};
///
/// assert_eq!(parse(" 0.5 "), Ok(Expr::Number(0.5)));
/// assert_eq!(parse("wave1"), Ok(Expr::Widget("wave1".to_owned())));
/// ```
pub fn parse(raw: &str) -> PResult<Expr> {
    let text = raw.trim();

    if text.is_empty() {
        return Err(Error::Empty);
    }

    if let Ok(value) = text.parse::<f64>() {
        return Ok(Expr::Number(value));
    }

    if let Some(parts) = split_top_level(text) {
        return Ok(Expr::Vector(
            parts.into_iter().map(parse).collect::<PResult<_>>()?,
        ));
    }

    if text.starts_with('#') {
        return parse_hex(text);
    }

    if text.ends_with('.') {
        return Err(Error::TrailingDot(text.to_owned()));
    }

    if let Some(name) = text.strip_prefix('.') {
        if !name.contains('.') {
            return Ok(Expr::Builtin(name.to_owned()));
        }
    }

    if let Some((base, fields)) = split_swizzle(text) {
        return Ok(Expr::Swizzle {
            base: Box::new(parse(base)?),
            fields: fields.to_owned(),
        });
    }

    Ok(Expr::Widget(text.to_owned()))
}

/// Split on commas sitting outside any parentheses, or [None] if there are
/// none.
fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;

    for (index, character) in text.char_indices() {
        match character {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            }
            _ => (),
        }
    }

    if parts.is_empty() {
        return None;
    }

    parts.push(&text[start..]);
    Some(parts)
}

fn parse_hex(text: &str) -> PResult<Expr> {
    let digits = &text[1..];
    let bad = || Error::BadHex(text.to_owned());

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }

    let channel = |index: usize| -> PResult<f32> {
        u8::from_str_radix(&digits[index..=index], 16)
            .map(|nibble| nibble as f32 / 15.)
            .map_err(|_| bad())
    };
    let wide_channel = |index: usize| -> PResult<f32> {
        u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16)
            .map(|byte| byte as f32 / 255.)
            .map_err(|_| bad())
    };

    Ok(match digits.len() {
        3 => Expr::Color {
            rgb: [channel(0)?, channel(1)?, channel(2)?],
            alpha: None,
        },
        4 => Expr::Color {
            rgb: [channel(0)?, channel(1)?, channel(2)?],
            alpha: Some(channel(3)?),
        },
        6 => Expr::Color {
            rgb: [wide_channel(0)?, wide_channel(1)?, wide_channel(2)?],
            alpha: None,
        },
        8 => Expr::Color {
            rgb: [wide_channel(0)?, wide_channel(1)?, wide_channel(2)?],
            alpha: Some(wide_channel(3)?),
        },
        _ => Err(bad())?,
    })
}

/// Split `base.fields` where `fields` is 1 to 4 characters of `xyzw`.
fn split_swizzle(text: &str) -> Option<(&str, &str)> {
    let dot = text.rfind('.')?;
    let (base, fields) = (&text[..dot], &text[dot + 1..]);

    (!base.is_empty()
        && (1..=4).contains(&fields.len())
        && fields.chars().all(|c| "xyzw".contains(c)))
    .then_some((base, fields))
}

/// Format a numeric literal as GLSL float source.
///
/// Always yields a decimal point or an exponent so the shading language reads
/// it as a float. Non-finite values get sentinel encodings the GLSL compiler
/// accepts: `NaN` becomes `(0.0/0.0)` and infinities become out-of-range
/// exponent literals.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "(0.0/0.0)".to_owned()
    } else if value == f64::INFINITY {
        "1e+1000".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-1e+1000".to_owned()
    } else {
        format!("{value:?}")
    }
}
