//! Parses an annotated widget source block into a [WidgetDefinition].
//!
//! A block mixes `//!`-prefixed metadata lines with one or more function
//! definitions in a C-like grammar restricted to the [ValueType] set. Pass 1
//! scans metadata line by line; pass 2 hands the rest to a pest grammar. The
//! consumed header and all comments are blanked rather than removed so every
//! error stays attributable to a line of the original block.
//!
//! Parsing is fail-fast: the first malformed line or failed check aborts the
//! whole block.

use super::{ControlSpec, Overload, Param, WidgetDefinition};
use crate::types::ValueType;

use std::collections::HashMap;

use {
    pest::{error::LineColLocation, iterators::Pair, Parser},
    pest_derive::Parser,
};

/// Parse result alias for this module.
pub type PResult<T> = Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
/// Definition rejection, attributed to a line of the source block.
pub struct Error {
    /// 1-based line in the annotated block.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl Error {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Parser)]
#[grammar = "lib/pest/grammar.pest"]
struct DefParser;

/// Widget-level metadata accumulated during pass 1.
#[derive(Default)]
struct Meta {
    id: String,
    name: String,
    category: String,
    description: String,
    alt: String,
    requires: Vec<String>,
}

/// Parse one annotated widget block.
///
/// # Example
/// ```
/// use fraglab::widget::parsing::parse_definition;
///
/// let widget = parse_definition(
///     "//! .name: Negate\n\
///      //! .category: math\n\
///      //! v.name: Input\n\
///      float negate(float v) { return -v; }\n",
/// )
/// .unwrap();
///
/// assert_eq!(widget.id, "negate");
/// assert_eq!(widget.params.len(), 1);
/// ```
pub fn parse_definition(source: &str) -> PResult<WidgetDefinition> {
    let mut meta = Meta::default();
    let mut params: Vec<Param> = Vec::new();

    // Pass 1: metadata scan, stopping at the first code line.
    let mut body_start = source.lines().count();
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();

        if let Some(content) = trimmed.strip_prefix("//!") {
            parse_metadata_line(content, index + 1, &mut meta, &mut params)?;
        } else if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        } else {
            body_start = index;
            break;
        }
    }

    // Pass 2: function definitions, with the header and comments blanked so
    // pest's positions map back to the original block.
    let blanked = blank_comments(&blank_header(source, body_start));
    let mut pairs = DefParser::parse(Rule::program, &blanked).map_err(pest_error)?;
    let program = pairs.next().unwrap();

    let mut function_name: Option<String> = None;
    let mut definitions = Vec::new();

    for function in program
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::function)
    {
        let index = definitions.len();
        definitions.push(parse_function(
            function,
            &mut function_name,
            &mut params,
            index,
        )?);
    }

    let function_name =
        function_name.ok_or_else(|| Error::new(1, "no function definition found"))?;

    if meta.category.is_empty() {
        return Err(Error::new(
            1,
            format!("widget `{function_name}` has no category"),
        ));
    }

    Ok(WidgetDefinition {
        id: if meta.id.is_empty() {
            function_name.clone()
        } else {
            meta.id
        },
        name: if meta.name.is_empty() {
            function_name
        } else {
            meta.name
        },
        category: meta.category,
        description: meta.description,
        alt: meta.alt,
        requires: meta.requires,
        params,
        definitions,
    })
}

fn parse_metadata_line(
    content: &str,
    line: usize,
    meta: &mut Meta,
    params: &mut Vec<Param>,
) -> PResult<()> {
    let Some((key, value)) = content.split_once(':') else {
        return Err(Error::new(
            line,
            format!("expected `key: value`, got `{}`", content.trim()),
        ));
    };
    let (key, value) = (key.trim(), value.trim());

    if let Some(field) = key.strip_prefix('.') {
        match field {
            "id" => meta.id = value.to_owned(),
            "name" => meta.name = value.to_owned(),
            "category" => meta.category = value.to_owned(),
            "description" => meta.description = value.to_owned(),
            "alt" => meta.alt = value.to_owned(),
            "require" => meta.requires.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned),
            ),
            _ => {
                return Err(Error::new(
                    line,
                    format!("metadata key `{key}` not recognized"),
                ))
            }
        }

        return Ok(());
    }

    let parts: Vec<&str> = key.split('.').collect();
    let &[param_id, property] = parts.as_slice() else {
        return Err(Error::new(
            line,
            format!("malformed metadata key `{key}`, expected `param.property`"),
        ));
    };

    let param = upsert_param(params, param_id);
    match property {
        "id" => param.id = value.to_owned(),
        "name" => param.name = value.to_owned(),
        "description" => param.description = value.to_owned(),
        "default" => param.default = Some(value.to_owned()),
        "control" => param.control = Some(parse_control(value, line)?),
        _ => {
            return Err(Error::new(
                line,
                format!("unknown parameter property `{property}`"),
            ))
        }
    }

    Ok(())
}

fn upsert_param<'a>(params: &'a mut Vec<Param>, id: &str) -> &'a mut Param {
    match params.iter().position(|param| param.id == id) {
        Some(index) => &mut params[index],
        None => {
            params.push(Param::new(id));
            params.last_mut().unwrap()
        }
    }
}

fn parse_control(value: &str, line: usize) -> PResult<ControlSpec> {
    if value == "checkbox" {
        return Ok(ControlSpec::Checkbox);
    }
    if value == "slider" {
        return Ok(ControlSpec::Slider);
    }

    if let Some(options) = value
        .strip_prefix("select(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let options: Vec<String> = options
            .split(',')
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .map(str::to_owned)
            .collect();

        if options.is_empty() {
            return Err(Error::new(line, "select control needs at least one option"));
        }

        return Ok(ControlSpec::Select(options));
    }

    if let Some(range) = value
        .strip_prefix("int(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let bounds: Vec<&str> = range.split(',').map(str::trim).collect();
        if let [min, max] = bounds[..] {
            if let (Ok(min), Ok(max)) = (min.parse(), max.parse()) {
                return Ok(ControlSpec::IntRange(min, max));
            }
        }

        return Err(Error::new(
            line,
            format!("malformed int control bounds `{range}`"),
        ));
    }

    Err(Error::new(line, format!("unknown control `{value}`")))
}

fn parse_function(
    function: Pair<Rule>,
    shared_name: &mut Option<String>,
    params: &mut Vec<Param>,
    overload_index: usize,
) -> PResult<Overload> {
    let line = function.as_span().start_pos().line_col().0;
    let code = function.as_str().trim().to_owned();

    let mut inner = function.into_inner();
    let return_type: ValueType = inner
        .next()
        .unwrap()
        .as_str()
        .parse()
        .map_err(|message| Error::new(line, message))?;
    let name = inner.next().unwrap().as_str().to_owned();

    match shared_name {
        None => *shared_name = Some(name.clone()),
        Some(expected) if *expected != name => {
            return Err(Error::new(
                line,
                format!("all overloads must share one name, expected `{expected}`, found `{name}`"),
            ))
        }
        _ => (),
    }

    let mut formals: Vec<(ValueType, String)> = Vec::new();
    for pair in inner {
        if pair.as_rule() != Rule::param_list {
            continue;
        }

        for param in pair.into_inner() {
            let mut parts = param.into_inner();
            let ty: ValueType = parts
                .next()
                .unwrap()
                .as_str()
                .parse()
                .map_err(|message| Error::new(line, message))?;
            formals.push((ty, parts.next().unwrap().as_str().to_owned()));
        }
    }

    let first = overload_index == 0;
    let mut param_order: Vec<String> = Vec::new();
    let mut input_types = HashMap::new();

    for (ty, formal) in &formals {
        if param_order.contains(formal) {
            return Err(Error::new(line, format!("duplicate parameter `{formal}`")));
        }

        if params.iter().all(|param| param.id != *formal) {
            if first {
                // The first overload registers its parameters implicitly.
                params.push(Param::new(formal));
            } else {
                return Err(Error::new(
                    line,
                    format!("parameter `{formal}` does not appear in previous overloads of `{name}`"),
                ));
            }
        }

        let param = upsert_param(params, formal);
        if let Some(control) = &param.control {
            let expected = control.value_type();
            if *ty != expected {
                return Err(Error::new(
                    line,
                    format!(
                        "parameter `{formal}` is bound to a control of type `{expected}`, found `{ty}`"
                    ),
                ));
            }
        } else if *ty == ValueType::Int {
            // Ints never take part in type inference, so they must come from
            // a control.
            return Err(Error::new(
                line,
                format!("parameter `{formal}` of type `int` must be bound to a control"),
            ));
        } else {
            input_types.insert(formal.clone(), *ty);
        }

        param_order.push(formal.clone());
    }

    for param in params.iter().filter(|param| param.control.is_none()) {
        if !param_order.contains(&param.id) {
            return Err(Error::new(
                line,
                format!(
                    "parameter `{}` not specified in definition of `{name}`",
                    param.id
                ),
            ));
        }
    }

    Ok(Overload {
        name,
        param_order,
        input_types,
        return_type,
        code,
    })
}

fn pest_error(err: pest::error::Error<Rule>) -> Error {
    let line = match err.line_col {
        LineColLocation::Pos((line, _)) => line,
        LineColLocation::Span((line, _), _) => line,
    };

    Error::new(line, err.variant.message().into_owned())
}

/// Replace the metadata header with blank lines, preserving line numbers.
fn blank_header(source: &str, body_start: usize) -> String {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| if index < body_start { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace `//` and `/* */` comments with spaces, preserving newlines.
fn blank_comments(text: &str) -> String {
    enum State {
        Code,
        Line,
        Block,
    }

    let mut state = State::Code;
    let mut result = String::with_capacity(text.len());
    let mut characters = text.chars().peekable();

    while let Some(character) = characters.next() {
        match state {
            State::Code => match (character, characters.peek()) {
                ('/', Some('/')) => {
                    characters.next();
                    result.push_str("  ");
                    state = State::Line;
                }
                ('/', Some('*')) => {
                    characters.next();
                    result.push_str("  ");
                    state = State::Block;
                }
                _ => result.push(character),
            },
            State::Line => {
                if character == '\n' {
                    result.push('\n');
                    state = State::Code;
                } else {
                    result.push(' ');
                }
            }
            State::Block => match (character, characters.peek()) {
                ('*', Some('/')) => {
                    characters.next();
                    result.push_str("  ");
                    state = State::Code;
                }
                ('\n', _) => result.push('\n'),
                _ => result.push(' '),
            },
        }
    }

    result
}
