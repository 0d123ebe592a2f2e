//! Widget definitions: the typed, overload-aware signatures the graph
//! compiler resolves instances against.

pub mod parsing;

use crate::types::ValueType;

use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
/// A parsed built-in widget: metadata, parameter table and one or more typed
/// overloads. Immutable once built.
pub struct WidgetDefinition {
    /// Registry key; defaults to the parsed function name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Palette category; mandatory.
    pub category: String,
    /// Longer display description.
    pub description: String,
    /// Alternative search terms.
    pub alt: String,
    /// Ids of widgets whose code must be included before this one's.
    pub requires: Vec<String>,
    /// Parameter table in first-mention order.
    pub params: Vec<Param>,
    /// Typed overloads in declaration order. Declaration order is load-bearing
    /// for tie-breaks during overload selection.
    pub definitions: Vec<Overload>,
}

impl WidgetDefinition {
    /// Look a parameter up by id.
    pub fn param(&self, id: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.id == id)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// One named widget parameter, either a data input or a UI-bound control.
pub struct Param {
    /// Unique id within the widget.
    pub id: String,
    /// Display name; defaults to the id.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Prefill for the input box, if any.
    pub default: Option<String>,
    /// UI control binding. A parameter either has one (value supplied as a
    /// uniform) or is a data input resolved from the graph.
    pub control: Option<ControlSpec>,
}

impl Param {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            description: String::new(),
            default: None,
            control: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// UI control variants a parameter can be bound to.
pub enum ControlSpec {
    /// On/off toggle, semantic type `int`.
    Checkbox,
    /// `[0, 1]` range, semantic type `float`.
    Slider,
    /// Ordered option list, semantic type `int` (the selected index).
    Select(Vec<String>),
    /// Bounded integer, semantic type `int`.
    IntRange(i64, i64),
}

impl ControlSpec {
    /// Semantic type a parameter bound to this control must declare.
    pub fn value_type(&self) -> ValueType {
        match self {
            ControlSpec::Slider => ValueType::Float,
            ControlSpec::Checkbox | ControlSpec::Select(_) | ControlSpec::IntRange(..) => {
                ValueType::Int
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// One concrete `(param types) -> return type` signature plus its function
/// body. All overloads of a widget share one function name.
pub struct Overload {
    /// Shared function name.
    pub name: String,
    /// Formal parameter ids in declaration order.
    pub param_order: Vec<String>,
    /// Declared types of the data-input parameters. Control-bound parameters
    /// are excluded; their type is fixed by the control.
    pub input_types: HashMap<String, ValueType>,
    /// Declared return type.
    pub return_type: ValueType,
    /// Literal source text of the whole function, emitted verbatim into the
    /// declaration set.
    pub code: String,
}

impl Overload {
    /// Arity of this overload, control parameters included.
    pub fn arity(&self) -> usize {
        self.param_order.len()
    }
}
