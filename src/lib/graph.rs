//! User-authored widget graphs, as handed over by the external editor.
//!
//! The compiler treats a [WidgetGraph] as a pure value: instances are looked
//! up by name, raw input expressions stay raw until
//! [compile](crate::compiler::compile) resolves them.

use crate::types::ValueType;

use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default, PartialEq)]
/// Mapping of instance names to placed widget instances.
///
/// Names are kept ordered so repeated compiles of the same graph emit
/// byte-identical source.
pub struct WidgetGraph {
    instances: BTreeMap<String, WidgetInstance>,
}

impl WidgetGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an instance under a name, replacing any previous holder.
    pub fn insert(&mut self, name: impl Into<String>, instance: WidgetInstance) {
        self.instances.insert(name.into(), instance);
    }

    /// Look an instance up by name.
    pub fn get(&self, name: &str) -> Option<&WidgetInstance> {
        self.instances.get(name)
    }

    /// Iterate instances in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WidgetInstance)> {
        self.instances.iter()
    }

    /// Number of placed instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the graph holds no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A placed, named occurrence of a widget.
pub struct WidgetInstance {
    /// Editor-assigned numeric id, used to tag compile errors and to name
    /// control uniforms.
    pub id: u32,
    /// Id of the [WidgetDefinition](crate::widget::WidgetDefinition) this
    /// instance was placed from.
    pub func: String,
    /// Raw textual expression per data-input parameter id.
    pub inputs: HashMap<String, String>,
    /// Uniform bindings for the control-bound parameters.
    pub controls: Vec<ControlBinding>,
}

impl WidgetInstance {
    /// Look a control binding up by parameter id.
    pub fn control(&self, param: &str) -> Option<&ControlBinding> {
        self.controls.iter().find(|binding| binding.param == param)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A control value deferred to render time as a uniform.
pub struct ControlBinding {
    /// Parameter id the control is bound to.
    pub param: String,
    /// Uniform name, conventionally [control_uniform].
    pub uniform: String,
    /// Resolved semantic type (`int` or `float`).
    pub ty: ValueType,
}

/// Conventional uniform name for an instance's control parameter.
pub fn control_uniform(instance_id: u32, param: &str) -> String {
    format!("_control{instance_id}_{param}")
}

/// Whether a string is usable as an instance name.
///
/// The editor enforces this before an instance ever reaches the compiler: a
/// name must not collide with the expression grammar (numbers, dots, `#`) and
/// must survive the wire format (no `;` or `,`).
pub fn is_valid_name(name: &str) -> bool {
    let mut characters = name.chars();

    characters
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && characters.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
