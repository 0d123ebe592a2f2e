//! Compact textual export format for widget graphs.
//!
//! A creation is a flat string `_title=<title>;;<instance>;;…;;_out=<name>`
//! where each instance is `<func>;n:<name>;i<inputId>:<value>;…;c<controlId>:
//! <value>;…`. Field order is fixed (`func` first, unprefixed) and values are
//! not escaped, which is why `;` can never appear inside one.
//!
//! The editor owns this layer; the compiler never sees it. [Document]
//! round-trips the string form and [Document::to_graph] bridges into the
//! compiler's data model, leaving the control *values* behind (they live in
//! uniforms at render time, not in the graph).

use crate::{
    graph::{control_uniform, WidgetGraph, WidgetInstance},
    registry::Registry,
};

use std::collections::HashMap;

/// Wire result alias for this module.
pub type WResult<T> = Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
/// Malformed or unrepresentable wire data.
pub enum Error {
    #[error("missing `{0}` field")]
    /// A required field was absent.
    MissingField(&'static str),

    #[error("unexpected field `{0}`")]
    /// A field carried an unknown prefix.
    UnexpectedField(String),

    #[error("`{0}` contains a reserved character")]
    /// A value held a `;`, which the format cannot escape.
    ReservedCharacter(String),

    #[error("unknown widget kind `{0}`")]
    /// An instance referenced a widget id absent from the registry.
    UnknownWidget(String),

    #[error("widget `{widget}` has no control parameter `{param}`")]
    /// A `c` field referenced a parameter that is not control-bound.
    UnknownControl {
        /// Widget id.
        widget: String,
        /// Offending parameter id.
        param: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A parsed creation: title, instance records and the selected output.
pub struct Document {
    /// Creation title.
    pub title: String,
    /// Name of the output instance.
    pub out: String,
    /// Instance records in export order.
    pub instances: Vec<InstanceRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// One exported instance, values still textual.
pub struct InstanceRecord {
    /// Widget id the instance was placed from.
    pub func: String,
    /// Instance name.
    pub name: String,
    /// `(param id, raw expression)` pairs in export order.
    pub inputs: Vec<(String, String)>,
    /// `(param id, control value)` pairs in export order.
    pub controls: Vec<(String, String)>,
}

impl Document {
    /// Render the document to its wire string.
    pub fn encode(&self) -> WResult<String> {
        let mut segments = vec![format!("_title={}", reserve_free(&self.title)?)];

        for instance in &self.instances {
            segments.push(instance.encode()?);
        }

        segments.push(format!("_out={}", reserve_free(&self.out)?));
        Ok(segments.join(";;"))
    }

    /// Parse a wire string back into a document.
    pub fn decode(wire: &str) -> WResult<Self> {
        let mut title = None;
        let mut out = None;
        let mut instances = Vec::new();

        for segment in wire.split(";;") {
            if let Some(value) = segment.strip_prefix("_title=") {
                title = Some(value.to_owned());
            } else if let Some(value) = segment.strip_prefix("_out=") {
                out = Some(value.to_owned());
            } else {
                instances.push(InstanceRecord::decode(segment)?);
            }
        }

        Ok(Self {
            title: title.ok_or(Error::MissingField("_title"))?,
            out: out.ok_or(Error::MissingField("_out"))?,
            instances,
        })
    }

    /// Build the compiler-facing graph this document describes.
    ///
    /// Instance ids are assigned in export order and control uniforms follow
    /// the [control_uniform] convention. Control values are dropped here; the
    /// render loop feeds them through the uniforms instead.
    pub fn to_graph(&self, registry: &Registry) -> WResult<WidgetGraph> {
        let mut graph = WidgetGraph::new();

        for (index, record) in self.instances.iter().enumerate() {
            let widget = registry
                .get(&record.func)
                .ok_or_else(|| Error::UnknownWidget(record.func.clone()))?;
            let id = index as u32 + 1;

            let mut instance = WidgetInstance {
                id,
                func: record.func.clone(),
                inputs: HashMap::new(),
                controls: Vec::new(),
            };

            for (param, value) in &record.inputs {
                instance.inputs.insert(param.clone(), value.clone());
            }

            for (param, _value) in &record.controls {
                let spec = widget
                    .param(param)
                    .and_then(|param| param.control.as_ref())
                    .ok_or_else(|| Error::UnknownControl {
                        widget: record.func.clone(),
                        param: param.clone(),
                    })?;

                instance.controls.push(crate::graph::ControlBinding {
                    param: param.clone(),
                    uniform: control_uniform(id, param),
                    ty: spec.value_type(),
                });
            }

            graph.insert(record.name.clone(), instance);
        }

        Ok(graph)
    }
}

impl InstanceRecord {
    fn encode(&self) -> WResult<String> {
        let mut fields = vec![
            reserve_free(&self.func)?.to_owned(),
            format!("n:{}", reserve_free(&self.name)?),
        ];

        for (param, value) in &self.inputs {
            fields.push(format!("i{}:{}", reserve_free(param)?, reserve_free(value)?));
        }
        for (param, value) in &self.controls {
            fields.push(format!("c{}:{}", reserve_free(param)?, reserve_free(value)?));
        }

        Ok(fields.join(";"))
    }

    fn decode(segment: &str) -> WResult<Self> {
        let mut fields = segment.split(';');
        let func = fields.next().filter(|f| !f.is_empty()).map(str::to_owned);

        let mut record = Self {
            func: func.ok_or(Error::MissingField("func"))?,
            ..Self::default()
        };

        let mut name = None;
        for field in fields {
            if let Some(value) = field.strip_prefix("n:") {
                name = Some(value.to_owned());
            } else if let Some(rest) = field.strip_prefix('i') {
                let (param, value) = rest
                    .split_once(':')
                    .ok_or_else(|| Error::UnexpectedField(field.to_owned()))?;
                record.inputs.push((param.to_owned(), value.to_owned()));
            } else if let Some(rest) = field.strip_prefix('c') {
                let (param, value) = rest
                    .split_once(':')
                    .ok_or_else(|| Error::UnexpectedField(field.to_owned()))?;
                record.controls.push((param.to_owned(), value.to_owned()));
            } else {
                return Err(Error::UnexpectedField(field.to_owned()));
            }
        }

        record.name = name.ok_or(Error::MissingField("n"))?;
        Ok(record)
    }
}

fn reserve_free(value: &str) -> WResult<&str> {
    if value.contains(';') {
        return Err(Error::ReservedCharacter(value.to_owned()));
    }

    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::Registry;

    fn sample() -> Document {
        Document {
            title: "plasma".to_owned(),
            out: "col".to_owned(),
            instances: vec![
                InstanceRecord {
                    func: "wave".to_owned(),
                    name: "osc".to_owned(),
                    inputs: vec![("phase".to_owned(), ".time".to_owned())],
                    controls: vec![("shape".to_owned(), "1".to_owned())],
                },
                InstanceRecord {
                    func: "buffer".to_owned(),
                    name: "col".to_owned(),
                    inputs: vec![("v".to_owned(), "osc, osc, 1".to_owned())],
                    controls: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn encode_layout() {
        let wire = sample().encode().unwrap();
        assert_eq!(
            wire,
            "_title=plasma;;wave;n:osc;iphase:.time;cshape:1;;buffer;n:col;iv:osc, osc, 1;;_out=col"
        );
    }

    #[test]
    fn roundtrip() {
        let document = sample();
        let wire = document.encode().unwrap();
        assert_eq!(Document::decode(&wire).unwrap(), document);
    }

    #[test]
    fn reserved_characters_are_rejected() {
        let mut document = sample();
        document.instances[0].inputs[0].1 = "a;b".to_owned();
        assert!(matches!(
            document.encode(),
            Err(Error::ReservedCharacter(_))
        ));
    }

    #[test]
    fn missing_fields() {
        assert_eq!(
            Document::decode("_out=x"),
            Err(Error::MissingField("_title"))
        );
        assert_eq!(
            Document::decode("_title=x;;wave;iphase:1;;_out=y").unwrap_err(),
            Error::MissingField("n")
        );
    }

    #[test]
    fn to_graph_binds_controls() {
        let registry = Registry::from_sources([
            "//! .category: generator
//! shape.control: select(sine, saw)
float wave(float phase, int shape) { return sin(phase); }",
            "//! .category: basic
vec3 buffer(vec3 v) { return v; }",
        ]);

        let graph = sample().to_graph(&registry).unwrap();
        assert_eq!(graph.len(), 2);

        let osc = graph.get("osc").unwrap();
        assert_eq!(osc.id, 1);
        assert_eq!(osc.inputs["phase"], ".time");
        assert_eq!(osc.controls[0].uniform, "_control1_shape");

        let mut broken = sample();
        broken.instances[0].func = "ghost".to_owned();
        assert_eq!(
            broken.to_graph(&registry),
            Err(Error::UnknownWidget("ghost".to_owned()))
        );
    }
}
