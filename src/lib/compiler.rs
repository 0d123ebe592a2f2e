//! Flattens a [WidgetGraph] into a single GLSL fragment function.
//!
//! A compile is single-threaded and runs to completion: every instance output
//! is memoized for the duration of one [CompileState] and the whole state is
//! discarded afterwards, so no cached value can ever go stale across edits.

use crate::{
    expr::{self, Expr},
    graph::{WidgetGraph, WidgetInstance},
    registry::Registry,
    types::ValueType,
    widget::{Overload, WidgetDefinition},
};

use std::collections::{HashMap, HashSet};

/// Signature of the generated wrapper function. `pos` and `mouse` are in
/// `[-1, 1]` space, `time` is elapsed seconds.
pub const FRAGMENT_SIGNATURE: &str = "vec3 fragment(vec2 pos, vec2 mouse, float time)";

/// Compile result alias for this module.
pub type CResult<T> = Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
/// A resolution or overload-selection failure, terminal for the current
/// compile attempt.
pub struct Error {
    /// What went wrong.
    pub message: String,
    /// Id of the responsible widget instance, when one could be identified,
    /// so the editor can highlight the failing node.
    pub widget: Option<u32>,
}

impl Error {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            widget: None,
        }
    }

    /// Attach the responsible instance unless an inner resolution already
    /// named one.
    fn tag(mut self, id: u32) -> Self {
        self.widget.get_or_insert(id);
        self
    }
}

impl From<expr::Error> for Error {
    fn from(err: expr::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A resolved expression: generated code plus its inferred type.
pub struct Resolved {
    /// GLSL expression text, most often a generated variable name.
    pub code: String,
    /// Inferred semantic type.
    pub ty: ValueType,
}

/// Compile a graph into fragment-shader source for one output instance.
///
/// Emits every control as a uniform declaration, resolves the output
/// instance's expression, and wraps the generated statements in
/// [FRAGMENT_SIGNATURE] with the result converted to a 3-component color.
pub fn compile(registry: &Registry, graph: &WidgetGraph, output: &str) -> CResult<String> {
    let mut state = CompileState::new(registry, graph);

    // Controls are deferred to render time, never baked into the code.
    for (_name, instance) in graph.iter() {
        for control in &instance.controls {
            state.add_declaration(format!("uniform {} {};", control.ty, control.uniform));
        }
    }

    let resolved = state.resolve(output)?;
    let result = match resolved.ty {
        ValueType::Float => format!("vec3({})", resolved.code),
        ValueType::Vec2 => format!("vec3({}, 0.0)", resolved.code),
        ValueType::Vec3 => resolved.code,
        ValueType::Vec4 => format!("{}.xyz", resolved.code),
        ValueType::Int => {
            return Err(Error::new("output of type `int` cannot become a color"))
        }
    };

    let mut source = String::new();
    for declaration in &state.declarations {
        source.push_str(declaration);
        source.push('\n');
    }
    if !state.declarations.is_empty() {
        source.push('\n');
    }

    source.push_str(FRAGMENT_SIGNATURE);
    source.push_str(" {\n");
    for statement in &state.statements {
        source.push_str("    ");
        source.push_str(statement);
        source.push('\n');
    }
    source.push_str("    return ");
    source.push_str(&result);
    source.push_str(";\n}\n");

    Ok(source)
}

/// Per-compile working state. Created fresh for every compile and discarded
/// with it.
pub struct CompileState<'a> {
    registry: &'a Registry,
    graph: &'a WidgetGraph,

    /// De-duplicated declaration texts (function code, uniforms) in
    /// first-seen order.
    declarations: Vec<String>,
    declared: HashSet<String>,

    /// Generated statements of the wrapper function body, in emission order.
    statements: Vec<String>,

    /// Fresh-variable counter.
    counter: usize,

    /// Instance names on the current resolution path, for cycle detection.
    in_progress: HashSet<String>,

    /// Memoized per-instance outputs, errors included so a broken widget is
    /// not re-derived on every reference.
    outputs: HashMap<String, CResult<Resolved>>,
}

impl<'a> CompileState<'a> {
    /// Fresh state over a read-only registry and graph.
    pub fn new(registry: &'a Registry, graph: &'a WidgetGraph) -> Self {
        Self {
            registry,
            graph,
            declarations: Vec::new(),
            declared: HashSet::new(),
            statements: Vec::new(),
            counter: 0,
            in_progress: HashSet::new(),
            outputs: HashMap::new(),
        }
    }

    /// Resolve a raw textual expression to generated code and its type.
    pub fn resolve(&mut self, raw: &str) -> CResult<Resolved> {
        let parsed = expr::parse(raw)?;
        self.eval(&parsed)
    }

    fn add_declaration(&mut self, text: String) {
        if self.declared.insert(text.clone()) {
            self.declarations.push(text);
        }
    }

    /// Emit an assignment to a fresh variable and return the variable name.
    fn emit(&mut self, ty: ValueType, value: &str) -> String {
        let variable = format!("_x{}", self.counter);
        self.counter += 1;
        self.statements.push(format!("{ty} {variable} = {value};"));
        variable
    }

    fn eval(&mut self, parsed: &Expr) -> CResult<Resolved> {
        match parsed {
            Expr::Number(value) => Ok(Resolved {
                code: expr::format_number(*value),
                ty: ValueType::Float,
            }),

            Expr::Vector(parts) => self.eval_vector(parts),

            Expr::Color { rgb, alpha } => Ok(match alpha {
                None => Resolved {
                    code: format!("vec3({:?}, {:?}, {:?})", rgb[0], rgb[1], rgb[2]),
                    ty: ValueType::Vec3,
                },
                Some(alpha) => Resolved {
                    code: format!(
                        "vec4({:?}, {:?}, {:?}, {:?})",
                        rgb[0], rgb[1], rgb[2], alpha
                    ),
                    ty: ValueType::Vec4,
                },
            }),

            Expr::Builtin(name) => {
                builtin(name).ok_or_else(|| Error::new(format!("no such builtin `.{name}`")))
            }

            Expr::Swizzle { base, fields } => self.eval_swizzle(base, fields),

            Expr::Widget(name) => self.eval_widget(name),
        }
    }

    fn eval_vector(&mut self, parts: &[Expr]) -> CResult<Resolved> {
        let parts: Vec<Resolved> = parts
            .iter()
            .map(|part| self.eval(part))
            .collect::<CResult<_>>()?;

        let mut components = 0;
        for part in &parts {
            if !part.ty.is_float_based() {
                return Err(Error::new(format!(
                    "cannot use `{}` in a vector constructor",
                    part.ty
                )));
            }
            components += part.ty.components();
        }

        let ty = ValueType::vector(components).ok_or_else(|| {
            Error::new(format!(
                "vector constructor with {components} components (maximum is 4)"
            ))
        })?;

        let codes: Vec<&str> = parts.iter().map(|part| part.code.as_str()).collect();
        let variable = self.emit(ty, &format!("{ty}({})", codes.join(", ")));

        Ok(Resolved { code: variable, ty })
    }

    fn eval_swizzle(&mut self, base: &Expr, fields: &str) -> CResult<Resolved> {
        let base = self.eval(base)?;

        if !base.ty.is_float_based() {
            return Err(Error::new(format!("cannot swizzle `{}`", base.ty)));
        }

        for field in fields.chars() {
            let index = "xyzw".find(field).unwrap_or(4);
            if index >= base.ty.components() {
                return Err(Error::new(format!(
                    "swizzle field `{field}` is out of range for `{}`",
                    base.ty
                )));
            }
        }

        let ty = ValueType::vector(fields.len())
            .ok_or_else(|| Error::new(format!("swizzle `.{fields}` selects too many components")))?;

        Ok(Resolved {
            code: format!("{}.{fields}", base.code),
            ty,
        })
    }

    fn eval_widget(&mut self, name: &str) -> CResult<Resolved> {
        let instance = self
            .graph
            .get(name)
            .ok_or_else(|| Error::new(format!("cannot find widget `{name}`")))?;

        if self.in_progress.contains(name) {
            return Err(Error::new(format!("circular dependency at `{name}`")).tag(instance.id));
        }

        if let Some(cached) = self.outputs.get(name) {
            return cached.clone();
        }

        self.in_progress.insert(name.to_owned());
        let result = self
            .widget_output(instance)
            .map_err(|err| err.tag(instance.id));
        self.in_progress.remove(name);

        self.outputs.insert(name.to_owned(), result.clone());
        result
    }

    /// Compute one instance's output: include requirements, resolve inputs,
    /// pick an overload and emit the call.
    fn widget_output(&mut self, instance: &WidgetInstance) -> CResult<Resolved> {
        let widget = self
            .registry
            .get(&instance.func)
            .ok_or_else(|| Error::new(format!("unknown widget kind `{}`", instance.func)))?;

        self.include_requirements(widget)?;

        // Arguments in parameter-table order: control uniforms as-is, data
        // inputs resolved recursively.
        let mut arguments: Vec<(String, Resolved)> = Vec::new();
        for param in &widget.params {
            if param.control.is_some() {
                let binding = instance.control(&param.id).ok_or_else(|| {
                    Error::new(format!(
                        "widget `{}` is missing a binding for control `{}`",
                        widget.id, param.id
                    ))
                })?;

                arguments.push((
                    param.id.clone(),
                    Resolved {
                        code: binding.uniform.clone(),
                        ty: binding.ty,
                    },
                ));
            } else if let Some(raw) = instance.inputs.get(&param.id) {
                arguments.push((param.id.clone(), self.resolve(raw)?));
            } else if let Some(default) = &param.default {
                arguments.push((param.id.clone(), self.resolve(default)?));
            }
        }

        let (overload, call_arguments) = select_overload(widget, &arguments)?;

        self.add_declaration(overload.code.clone());
        let variable = self.emit(
            overload.return_type,
            &format!("{}({})", overload.name, call_arguments.join(", ")),
        );

        Ok(Resolved {
            code: variable,
            ty: overload.return_type,
        })
    }

    /// Transitively add required widget code to the declaration set. Presence
    /// is checked before recursing, so requirement cycles terminate.
    fn include_requirements(&mut self, widget: &WidgetDefinition) -> CResult<()> {
        for required in &widget.requires {
            let dependency = self.registry.get(required).ok_or_else(|| {
                Error::new(format!(
                    "widget `{}` requires unknown widget `{required}`",
                    widget.id
                ))
            })?;

            let present = dependency
                .definitions
                .iter()
                .all(|overload| self.declared.contains(&overload.code));
            if present {
                continue;
            }

            for overload in &dependency.definitions {
                self.add_declaration(overload.code.clone());
            }
            self.include_requirements(dependency)?;
        }

        Ok(())
    }
}

/// Score every overload against the supplied arguments and pick the winner,
/// returning the call arguments positioned and promoted for it.
///
/// Scoring: +1 for an exact type match, 0 for a `float` argument against a
/// vector parameter (implicit promotion), disqualified otherwise. The
/// strictly highest score wins; ties keep the earliest-declared overload.
fn select_overload<'w>(
    widget: &'w WidgetDefinition,
    arguments: &[(String, Resolved)],
) -> CResult<(&'w Overload, Vec<String>)> {
    let mut best: Option<(&Overload, i32, Vec<String>)> = None;

    for overload in &widget.definitions {
        if overload.arity() != arguments.len() {
            continue;
        }

        let Some((score, call_arguments)) = score_overload(widget, overload, arguments) else {
            continue;
        };

        match &best {
            Some((_, best_score, _)) if score <= *best_score => (),
            _ => best = Some((overload, score, call_arguments)),
        }
    }

    match best {
        Some((overload, _, call_arguments)) => Ok((overload, call_arguments)),
        None => {
            let supplied = arguments
                .iter()
                .map(|(id, resolved)| format!("{id}: {}", resolved.ty))
                .collect::<Vec<_>>()
                .join(", ");

            Err(Error::new(format!(
                "no overload of `{}` accepts ({supplied})",
                widget.id
            )))
        }
    }
}

/// Score one overload, also rendering each argument at its declared position,
/// wrapped in an explicit constructor where promotion applies. [None] means
/// disqualified.
fn score_overload(
    widget: &WidgetDefinition,
    overload: &Overload,
    arguments: &[(String, Resolved)],
) -> Option<(i32, Vec<String>)> {
    let mut score = 0;
    let mut call_arguments = Vec::with_capacity(overload.param_order.len());

    for param_id in &overload.param_order {
        let (_, resolved) = arguments.iter().find(|(id, _)| id == param_id)?;
        let declared = declared_type(widget, overload, param_id)?;

        if resolved.ty == declared {
            score += 1;
            call_arguments.push(resolved.code.clone());
        } else if resolved.ty == ValueType::Float && declared.is_vector() {
            // Implicit promotion: no penalty, no bonus.
            call_arguments.push(format!("{declared}({})", resolved.code));
        } else {
            return None;
        }
    }

    Some((score, call_arguments))
}

/// Declared type of a formal parameter: recorded input type for data
/// parameters, the control's semantic type otherwise.
fn declared_type(
    widget: &WidgetDefinition,
    overload: &Overload,
    param_id: &str,
) -> Option<ValueType> {
    overload.input_types.get(param_id).copied().or_else(|| {
        widget
            .param(param_id)?
            .control
            .as_ref()
            .map(|control| control.value_type())
    })
}

/// Builtin table for leading-dot identifiers.
fn builtin(name: &str) -> Option<Resolved> {
    let entry = |code: &str, ty| {
        Some(Resolved {
            code: code.to_owned(),
            ty,
        })
    };

    match name {
        "pos" => entry("pos", ValueType::Vec2),
        "pos01" => entry("((pos + 1.0) * 0.5)", ValueType::Vec2),
        "mouse" => entry("mouse", ValueType::Vec2),
        "mouse01" => entry("((mouse + 1.0) * 0.5)", ValueType::Vec2),
        "time" => entry("time", ValueType::Float),
        "pi" | "π" => entry("3.141592653589793", ValueType::Float),
        "2pi" | "2π" => entry("6.283185307179586", ValueType::Float),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{control_uniform, ControlBinding};

    use map_macro::hash_map;

    const BUFFER: &str = "//! .category: basic
float buffer(float v) { return v; }
vec2 buffer(vec2 v) { return v; }
vec3 buffer(vec3 v) { return v; }
vec4 buffer(vec4 v) { return v; }
";

    const ADD: &str = "//! .category: math
float add(float a, float b) { return a + b; }
vec3 add(vec3 a, vec3 b) { return a + b; }
";

    const ROT2: &str = "//! .category: math
vec2 rot2(vec2 v, float angle) {
    float c = cos(angle);
    float s = sin(angle);
    return vec2(v.x * c - v.y * s, v.x * s + v.y * c);
}
";

    const SWIRL: &str = "//! .category: distort
//! .require: rot2
vec2 swirl(vec2 v, float strength) {
    return rot2(v, strength * 6.2831853 * length(v));
}
";

    const COUNT: &str = "//! .category: misc
//! n.control: int(0, 9)
int count(int n) { return n; }
";

    fn registry() -> Registry {
        Registry::from_sources([BUFFER, ADD, ROT2, SWIRL, COUNT])
    }

    fn instance(id: u32, func: &str, inputs: HashMap<String, String>) -> WidgetInstance {
        WidgetInstance {
            id,
            func: func.to_owned(),
            inputs,
            controls: Vec::new(),
        }
    }

    #[test]
    fn hex_buffer_roundtrip() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "buf",
            instance(1, "buffer", hash_map! { "v".to_owned() => "#acabff".to_owned() }),
        );

        let source = compile(&registry(), &graph, "buf").unwrap();

        let expected = format!(
            "vec3({:?}, {:?}, {:?})",
            172. / 255_f32,
            171. / 255_f32,
            255. / 255_f32
        );
        assert!(source.contains(&expected), "{source}");
        assert!(source.contains("return _x0;"), "{source}");
    }

    #[test]
    fn float_promotes_to_vector_overload() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "sum",
            instance(
                1,
                "add",
                hash_map! {
                    "a".to_owned() => "1".to_owned(),
                    "b".to_owned() => "#0000ff".to_owned(),
                },
            ),
        );

        let source = compile(&registry(), &graph, "sum").unwrap();

        // The (vec3, vec3) overload wins and the float argument gets wrapped.
        assert!(source.contains("add(vec3(1.0), vec3("), "{source}");
        assert!(source.contains("vec3 add(vec3 a, vec3 b)"), "{source}");
        assert!(!source.contains("float add(float a, float b)"), "{source}");
    }

    #[test]
    fn exact_overload_beats_promotion() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "sum",
            instance(
                1,
                "add",
                hash_map! {
                    "a".to_owned() => "1".to_owned(),
                    "b".to_owned() => "2".to_owned(),
                },
            ),
        );

        let source = compile(&registry(), &graph, "sum").unwrap();
        assert!(source.contains("add(1.0, 2.0)"), "{source}");
        assert!(source.contains("float add(float a, float b)"), "{source}");
    }

    #[test]
    fn cycle_detection() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "a",
            instance(1, "buffer", hash_map! { "v".to_owned() => "b".to_owned() }),
        );
        graph.insert(
            "b",
            instance(2, "buffer", hash_map! { "v".to_owned() => "a".to_owned() }),
        );

        let err = compile(&registry(), &graph, "a").unwrap_err();
        assert!(err.message.contains("circular dependency"), "{err}");
        assert!(err.widget.is_some());
    }

    #[test]
    fn idempotent_compiles() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "spin",
            instance(
                1,
                "swirl",
                hash_map! {
                    "v".to_owned() => ".pos".to_owned(),
                    "strength".to_owned() => "0.5".to_owned(),
                },
            ),
        );

        let first = compile(&registry(), &graph, "spin").unwrap();
        let second = compile(&registry(), &graph, "spin").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn requirements_precede_dependents() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "spin",
            instance(
                1,
                "swirl",
                hash_map! {
                    "v".to_owned() => ".pos".to_owned(),
                    "strength".to_owned() => "0.5".to_owned(),
                },
            ),
        );

        let source = compile(&registry(), &graph, "spin").unwrap();

        let rot2_at = source.find("vec2 rot2").unwrap();
        let swirl_at = source.find("vec2 swirl").unwrap();
        assert!(rot2_at < swirl_at, "{source}");
    }

    #[test]
    fn swizzle_bounds_are_checked() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "v",
            instance(1, "buffer", hash_map! { "v".to_owned() => ".pos".to_owned() }),
        );
        graph.insert(
            "w",
            instance(2, "buffer", hash_map! { "v".to_owned() => "v.xyzw".to_owned() }),
        );

        let err = compile(&registry(), &graph, "w").unwrap_err();
        assert!(err.message.contains("`z`"), "{err}");
        assert!(err.message.contains("`vec2`"), "{err}");
    }

    #[test]
    fn no_int_promotion() {
        let control = |id: u32| ControlBinding {
            param: "n".to_owned(),
            uniform: control_uniform(id, "n"),
            ty: ValueType::Int,
        };

        let mut graph = WidgetGraph::new();
        graph.insert(
            "c1",
            WidgetInstance {
                id: 1,
                func: "count".to_owned(),
                inputs: HashMap::new(),
                controls: vec![control(1)],
            },
        );
        graph.insert(
            "c2",
            WidgetInstance {
                id: 2,
                func: "count".to_owned(),
                inputs: HashMap::new(),
                controls: vec![control(2)],
            },
        );
        graph.insert(
            "sum",
            instance(
                3,
                "add",
                hash_map! {
                    "a".to_owned() => "c1".to_owned(),
                    "b".to_owned() => "c2".to_owned(),
                },
            ),
        );

        let err = compile(&registry(), &graph, "sum").unwrap_err();
        assert!(err.message.contains("a: int"), "{err}");
        assert!(err.message.contains("b: int"), "{err}");
        assert_eq!(err.widget, Some(3));
    }

    #[test]
    fn memoized_instances_emit_once() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "base",
            instance(1, "buffer", hash_map! { "v".to_owned() => ".time".to_owned() }),
        );
        graph.insert(
            "sum",
            instance(
                2,
                "add",
                hash_map! {
                    "a".to_owned() => "base".to_owned(),
                    "b".to_owned() => "base".to_owned(),
                },
            ),
        );

        let source = compile(&registry(), &graph, "sum").unwrap();
        assert_eq!(source.matches("buffer(time)").count(), 1, "{source}");
    }

    #[test]
    fn controls_become_uniforms() {
        let mut graph = WidgetGraph::new();
        graph.insert(
            "c",
            WidgetInstance {
                id: 7,
                func: "count".to_owned(),
                inputs: HashMap::new(),
                controls: vec![ControlBinding {
                    param: "n".to_owned(),
                    uniform: control_uniform(7, "n"),
                    ty: ValueType::Int,
                }],
            },
        );
        graph.insert(
            "buf",
            instance(8, "buffer", hash_map! { "v".to_owned() => ".pos01".to_owned() }),
        );

        let source = compile(&registry(), &graph, "buf").unwrap();
        // Every instance's controls are declared, used or not.
        assert!(source.contains("uniform int _control7_n;"), "{source}");
        assert!(!source.contains("count(_control7_n)"), "{source}");
    }

    #[test]
    fn output_conversions() {
        let registry = registry();

        let mut graph = WidgetGraph::new();
        graph.insert(
            "f",
            instance(1, "buffer", hash_map! { "v".to_owned() => ".time".to_owned() }),
        );
        let source = compile(&registry, &graph, "f").unwrap();
        assert!(source.contains("return vec3(_x0);"), "{source}");

        let mut graph = WidgetGraph::new();
        graph.insert(
            "v2",
            instance(1, "buffer", hash_map! { "v".to_owned() => ".pos".to_owned() }),
        );
        let source = compile(&registry, &graph, "v2").unwrap();
        assert!(source.contains("return vec3(_x0, 0.0);"), "{source}");

        let mut graph = WidgetGraph::new();
        graph.insert(
            "v4",
            instance(
                1,
                "buffer",
                hash_map! { "v".to_owned() => "#acabff80".to_owned() },
            ),
        );
        let source = compile(&registry, &graph, "v4").unwrap();
        assert!(source.contains("return _x0.xyz;"), "{source}");
    }

    #[test]
    fn resolution_errors() {
        let registry = registry();
        let graph = WidgetGraph::new();

        let err = compile(&registry, &graph, "ghost").unwrap_err();
        assert!(err.message.contains("cannot find widget `ghost`"), "{err}");

        let mut state = CompileState::new(&registry, &graph);
        assert!(state.resolve("").unwrap_err().message.contains("empty"));
        assert!(state
            .resolve(".nope")
            .unwrap_err()
            .message
            .contains("no such builtin"));
        assert!(state
            .resolve("x.")
            .unwrap_err()
            .message
            .contains("ends with a dot"));
        assert!(state
            .resolve("1, 2, 3, 4, 5")
            .unwrap_err()
            .message
            .contains("5 components"));
    }

    #[test]
    fn vector_construction_from_mixed_parts() {
        let registry = registry();
        let graph = WidgetGraph::new();
        let mut state = CompileState::new(&registry, &graph);

        let resolved = state.resolve(".pos, 1").unwrap();
        assert_eq!(resolved.ty, ValueType::Vec3);
        assert_eq!(resolved.code, "_x0");
        assert_eq!(state.statements, vec!["vec3 _x0 = vec3(pos, 1.0);"]);
    }
}
