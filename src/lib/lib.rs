#![warn(missing_docs)]

//! Library used by the fraglab software. Compiles a directed graph of small
//! numeric/vector widgets into a single GLSL fragment-shader function.
//!
//! The two halves of the crate are the widget definition parser
//! ([widget::parsing]), which turns an annotated source block into a typed
//! [WidgetDefinition](widget::WidgetDefinition), and the graph compiler
//! ([compiler]), which flattens a user-authored
//! [WidgetGraph](graph::WidgetGraph) into shader source.

pub mod compiler;
pub mod expr;
pub mod graph;
pub mod registry;
pub mod types;
pub mod widget;
pub mod widgetlib;
pub mod wire;
