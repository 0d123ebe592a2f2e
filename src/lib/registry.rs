//! The widget definition registry: built once at startup, read-only after.

use crate::widget::{parsing, WidgetDefinition};

use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
/// Owned collection of parsed [WidgetDefinition]s, keyed by widget id.
///
/// Built once from the annotated sources and passed by shared reference into
/// every compile; the compiler never mutates it.
pub struct Registry {
    widgets: HashMap<String, WidgetDefinition>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every annotated source block and collect the results.
    ///
    /// A block that fails to parse is logged and omitted; one broken widget
    /// never aborts startup.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut registry = Self::new();

        for source in sources {
            match parsing::parse_definition(source) {
                Ok(widget) => {
                    registry.insert(widget);
                }
                Err(err) => log::warn!("skipping widget definition: {err}"),
            }
        }

        registry
    }

    /// Register a definition, returning the one it displaced if the id was
    /// already taken.
    pub fn insert(&mut self, widget: WidgetDefinition) -> Option<WidgetDefinition> {
        self.widgets.insert(widget.id.clone(), widget)
    }

    /// Look a definition up by widget id.
    pub fn get(&self, id: &str) -> Option<&WidgetDefinition> {
        self.widgets.get(id)
    }

    /// Iterate all registered definitions in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &WidgetDefinition> {
        self.widgets.values()
    }

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Whether the registry holds no widgets.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn broken_blocks_are_omitted() {
        let registry = Registry::from_sources([
            "//! .category: math\nfloat ok(float v) { return v; }",
            "float broken(float v) { return v; }", // no category
        ]);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("ok").is_some());
        assert!(registry.get("broken").is_none());
    }
}
