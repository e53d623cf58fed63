//! Non-fatal findings collected while normalizing the catalog.
//!
//! Generation keeps going after one of these so a single run reports every
//! defect; the generated code carries a visible `// BAD:` marker instead.
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No codec is registered for the attribute type.
    UnsupportedType { node: String, attr: String, ty: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedType { node, attr, ty } => write!(
                f,
                "cannot generate import/export for node {node}: unsupported attribute type: {ty} (attribute {attr})"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_in_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        for ty in ["ident*", "size_t"] {
            diags.report(Diagnostic::UnsupportedType {
                node: "ASM".into(),
                attr: "text".into(),
                ty: ty.into(),
            });
        }
        assert_eq!(diags.len(), 2);
        let tys: Vec<_> = diags
            .iter()
            .map(|d| match d {
                Diagnostic::UnsupportedType { ty, .. } => ty.as_str(),
            })
            .collect();
        assert_eq!(tys, ["ident*", "size_t"]);
    }

    #[test]
    fn message_names_node_and_type() {
        let d = Diagnostic::UnsupportedType {
            node: "Foo".into(),
            attr: "bar".into(),
            ty: "weird_t".into(),
        };
        let msg = d.to_string();
        assert!(msg.contains("node Foo"));
        assert!(msg.contains("weird_t"));
    }
}
