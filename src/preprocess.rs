//! Catalog preprocessing: normalize every eligible node, in a stable order,
//! and expose the per-artifact views.
use crate::catalog::Catalog;
use crate::codec::CodecTable;
use crate::config::GenConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{GenError, Result};
use crate::normalize::{normalize, NormalizedNode};

/// The frozen, normalized catalog shared by all emission passes.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    nodes: Vec<NormalizedNode>,
}

/// Normalizes `catalog` in case-insensitive name order (ties broken by the
/// exact name). Not-yet-implemented nodes are skipped; abstract ones are
/// normalized but never emitted.
pub fn preprocess(
    catalog: &Catalog,
    config: &GenConfig,
    codecs: &CodecTable,
    diags: &mut Diagnostics,
) -> Result<Preprocessed> {
    let mut entries: Vec<_> = catalog.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let mut nodes = Vec::with_capacity(entries.len());
    for (name, spec) in entries {
        if spec.not_yet_implemented || config.not_yet_implemented.contains(name) {
            tracing::debug!(node = name, "skipping: not yet implemented");
            continue;
        }
        let mut node = normalize(name, spec, catalog, codecs, diags)?;
        node.custom_serializer |= config.custom_serialized.contains(name);
        if node.no_constructor && !node.is_abstract && !node.custom_serializer {
            return Err(GenError::shape(name, "has no constructor, so it needs a custom serializer"));
        }
        tracing::debug!(
            node = name,
            arguments = node.arguments.len(),
            setters = node.init_args.len(),
            "normalized"
        );
        nodes.push(node);
    }
    Ok(Preprocessed { nodes })
}

impl Preprocessed {
    pub fn nodes(&self) -> &[NormalizedNode] {
        &self.nodes
    }

    pub fn get(&self, name: &str) -> Option<&NormalizedNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn export_nodes(&self) -> impl Iterator<Item = &NormalizedNode> {
        self.nodes.iter().filter(|n| !n.is_abstract)
    }

    pub fn import_nodes(&self) -> impl Iterator<Item = &NormalizedNode> {
        self.nodes.iter().filter(|n| !n.is_abstract && !n.custom_serializer)
    }

    /// Every concrete node, custom serializer or not: the lexer only maps
    /// keywords to opcodes.
    pub fn lexer_nodes(&self) -> impl Iterator<Item = &NormalizedNode> {
        self.export_nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Attr, NodeSpec};
    use crate::codec::FIRM_CODECS;
    use crate::firm;

    fn firm_preprocessed() -> (Preprocessed, Diagnostics) {
        let mut diags = Diagnostics::new();
        let catalog = firm::catalog().unwrap();
        let pre = preprocess(&catalog, &GenConfig::default(), &FIRM_CODECS, &mut diags).unwrap();
        (pre, diags)
    }

    fn names<'a>(it: impl Iterator<Item = &'a NormalizedNode>) -> Vec<&'a str> {
        it.map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn firm_catalog_has_a_codec_for_every_attribute() {
        let (pre, diags) = firm_preprocessed();
        let unsupported: Vec<_> = diags.iter().map(ToString::to_string).collect();
        assert!(unsupported.is_empty(), "{unsupported:#?}");
        assert!(pre.nodes().iter().flat_map(|n| n.fields()).all(|f| f.supported));
    }

    #[test]
    fn order_is_case_insensitive_alphabetical() {
        let (pre, _) = firm_preprocessed();
        let all = names(pre.nodes().iter());
        let id = all.iter().position(|n| *n == "Id").unwrap();
        let ijmp = all.iter().position(|n| *n == "IJmp").unwrap();
        assert!(id < ijmp);
        let mut sorted = all.clone();
        sorted.sort_by_key(|n| n.to_lowercase());
        assert_eq!(all, sorted);
    }

    #[test]
    fn not_yet_implemented_nodes_are_skipped_everywhere() {
        let (pre, _) = firm_preprocessed();
        assert!(pre.get("ASM").is_none());
        assert!(!names(pre.lexer_nodes()).contains(&"ASM"));
    }

    #[test]
    fn views_apply_exclusions() {
        let (pre, _) = firm_preprocessed();
        let export = names(pre.export_nodes());
        let import = names(pre.import_nodes());
        let lexer = names(pre.lexer_nodes());

        assert!(pre.get("Binop").is_some());
        assert!(!export.contains(&"Binop"));
        assert!(!import.contains(&"Binop"));
        assert!(!lexer.contains(&"Binop"));

        for custom in ["Anchor", "Block", "End", "Start", "SymConst", "Phi", "Deleted"] {
            assert!(export.contains(&custom), "{custom} missing from export");
            assert!(lexer.contains(&custom), "{custom} missing from lexer");
            assert!(!import.contains(&custom), "{custom} must not be imported");
        }
        assert!(import.contains(&"Add"));
        assert!(import.contains(&"Div"));
    }

    #[test]
    fn config_can_extend_exclusions() {
        let mut diags = Diagnostics::new();
        let catalog = firm::catalog().unwrap();
        let config = GenConfig::default().skip("Mulh").custom("Proj");
        let pre = preprocess(&catalog, &config, &FIRM_CODECS, &mut diags).unwrap();
        assert!(pre.get("Mulh").is_none());
        assert!(pre.get("Proj").unwrap().custom_serializer);
        assert!(!names(pre.import_nodes()).contains(&"Proj"));
    }

    #[test]
    fn node_flag_marks_not_yet_implemented() {
        let mut catalog = Catalog::new();
        catalog.insert("Later", NodeSpec { not_yet_implemented: true, ..NodeSpec::default() }).unwrap();
        catalog.insert("Now", NodeSpec::default()).unwrap();
        let mut diags = Diagnostics::new();
        let pre = preprocess(&catalog, &GenConfig::bare(), &FIRM_CODECS, &mut diags).unwrap();
        assert_eq!(names(pre.nodes().iter()), ["Now"]);
    }

    #[test]
    fn constructorless_node_must_be_custom() {
        let mut catalog = Catalog::new();
        catalog.insert("Handmade", NodeSpec { no_constructor: true, ..NodeSpec::default() }).unwrap();
        let mut diags = Diagnostics::new();
        let err = preprocess(&catalog, &GenConfig::bare(), &FIRM_CODECS, &mut diags).unwrap_err();
        assert!(matches!(err, GenError::Shape { .. }));

        let config = GenConfig::bare().custom("Handmade");
        assert!(preprocess(&catalog, &config, &FIRM_CODECS, &mut diags).is_ok());
    }

    #[test]
    fn diagnostics_accumulate_across_nodes() {
        let mut catalog = Catalog::new();
        for name in ["A", "B"] {
            let spec = NodeSpec { attrs: vec![Attr::new("x", "mystery_t")], ..NodeSpec::default() };
            catalog.insert(name, spec).unwrap();
        }
        let mut diags = Diagnostics::new();
        let pre = preprocess(&catalog, &GenConfig::bare(), &FIRM_CODECS, &mut diags).unwrap();
        assert_eq!(pre.nodes().len(), 2);
        assert_eq!(diags.len(), 2);
    }
}
