use crate::pdf_utils;
use crate::walker::SanitizerSession;
use crate::Result;
use lopdf::{Dictionary, Document, ObjectId};
use std::collections::HashSet;

/// A bookmark and its children, collected from the `/First` → `/Next` chains
/// below the catalog's `/Outlines` dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutlineNode {
    pub(crate) id: ObjectId,
    pub(crate) title: String,
    pub(crate) children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn label(&self, is_root: bool) -> String {
        if is_root {
            "Outlines".to_owned()
        } else {
            format!("Outline {}", self.title)
        }
    }
}

/// Collect the outline tree, or `None` when the document has no outlines.
///
/// The tree is read before anything is removed. A malformed chain that loops
/// back to an item already collected is cut at that item.
pub(crate) fn collect_outline(document: &Document) -> Option<OutlineNode> {
    let catalog = document.catalog().ok()?;
    let root_id = catalog.get(b"Outlines").ok()?.as_reference().ok()?;
    let root = document.get_dictionary(root_id).ok()?;

    let mut seen = HashSet::from([root_id]);
    Some(OutlineNode {
        id: root_id,
        title: pdf_utils::text_from_dict(root, b"Title").unwrap_or_default(),
        children: collect_children(document, root, &mut seen),
    })
}

fn collect_children(
    document: &Document,
    parent: &Dictionary,
    seen: &mut HashSet<ObjectId>,
) -> Vec<OutlineNode> {
    let mut children = Vec::new();
    let mut next = parent.get(b"First").and_then(|v| v.as_reference()).ok();

    while let Some(id) = next {
        if !seen.insert(id) {
            log::warn!("outline item {} {} R appears twice, skipping the rest of the chain", id.0, id.1);
            break;
        }
        let Ok(item) = document.get_dictionary(id) else {
            break;
        };

        children.push(OutlineNode {
            id,
            title: pdf_utils::text_from_dict(item, b"Title").unwrap_or_default(),
            children: collect_children(document, item, seen),
        });
        next = item.get(b"Next").and_then(|v| v.as_reference()).ok();
    }

    children
}

/// Outline traversal for [`SanitizerSession`].
impl SanitizerSession<'_> {
    /// Sanitize every outline item depth-first, pre-order.
    ///
    /// Items share the session's visited set, so an item already reached
    /// through the trailer or catalog is not sanitized twice.
    pub(crate) fn walk_outline(&mut self, document: &mut Document, root: &OutlineNode) -> Result<()> {
        self.walk_outline_node(document, root, true)
    }

    fn walk_outline_node(
        &mut self,
        document: &mut Document,
        node: &OutlineNode,
        is_root: bool,
    ) -> Result<()> {
        self.walk_reference(document, node.id, &node.label(is_root))?;
        for child in &node.children {
            self.walk_outline_node(document, child, false)?;
        }
        Ok(())
    }
}
