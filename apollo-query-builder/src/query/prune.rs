//! Rewrites a freshly compiled tree into the minimal selection it stands for.
//!
//! The passes run in a fixed order, each relying on what the previous ones established:
//! 1. fields with the same name merge,
//! 2. subtypes with the same type merge,
//! 3. subtype fields already selected by the enclosing node fold into that selection,
//! 4. fragments are extracted and every other selection of a fragment's type spreads it,
//! 5. object selections left without children disappear.

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::NodeKind;
use super::QueryNode;
use crate::error::CompileError;

/// A pruned operation and the fragment definitions it spreads.
#[derive(Debug)]
pub(crate) struct PrunedQuery {
    pub(crate) root: QueryNode,
    pub(crate) fragments: IndexMap<String, QueryNode>,
}

#[tracing::instrument(skip_all, level = "trace")]
pub(crate) fn prune(mut root: QueryNode, recursion_limit: usize) -> Result<PrunedQuery, CompileError> {
    root.normalize(0, recursion_limit)?;

    let mut fragments = IndexMap::new();
    root.extract_fragments(&mut fragments)?;
    for fragment in fragments.values_mut() {
        // Definitions merged from several applications may repeat fields.
        fragment.normalize(0, recursion_limit)?;
    }
    if !fragments.is_empty() {
        root.substitute_fragments(&fragments);
    }

    root.elide_empty();
    if root.ty.is_composite() && root.children.is_empty() {
        return Err(CompileError::EmptySelection(root.name));
    }
    for fragment in fragments.values_mut() {
        fragment.elide_empty();
        if fragment.children.is_empty() {
            return Err(CompileError::EmptySelection(fragment.name.clone()));
        }
    }
    Ok(PrunedQuery { root, fragments })
}

impl QueryNode {
    fn normalize(&mut self, depth: usize, recursion_limit: usize) -> Result<(), CompileError> {
        if depth > recursion_limit {
            return Err(CompileError::RecursionLimitExceeded(recursion_limit));
        }
        self.merge_children()?;
        self.fold_subtype_fields()?;
        for child in &mut self.children {
            child.normalize(depth + 1, recursion_limit)?;
        }
        Ok(())
    }

    fn merge_children(&mut self) -> Result<(), CompileError> {
        let mut merged: Vec<QueryNode> = Vec::with_capacity(self.children.len());
        for child in std::mem::take(&mut self.children) {
            match merged.iter_mut().find(|existing| existing.merges_with(&child)) {
                Some(existing) => existing.absorb(child)?,
                None => merged.push(child),
            }
        }
        self.children = merged;
        Ok(())
    }

    fn merges_with(&self, other: &QueryNode) -> bool {
        self.kind == other.kind
            && match self.kind {
                NodeKind::Subtype => self.ty.type_ref() == other.ty.type_ref(),
                _ => self.name == other.name,
            }
    }

    fn absorb(&mut self, other: QueryNode) -> Result<(), CompileError> {
        if self.kind != NodeKind::Typename && self.ty != other.ty {
            return Err(CompileError::ConflictingFieldShape {
                field: self.name.clone(),
                first: self.ty.to_string(),
                second: other.ty.to_string(),
            });
        }
        if !self.same_arguments(&other) {
            return Err(CompileError::ConflictingArguments {
                field: self.name.clone(),
            });
        }
        self.children.extend(other.children);
        Ok(())
    }

    /// Same kind, name, type and arguments: one can stand in for the other.
    fn same_selection(&self, other: &QueryNode) -> bool {
        self.merges_with(other)
            && (self.kind == NodeKind::Typename || self.ty == other.ty)
            && self.same_arguments(other)
    }

    fn fold_subtype_fields(&mut self) -> Result<(), CompileError> {
        let mut folded = Vec::new();
        for index in 0..self.children.len() {
            if self.children[index].kind != NodeKind::Subtype {
                continue;
            }
            let (base, rest) = self.children.split_at_mut(index);
            let Some((subtype, after)) = rest.split_first_mut() else {
                continue;
            };
            let selected_by_parent = |node: &QueryNode| {
                node.is_field()
                    && base
                        .iter()
                        .chain(after.iter())
                        .any(|field| field.is_field() && field.same_selection(node))
            };
            let (moved, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut subtype.children)
                .into_iter()
                .partition(|node| selected_by_parent(node));
            subtype.children = kept;
            folded.extend(moved);
        }
        for node in folded {
            if let Some(field) = self
                .children
                .iter_mut()
                .find(|field| field.is_field() && field.same_selection(&node))
            {
                field.absorb(node)?;
            }
        }
        Ok(())
    }

    /// Replaces every fragment definition in the tree with a spread and collects the
    /// definitions, merging those with the same name.
    fn extract_fragments(
        &mut self,
        fragments: &mut IndexMap<String, QueryNode>,
    ) -> Result<(), CompileError> {
        for child in &mut self.children {
            child.extract_fragments(fragments)?;
            if child.kind != NodeKind::Fragment {
                continue;
            }
            let spread = QueryNode::fragment_spread(child.name.clone(), child.ty.clone());
            let fragment = std::mem::replace(child, spread);
            match fragments.entry(fragment.name.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().absorb(fragment)?,
                Entry::Vacant(entry) => {
                    entry.insert(fragment);
                }
            }
        }
        Ok(())
    }

    /// Spreads every fragment of this node's type and drops the children it covers.
    fn substitute_fragments(&mut self, fragments: &IndexMap<String, QueryNode>) {
        for child in &mut self.children {
            child.substitute_fragments(fragments);
        }
        if !matches!(self.kind, NodeKind::Field | NodeKind::Subtype) || !self.ty.is_composite() {
            return;
        }
        for (name, fragment) in fragments {
            if fragment.ty.type_ref() != self.ty.type_ref() {
                continue;
            }
            self.children.retain(|child| {
                child.kind == NodeKind::FragmentSpread || !fragment.covers(child)
            });
            let spread = QueryNode::fragment_spread(name.clone(), fragment.ty.clone());
            if !self.children.iter().any(|child| child.merges_with(&spread)) {
                self.children.push(spread);
            }
        }
    }

    /// Whether selecting `self` selects everything `node` would, as one of its children.
    fn covers(&self, node: &QueryNode) -> bool {
        self.children.iter().any(|candidate| {
            candidate.same_selection(node)
                && node
                    .children
                    .iter()
                    .all(|grandchild| candidate.covers(grandchild))
        })
    }

    fn elide_empty(&mut self) {
        for child in &mut self.children {
            child.elide_empty();
        }
        self.children.retain(|child| {
            !(matches!(child.kind, NodeKind::Field | NodeKind::Subtype)
                && child.ty.is_composite()
                && child.children.is_empty())
        });
    }
}
