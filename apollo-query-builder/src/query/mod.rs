//! The intermediate selection tree built by the compiler.
//!
//! A tree is built for one compilation, pruned in place (see [`prune`]) and rendered once (see
//! [`render`]).

use crate::mapping::ArgumentSource;
use crate::schema::Argument;
use crate::schema::GraphType;

pub(crate) mod prune;
pub(crate) mod render;

pub(crate) const TYPENAME: &str = "__typename";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Field,
    /// The `__typename` discriminator of an abstract selection.
    Typename,
    /// `... on T`
    Subtype,
    /// A fragment definition, extracted from the tree before rendering.
    Fragment,
    /// `... Name`
    FragmentSpread,
}

#[derive(Debug, Clone)]
pub(crate) struct QueryNode {
    /// Field or fragment name, empty for subtypes.
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) ty: GraphType,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) argument_source: Option<ArgumentSource>,
    /// Variable names of `arguments`, filled in just before rendering.
    pub(crate) variables: Vec<String>,
    pub(crate) children: Vec<QueryNode>,
}

impl QueryNode {
    fn new(name: String, kind: NodeKind, ty: GraphType) -> Self {
        Self {
            name,
            kind,
            ty,
            arguments: Vec::new(),
            argument_source: None,
            variables: Vec::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn field(
        name: impl Into<String>,
        ty: GraphType,
        arguments: Vec<Argument>,
        argument_source: Option<ArgumentSource>,
    ) -> Self {
        Self {
            arguments,
            argument_source,
            ..Self::new(name.into(), NodeKind::Field, ty)
        }
    }

    /// `__typename`, typed as the selection it discriminates.
    pub(crate) fn typename(ty: GraphType) -> Self {
        Self::new(TYPENAME.to_string(), NodeKind::Typename, ty)
    }

    pub(crate) fn subtype(ty: GraphType) -> Self {
        Self::new(String::new(), NodeKind::Subtype, ty)
    }

    pub(crate) fn fragment(name: impl Into<String>, ty: GraphType) -> Self {
        Self::new(name.into(), NodeKind::Fragment, ty)
    }

    pub(crate) fn fragment_spread(name: impl Into<String>, ty: GraphType) -> Self {
        Self::new(name.into(), NodeKind::FragmentSpread, ty)
    }

    /// Fields and `__typename`, which merge by name.
    pub(crate) fn is_field(&self) -> bool {
        matches!(self.kind, NodeKind::Field | NodeKind::Typename)
    }

    pub(crate) fn descendant_mut(&mut self, path: &[usize]) -> &mut QueryNode {
        path.iter()
            .fold(self, |node, index| &mut node.children[*index])
    }

    pub(crate) fn descendant(&self, path: &[usize]) -> &QueryNode {
        path.iter().fold(self, |node, index| &node.children[*index])
    }

    pub(crate) fn same_arguments(&self, other: &QueryNode) -> bool {
        match (&self.argument_source, &other.argument_source) {
            (None, None) => true,
            (Some(left), Some(right)) => left.same_as(right),
            _ => false,
        }
    }
}

/// A compiled sub-expression: the tree it built and the node later operations apply to.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) root: QueryNode,
    /// Path from `root` to the head node.
    pub(crate) head: Vec<usize>,
}

impl Compiled {
    pub(crate) fn new(root: QueryNode) -> Self {
        Self {
            root,
            head: Vec::new(),
        }
    }

    pub(crate) fn head(&self) -> &QueryNode {
        self.root.descendant(&self.head)
    }

    /// Appends `other` to the head. When `move_head` is set the head moves to `other`'s head.
    pub(crate) fn attach(mut self, other: Compiled, move_head: bool) -> Compiled {
        let head = self.root.descendant_mut(&self.head);
        head.children.push(other.root);
        if move_head {
            self.head.push(head.children.len() - 1);
            self.head.extend(other.head);
        }
        self
    }
}
