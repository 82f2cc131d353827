use std::fmt;

use indexmap::IndexMap;

use super::NodeKind;
use super::QueryNode;
use super::prune::PrunedQuery;
use crate::display_helpers::DisplaySeparated;
use crate::display_helpers::State;
use crate::display_helpers::write_indented_lines;
use crate::error::CompileError;
use crate::variables::VariableBinder;
use crate::variables::VariableBinding;

/// A pruned tree with its arguments bound to variables, ready to print.
#[derive(Debug)]
pub(crate) struct QueryDocument {
    root: QueryNode,
    fragments: IndexMap<String, QueryNode>,
    variables: Vec<VariableBinding>,
}

impl PrunedQuery {
    /// Binds arguments in the order they are printed, so variable ordinals follow the text.
    pub(crate) fn bind(self, binder: &mut VariableBinder) -> Result<QueryDocument, CompileError> {
        let PrunedQuery {
            mut root,
            mut fragments,
        } = self;
        bind_node(&mut root, binder)?;
        for fragment in fragments.values_mut() {
            bind_node(fragment, binder)?;
        }
        Ok(QueryDocument {
            root,
            fragments,
            variables: binder.variables().to_vec(),
        })
    }
}

fn bind_node(node: &mut QueryNode, binder: &mut VariableBinder) -> Result<(), CompileError> {
    if !node.arguments.is_empty() {
        let source =
            node.argument_source
                .as_ref()
                .ok_or_else(|| CompileError::MissingArgumentSource {
                    field: node.name.clone(),
                })?;
        node.variables = node
            .arguments
            .iter()
            .map(|argument| binder.bind(source, argument).map(str::to_string))
            .collect::<Result<_, _>>()?;
    }
    for index in print_order(&node.children) {
        bind_node(&mut node.children[index], binder)?;
    }
    Ok(())
}

/// Fields first, then fragment spreads, then subtypes, each group in tree order.
fn print_order(children: &[QueryNode]) -> Vec<usize> {
    let rank = |node: &QueryNode| match node.kind {
        NodeKind::Field | NodeKind::Typename => Some(0),
        NodeKind::FragmentSpread => Some(1),
        NodeKind::Subtype => Some(2),
        NodeKind::Fragment => None,
    };
    let mut order: Vec<(u8, usize)> = children
        .iter()
        .enumerate()
        .filter_map(|(index, node)| rank(node).map(|rank| (rank, index)))
        .collect();
    order.sort();
    order.into_iter().map(|(_, index)| index).collect()
}

fn printed(children: &[QueryNode]) -> Vec<&QueryNode> {
    print_order(children)
        .into_iter()
        .map(|index| &children[index])
        .collect()
}

impl fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = State::new(f);
        state.write("query")?;
        if !self.variables.is_empty() {
            let declarations: Vec<String> = self
                .variables
                .iter()
                .map(|variable| format!("${}: {}", variable.name, variable.ty))
                .collect();
            write!(state, "({})", DisplaySeparated(&declarations))?;
        }
        state.write(" {")?;
        write_indented_lines(&mut state, &[&self.root], write_node)?;
        state.write("}\n")?;

        for fragment in self.fragments.values() {
            write!(state, "\nfragment {} on {} {{", fragment.name, fragment.ty.name())?;
            write_indented_lines(&mut state, &printed(&fragment.children), write_node)?;
            state.write("}\n")?;
        }
        Ok(())
    }
}

fn write_node(state: &mut State<'_>, node: &&QueryNode) -> fmt::Result {
    match node.kind {
        NodeKind::Field | NodeKind::Typename => {
            state.write(&node.name)?;
            if !node.variables.is_empty() {
                let arguments: Vec<String> = node
                    .arguments
                    .iter()
                    .zip(&node.variables)
                    .map(|(argument, variable)| format!("{}: ${variable}", argument.name))
                    .collect();
                write!(state, "({})", DisplaySeparated(&arguments))?;
            }
            write_selection_set(state, node)
        }
        NodeKind::Subtype => {
            write!(state, "... on {}", node.ty.name())?;
            write_selection_set(state, node)
        }
        NodeKind::FragmentSpread => write!(state, "... {}", node.name),
        NodeKind::Fragment => Ok(()),
    }
}

fn write_selection_set(state: &mut State<'_>, node: &QueryNode) -> fmt::Result {
    if node.children.is_empty() {
        return Ok(());
    }
    state.write(" {")?;
    write_indented_lines(state, &printed(&node.children), write_node)?;
    state.write("}")
}
