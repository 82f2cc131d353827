//! Compilation of query expressions into query documents.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::configuration::Configuration;
use crate::error::CompileError;
use crate::expression::QueryExpression;
use crate::mapping::ArgumentSource;
use crate::mapping::Member;
use crate::mapping::MemberNameMapper;
use crate::mapping::TypeNameMapper;
use crate::query::Compiled;
use crate::query::NodeKind;
use crate::query::QueryNode;
use crate::query::prune::prune;
use crate::schema::Field;
use crate::schema::GraphSchema;
use crate::schema::GraphType;
use crate::schema::TypeRef;
use crate::variables::VariableBinder;
use crate::variables::VariableBinding;
use crate::variables::to_json;

/// The result of compiling a query expression.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// The query document text.
    pub document: String,
    /// Declared variables, in declaration order.
    pub variables: Vec<VariableBinding>,
    /// Name of the query field the result is found under.
    pub entry_point: String,
    /// Type of that query field.
    pub entry_type: GraphType,
}

impl CompiledQuery {
    /// Variable values keyed by variable name, as sent with the document.
    pub fn variables_json(&self) -> serde_json::Map<String, serde_json::Value> {
        to_json(&self.variables)
    }
}

/// Compiles [`QueryExpression`]s against one schema.
#[derive(Clone)]
pub struct Compiler {
    schema: Arc<GraphSchema>,
    type_mapper: Arc<dyn TypeNameMapper>,
    member_mapper: Arc<dyn MemberNameMapper>,
    configuration: Configuration,
}

/// What the selector parameter stands for.
#[derive(Clone, Copy)]
enum Current<'a> {
    /// Not inside a selector.
    Unbound,
    /// An element of the given type, selected by the enclosing expression.
    Selector(&'a TypeRef),
    /// The fragment being defined.
    Fragment { name: &'a str, ty: &'a GraphType },
}

#[derive(Clone, Copy)]
struct Scope<'a> {
    current: Current<'a>,
    default_scalars: bool,
    /// Arguments for the field selected last.
    arguments: Option<&'a ArgumentSource>,
    depth: usize,
}

impl<'a> Scope<'a> {
    fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    fn without_scalars(self) -> Self {
        Self {
            default_scalars: false,
            ..self
        }
    }

    fn with_arguments(self, arguments: Option<&'a ArgumentSource>) -> Self {
        Self { arguments, ..self }
    }
}

impl Compiler {
    pub fn new(
        schema: Arc<GraphSchema>,
        type_mapper: Arc<dyn TypeNameMapper>,
        member_mapper: Arc<dyn MemberNameMapper>,
        configuration: Configuration,
    ) -> Self {
        Self {
            schema,
            type_mapper,
            member_mapper,
            configuration,
        }
    }

    pub fn schema(&self) -> &Arc<GraphSchema> {
        &self.schema
    }

    pub fn member_mapper(&self) -> &Arc<dyn MemberNameMapper> {
        &self.member_mapper
    }

    pub fn type_mapper(&self) -> &Arc<dyn TypeNameMapper> {
        &self.type_mapper
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[tracing::instrument(skip_all, level = "trace")]
    pub fn compile(&self, expression: &QueryExpression) -> Result<CompiledQuery, CompileError> {
        let scope = Scope {
            current: Current::Unbound,
            default_scalars: self.configuration.default_scalars,
            arguments: None,
            depth: 0,
        };
        let Compiled { root, .. } = self.compile_expression(expression, scope)?;
        if root.kind != NodeKind::Field {
            return Err(CompileError::EmptySelector);
        }
        let entry_point = root.name.clone();
        let entry_type = root.ty.clone();

        let pruned = prune(root, self.configuration.recursion_limit)?;
        let mut binder = VariableBinder::new(self.configuration.variable_prefix.as_str());
        let document = pruned.bind(&mut binder)?.to_string();
        tracing::debug!(
            entry_point = %entry_point,
            variables = binder.variables().len(),
            "compiled query document"
        );
        Ok(CompiledQuery {
            document,
            variables: binder.into_variables(),
            entry_point,
            entry_type,
        })
    }

    fn compile_expression(
        &self,
        expression: &QueryExpression,
        scope: Scope<'_>,
    ) -> Result<Compiled, CompileError> {
        if scope.depth > self.configuration.recursion_limit {
            return Err(CompileError::RecursionLimitExceeded(
                self.configuration.recursion_limit,
            ));
        }
        match expression {
            QueryExpression::Root {
                domain_type,
                entry_point,
            } => {
                let ty = self.resolve_type(domain_type)?;
                let field = self.entry_field(&ty, entry_point.as_deref(), scope.arguments)?;
                Ok(Compiled::new(self.field_node(field, scope)?))
            }
            QueryExpression::Current => match scope.current {
                Current::Fragment { name, ty } => {
                    let mut node = QueryNode::fragment(name, ty.clone());
                    self.expand(&mut node, self.configuration.default_scalars);
                    Ok(Compiled::new(node))
                }
                Current::Unbound | Current::Selector(_) => Err(CompileError::EmptySelector),
            },
            QueryExpression::Member { target, member } => {
                let (source, owner) = match (target.as_ref(), scope.current) {
                    (QueryExpression::Current, Current::Selector(owner)) => (None, owner.clone()),
                    _ => {
                        let inner = scope.nested().without_scalars().with_arguments(None);
                        let source = self.compile_expression(target, inner)?;
                        let owner = source.head().ty.type_ref().clone();
                        (Some(source), owner)
                    }
                };
                let field = self.resolve_member(member, &owner)?;
                let node = Compiled::new(self.field_node(field, scope)?);
                Ok(match source {
                    Some(source) => source.attach(node, true),
                    None => node,
                })
            }
            QueryExpression::Project { source, selector }
            | QueryExpression::ProjectMany { source, selector } => {
                let inner = scope.nested().without_scalars().with_arguments(None);
                let source = self.compile_expression(source, inner)?;
                let owner = source.head().ty.type_ref().clone();
                let selector = self.compile_expression(selector, Scope {
                    current: Current::Selector(&owner),
                    ..scope.nested()
                })?;
                Ok(source.attach(selector, true))
            }
            QueryExpression::Include { source, selector } => {
                let source = self.compile_expression(source, scope.nested())?;
                let owner = source.head().ty.type_ref().clone();
                let selector = self.compile_expression(selector, Scope {
                    current: Current::Selector(&owner),
                    default_scalars: self.configuration.default_scalars,
                    arguments: None,
                    depth: scope.depth + 1,
                })?;
                Ok(source.attach(selector, false))
            }
            QueryExpression::Filter { source, arguments } => {
                self.compile_expression(source, scope.nested().with_arguments(Some(arguments)))
            }
            QueryExpression::Cast {
                source,
                domain_type,
            } => {
                let source = self.compile_expression(source, scope.nested())?;
                let parent = source.head().ty.terminal().clone();
                let target = self.resolve_type(domain_type)?;
                let legal = parent.is_abstract()
                    && (target.is_abstract()
                        || self
                            .schema
                            .is_possible_type(parent.type_ref(), target.type_ref()));
                if !legal {
                    return Err(CompileError::NotAPossibleType {
                        type_name: target.name().to_string(),
                        parent_type: parent.name().to_string(),
                    });
                }
                let mut node = QueryNode::subtype(target);
                self.expand(&mut node, scope.default_scalars);
                Ok(source.attach(Compiled::new(node), true))
            }
            QueryExpression::ApplyFragment { source, fragment } => {
                let source = self.compile_expression(source, scope.nested())?;
                let ty = self.resolve_type(fragment.domain_type())?;
                if !ty.is_composite() {
                    return Err(CompileError::NotAComplexType(ty.name().to_string()));
                }
                let head = source.head().ty.type_ref().clone();
                let applicable = head == *ty.type_ref()
                    || self.schema.is_possible_type(&head, ty.type_ref())
                    || self.schema.is_possible_type(ty.type_ref(), &head);
                if !applicable {
                    return Err(CompileError::NotAPossibleType {
                        type_name: ty.name().to_string(),
                        parent_type: head.name().to_string(),
                    });
                }
                let definition = self.compile_expression(fragment.selection(), Scope {
                    current: Current::Fragment {
                        name: fragment.name(),
                        ty: &ty,
                    },
                    default_scalars: self.configuration.default_scalars,
                    arguments: None,
                    depth: scope.depth + 1,
                })?;
                if definition.root.kind != NodeKind::Fragment {
                    return Err(CompileError::EmptySelector);
                }
                Ok(source.attach(Compiled::new(definition.root), false))
            }
        }
    }

    fn resolve_type(&self, domain_type: &str) -> Result<GraphType, CompileError> {
        let type_name = self.type_mapper.type_name(domain_type);
        self.schema
            .graph_type(&type_name)
            .ok_or_else(|| CompileError::UnknownType {
                domain_type: domain_type.to_string(),
                type_name,
            })
    }

    fn resolve_member(&self, member: &Member, owner: &TypeRef) -> Result<&Field, CompileError> {
        if self.schema.fields(owner).is_none() {
            return Err(CompileError::NotAComplexType(owner.name().to_string()));
        }
        let field_name = self.member_mapper.field_name(member);
        self.schema
            .find_field_ignore_case(owner, &field_name)
            .ok_or_else(|| CompileError::UnmappedMember {
                member: member.name().to_string(),
                declaring_type: member.declaring_type().to_string(),
                graph_type: owner.name().to_string(),
            })
    }

    /// The query field a root reference is fetched through.
    ///
    /// Without an explicit name, the field must return the type and take exactly the
    /// arguments the filter provides (none without a filter).
    fn entry_field(
        &self,
        ty: &GraphType,
        entry_point: Option<&str>,
        arguments: Option<&ArgumentSource>,
    ) -> Result<&Field, CompileError> {
        let query = self.schema.query_type();
        let target = ty.type_ref();
        if let Some(entry_point) = entry_point {
            return self
                .schema
                .find_field_ignore_case(query, entry_point)
                .filter(|field| field.ty.type_ref() == target)
                .ok_or_else(|| CompileError::InvalidEntryPoint {
                    entry_point: entry_point.to_string(),
                    type_name: target.name().to_string(),
                });
        }

        let candidates = self
            .schema
            .fields(query)
            .into_iter()
            .flat_map(IndexMap::values)
            .filter(|field| field.ty.type_ref() == target);
        let (matching, details): (Vec<&Field>, String) = match arguments {
            None => (
                candidates
                    .filter(|field| field.arguments.is_empty())
                    .collect(),
                " without arguments".to_string(),
            ),
            Some(source) => {
                let provided: BTreeSet<String> = source.fields().into_iter().collect();
                let matching = candidates
                    .filter(|field| {
                        field.arguments.len() == provided.len()
                            && field
                                .arguments
                                .keys()
                                .all(|argument| provided.contains(argument.as_str()))
                    })
                    .collect();
                let provided: Vec<String> = provided.into_iter().collect();
                (matching, format!(" with arguments ({})", provided.join(", ")))
            }
        };
        match matching.as_slice() {
            [field] => Ok(*field),
            [] => Err(CompileError::NoEntryPoint {
                type_name: target.name().to_string(),
                details,
            }),
            several => Err(CompileError::AmbiguousEntryPoint {
                type_name: target.name().to_string(),
                candidates: several
                    .iter()
                    .map(|field| field.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn field_node(&self, field: &Field, scope: Scope<'_>) -> Result<QueryNode, CompileError> {
        let argument_source = if field.arguments.is_empty() {
            None
        } else {
            Some(
                scope
                    .arguments
                    .cloned()
                    .ok_or_else(|| CompileError::MissingArgumentSource {
                        field: field.name.to_string(),
                    })?,
            )
        };
        let mut node = QueryNode::field(
            field.name.as_str(),
            field.ty.clone(),
            field.arguments.values().cloned().collect(),
            argument_source,
        );
        if field.ty.is_composite() {
            self.expand(&mut node, scope.default_scalars);
        }
        Ok(node)
    }

    /// Adds the leaf fields of the node's type and, for abstract types, the discriminator and
    /// one subtype per concrete type and per interface those types share.
    fn expand(&self, node: &mut QueryNode, default_scalars: bool) {
        let ty = node.ty.type_ref().clone();
        if default_scalars {
            node.children.extend(self.leaf_fields(&ty));
        }
        if !node.ty.is_abstract() {
            return;
        }
        node.children
            .push(QueryNode::typename(node.ty.terminal().clone()));
        let possible_types: Vec<TypeRef> = self.schema.possible_types(&ty).cloned().collect();
        let mut shared_interfaces: IndexMap<TypeRef, usize> = IndexMap::new();
        for object in &possible_types {
            let mut subtype = QueryNode::subtype(GraphType::Object(object.clone()));
            if default_scalars {
                subtype.children.extend(self.leaf_fields(object));
            }
            node.children.push(subtype);
            for interface in self.schema.interfaces(object) {
                if *interface != ty {
                    *shared_interfaces.entry(interface.clone()).or_default() += 1;
                }
            }
        }
        for (interface, implementers) in shared_interfaces {
            if implementers < 2 {
                continue;
            }
            let mut subtype = QueryNode::subtype(GraphType::Interface(interface.clone()));
            if default_scalars {
                subtype.children.extend(self.leaf_fields(&interface));
            }
            node.children.push(subtype);
        }
    }

    fn leaf_fields(&self, ty: &TypeRef) -> Vec<QueryNode> {
        self.schema
            .fields(ty)
            .into_iter()
            .flat_map(IndexMap::values)
            .filter(|field| field.ty.is_leaf() && field.arguments.is_empty())
            .map(|field| QueryNode::field(field.name.as_str(), field.ty.clone(), vec![], None))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::error::BindError;
    use crate::expression::Fragment;
    use crate::expression::member;
    use crate::mapping::IdentityNameMapper;
    use crate::mapping::MappedNames;

    const SCHEMA: &str = r#"
        type Query {
          schemas(productId: Int!): [DrawSchema!]!
          product(id: ID!): Product
          products: [Product!]!
          shapes: [Shape]
          orphans: [Orphan]
          nodes: [Node]
          featured: [Node]
        }

        type DrawSchema {
          id: ID!
          name: String
          items: [DrawSchemaItem!]!
        }

        type DrawSchemaItem {
          id: ID!
          position: Int
          template: Template
        }

        interface Template {
          id: ID!
          name: String
        }

        type TextTemplate implements Template {
          id: ID!
          name: String
          fontFamily: String
        }

        type ImageTemplate implements Template {
          id: ID!
          name: String
          url(size: Int): String
        }

        type Product {
          id: ID!
          title: String
          kind: Kind
          related(limit: Int!): [Product]
        }

        enum Kind { BOOK FILM }

        union Shape = Circle | Square
        type Circle { radius: Float }
        type Square { side: Float }

        interface Orphan { id: ID! }

        interface Node { id: ID! }
        interface Named implements Node { id: ID! name: String }
        type Person implements Node & Named { id: ID! name: String age: Int }
        type Place implements Node & Named { id: ID! name: String }
    "#;

    fn compiler() -> Compiler {
        let schema = Arc::new(GraphSchema::parse_sdl(SCHEMA).unwrap());
        Compiler::new(
            schema,
            Arc::new(IdentityNameMapper),
            Arc::new(IdentityNameMapper),
            Configuration::default(),
        )
    }

    fn source(value: serde_json::Value) -> ArgumentSource {
        ArgumentSource::from_serialize(&value).unwrap()
    }

    #[test]
    fn schemas_with_items_and_templates() {
        let query = QueryExpression::root("DrawSchema")
            .filter(source(json!({ "productId": 12 })))
            .include(
                member("DrawSchema", "items").include(member("DrawSchemaItem", "template")),
            );
        let compiled = compiler().compile(&query).unwrap();
        assert_eq!(compiled.entry_point, "schemas");
        assert_eq!(compiled.variables_json(), *json!({ "var_0": 12 }).as_object().unwrap());
        insta::assert_snapshot!(compiled.document, @r###"
        query($var_0: Int!) {
          schemas(productId: $var_0) {
            id
            name
            items {
              id
              position
              template {
                id
                name
                __typename
                ... on TextTemplate {
                  fontFamily
                }
              }
            }
          }
        }
        "###);
    }

    #[test]
    fn project_narrows_the_selection() {
        let query = QueryExpression::root("Product").project(member("Product", "title"));
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query {
          products {
            title
          }
        }
        "###);
    }

    #[test]
    fn filter_applies_to_the_projected_field() {
        let filter = source(json!({ "limit": 3 }));
        let query = QueryExpression::root("Product")
            .project_many(member("Product", "related"))
            .filter(filter);
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query($var_0: Int!) {
          products {
            related(limit: $var_0) {
              id
              title
              kind
            }
          }
        }
        "###);
    }

    #[test]
    fn entry_point_matches_filter_members() {
        let query = QueryExpression::root("Product").filter(source(json!({ "id": "7" })));
        let compiled = compiler().compile(&query).unwrap();
        assert_eq!(compiled.entry_point, "product");
        assert_eq!(compiled.variables[0].ty.to_string(), "ID!");
    }

    #[test]
    fn explicit_entry_point() {
        let query = QueryExpression::root_with_entry_point("Node", "Featured");
        let compiled = compiler().compile(&query).unwrap();
        assert_eq!(compiled.entry_point, "featured");
    }

    #[test]
    fn shared_interfaces_get_their_own_subtype() {
        let query = QueryExpression::root_with_entry_point("Node", "nodes");
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query {
          nodes {
            id
            __typename
            ... on Person {
              name
              age
            }
            ... on Place {
              name
            }
            ... on Named {
              name
            }
          }
        }
        "###);
    }

    #[test]
    fn zero_implementers_select_the_discriminator() {
        let query = QueryExpression::root("Orphan");
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query {
          orphans {
            id
            __typename
          }
        }
        "###);
    }

    #[test]
    fn cast_keeps_every_subtype_selection() {
        let query = QueryExpression::root("Shape").cast("Circle");
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query {
          shapes {
            __typename
            ... on Circle {
              radius
            }
            ... on Square {
              side
            }
          }
        }
        "###);
    }

    #[test]
    fn fragments_replace_repeated_selections() {
        let template = Fragment::new("TemplateFields", "Template", |q| q);
        let query = QueryExpression::root("DrawSchema")
            .filter(source(json!({ "productId": 1 })))
            .include(
                member("DrawSchema", "items")
                    .include(member("DrawSchemaItem", "template").apply_fragment(template)),
            );
        let compiled = compiler().compile(&query).unwrap();
        insta::assert_snapshot!(compiled.document, @r###"
        query($var_0: Int!) {
          schemas(productId: $var_0) {
            id
            name
            items {
              id
              position
              template {
                ... TemplateFields
              }
            }
          }
        }

        fragment TemplateFields on Template {
          id
          name
          __typename
          ... on TextTemplate {
            fontFamily
          }
        }
        "###);
    }

    #[test]
    fn recompilation_is_identical() {
        let filter = source(json!({ "productId": 1 }));
        let query = QueryExpression::root("DrawSchema")
            .filter(filter)
            .include(member("DrawSchema", "items"));
        let compiler = compiler();
        let first = compiler.compile(&query).unwrap();
        let second = compiler.compile(&query).unwrap();
        assert_eq!(first.document, second.document);
        assert_eq!(first.entry_point, second.entry_point);
    }

    #[test]
    fn repeated_includes_render_once() {
        let filter = source(json!({ "productId": 1 }));
        let once = QueryExpression::root("DrawSchema")
            .filter(filter.clone())
            .include(member("DrawSchema", "items"));
        let twice = once.clone().include(member("DrawSchema", "items"));
        let compiler = compiler();
        assert_eq!(
            compiler.compile(&once).unwrap().document,
            compiler.compile(&twice).unwrap().document
        );
    }

    #[test]
    fn mapped_names() {
        let schema = Arc::new(GraphSchema::parse_sdl(SCHEMA).unwrap());
        let names = Arc::new(
            MappedNames::default()
                .with_type("Article", "Product")
                .with_field("Article", "headline", "title"),
        );
        let compiler = Compiler::new(schema, names.clone(), names, Configuration::default());
        let query = QueryExpression::root("Article").project(member("Article", "headline"));
        assert!(compiler.compile(&query).unwrap().document.contains("title"));
    }

    #[test]
    fn variable_prefix_is_configurable() {
        let schema = Arc::new(GraphSchema::parse_sdl(SCHEMA).unwrap());
        let configuration = Configuration {
            variable_prefix: "p".to_string(),
            ..Configuration::default()
        };
        let compiler = Compiler::new(
            schema,
            Arc::new(IdentityNameMapper),
            Arc::new(IdentityNameMapper),
            configuration,
        );
        let query = QueryExpression::root("DrawSchema").filter(source(json!({ "productId": 1 })));
        let compiled = compiler.compile(&query).unwrap();
        assert!(compiled.document.starts_with("query($p0: Int!) {"));
    }

    #[rstest]
    #[case::unknown_type(
        QueryExpression::root("Missing"),
        CompileError::UnknownType { domain_type: "Missing".into(), type_name: "Missing".into() }
    )]
    #[case::unmapped_member(
        QueryExpression::root("Product").project(member("Product", "price")),
        CompileError::UnmappedMember {
            member: "price".into(),
            declaring_type: "Product".into(),
            graph_type: "Product".into(),
        }
    )]
    #[case::member_of_a_leaf(
        QueryExpression::root("Product")
            .project(member("Product", "title").member("String", "length")),
        CompileError::NotAComplexType("String".into())
    )]
    #[case::cast_to_unrelated_type(
        QueryExpression::root("Shape").cast("Product"),
        CompileError::NotAPossibleType { type_name: "Product".into(), parent_type: "Shape".into() }
    )]
    #[case::cast_of_concrete_type(
        QueryExpression::root("Product").cast("Product"),
        CompileError::NotAPossibleType { type_name: "Product".into(), parent_type: "Product".into() }
    )]
    #[case::missing_argument_source(
        QueryExpression::root("Product").project(member("Product", "related")),
        CompileError::MissingArgumentSource { field: "related".into() }
    )]
    #[case::no_entry_point(
        QueryExpression::root("Circle"),
        CompileError::NoEntryPoint { type_name: "Circle".into(), details: " without arguments".into() }
    )]
    #[case::ambiguous_entry_point(
        QueryExpression::root("Node"),
        CompileError::AmbiguousEntryPoint { type_name: "Node".into(), candidates: "nodes, featured".into() }
    )]
    #[case::invalid_entry_point(
        QueryExpression::root_with_entry_point("Product", "shapes"),
        CompileError::InvalidEntryPoint { entry_point: "shapes".into(), type_name: "Product".into() }
    )]
    #[case::empty_selector(
        QueryExpression::root("Product").project(QueryExpression::current()),
        CompileError::EmptySelector
    )]
    #[case::conflicting_arguments(
        QueryExpression::root("Product")
            .include(member("Product", "related").filter(
                ArgumentSource::from_serialize(&json!({ "limit": 1 })).unwrap()
            ))
            .include(member("Product", "related").filter(
                ArgumentSource::from_serialize(&json!({ "limit": 2 })).unwrap()
            )),
        CompileError::ConflictingArguments { field: "related".into() }
    )]
    #[case::filter_without_matching_entry_point(
        QueryExpression::root("DrawSchema").filter(
            ArgumentSource::from_serialize(&json!({ "productid": 1 })).unwrap()
        ),
        CompileError::NoEntryPoint {
            type_name: "DrawSchema".into(),
            details: " with arguments (productid)".into(),
        }
    )]
    #[case::unresolved_argument(
        QueryExpression::root_with_entry_point("DrawSchema", "schemas").filter(
            ArgumentSource::from_serialize(&json!({ "id": 1 })).unwrap()
        ),
        CompileError::Bind(BindError::ArgumentResolution { argument: "productId".into() })
    )]
    fn compile_errors(#[case] query: QueryExpression, #[case] expected: CompileError) {
        assert_eq!(compiler().compile(&query).unwrap_err(), expected);
    }

    #[test]
    fn fragment_of_unrelated_type() {
        let fragment = Fragment::new("ShapeFields", "Shape", |q| q);
        let query = QueryExpression::root("Product").apply_fragment(fragment);
        assert_eq!(
            compiler().compile(&query).unwrap_err(),
            CompileError::NotAPossibleType {
                type_name: "Shape".into(),
                parent_type: "Product".into(),
            }
        );
    }

    #[test]
    fn projection_of_object_without_leaves_is_empty() {
        let schema = Arc::new(
            GraphSchema::parse_sdl("type Query { boxes: [Box] } type Box { inner: Box }").unwrap(),
        );
        let compiler = Compiler::new(
            schema,
            Arc::new(IdentityNameMapper),
            Arc::new(IdentityNameMapper),
            Configuration::default(),
        );
        assert_eq!(
            compiler.compile(&QueryExpression::root("Box")).unwrap_err(),
            CompileError::EmptySelection("boxes".into())
        );
    }

    #[test]
    fn recursion_limit() {
        let schema = Arc::new(GraphSchema::parse_sdl(SCHEMA).unwrap());
        let configuration = Configuration {
            recursion_limit: 4,
            ..Configuration::default()
        };
        let compiler = Compiler::new(
            schema,
            Arc::new(IdentityNameMapper),
            Arc::new(IdentityNameMapper),
            configuration,
        );
        let mut selector = member("DrawSchema", "items");
        for _ in 0..8 {
            selector = selector.include(member("DrawSchemaItem", "template"));
        }
        let query = QueryExpression::root("DrawSchema")
            .filter(source(json!({ "productId": 1 })))
            .include(selector);
        assert_eq!(
            compiler.compile(&query).unwrap_err(),
            CompileError::RecursionLimitExceeded(4)
        );
    }
}
