use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;

use super::GraphSchema;
use super::builder::SchemaBuilder;
use super::builder::TypeKind;
use super::builder::TypeReference;
use crate::error::SchemaError;

impl GraphSchema {
    /// Builds a schema from SDL.
    ///
    /// Introspection types (`__Schema`, `__Type`, ...) are not part of the result. The query
    /// root is the type named by `schema { query }`, or `Query`.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn parse_sdl(sdl: &str) -> Result<Self, SchemaError> {
        let schema = apollo_compiler::Schema::parse(sdl, "schema.graphql")
            .map_err(|invalid| SchemaError::Parse(invalid.errors.to_string()))?;

        let mut builder = SchemaBuilder::default();
        for (name, ty) in &schema.types {
            if name.starts_with("__") {
                continue;
            }
            match ty {
                ExtendedType::Scalar(_) => {
                    builder.add_type(TypeKind::Scalar, name.clone())?;
                }
                ExtendedType::Object(object) => {
                    let pending = builder.add_type(TypeKind::Object, name.clone())?;
                    for interface in &object.implements_interfaces {
                        pending.implements(interface.name.clone());
                    }
                    for field in object.fields.values() {
                        pending.field(
                            field.name.clone(),
                            type_reference(&field.ty),
                            arguments(&field.arguments),
                        );
                    }
                }
                ExtendedType::Interface(interface) => {
                    let pending = builder.add_type(TypeKind::Interface, name.clone())?;
                    for implemented in &interface.implements_interfaces {
                        pending.implements(implemented.name.clone());
                    }
                    for field in interface.fields.values() {
                        pending.field(
                            field.name.clone(),
                            type_reference(&field.ty),
                            arguments(&field.arguments),
                        );
                    }
                }
                ExtendedType::Union(union_) => {
                    let pending = builder.add_type(TypeKind::Union, name.clone())?;
                    for member in &union_.members {
                        pending.member(member.name.clone());
                    }
                }
                ExtendedType::Enum(enum_) => {
                    let pending = builder.add_type(TypeKind::Enum, name.clone())?;
                    for value in enum_.values.keys() {
                        pending.value(value.clone());
                    }
                }
                ExtendedType::InputObject(input) => {
                    let pending = builder.add_type(TypeKind::InputObject, name.clone())?;
                    for field in input.fields.values() {
                        pending.field(field.name.clone(), type_reference(&field.ty), Vec::new());
                    }
                }
            }
        }
        if let Some(query) = &schema.schema_definition.query {
            builder.query_type(query.name.clone());
        }
        builder.build()
    }
}

fn arguments(
    arguments: &[apollo_compiler::Node<ast::InputValueDefinition>],
) -> Vec<(apollo_compiler::Name, TypeReference)> {
    arguments
        .iter()
        .map(|argument| (argument.name.clone(), type_reference(&argument.ty)))
        .collect()
}

fn type_reference(ty: &ast::Type) -> TypeReference {
    match ty {
        ast::Type::Named(name) => TypeReference::Named(name.clone()),
        ast::Type::NonNullNamed(name) => {
            TypeReference::NonNull(Box::new(TypeReference::Named(name.clone())))
        }
        ast::Type::List(inner) => TypeReference::List(Box::new(type_reference(inner))),
        ast::Type::NonNullList(inner) => TypeReference::NonNull(Box::new(TypeReference::List(
            Box::new(type_reference(inner)),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeDefinition;

    #[test]
    fn explicit_query_root() {
        let schema = GraphSchema::parse_sdl(
            r#"
            schema { query: Root }
            type Root { version: String }
            "#,
        )
        .unwrap();
        assert_eq!(schema.query_type().name().as_str(), "Root");
    }

    #[test]
    fn introspection_types_are_skipped() {
        let schema = GraphSchema::parse_sdl("type Query { version: String }").unwrap();
        assert!(schema.type_by_name("__Schema").is_none());
        assert!(matches!(
            schema.type_by_name("String"),
            Some(TypeDefinition::Scalar(_))
        ));
    }

    #[test]
    fn wrappers_are_preserved() {
        let schema =
            GraphSchema::parse_sdl("type Query { matrix(size: Int!): [[Int!]]! }").unwrap();
        let field = schema.field(schema.query_type(), "matrix").unwrap();
        assert_eq!(field.ty.to_string(), "[[Int!]]!");
        assert_eq!(field.arguments["size"].ty.to_string(), "Int!");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = GraphSchema::parse_sdl("type Query {").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }
}
