//! Two-phase schema construction.
//!
//! Sources first declare every type with its raw, name-based references. [`SchemaBuilder::build`]
//! then assigns arena slots, resolves every reference and ties interface implementers and union
//! members back to their interfaces and unions.

use std::collections::HashMap;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;

use super::Argument;
use super::EnumType;
use super::Field;
use super::GraphSchema;
use super::GraphType;
use super::InputObjectType;
use super::InterfaceType;
use super::ObjectType;
use super::ScalarType;
use super::TypeDefinition;
use super::TypeId;
use super::TypeRef;
use super::UnionType;
use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// A type reference as written in the source, resolved at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeReference {
    Named(Name),
    List(Box<TypeReference>),
    NonNull(Box<TypeReference>),
}

#[derive(Debug)]
pub(crate) struct PendingField {
    name: Name,
    ty: TypeReference,
    arguments: Vec<(Name, TypeReference)>,
}

#[derive(Debug)]
pub(crate) struct PendingType {
    kind: TypeKind,
    name: Name,
    fields: Vec<PendingField>,
    interfaces: Vec<Name>,
    members: Vec<Name>,
    values: Vec<Name>,
}

impl PendingType {
    pub(crate) fn field(
        &mut self,
        name: Name,
        ty: TypeReference,
        arguments: Vec<(Name, TypeReference)>,
    ) -> &mut Self {
        self.fields.push(PendingField {
            name,
            ty,
            arguments,
        });
        self
    }

    pub(crate) fn implements(&mut self, interface: Name) -> &mut Self {
        self.interfaces.push(interface);
        self
    }

    pub(crate) fn member(&mut self, member: Name) -> &mut Self {
        self.members.push(member);
        self
    }

    pub(crate) fn value(&mut self, value: Name) -> &mut Self {
        self.values.push(value);
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct SchemaBuilder {
    types: IndexMap<Name, PendingType>,
    query_type: Option<Name>,
}

impl SchemaBuilder {
    pub(crate) fn add_type(
        &mut self,
        kind: TypeKind,
        name: Name,
    ) -> Result<&mut PendingType, SchemaError> {
        match self.types.entry(name.clone()) {
            indexmap::map::Entry::Occupied(_) => Err(SchemaError::DuplicateType(name.to_string())),
            indexmap::map::Entry::Vacant(entry) => Ok(entry.insert(PendingType {
                kind,
                name,
                fields: Vec::new(),
                interfaces: Vec::new(),
                members: Vec::new(),
                values: Vec::new(),
            })),
        }
    }

    pub(crate) fn query_type(&mut self, name: Name) {
        self.query_type = Some(name);
    }

    pub(crate) fn build(self) -> Result<GraphSchema, SchemaError> {
        let declared: HashMap<Name, (TypeRef, TypeKind)> = self
            .types
            .values()
            .enumerate()
            .map(|(index, pending)| {
                let ty = TypeRef {
                    id: TypeId(index),
                    name: pending.name.clone(),
                };
                (pending.name.clone(), (ty, pending.kind))
            })
            .collect();
        let resolver = Resolver {
            declared: &declared,
        };

        let mut types = Vec::with_capacity(self.types.len());
        for pending in self.types.values() {
            types.push(resolver.definition(pending)?);
        }

        // Every object lists its interfaces; interfaces learn their implementers from them.
        let implementations: Vec<(TypeId, TypeRef)> = types
            .iter()
            .filter_map(|definition| match definition {
                TypeDefinition::Object(object) => Some(object),
                _ => None,
            })
            .flat_map(|object| {
                let ty = declared[&object.name].0.clone();
                object
                    .implements_interfaces
                    .iter()
                    .map(move |interface| (interface.id, ty.clone()))
            })
            .collect();
        for (interface, object) in implementations {
            if let TypeDefinition::Interface(interface) = &mut types[interface.0] {
                interface.possible_types.insert(object);
            }
        }

        // Union members learn which unions contain them.
        let memberships: Vec<(TypeId, TypeRef)> = types
            .iter()
            .filter_map(|definition| match definition {
                TypeDefinition::Union(union) => Some(union),
                _ => None,
            })
            .flat_map(|union| {
                let ty = declared[&union.name].0.clone();
                union
                    .members
                    .iter()
                    .map(move |member| (member.id, ty.clone()))
            })
            .collect();
        for (member, union) in memberships {
            if let TypeDefinition::Object(object) = &mut types[member.0] {
                object.unions.insert(union);
            }
        }

        let query_name = self
            .query_type
            .unwrap_or_else(|| apollo_compiler::name!("Query"));
        let query_type = match declared.get(&query_name) {
            Some((ty, TypeKind::Object)) => ty.clone(),
            _ => return Err(SchemaError::MissingQueryType),
        };

        let by_name = declared
            .into_iter()
            .map(|(name, (ty, _))| (name, ty.id))
            .collect();
        Ok(GraphSchema {
            types,
            by_name,
            query_type,
        })
    }
}

struct Resolver<'a> {
    declared: &'a HashMap<Name, (TypeRef, TypeKind)>,
}

impl Resolver<'_> {
    fn definition(&self, pending: &PendingType) -> Result<TypeDefinition, SchemaError> {
        let name = pending.name.clone();
        Ok(match pending.kind {
            TypeKind::Scalar => TypeDefinition::Scalar(ScalarType { name }),
            TypeKind::Object => TypeDefinition::Object(ObjectType {
                fields: self.fields(pending)?,
                implements_interfaces: self.interfaces(pending)?,
                unions: IndexSet::new(),
                name,
            }),
            TypeKind::Interface => TypeDefinition::Interface(InterfaceType {
                fields: self.fields(pending)?,
                implements_interfaces: self.interfaces(pending)?,
                possible_types: IndexSet::new(),
                name,
            }),
            TypeKind::Union => TypeDefinition::Union(UnionType {
                members: pending
                    .members
                    .iter()
                    .map(|member| self.named(member, &pending.name, TypeKind::Object, "an object"))
                    .collect::<Result<_, _>>()?,
                name,
            }),
            TypeKind::Enum => TypeDefinition::Enum(EnumType {
                values: pending.values.iter().cloned().collect(),
                name,
            }),
            TypeKind::InputObject => TypeDefinition::InputObject(InputObjectType {
                fields: pending
                    .fields
                    .iter()
                    .map(|field| {
                        let ty = self.resolve(&field.ty, &pending.name)?;
                        let argument = Argument {
                            name: field.name.clone(),
                            ty,
                        };
                        Ok((field.name.clone(), argument))
                    })
                    .collect::<Result<_, SchemaError>>()?,
                name,
            }),
        })
    }

    fn fields(&self, pending: &PendingType) -> Result<IndexMap<Name, Field>, SchemaError> {
        pending
            .fields
            .iter()
            .map(|field| {
                let arguments = field
                    .arguments
                    .iter()
                    .map(|(name, ty)| {
                        let ty = self.resolve(ty, &pending.name)?;
                        Ok((name.clone(), Argument {
                            name: name.clone(),
                            ty,
                        }))
                    })
                    .collect::<Result<_, SchemaError>>()?;
                let field_def = Field {
                    name: field.name.clone(),
                    ty: self.resolve(&field.ty, &pending.name)?,
                    arguments,
                };
                Ok((field.name.clone(), field_def))
            })
            .collect()
    }

    fn interfaces(&self, pending: &PendingType) -> Result<IndexSet<TypeRef>, SchemaError> {
        pending
            .interfaces
            .iter()
            .map(|interface| {
                self.named(interface, &pending.name, TypeKind::Interface, "an interface")
            })
            .collect()
    }

    fn named(
        &self,
        name: &Name,
        referenced_by: &Name,
        kind: TypeKind,
        expected: &str,
    ) -> Result<TypeRef, SchemaError> {
        match self.declared.get(name) {
            Some((ty, declared_kind)) if *declared_kind == kind => Ok(ty.clone()),
            Some(_) => Err(SchemaError::InvalidReference {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
                expected: expected.to_string(),
            }),
            None => Err(SchemaError::UnresolvedType {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            }),
        }
    }

    fn resolve(&self, reference: &TypeReference, owner: &Name) -> Result<GraphType, SchemaError> {
        Ok(match reference {
            TypeReference::List(inner) => GraphType::List(Box::new(self.resolve(inner, owner)?)),
            TypeReference::NonNull(inner) => {
                GraphType::NonNull(Box::new(self.resolve(inner, owner)?))
            }
            TypeReference::Named(name) => {
                let Some((ty, kind)) = self.declared.get(name) else {
                    return Err(SchemaError::UnresolvedType {
                        name: name.to_string(),
                        referenced_by: owner.to_string(),
                    });
                };
                let ty = ty.clone();
                match kind {
                    TypeKind::Scalar => GraphType::Scalar(ty),
                    TypeKind::Object => GraphType::Object(ty),
                    TypeKind::Interface => GraphType::Interface(ty),
                    TypeKind::Union => GraphType::Union(ty),
                    TypeKind::Enum => GraphType::Enum(ty),
                    TypeKind::InputObject => GraphType::InputObject(ty),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    fn named(name: Name) -> TypeReference {
        TypeReference::Named(name)
    }

    #[test]
    fn references_resolve_after_declaration() {
        let mut builder = SchemaBuilder::default();
        builder
            .add_type(TypeKind::Object, name!("Query"))
            .unwrap()
            .field(name!("shape"), named(name!("Shape")), vec![]);
        builder
            .add_type(TypeKind::Object, name!("Circle"))
            .unwrap()
            .implements(name!("Shape"))
            .field(name!("radius"), named(name!("Float")), vec![]);
        builder.add_type(TypeKind::Interface, name!("Shape")).unwrap();
        builder.add_type(TypeKind::Scalar, name!("Float")).unwrap();

        let schema = builder.build().unwrap();
        let shape = schema.type_ref("Shape").unwrap();
        let possible: Vec<_> = schema.possible_types(&shape).collect();
        assert_eq!(possible, [&schema.type_ref("Circle").unwrap()]);
        assert_eq!(schema.query_type().name().as_str(), "Query");
    }

    #[test]
    fn union_members_record_their_unions() {
        let mut builder = SchemaBuilder::default();
        builder
            .add_type(TypeKind::Object, name!("Query"))
            .unwrap()
            .field(name!("media"), named(name!("Media")), vec![]);
        builder
            .add_type(TypeKind::Union, name!("Media"))
            .unwrap()
            .member(name!("Book"))
            .member(name!("Film"));
        builder
            .add_type(TypeKind::Union, name!("Printed"))
            .unwrap()
            .member(name!("Book"));
        builder.add_type(TypeKind::Object, name!("Book")).unwrap();
        builder.add_type(TypeKind::Object, name!("Film")).unwrap();

        let schema = builder.build().unwrap();
        let unions_of = |name: &str| -> Vec<String> {
            schema
                .unions(&schema.type_ref(name).unwrap())
                .map(|union| union.name().to_string())
                .collect()
        };
        assert_eq!(unions_of("Book"), ["Media", "Printed"]);
        assert_eq!(unions_of("Film"), ["Media"]);
        assert!(unions_of("Query").is_empty());
    }

    #[test]
    fn unresolved_reference() {
        let mut builder = SchemaBuilder::default();
        builder
            .add_type(TypeKind::Object, name!("Query"))
            .unwrap()
            .field(name!("missing"), named(name!("Missing")), vec![]);
        assert_eq!(
            builder.build().unwrap_err(),
            SchemaError::UnresolvedType {
                name: "Missing".to_string(),
                referenced_by: "Query".to_string(),
            }
        );
    }

    #[test]
    fn implements_must_name_an_interface() {
        let mut builder = SchemaBuilder::default();
        builder
            .add_type(TypeKind::Object, name!("Query"))
            .unwrap()
            .implements(name!("Query"));
        assert!(matches!(
            builder.build().unwrap_err(),
            SchemaError::InvalidReference { .. }
        ));
    }

    #[test]
    fn duplicate_type() {
        let mut builder = SchemaBuilder::default();
        builder.add_type(TypeKind::Scalar, name!("Date")).unwrap();
        assert_eq!(
            builder
                .add_type(TypeKind::Scalar, name!("Date"))
                .unwrap_err(),
            SchemaError::DuplicateType("Date".to_string())
        );
    }

    #[test]
    fn missing_query_type() {
        let mut builder = SchemaBuilder::default();
        builder.add_type(TypeKind::Scalar, name!("Date")).unwrap();
        assert_eq!(builder.build().unwrap_err(), SchemaError::MissingQueryType);
    }
}
