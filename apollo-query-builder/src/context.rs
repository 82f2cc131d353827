//! Compiles, sends and materializes queries.

use std::sync::Arc;

use crate::compiler::CompiledQuery;
use crate::compiler::Compiler;
use crate::configuration::Configuration;
use crate::error::Error;
use crate::error::MaterializeError;
use crate::error::SchemaError;
use crate::expression::QueryExpression;
use crate::mapping::IdentityNameMapper;
use crate::mapping::Member;
use crate::mapping::MemberNameMapper;
use crate::mapping::TypeNameMapper;
use crate::materializer::Materializer;
use crate::materializer::cache::EntityCache;
use crate::materializer::entity::Value;
use crate::schema::GraphSchema;
use crate::schema::INTROSPECTION_QUERY;
use crate::schema::SchemaSource;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sends query documents to a GraphQL endpoint.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Executes `document` and returns the `data` object of the response.
    async fn send(
        &self,
        document: &str,
        variables: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<serde_json::Value, BoxError>;
}

/// Runs [`QueryExpression`]s against one endpoint.
///
/// Every execution materializes into the same [`EntityCache`], so an entity fetched by two
/// queries is the same [`Entity`](crate::Entity).
#[derive(Clone)]
pub struct QueryContext {
    compiler: Compiler,
    materializer: Materializer,
    transport: Arc<dyn Transport>,
}

impl QueryContext {
    pub fn new(
        schema: &dyn SchemaSource,
        transport: impl Transport + 'static,
    ) -> Result<Self, SchemaError> {
        let schema = schema.schema()?;
        let configuration = Configuration::default();
        Ok(Self {
            compiler: Compiler::new(
                schema.clone(),
                Arc::new(IdentityNameMapper),
                Arc::new(IdentityNameMapper),
                configuration.clone(),
            ),
            materializer: Materializer::new(schema, configuration),
            transport: Arc::new(transport),
        })
    }

    /// Fetches the schema from the endpoint itself.
    pub async fn from_introspection(transport: impl Transport + 'static) -> Result<Self, Error> {
        let data = transport
            .send(INTROSPECTION_QUERY, &serde_json::Map::new())
            .await
            .map_err(|err| Error::Transport(err.to_string()))?;
        let schema = Arc::new(GraphSchema::from_introspection(&data)?);
        Ok(Self::new(&schema, transport)?)
    }

    pub fn with_name_mappers(
        mut self,
        types: Arc<dyn TypeNameMapper>,
        members: Arc<dyn MemberNameMapper>,
    ) -> Self {
        self.compiler = Compiler::new(
            self.compiler.schema().clone(),
            types,
            members,
            self.compiler.configuration().clone(),
        );
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.compiler = Compiler::new(
            self.compiler.schema().clone(),
            self.compiler.type_mapper().clone(),
            self.compiler.member_mapper().clone(),
            configuration.clone(),
        );
        self.materializer.set_configuration(configuration);
        self
    }

    /// Materializes into `cache`, shared with other contexts. Entities are keyed by type name,
    /// so the sharing contexts should use schemas that agree on their type names.
    pub fn with_cache(mut self, cache: Arc<EntityCache>) -> Self {
        self.materializer.set_cache(cache);
        self
    }

    /// See [`Materializer::construct_with`].
    pub fn construct_with(
        mut self,
        abstract_type: &str,
        concrete_type: &str,
    ) -> Result<Self, MaterializeError> {
        self.materializer = self
            .materializer
            .construct_with(abstract_type, concrete_type)?;
        Ok(self)
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        self.materializer.cache()
    }

    pub fn compile(&self, expression: &QueryExpression) -> Result<CompiledQuery, Error> {
        Ok(self.compiler.compile(expression)?)
    }

    /// Compiles and sends `expression`, then materializes the result and applies the
    /// expression's projections to it.
    pub async fn execute(&self, expression: &QueryExpression) -> Result<Value, Error> {
        let compiled = self.compile(expression)?;
        let data = self
            .transport
            .send(&compiled.document, &compiled.variables_json())
            .await
            .map_err(|err| Error::Transport(err.to_string()))?;
        let json = data
            .get(&compiled.entry_point)
            .ok_or_else(|| Error::MissingEntryPoint(compiled.entry_point.clone()))?;
        let value = self.materializer.materialize(json, &compiled.entry_type)?;
        Ok(self.evaluate(expression, value))
    }

    /// Applies `expression` to the materialized result of its root.
    fn evaluate(&self, expression: &QueryExpression, input: Value) -> Value {
        match expression {
            QueryExpression::Root { .. } | QueryExpression::Current => input,
            QueryExpression::Member { target, member } => {
                let target = self.evaluate(target, input);
                self.member(&target, member)
            }
            QueryExpression::Project { source, selector } => {
                match self.evaluate(source, input) {
                    Value::List(items) => Value::List(
                        items
                            .into_iter()
                            .map(|item| self.evaluate(selector, item))
                            .collect(),
                    ),
                    Value::Null => Value::Null,
                    value => self.evaluate(selector, value),
                }
            }
            QueryExpression::ProjectMany { source, selector } => {
                match self.evaluate(source, input) {
                    Value::List(items) => Value::List(
                        items
                            .into_iter()
                            .flat_map(|item| match self.evaluate(selector, item) {
                                Value::List(selected) => selected,
                                Value::Null => Vec::new(),
                                value => vec![value],
                            })
                            .collect(),
                    ),
                    Value::Null => Value::Null,
                    value => self.evaluate(selector, value),
                }
            }
            QueryExpression::Filter { source, .. }
            | QueryExpression::Include { source, .. }
            | QueryExpression::ApplyFragment { source, .. } => self.evaluate(source, input),
            QueryExpression::Cast {
                source,
                domain_type,
            } => {
                let keep = |value: &Value| self.is_instance(value, domain_type);
                match self.evaluate(source, input) {
                    Value::List(items) => Value::List(items.into_iter().filter(keep).collect()),
                    value if keep(&value) => value,
                    _ => Value::Null,
                }
            }
        }
    }

    fn member(&self, target: &Value, member: &Member) -> Value {
        match target {
            Value::Object(entity) => {
                let field_name = self.compiler.member_mapper().field_name(member);
                entity.get_ignore_case(&field_name).unwrap_or(Value::Null)
            }
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.member(item, member))
                    .collect(),
            ),
            Value::Null | Value::Leaf(_) => Value::Null,
        }
    }

    fn is_instance(&self, value: &Value, domain_type: &str) -> bool {
        let Some(entity) = value.as_entity() else {
            return false;
        };
        let schema = self.compiler.schema();
        let type_name = self.compiler.type_mapper().type_name(domain_type);
        schema
            .type_ref(&type_name)
            .is_some_and(|target| schema.is_subtype(&target, entity.type_ref()))
    }
}
