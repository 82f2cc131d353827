//! Binding of filter arguments to query variables.

use indexmap::IndexMap;

use crate::error::BindError;
use crate::mapping::ArgumentSource;
use crate::schema::Argument;
use crate::schema::GraphType;

/// A declared query variable and the value it is sent with.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBinding {
    pub name: String,
    pub ty: GraphType,
    pub value: serde_json::Value,
}

/// Assigns one variable per (argument source, argument name) pair, in first-use order.
pub(crate) struct VariableBinder {
    prefix: String,
    by_argument: IndexMap<(usize, String), usize>,
    bindings: Vec<VariableBinding>,
    // Keeps every bound source alive so its address cannot be reused by another source.
    sources: Vec<ArgumentSource>,
}

impl VariableBinder {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            by_argument: IndexMap::new(),
            bindings: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Returns the variable bound to `argument` of `source`, binding it on first use.
    pub(crate) fn bind(
        &mut self,
        source: &ArgumentSource,
        argument: &Argument,
    ) -> Result<&str, BindError> {
        let key = (source.identity(), argument.name.to_string());
        let index = match self.by_argument.get(&key) {
            Some(index) => *index,
            None => {
                let value =
                    source
                        .value(&argument.name)
                        .ok_or_else(|| BindError::ArgumentResolution {
                            argument: argument.name.to_string(),
                        })?;
                let index = self.bindings.len();
                self.bindings.push(VariableBinding {
                    name: format!("{}{}", self.prefix, index),
                    ty: argument.ty.clone(),
                    value,
                });
                if !self.sources.iter().any(|bound| bound.same_as(source)) {
                    self.sources.push(source.clone());
                }
                self.by_argument.insert(key, index);
                index
            }
        };
        Ok(&self.bindings[index].name)
    }

    pub(crate) fn variables(&self) -> &[VariableBinding] {
        &self.bindings
    }

    pub(crate) fn into_variables(self) -> Vec<VariableBinding> {
        self.bindings
    }
}

/// The JSON object sent along with the document.
pub(crate) fn to_json(bindings: &[VariableBinding]) -> serde_json::Map<String, serde_json::Value> {
    bindings
        .iter()
        .map(|binding| (binding.name.clone(), binding.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::GraphSchema;

    fn argument(name: &str) -> Argument {
        let schema =
            GraphSchema::parse_sdl("type Query { product(productId: Int!, name: String): Int }")
                .unwrap();
        schema
            .field(schema.query_type(), "product")
            .unwrap()
            .arguments[name]
            .clone()
    }

    fn source(value: serde_json::Value) -> ArgumentSource {
        ArgumentSource::from_serialize(&value).unwrap()
    }

    #[test]
    fn same_source_same_variable() {
        let mut binder = VariableBinder::new("var_");
        let filter = source(json!({ "productId": 1, "name": "a" }));
        assert_eq!(binder.bind(&filter, &argument("productId")).unwrap(), "var_0");
        assert_eq!(binder.bind(&filter, &argument("name")).unwrap(), "var_1");
        assert_eq!(binder.bind(&filter.clone(), &argument("productId")).unwrap(), "var_0");
        assert_eq!(binder.variables().len(), 2);
        assert_eq!(binder.variables()[0].ty.to_string(), "Int!");
    }

    #[test]
    fn equal_sources_get_distinct_variables() {
        let mut binder = VariableBinder::new("p");
        let first = source(json!({ "productId": 1 }));
        let second = source(json!({ "productId": 1 }));
        assert_eq!(binder.bind(&first, &argument("productId")).unwrap(), "p0");
        assert_eq!(binder.bind(&second, &argument("productId")).unwrap(), "p1");
        assert_eq!(
            to_json(&binder.into_variables()),
            json!({ "p0": 1, "p1": 1 }).as_object().unwrap().clone()
        );
    }

    #[test]
    fn missing_member() {
        let mut binder = VariableBinder::new("var_");
        let filter = source(json!({ "id": 1 }));
        assert_eq!(
            binder.bind(&filter, &argument("productId")).unwrap_err(),
            BindError::ArgumentResolution {
                argument: "productId".to_string()
            }
        );
        assert!(binder.variables().is_empty());
    }
}
