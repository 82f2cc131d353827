use std::sync::Arc;

use apollo_query_builder::Configuration;
use apollo_query_builder::EntityCache;
use apollo_query_builder::Error;
use apollo_query_builder::Materializer;
use apollo_query_builder::QueryExpression;
use apollo_query_builder::Value;
use apollo_query_builder::error::MaterializeError;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::context::Replies;
use crate::context::context;
use crate::context::schema;

fn people() -> apollo_query_builder::GraphType {
    schema()
        .field(schema().query_type(), "people")
        .unwrap()
        .ty
        .clone()
}

#[test]
fn siblings_share_one_entity() {
    let materializer = Materializer::new(schema(), Configuration::default());
    let value = materializer
        .materialize(
            &json!([
                { "id": "1", "name": "Ada", "friends": [{ "id": "2" }] },
                { "id": "3", "friends": [{ "id": "2", "name": "Grace" }] },
            ]),
            &people(),
        )
        .unwrap();
    let people = value.as_list().unwrap();
    let friend = |index: usize| {
        let friends = people[index].as_entity().unwrap().get("friends").unwrap();
        friends.as_list().unwrap()[0].as_entity().unwrap().clone()
    };
    assert!(friend(0).ptr_eq(&friend(1)));
    assert_eq!(friend(0).get("name").unwrap().as_str(), Some("Grace"));
}

#[test]
fn shared_cache_keeps_identity_across_queries() {
    let cache = Arc::new(EntityCache::new());
    let first = Materializer::with_cache(schema(), Configuration::default(), cache.clone());
    let second = Materializer::with_cache(schema(), Configuration::default(), cache.clone());
    let a = first
        .materialize(&json!([{ "id": "1", "name": "Ada" }]), &people())
        .unwrap();
    let b = second
        .materialize(&json!([{ "id": "1" }]), &people())
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(cache.len(), 1);

    let fresh = Materializer::new(schema(), Configuration::default());
    let c = fresh
        .materialize(&json!([{ "id": "1" }]), &people())
        .unwrap();
    assert_ne!(a, c);
}

#[test]
fn cycles_terminate() {
    let materializer = Materializer::new(schema(), Configuration::default());
    let value = materializer
        .materialize(
            &json!([{
                "id": "1",
                "friends": [{ "id": "2", "friends": [{ "id": "1", "name": "Ada" }] }],
            }]),
            &people(),
        )
        .unwrap();
    let ada = value.as_list().unwrap()[0].as_entity().unwrap().clone();
    let friends_of = |value: Value| value.as_list().unwrap()[0].as_entity().unwrap().clone();
    let grace = friends_of(ada.get("friends").unwrap());
    let back = friends_of(grace.get("friends").unwrap());
    assert!(back.ptr_eq(&ada));
    assert_eq!(ada.get("name").unwrap().as_str(), Some("Ada"));
    assert_eq!(
        format!("{ada:?}"),
        r#"Entity { type: "Person", fields: ["id", "name", "friends"] }"#
    );
}

#[test]
fn recursion_limit_bounds_nesting() {
    let configuration = Configuration {
        recursion_limit: 3,
        ..Configuration::default()
    };
    let materializer = Materializer::new(schema(), configuration);
    let nested = json!([{ "friends": [{ "friends": [{ "friends": [{ "name": "deep" }] }] }] }]);
    assert_eq!(
        materializer.materialize(&nested, &people()).unwrap_err(),
        MaterializeError::RecursionLimitExceeded(3)
    );
}

#[tokio::test]
async fn zero_implementers() {
    let replies = Replies::new([json!({ "orphans": [] }), json!({ "orphans": null })]);
    let context = context(&replies);
    let query = QueryExpression::root("Orphan");
    assert_eq!(context.execute(&query).await.unwrap(), Value::List(vec![]));
    assert_eq!(context.execute(&query).await.unwrap(), Value::Null);
    let document = replies.documents.lock()[0].clone();
    insta::assert_snapshot!(document, @r###"
    query {
      orphans {
        id
        __typename
      }
    }
    "###);
}

#[tokio::test]
async fn execution_reports_materialization_errors() {
    let replies = Replies::new([json!({
        "templates": [{ "__typename": "VideoTemplate", "id": "1" }],
    })]);
    let context = context(&replies);
    assert_eq!(
        context
            .execute(&QueryExpression::root("Template"))
            .await
            .unwrap_err(),
        Error::Materialize(MaterializeError::UnknownDiscriminator(
            "VideoTemplate".to_string()
        ))
    );
}

#[tokio::test]
async fn cast_keeps_matching_entities() {
    let replies = Replies::new([json!({
        "templates": [
            { "__typename": "TextTemplate", "id": "1", "fontFamily": "serif" },
            { "__typename": "ImageTemplate", "id": "2", "width": 10 },
            null,
        ],
    })]);
    let context = context(&replies);
    let texts = context
        .execute(&QueryExpression::root("Template").cast("TextTemplate"))
        .await
        .unwrap();
    let texts = texts.as_list().unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        texts[0].as_entity().unwrap().type_name().as_str(),
        "TextTemplate"
    );
}
