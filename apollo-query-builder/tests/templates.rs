use std::sync::Arc;

use apollo_query_builder::ArgumentSource;
use apollo_query_builder::Entity;
use apollo_query_builder::GraphSchema;
use apollo_query_builder::QueryContext;
use apollo_query_builder::QueryExpression;
use apollo_query_builder::Value;
use apollo_query_builder::member;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::context::Replies;
use crate::context::context;

fn schemas_with_templates(product_id: i64) -> QueryExpression {
    QueryExpression::root("DrawSchema")
        .filter(ArgumentSource::from_serialize(&json!({ "productId": product_id })).unwrap())
        .include(member("DrawSchema", "items").include(member("DrawSchemaItem", "template")))
}

fn entities(value: &Value) -> Vec<Entity> {
    value
        .as_list()
        .unwrap()
        .iter()
        .map(|value| value.as_entity().unwrap().clone())
        .collect()
}

fn field(entity: &Entity, name: &str) -> Value {
    entity.get(name).unwrap()
}

#[tokio::test]
async fn refetching_repopulates_the_same_graph() {
    let first = json!({
        "schemas": [{
            "id": "1",
            "name": "Main",
            "items": [
                {
                    "id": "10",
                    "position": 0,
                    "template": {
                        "__typename": "TextTemplate",
                        "id": "100",
                        "name": "Title",
                        "fontFamily": "serif",
                    },
                },
                {
                    "id": "11",
                    "position": 1,
                    "template": { "__typename": "ImageTemplate", "id": "101", "name": "Logo" },
                },
            ],
        }],
    });
    let second = json!({
        "schemas": [{
            "id": "1",
            "name": "Main",
            "items": [
                {
                    "id": "11",
                    "position": 0,
                    "template": { "__typename": "ImageTemplate", "id": "101", "name": "Logo" },
                },
                {
                    "id": "10",
                    "position": 1,
                    "template": {
                        "__typename": "TextTemplate",
                        "id": "100",
                        "name": "Title",
                        "fontFamily": "sans",
                    },
                },
            ],
        }],
    });
    let replies = Replies::new([first, second]);
    let context = context(&replies);

    let before = context.execute(&schemas_with_templates(7)).await.unwrap();
    let schema = entities(&before).remove(0);
    let items = entities(&field(&schema, "items"));
    assert_eq!(items.len(), 2);
    let text = field(&items[0], "template").as_entity().unwrap().clone();
    assert_eq!(text.type_name().as_str(), "TextTemplate");
    assert_eq!(field(&text, "fontFamily").as_str(), Some("serif"));

    let after = context.execute(&schemas_with_templates(7)).await.unwrap();
    let refetched = entities(&after).remove(0);
    assert!(refetched.ptr_eq(&schema));
    let reordered = entities(&field(&schema, "items"));
    assert_eq!(reordered.len(), 2);
    assert!(reordered[1].ptr_eq(&items[0]));
    assert!(reordered[0].ptr_eq(&items[1]));
    assert_eq!(field(&items[0], "position").as_leaf(), Some(&json!(1)));
    assert_eq!(field(&text, "fontFamily").as_str(), Some("sans"));

    let documents = replies.documents.lock();
    assert_eq!(documents[0], documents[1]);
}

#[tokio::test]
async fn templates_are_registered_under_their_interface() {
    let replies = Replies::new([json!({
        "schemas": [{
            "id": "1",
            "items": [{
                "id": "10",
                "template": { "__typename": "ImageTemplate", "id": "101", "width": 40 },
            }],
        }],
    })]);
    let context = context(&replies);
    let value = context.execute(&schemas_with_templates(1)).await.unwrap();
    let item = entities(&field(&entities(&value)[0], "items")).remove(0);
    let template = field(&item, "template").as_entity().unwrap().clone();

    // DrawSchema, DrawSchemaItem, and the template under ImageTemplate and Template.
    assert_eq!(context.cache().len(), 4);
    assert_eq!(field(&template, "width").as_leaf(), Some(&json!(40)));
}

#[tokio::test]
async fn included_templates_are_the_queried_templates() {
    let schema = Arc::new(
        GraphSchema::parse_sdl(
            r#"
            type Schema { items: [Item] }
            type Item { template: Template! }
            type Template { id: ID }
            type Query { schemas: [Schema] templates: [Template] }
            "#,
        )
        .unwrap(),
    );
    let replies = Replies::new([
        json!({
            "schemas": [{
                "items": [{ "template": { "id": "0" } }, { "template": { "id": "0" } }],
            }],
        }),
        json!({ "templates": [{ "id": "0" }] }),
    ]);
    let context = QueryContext::new(&schema, replies.clone()).unwrap();

    let schemas = context
        .execute(
            &QueryExpression::root("Schema")
                .include(member("Schema", "items").include(member("Item", "template"))),
        )
        .await
        .unwrap();
    let templates = context
        .execute(&QueryExpression::root("Template"))
        .await
        .unwrap();

    let items = entities(&field(&entities(&schemas)[0], "items"));
    let first = field(&items[0], "template").as_entity().unwrap().clone();
    let second = field(&items[1], "template").as_entity().unwrap().clone();
    let queried = entities(&templates).remove(0);
    assert!(first.ptr_eq(&second));
    assert!(first.ptr_eq(&queried));

    let documents = replies.documents.lock();
    insta::assert_snapshot!(documents[0].as_str(), @r###"
    query {
      schemas {
        items {
          template {
            id
          }
        }
      }
    }
    "###);
}
