use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{recipe_tag, tag};

use crate::common::{TestApp, routes};

mod auth {
    use super::*;

    #[tokio::test]
    async fn listing_tags_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::TAGS).await;

        assert_eq!(res.status, 401);
    }
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn list_is_limited_to_own_tags_and_sorted_by_name_desc() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let other = app.create_authenticated_user("other@example.com").await;

        let vegan = app.create_tag(&token, "Vegan").await;
        let dessert = app.create_tag(&token, "Dessert").await;
        app.create_tag(&other, "Fruity").await;

        let res = app.get_with_token(routes::TAGS, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body,
            json!([
                {"id": vegan, "name": "Vegan"},
                {"id": dessert, "name": "Dessert"},
            ])
        );
    }

    #[tokio::test]
    async fn equal_names_fall_back_to_id_desc() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let first = app.create_tag(&token, "Same").await;
        let second = app.create_tag(&token, "Same").await;

        let res = app.get_with_token(routes::TAGS, &token).await;

        let ids: Vec<i64> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second as i64, first as i64]);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "   "}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_overlong_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .post_with_token(routes::TAGS, &json!({"name": "x".repeat(256)}), &token)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn patch_renames_tag() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_tag(&token, "After Dinner").await;

        let res = app
            .patch_with_token(&routes::tag(id), &json!({"name": "Dessert"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!({"id": id, "name": "Dessert"}));

        let stored = tag::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Dessert");
    }

    #[tokio::test]
    async fn patch_without_name_keeps_tag() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_tag(&token, "Breakfast").await;

        let res = app.patch_with_token(&routes::tag(id), &json!({}), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Breakfast");
    }

    #[tokio::test]
    async fn put_requires_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_tag(&token, "Breakfast").await;

        let res = app.put_with_token(&routes::tag(id), &json!({}), &token).await;
        assert_eq!(res.status, 400);

        let res = app
            .put_with_token(&routes::tag(id), &json!({"name": "Brunch"}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Brunch");
    }

    #[tokio::test]
    async fn other_users_tag_is_not_found() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com").await;
        let intruder = app.create_authenticated_user("intruder@example.com").await;
        let id = app.create_tag(&owner, "Private").await;

        let get = app.get_with_token(&routes::tag(id), &intruder).await;
        assert_eq!(get.status, 404);

        let patch = app
            .patch_with_token(&routes::tag(id), &json!({"name": "Mine"}), &intruder)
            .await;
        assert_eq!(patch.status, 404);

        let delete = app.delete_with_token(&routes::tag(id), &intruder).await;
        assert_eq!(delete.status, 404);

        let stored = tag::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Private");
    }

    #[tokio::test]
    async fn delete_removes_tag_and_its_links() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_tag(&token, "Breakfast").await;
        let recipe_id = app.create_recipe(&token, json!({"tags": [id]})).await;

        let res = app.delete_with_token(&routes::tag(id), &token).await;
        assert_eq!(res.status, 204);

        assert!(tag::Entity::find_by_id(id).one(&app.db).await.unwrap().is_none());
        let links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::TagId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 0);

        let recipe = app.get_with_token(&routes::recipe(recipe_id), &token).await;
        assert_eq!(recipe.status, 200);
        assert_eq!(recipe.body["tags"], json!([]));
    }
}

mod assigned_only {
    use super::*;

    #[tokio::test]
    async fn only_tags_used_by_a_recipe_are_listed() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let breakfast = app.create_tag(&token, "Breakfast").await;
        app.create_tag(&token, "Lunch").await;
        app.create_recipe(&token, json!({"title": "Apple Crumble", "tags": [breakfast]}))
            .await;

        let res = app
            .get_with_token(&format!("{}?assigned_only=1", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!([{"id": breakfast, "name": "Breakfast"}]));
    }

    #[tokio::test]
    async fn a_tag_used_twice_is_listed_once() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let breakfast = app.create_tag(&token, "Breakfast").await;
        app.create_tag(&token, "Dinner").await;
        app.create_recipe(&token, json!({"title": "Pancakes", "tags": [breakfast]}))
            .await;
        app.create_recipe(&token, json!({"title": "Porridge", "tags": [breakfast]}))
            .await;

        let res = app
            .get_with_token(&format!("{}?assigned_only=true", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_returns_everything() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        app.create_tag(&token, "Breakfast").await;
        app.create_tag(&token, "Dinner").await;

        let res = app
            .get_with_token(&format!("{}?assigned_only=0", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unparsable_flag_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .get_with_token(&format!("{}?assigned_only=maybe", routes::TAGS), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
