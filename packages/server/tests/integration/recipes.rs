use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{recipe, recipe_ingredient, recipe_tag};

use crate::common::{TestApp, png_bytes, routes};

fn ids(body: &serde_json::Value) -> Vec<i64> {
    body.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn creating_a_recipe_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::RECIPES,
                &json!({"title": "Soup", "time_minutes": 5, "price": "1.00"}),
            )
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn basic_recipe_is_created_for_the_caller() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({"title": "Sample recipe", "time_minutes": 30, "price": "5.99"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Sample recipe");
        assert_eq!(res.body["time_minutes"], 30);
        assert_eq!(res.body["price"], "5.99");
        assert_eq!(res.body["link"], "");
        assert_eq!(res.body["tags"], json!([]));
        assert_eq!(res.body["ingredients"], json!([]));
        assert!(res.body["image"].is_null());

        let stored = recipe::Entity::find_by_id(res.id())
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.price_cents, 599);
    }

    #[tokio::test]
    async fn price_may_be_sent_as_a_number() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({"title": "Toast", "time_minutes": 3, "price": 2.5}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["price"], "2.50");
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let cases = [
            json!({"title": "", "time_minutes": 5, "price": "1.00"}),
            json!({"title": "Soup", "time_minutes": 0, "price": "1.00"}),
            json!({"title": "Soup", "time_minutes": 5, "price": "1.234"}),
            json!({"title": "Soup", "time_minutes": 5, "price": "1000.00"}),
            json!({"title": "Soup", "time_minutes": 5, "price": "-1"}),
            json!({"title": "Soup", "time_minutes": 5}),
        ];

        for body in cases {
            let res = app.post_with_token(routes::RECIPES, &body, &token).await;
            assert_eq!(res.status, 400, "expected 400 for {body}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }

        let count = recipe::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn recipe_links_existing_tags_and_ingredients() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let thai = app.create_tag(&token, "Thai").await;
        let dinner = app.create_tag(&token, "Dinner").await;
        let prawns = app.create_ingredient(&token, "Prawns").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({
                    "title": "Thai Prawn Curry",
                    "time_minutes": 30,
                    "price": "7.00",
                    "tags": [dinner, thai, thai],
                    "ingredients": [prawns],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let mut expected = vec![thai, dinner];
        expected.sort();
        assert_eq!(res.body["tags"], json!(expected));
        assert_eq!(res.body["ingredients"], json!([prawns]));

        let links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.eq(res.id()))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 2);
    }

    #[tokio::test]
    async fn unknown_tag_id_rejects_the_whole_recipe() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let real = app.create_tag(&token, "Real").await;

        let res = app
            .post_with_token(
                routes::RECIPES,
                &json!({
                    "title": "Ghost Soup",
                    "time_minutes": 10,
                    "price": "1.00",
                    "tags": [real, 9999],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("9999"));

        let count = recipe::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(count, 0);
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn list_is_limited_to_own_recipes_newest_first() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let other = app.create_authenticated_user("other@example.com").await;

        let first = app.create_recipe(&token, json!({"title": "First"})).await;
        let second = app.create_recipe(&token, json!({"title": "Second"})).await;
        app.create_recipe(&other, json!({"title": "Not mine"})).await;

        let res = app.get_with_token(routes::RECIPES, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(ids(&res.body), vec![second as i64, first as i64]);
    }

    #[tokio::test]
    async fn filter_by_tags_matches_any_listed_tag() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let vegan = app.create_tag(&token, "Vegan").await;
        let veggie = app.create_tag(&token, "Vegetarian").await;

        let curry = app
            .create_recipe(&token, json!({"title": "Thai Vegetable Curry", "tags": [vegan]}))
            .await;
        let tahini = app
            .create_recipe(&token, json!({"title": "Aubergine with Tahini", "tags": [veggie]}))
            .await;
        app.create_recipe(&token, json!({"title": "Fish and chips"}))
            .await;

        let res = app
            .get_with_token(&format!("{}?tags={vegan},{veggie}", routes::RECIPES), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(ids(&res.body), vec![tahini as i64, curry as i64]);
    }

    #[tokio::test]
    async fn tag_and_ingredient_filters_combine() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let quick = app.create_tag(&token, "Quick").await;
        let cheese = app.create_ingredient(&token, "Cheese").await;

        let both = app
            .create_recipe(
                &token,
                json!({"title": "Cheese toast", "tags": [quick], "ingredients": [cheese]}),
            )
            .await;
        app.create_recipe(&token, json!({"title": "Salad", "tags": [quick]}))
            .await;
        app.create_recipe(&token, json!({"title": "Fondue", "ingredients": [cheese]}))
            .await;

        let res = app
            .get_with_token(
                &format!("{}?tags={quick}&ingredients={cheese}", routes::RECIPES),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(ids(&res.body), vec![both as i64]);
    }

    #[tokio::test]
    async fn recipe_with_several_matching_tags_is_listed_once() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let a = app.create_tag(&token, "A").await;
        let b = app.create_tag(&token, "B").await;
        let id = app.create_recipe(&token, json!({"tags": [a, b]})).await;

        let res = app
            .get_with_token(&format!("{}?tags={a},{b}", routes::RECIPES), &token)
            .await;

        assert_eq!(ids(&res.body), vec![id as i64]);
    }

    #[tokio::test]
    async fn malformed_filter_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app
            .get_with_token(&format!("{}?tags=1,abc", routes::RECIPES), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn detail_resolves_tags_and_ingredients() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let tag = app.create_tag(&token, "Breakfast").await;
        let ingredient = app.create_ingredient(&token, "Oats").await;
        let id = app
            .create_recipe(
                &token,
                json!({"title": "Porridge", "tags": [tag], "ingredients": [ingredient]}),
            )
            .await;

        let res = app.get_with_token(&routes::recipe(id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Porridge");
        assert_eq!(res.body["price"], "5.00");
        assert_eq!(res.body["tags"], json!([{"id": tag, "name": "Breakfast"}]));
        assert_eq!(
            res.body["ingredients"],
            json!([{"id": ingredient, "name": "Oats"}])
        );
    }

    #[tokio::test]
    async fn other_users_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com").await;
        let intruder = app.create_authenticated_user("intruder@example.com").await;
        let id = app.create_recipe(&owner, json!({})).await;

        let get = app.get_with_token(&routes::recipe(id), &intruder).await;
        assert_eq!(get.status, 404);

        let patch = app
            .patch_with_token(&routes::recipe(id), &json!({"title": "Stolen"}), &intruder)
            .await;
        assert_eq!(patch.status, 404);

        let delete = app.delete_with_token(&routes::recipe(id), &intruder).await;
        assert_eq!(delete.status, 404);

        let stored = recipe::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Sample recipe");
    }

    #[tokio::test]
    async fn unparsable_id_is_a_json_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        for path in [
            "/recipe/recipes/abc",
            "/recipe/recipes/99999999999",
            "/recipe/tags/abc",
            "/recipe/ingredients/1.5",
        ] {
            let res = app.get_with_token(path, &token).await;
            assert_eq!(res.status, 404, "{path}: {}", res.text);
            assert_eq!(res.body["code"], "NOT_FOUND", "{path}");
        }
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;

        let res = app.get_with_token(&routes::recipe(4242), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let tag = app.create_tag(&token, "Dinner").await;
        let id = app
            .create_recipe(
                &token,
                json!({"title": "Sample Recipe", "link": "https://example.com/r.pdf", "tags": [tag]}),
            )
            .await;

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"title": "New title"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "New title");
        assert_eq!(res.body["link"], "https://example.com/r.pdf");
        assert_eq!(res.body["price"], "5.00");
        assert_eq!(res.body["tags"], json!([tag]));
    }

    #[tokio::test]
    async fn patch_with_tag_list_replaces_links() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let breakfast = app.create_tag(&token, "Breakfast").await;
        let lunch = app.create_tag(&token, "Lunch").await;
        let id = app.create_recipe(&token, json!({"tags": [breakfast]})).await;

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"tags": [lunch]}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["tags"], json!([lunch]));

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"tags": []}), &token)
            .await;
        assert_eq!(res.body["tags"], json!([]));
    }

    #[tokio::test]
    async fn put_replaces_everything_and_clears_omitted_links() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let tag = app.create_tag(&token, "Italian").await;
        let ingredient = app.create_ingredient(&token, "Eggs").await;
        let id = app
            .create_recipe(
                &token,
                json!({
                    "title": "Sample Recipe",
                    "link": "https://example.com/recipe.pdf",
                    "tags": [tag],
                    "ingredients": [ingredient],
                }),
            )
            .await;

        let res = app
            .put_with_token(
                &routes::recipe(id),
                &json!({"title": "Spaghetti carbonara", "time_minutes": 25, "price": "5.00"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Spaghetti carbonara");
        assert_eq!(res.body["time_minutes"], 25);
        assert_eq!(res.body["link"], "");
        assert_eq!(res.body["tags"], json!([]));
        assert_eq!(res.body["ingredients"], json!([]));

        let tag_links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let ingredient_links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(tag_links, 0);
        assert_eq!(ingredient_links, 0);
    }

    #[tokio::test]
    async fn put_missing_required_fields_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let res = app
            .put_with_token(&routes::recipe(id), &json!({"title": "Only title"}), &token)
            .await;

        assert_eq!(res.status, 400);
        let stored = recipe::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Sample recipe");
    }

    #[tokio::test]
    async fn failed_update_leaves_links_untouched() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let tag = app.create_tag(&token, "Keep").await;
        let id = app.create_recipe(&token, json!({"tags": [tag]})).await;

        let res = app
            .patch_with_token(&routes::recipe(id), &json!({"tags": [tag, 9999]}), &token)
            .await;
        assert_eq!(res.status, 400);

        let res = app.get_with_token(&routes::recipe(id), &token).await;
        assert_eq!(res.body["tags"], json!([{"id": tag, "name": "Keep"}]));
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_recipe_and_links_but_keeps_tags() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let tag = app.create_tag(&token, "Dinner").await;
        let id = app.create_recipe(&token, json!({"tags": [tag]})).await;

        let res = app.delete_with_token(&routes::recipe(id), &token).await;
        assert_eq!(res.status, 204);

        assert!(recipe::Entity::find_by_id(id).one(&app.db).await.unwrap().is_none());
        let links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(links, 0);

        let tag_res = app.get_with_token(&routes::tag(tag), &token).await;
        assert_eq!(tag_res.status, 200);
    }
}

mod image {
    use super::*;

    #[tokio::test]
    async fn uploading_a_png_stores_it_and_serves_it() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let res = app.upload_image(id, "photo.png", png_bytes(), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        let url = res.body["image"].as_str().unwrap().to_string();
        assert!(url.starts_with("/media/uploads/recipe/"), "{url}");
        assert!(url.ends_with(".png"), "{url}");

        let file = app
            .client
            .get(app.url(&url))
            .send()
            .await
            .expect("Failed to fetch image");
        assert_eq!(file.status().as_u16(), 200);
        assert_eq!(
            file.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("image/png")
        );
        assert_eq!(
            file.headers()
                .get("x-content-type-options")
                .and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );
        assert_eq!(file.bytes().await.unwrap().to_vec(), png_bytes());

        let detail = app.get_with_token(&routes::recipe(id), &token).await;
        assert_eq!(detail.body["image"], url.as_str());
    }

    #[tokio::test]
    async fn replacing_an_image_removes_the_old_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let first = app.upload_image(id, "a.png", png_bytes(), &token).await;
        let old_url = first.body["image"].as_str().unwrap().to_string();
        let second = app.upload_image(id, "b.png", png_bytes(), &token).await;
        let new_url = second.body["image"].as_str().unwrap().to_string();

        assert_ne!(old_url, new_url);
        let old = app.get_without_token(&old_url).await;
        assert_eq!(old.status, 404);
        let new = app.client.get(app.url(&new_url)).send().await.unwrap();
        assert_eq!(new.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected_and_keeps_current_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;
        let good = app.upload_image(id, "good.png", png_bytes(), &token).await;
        assert_eq!(good.status, 200, "{}", good.text);

        let res = app
            .upload_image(id, "notimage.png", b"notimage".to_vec(), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let stored = recipe::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.image.map(|p| format!("/media/{p}")),
            good.body["image"].as_str().map(str::to_string)
        );
    }

    #[tokio::test]
    async fn image_named_as_html_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let res = app.upload_image(id, "evil.html", png_bytes(), &token).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let stored = recipe::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.image.is_none());
        assert!(app.stored_recipe_images().is_empty());
    }

    #[tokio::test]
    async fn extension_must_match_the_decoded_format() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let mangled = app.upload_image(id, "pic.j-pg", png_bytes(), &token).await;
        assert_eq!(mangled.status, 400);

        let wrong = app.upload_image(id, "pic.jpg", png_bytes(), &token).await;
        assert_eq!(wrong.status, 400);

        let upper = app.upload_image(id, "PIC.PNG", png_bytes(), &token).await;
        assert_eq!(upper.status, 200, "{}", upper.text);
        assert!(upper.body["image"].as_str().unwrap().ends_with(".png"));

        let bare = app.upload_image(id, "pic", png_bytes(), &token).await;
        assert_eq!(bare.status, 200, "{}", bare.text);
        assert!(bare.body["image"].as_str().unwrap().ends_with(".png"));
    }

    #[tokio::test]
    async fn concurrent_uploads_leave_only_the_referenced_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let (a, b) = tokio::join!(
            app.upload_image(id, "a.png", png_bytes(), &token),
            app.upload_image(id, "b.png", png_bytes(), &token),
        );
        for res in [&a, &b] {
            assert!(
                res.status == 200 || res.status == 409,
                "unexpected status {}: {}",
                res.status,
                res.text
            );
        }
        assert!(a.status == 200 || b.status == 200);

        let stored = recipe::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap()
            .image
            .expect("an image should be stored");
        let file_name = stored.rsplit('/').next().unwrap().to_string();
        assert_eq!(app.stored_recipe_images(), vec![file_name]);
    }

    #[tokio::test]
    async fn upload_without_multipart_body_is_a_json_error() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let res = app
            .post_with_token(&routes::recipe_upload(id), &json!({"image": "x"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_without_image_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com").await;
        let id = app.create_recipe(&token, json!({})).await;

        let form = reqwest::multipart::Form::new().text("caption", "no file here");
        let res = app
            .client
            .post(app.url(&routes::recipe_upload(id)))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn cannot_upload_to_another_users_recipe() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com").await;
        let intruder = app.create_authenticated_user("intruder@example.com").await;
        let id = app.create_recipe(&owner, json!({})).await;

        let res = app.upload_image(id, "x.png", png_bytes(), &intruder).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn media_path_traversal_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token("/media/uploads/recipe/..%2F..%2Fsecret.txt")
            .await;

        assert_eq!(res.status, 404);
    }
}
