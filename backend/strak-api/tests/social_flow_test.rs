//! End-to-end flow against a real PostgreSQL: accounts, follows, posts,
//! likes, comments, lists, search, privacy and account deletion.
//!
//! Run with `cargo test -- --ignored` on a machine with Docker.

mod common;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use serial_test::serial;

use common::{envelope, migrated_pool, start_postgres, state_with};
use strak_api::routes;

macro_rules! send {
    ($app:expr, $req:expr) => {
        envelope(test::call_service(&$app, $req.to_request()).await).await
    };
}

/// Registers `$name` and yields `(user_id, access_token)`.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(register_body($name))
        );
        assert_eq!(status, 201, "{body}");
        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["tokens"]["access_token"]
                .as_str()
                .unwrap()
                .to_string(),
        )
    }};
}

/// Uploads a tiny PNG as `$token` and yields the media id.
macro_rules! upload_png {
    ($app:expr, $token:expr) => {{
        let (status, media) = send!(
            $app,
            auth(
                test::TestRequest::post()
                    .uri("/api/v1/media")
                    .insert_header(("Content-Type", "multipart/form-data; boundary=XBOUNDARY"))
                    .set_payload(png_form()),
                $token
            )
        );
        assert_eq!(status, 201, "{media}");
        media["data"]["id"].as_str().unwrap().to_string()
    }};
}

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

fn png_form() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n",
    );
    body.extend_from_slice(PNG);
    body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");
    body
}

fn usernames(body: &Value) -> Vec<String> {
    body.as_array()
        .or_else(|| body["items"].as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["username"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn auth(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}

fn register_body(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username.to_lowercase()),
        "password": "SecurePass123",
        "display_name": format!("{username} Test"),
    })
}

#[actix_web::test]
#[serial]
#[ignore = "Requires Docker"]
async fn social_flow_end_to_end() {
    let (_pg, url) = start_postgres().await;
    let pool = migrated_pool(&url).await;
    crypto_core::testing::init_test_keys();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(pool.clone())))
            .configure(routes::configure(pool.clone()))
            .default_service(web::route().to(routes::not_found)),
    )
    .await;

    // --- accounts ---
    let (status, alice) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(register_body("Alice"))
    );
    assert_eq!(status, 201, "{alice}");
    let alice_id = alice["data"]["user"]["id"].as_str().unwrap().to_string();
    let alice_token = alice["data"]["tokens"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(alice["data"]["user"]["email"], "alice@example.com");

    let (status, bob) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(register_body("bob_b"))
    );
    assert_eq!(status, 201);
    let bob_id = bob["data"]["user"]["id"].as_str().unwrap().to_string();
    let bob_token = bob["data"]["tokens"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    // usernames are unique regardless of case
    let mut duplicate = register_body("ALICE");
    duplicate["email"] = json!("other@example.com");
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(duplicate)
    );
    assert_eq!(status, 409);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "identifier": "alice@example.com", "password": "wrong" }))
    );
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Invalid email/username or password");

    let (status, login) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "identifier": "Alice", "password": "SecurePass123" }))
    );
    assert_eq!(status, 200);
    let refresh = login["data"]["tokens"]["refresh_token"].as_str().unwrap();
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refresh_token": refresh }))
    );
    assert_eq!(status, 200);

    // --- follows ---
    let follow_uri = format!("/api/v1/users/{alice_id}/follow");
    for _ in 0..2 {
        let (status, body) = send!(app, auth(test::TestRequest::post().uri(&follow_uri), &bob_token));
        assert_eq!(status, 200);
        assert_eq!(body["data"]["following"], true);
        assert_eq!(body["data"]["followers_count"], 1);
    }

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post().uri(&format!("/api/v1/users/{bob_id}/follow")),
            &bob_token
        )
    );
    assert_eq!(status, 400);

    let (status, profile) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/users/Alice"), &bob_token)
    );
    assert_eq!(status, 200);
    assert_eq!(profile["data"]["is_following"], true);
    assert_eq!(profile["data"]["followers_count"], 1);
    assert!(profile["data"].get("email").is_none());

    // --- posts ---
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({ "content": "   " })),
            &alice_token
        )
    );
    assert_eq!(status, 400);

    let (status, post) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({ "content": "hello 100% of_you" })),
            &alice_token
        )
    );
    assert_eq!(status, 201, "{post}");
    let post_id = post["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(post["data"]["edited"], false);

    let (status, feed) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/feed"), &bob_token)
    );
    assert_eq!(status, 200);
    assert_eq!(feed["data"]["total"], 1);
    assert_eq!(feed["data"]["items"][0]["id"], post_id.as_str());

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri(&format!("/api/v1/posts/{post_id}"))
                .set_json(json!({ "content": "hijacked" })),
            &bob_token
        )
    );
    assert_eq!(status, 403);

    let (status, edited) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri(&format!("/api/v1/posts/{post_id}"))
                .set_json(json!({ "content": "hello 100% of_you (edited)" })),
            &alice_token
        )
    );
    assert_eq!(status, 200);
    assert_eq!(edited["data"]["edited"], true);

    // --- likes ---
    let like_uri = format!("/api/v1/posts/{post_id}/like");
    for _ in 0..2 {
        let (status, body) = send!(app, auth(test::TestRequest::post().uri(&like_uri), &bob_token));
        assert_eq!(status, 200);
        assert_eq!(body["data"]["like_count"], 1);
    }
    let (_, fetched) = send!(
        app,
        auth(
            test::TestRequest::get().uri(&format!("/api/v1/posts/{post_id}")),
            &bob_token
        )
    );
    assert_eq!(fetched["data"]["liked_by_me"], true);
    let (_, anonymous) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/posts/{post_id}"))
    );
    assert_eq!(anonymous["data"]["liked_by_me"], false);
    assert_eq!(anonymous["data"]["like_count"], 1);

    // --- comments ---
    let comments_uri = format!("/api/v1/posts/{post_id}/comments");
    let (status, comment) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "first!" })),
            &bob_token
        )
    );
    assert_eq!(status, 201);
    let comment_id = comment["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "thanks", "parent_id": comment_id })),
            &alice_token
        )
    );
    assert_eq!(status, 201);

    // the post author may remove comments on their post
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::delete().uri(&format!("/api/v1/comments/{comment_id}")),
            &alice_token
        )
    );
    assert_eq!(status, 200);

    let (status, thread) = send!(app, test::TestRequest::get().uri(&comments_uri));
    assert_eq!(status, 200);
    assert_eq!(thread["data"]["items"][0]["content"], "[deleted]");
    assert_eq!(thread["data"]["items"][0]["deleted"], true);
    assert_eq!(thread["data"]["items"][0]["reply_count"], 1);

    let (_, replies) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/comments/{comment_id}/replies"))
    );
    assert_eq!(replies["data"]["items"][0]["content"], "thanks");

    // a deleted comment whose replies are all deleted leaves the thread
    let (_, lonely) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "lonely" })),
            &bob_token
        )
    );
    let lonely_id = lonely["data"]["id"].as_str().unwrap().to_string();
    let (_, answer) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "answer", "parent_id": lonely_id })),
            &alice_token
        )
    );
    let answer_id = answer["data"]["id"].as_str().unwrap().to_string();

    // a deleted chain above a live reply stays reachable
    let (_, root) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "root" })),
            &bob_token
        )
    );
    let root_id = root["data"]["id"].as_str().unwrap().to_string();
    let (_, middle) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "middle", "parent_id": root_id })),
            &alice_token
        )
    );
    let middle_id = middle["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&comments_uri)
                .set_json(json!({ "content": "leaf", "parent_id": middle_id })),
            &bob_token
        )
    );
    assert_eq!(status, 201);

    for (id, token) in [
        (&answer_id, &alice_token),
        (&lonely_id, &bob_token),
        (&middle_id, &alice_token),
        (&root_id, &bob_token),
    ] {
        let (status, _) = send!(
            app,
            auth(
                test::TestRequest::delete().uri(&format!("/api/v1/comments/{id}")),
                token
            )
        );
        assert_eq!(status, 200);
    }

    let (_, thread) = send!(app, test::TestRequest::get().uri(&comments_uri));
    assert_eq!(thread["data"]["total"], 2);
    assert_eq!(thread["data"]["items"][0]["id"], comment_id.as_str());
    assert_eq!(thread["data"]["items"][1]["id"], root_id.as_str());
    assert_eq!(thread["data"]["items"][1]["deleted"], true);
    assert_eq!(thread["data"]["items"][1]["reply_count"], 0);

    let (_, replies) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/comments/{lonely_id}/replies"))
    );
    assert_eq!(replies["data"]["total"], 0);
    let (_, replies) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/comments/{root_id}/replies"))
    );
    assert_eq!(replies["data"]["total"], 1);
    assert_eq!(replies["data"]["items"][0]["content"], "[deleted]");
    assert_eq!(replies["data"]["items"][0]["reply_count"], 1);

    // --- search ---
    let (status, users) = send!(app, test::TestRequest::get().uri("/api/v1/search/users?q=ali"));
    assert_eq!(status, 200);
    assert_eq!(users["data"]["items"][0]["username"], "Alice");

    let (_, posts) = send!(app, test::TestRequest::get().uri("/api/v1/search/posts?q=100%25"));
    assert_eq!(posts["data"]["total"], 1);
    let (_, posts) = send!(app, test::TestRequest::get().uri("/api/v1/search/posts?q=0%25"));
    assert_eq!(posts["data"]["total"], 1);
    let (_, posts) = send!(app, test::TestRequest::get().uri("/api/v1/search/posts?q=f_y"));
    assert_eq!(posts["data"]["total"], 1);
    // `_` is not a wildcard
    let (_, posts) = send!(app, test::TestRequest::get().uri("/api/v1/search/posts?q=h_l"));
    assert_eq!(posts["data"]["total"], 0);

    // --- lists ---
    let (status, list) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/lists")
                .set_json(json!({ "name": "Friends", "kind": "users" })),
            &bob_token
        )
    );
    assert_eq!(status, 201);
    let list_id = list["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/lists")
                .set_json(json!({ "name": "friends", "kind": "posts" })),
            &bob_token
        )
    );
    assert_eq!(status, 409);

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri(&format!("/api/v1/lists/{list_id}"))
                .set_json(json!({ "kind": "posts" })),
            &bob_token
        )
    );
    assert_eq!(status, 400);

    let members_uri = format!("/api/v1/lists/{list_id}/members");
    let (status, list) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&members_uri)
                .set_json(json!({ "member_id": alice_id })),
            &bob_token
        )
    );
    assert_eq!(status, 200);
    assert_eq!(list["data"]["member_count"], 1);

    let (_, members) = send!(app, test::TestRequest::get().uri(&members_uri));
    assert_eq!(members["data"]["kind"], "users");
    assert_eq!(members["data"]["items"][0]["username"], "Alice");

    // unfollowing prunes the account from the follower's user lists
    let (status, body) = send!(app, auth(test::TestRequest::delete().uri(&follow_uri), &bob_token));
    assert_eq!(status, 200);
    assert_eq!(body["data"]["following"], false);
    let (_, members) = send!(app, test::TestRequest::get().uri(&members_uri));
    assert_eq!(members["data"]["total"], 0);

    // --- privacy ---
    let (status, settings) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri("/api/v1/settings")
                .set_json(json!({ "is_private": true, "language": "nl" })),
            &alice_token
        )
    );
    assert_eq!(status, 200);
    assert_eq!(settings["data"]["is_private"], true);
    assert_eq!(settings["data"]["language"], "nl");

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::get().uri(&format!("/api/v1/posts/{post_id}")),
            &bob_token
        )
    );
    assert_eq!(status, 404);
    let (status, _) = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/v1/users/{alice_id}/posts"))
    );
    assert_eq!(status, 403);
    let (_, explore) = send!(app, test::TestRequest::get().uri("/api/v1/explore"));
    assert_eq!(explore["data"]["total"], 0);

    // --- password and account deletion ---
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::put()
                .uri("/api/v1/settings/password")
                .set_json(json!({ "current_password": "nope", "new_password": "NewSecure456" })),
            &alice_token
        )
    );
    assert_eq!(status, 401);

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::delete()
                .uri("/api/v1/settings/account")
                .set_json(json!({ "password": "SecurePass123" })),
            &alice_token
        )
    );
    assert_eq!(status, 200);

    let (status, body) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/auth/me"), &alice_token)
    );
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Account no longer exists");

    let (status, _) = send!(app, test::TestRequest::get().uri("/api/v1/users/Alice"));
    assert_eq!(status, 404);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "identifier": "Alice", "password": "SecurePass123" }))
    );
    assert_eq!(status, 401);
}

#[actix_web::test]
#[serial]
#[ignore = "Requires Docker"]
async fn media_upload_and_attach() {
    let (_pg, url) = start_postgres().await;
    let pool = migrated_pool(&url).await;
    crypto_core::testing::init_test_keys();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(pool.clone())))
            .configure(routes::configure(pool.clone()))
            .default_service(web::route().to(routes::not_found)),
    )
    .await;

    let (_carol_id, token) = register!(app, "carol");

    let media_id = upload_png!(app, &token);

    let resp = test::call_service(
        &app,
        auth(
            test::TestRequest::get().uri(&format!("/api/v1/media/{media_id}")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(test::read_body(resp).await.as_ref(), PNG);

    // unattached uploads are private to their owner
    let media_uri = format!("/api/v1/media/{media_id}");
    let (status, _) = send!(app, test::TestRequest::get().uri(&media_uri));
    assert_eq!(status, 404);
    let (_dave_id, dave_token) = register!(app, "dave");
    let (status, _) = send!(app, auth(test::TestRequest::get().uri(&media_uri), &dave_token));
    assert_eq!(status, 404);

    let (status, post) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({ "media_ids": [media_id] })),
            &token
        )
    );
    assert_eq!(status, 201, "{post}");
    assert_eq!(post["data"]["media"][0]["id"], media_id.as_str());
    let post_id = post["data"]["id"].as_str().unwrap().to_string();

    // attached to a public post, anyone may fetch it
    let resp = test::call_service(&app, test::TestRequest::get().uri(&media_uri).to_request()).await;
    assert_eq!(resp.status().as_u16(), 200);

    // already attached media cannot be reused
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({ "content": "again", "media_ids": [media_id] })),
            &token
        )
    );
    assert_eq!(status, 400);

    // deleting the post detaches the media back to its owner only
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::delete().uri(&format!("/api/v1/posts/{post_id}")),
            &token
        )
    );
    assert_eq!(status, 200);
    let (status, _) = send!(app, test::TestRequest::get().uri(&media_uri));
    assert_eq!(status, 404);
    let resp = test::call_service(
        &app,
        auth(test::TestRequest::get().uri(&media_uri), &token).to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[actix_web::test]
#[serial]
#[ignore = "Requires Docker"]
async fn media_reordering() {
    let (_pg, url) = start_postgres().await;
    let pool = migrated_pool(&url).await;
    crypto_core::testing::init_test_keys();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(pool.clone())))
            .configure(routes::configure(pool.clone()))
            .default_service(web::route().to(routes::not_found)),
    )
    .await;

    let (_erin_id, token) = register!(app, "erin");
    let (_frank_id, frank_token) = register!(app, "frank");
    let first = upload_png!(app, &token);
    let second = upload_png!(app, &token);
    let spare = upload_png!(app, &token);

    let (status, post) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({ "content": "two pictures", "media_ids": [first, second] })),
            &token
        )
    );
    assert_eq!(status, 201, "{post}");
    assert_eq!(post["data"]["media"][0]["id"], first.as_str());
    let order_uri = format!("/api/v1/posts/{}/media/order", post["data"]["id"].as_str().unwrap());

    let (status, reordered) = send!(
        app,
        auth(
            test::TestRequest::put()
                .uri(&order_uri)
                .set_json(json!({ "media_ids": [second, first] })),
            &token
        )
    );
    assert_eq!(status, 200, "{reordered}");
    assert_eq!(reordered["data"]["media"][0]["id"], second.as_str());
    assert_eq!(reordered["data"]["media"][1]["id"], first.as_str());

    for media_ids in [
        json!([second]),
        json!([second, second]),
        json!([second, spare]),
        json!([second, first, spare]),
    ] {
        let (status, _) = send!(
            app,
            auth(
                test::TestRequest::put()
                    .uri(&order_uri)
                    .set_json(json!({ "media_ids": media_ids })),
                &token
            )
        );
        assert_eq!(status, 400, "{media_ids}");
    }

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::put()
                .uri(&order_uri)
                .set_json(json!({ "media_ids": [first, second] })),
            &frank_token
        )
    );
    assert_eq!(status, 403);
}

#[actix_web::test]
#[serial]
#[ignore = "Requires Docker"]
async fn discovery_and_membership_rules() {
    let (_pg, url) = start_postgres().await;
    let pool = migrated_pool(&url).await;
    crypto_core::testing::init_test_keys();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(pool.clone())))
            .configure(routes::configure(pool.clone()))
            .default_service(web::route().to(routes::not_found)),
    )
    .await;

    let (viewer_id, viewer) = register!(app, "viewer");
    let (amy_id, amy) = register!(app, "amy_a");
    let (ben_id, ben) = register!(app, "ben_b");
    let (xavier_id, _) = register!(app, "xavier");
    let (yusuf_id, yusuf) = register!(app, "yusuf");
    let (popular_id, _) = register!(app, "popular");
    let (zed_id, zed) = register!(app, "zed_z");

    macro_rules! follow {
        ($app:expr, $token:expr, $target:expr) => {{
            let (status, body) = send!(
                $app,
                auth(
                    test::TestRequest::post().uri(&format!("/api/v1/users/{}/follow", $target)),
                    $token
                )
            );
            assert_eq!(status, 200, "{body}");
        }};
    }

    // viewer -> amy, ben; amy -> xavier, yusuf; ben -> xavier
    follow!(app, &viewer, amy_id);
    follow!(app, &viewer, ben_id);
    follow!(app, &amy, xavier_id);
    follow!(app, &amy, yusuf_id);
    follow!(app, &ben, xavier_id);
    // popular has two followers but no mutual link to viewer
    follow!(app, &zed, popular_id);
    follow!(app, &yusuf, popular_id);

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post().uri(&format!("/api/v1/users/{viewer_id}/follow")),
            &viewer
        )
    );
    assert_eq!(status, 400);
    let (status, body) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&format!("/api/v1/users/{}/follow", uuid::Uuid::new_v4())),
            &viewer
        )
    );
    assert_eq!(status, 404);
    assert_eq!(body["message"], "User not found");

    // --- suggestions: mutual count first, then the most followed ---
    let (status, suggested) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/search/suggested?limit=3"), &viewer)
    );
    assert_eq!(status, 200, "{suggested}");
    assert_eq!(usernames(&suggested["data"]), ["xavier", "yusuf", "popular"]);

    let (_, suggested) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/search/suggested"), &viewer)
    );
    let names = usernames(&suggested["data"]);
    assert_eq!(names, ["xavier", "yusuf", "popular", "zed_z"]);

    // with no mutuals the fallback is follower count, newest accounts first on ties
    let (_, suggested) = send!(
        app,
        auth(test::TestRequest::get().uri("/api/v1/search/suggested?limit=2"), &zed)
    );
    assert_eq!(usernames(&suggested["data"]), ["xavier", "yusuf"]);

    // --- user search ranking: exact, then prefix, then followers ---
    let (_, _) = register!(app, "busam");
    let (samuel_id, _) = register!(app, "samuel");
    let (_, _) = register!(app, "samantha");
    let (_, _) = register!(app, "sam");
    follow!(app, &zed, samuel_id);

    let (status, found) = send!(app, test::TestRequest::get().uri("/api/v1/search/users?q=SAM"));
    assert_eq!(status, 200);
    assert_eq!(found["data"]["total"], 4);
    assert_eq!(
        usernames(&found["data"]),
        ["sam", "samuel", "samantha", "busam"]
    );

    // --- comments: a reply must target a comment on the same post ---
    let mut post_ids = Vec::new();
    for content in ["first post", "second post"] {
        let (status, post) = send!(
            app,
            auth(
                test::TestRequest::post()
                    .uri("/api/v1/posts")
                    .set_json(json!({ "content": content })),
                &amy
            )
        );
        assert_eq!(status, 201);
        post_ids.push(post["data"]["id"].as_str().unwrap().to_string());
    }
    let (_, comment) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&format!("/api/v1/posts/{}/comments", post_ids[0]))
                .set_json(json!({ "content": "on the first" })),
            &viewer
        )
    );
    let comment_id = comment["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&format!("/api/v1/posts/{}/comments", post_ids[1]))
                .set_json(json!({ "content": "misplaced", "parent_id": comment_id })),
            &viewer
        )
    );
    assert_eq!(status, 400);

    // --- lists: kind is fixed, user lists only take followed accounts ---
    let (status, list) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri("/api/v1/lists")
                .set_json(json!({ "name": "Close", "kind": "users" })),
            &viewer
        )
    );
    assert_eq!(status, 201);
    let list_uri = format!("/api/v1/lists/{}", list["data"]["id"].as_str().unwrap());

    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri(&list_uri)
                .set_json(json!({ "kind": "posts" })),
            &viewer
        )
    );
    assert_eq!(status, 400);
    let (status, renamed) = send!(
        app,
        auth(
            test::TestRequest::patch()
                .uri(&list_uri)
                .set_json(json!({ "kind": "users", "name": "Closest" })),
            &viewer
        )
    );
    assert_eq!(status, 200);
    assert_eq!(renamed["data"]["name"], "Closest");

    let members_uri = format!("{list_uri}/members");
    let (status, _) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&members_uri)
                .set_json(json!({ "member_id": zed_id })),
            &viewer
        )
    );
    assert_eq!(status, 400);
    let (status, list) = send!(
        app,
        auth(
            test::TestRequest::post()
                .uri(&members_uri)
                .set_json(json!({ "member_id": amy_id })),
            &viewer
        )
    );
    assert_eq!(status, 200);
    assert_eq!(list["data"]["member_count"], 1);
}
