use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{TestApp, png_bytes, routes};

mod lookup_and_listing {
    use super::*;

    #[tokio::test]
    async fn username_lookup_is_public_and_exact() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .get_with_query(routes::USERS, &[("username", "alice".to_string())])
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "alice");
        assert!(rows[0].get("password").is_none());

        let res = app
            .get_with_query(routes::USERS, &[("username", "alic".to_string())])
            .await;
        assert_eq!(res.body.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn listing_requires_an_admin() {
        let app = TestApp::spawn().await;
        let plain = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_without_token(routes::USERS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_with_token(routes::USERS, &plain).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let admin = app.create_admin_user("moderator", "securepass").await;
        let res = app.get_with_token(routes::USERS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn banned_filter_lists_only_active_bans() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        app.create_authenticated_user("goodguy", "securepass").await;
        let bad = app.create_authenticated_user("badactor", "securepass").await;
        let bad_id = app.user_id(&bad).await;

        let res = app
            .post_with_token(
                &routes::user_ban(bad_id),
                &json!({"reason": "spam uploads"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .get_with_query_and_token(routes::USERS, &[("status", "banned".to_string())], &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "badactor");

        let res = app
            .get_with_query_and_token(routes::USERS, &[("status", "deleted".to_string())], &admin)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod account_info {
    use super::*;

    #[tokio::test]
    async fn users_can_see_themselves_but_not_others() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bobby", "securepass").await;
        let alice_id = app.user_id(&alice).await;

        let res = app.get_with_token(&routes::user(alice_id), &alice).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["username"], "alice");

        let res = app.get_with_token(&routes::user(alice_id), &bob).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let admin = app.create_admin_user("moderator", "securepass").await;
        let res = app.get_with_token(&routes::user(alice_id), &admin).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn a_profile_page_lists_all_their_rices() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bobby", "securepass").await;
        let alice_id = app.user_id(&alice).await;

        app.create_rice(&alice, "Alice First").await;
        app.create_rice(&alice, "Alice Second").await;
        app.create_rice(&bob, "Bob Only").await;

        let res = app.get_without_token(&routes::user_rices(alice_id)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let titles: Vec<&str> = res
            .body
            .as_array()
            .expect("array")
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Alice Second", "Alice First"]);
    }
}

mod display_name {
    use super::*;

    #[tokio::test]
    async fn users_can_rename_themselves() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let res = app
            .patch_with_token(
                &routes::user_display_name(id),
                &json!({"displayName": "Fresh Name"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["displayName"], "Fresh Name");
    }

    #[tokio::test]
    async fn blacklisted_display_name_is_unprocessable() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let res = app
            .patch_with_token(
                &routes::user_display_name(id),
                &json!({"displayName": "so forbidden"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNPROCESSABLE");
    }

    #[tokio::test]
    async fn users_cannot_rename_each_other() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bobby", "securepass").await;
        let alice_id = app.user_id(&alice).await;

        let res = app
            .patch_with_token(
                &routes::user_display_name(alice_id),
                &json!({"displayName": "Vandalized"}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod password_change {
    use super::*;

    #[tokio::test]
    async fn changing_the_password_requires_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let res = app
            .patch_with_token(
                &routes::user_password(id),
                &json!({"oldPassword": "wrongpass", "newPassword": "newsecret"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");

        let res = app
            .patch_with_token(
                &routes::user_password(id),
                &json!({"oldPassword": "securepass", "newPassword": "newsecret"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "newsecret"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn an_admin_can_reset_without_the_old_password() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let alice_id = app.user_id(&alice).await;

        let res = app
            .patch_with_token(
                &routes::user_password(alice_id),
                &json!({"oldPassword": "", "newPassword": "resetsecret"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "resetsecret"}),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn a_too_short_new_password_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let res = app
            .patch_with_token(
                &routes::user_password(id),
                &json!({"oldPassword": "securepass", "newPassword": "tiny"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod avatars {
    use super::*;

    #[tokio::test]
    async fn avatar_upload_and_removal_round_trip() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let form = Form::new().part("avatar", Part::bytes(png_bytes()).file_name("me.png"));
        let res = app
            .multipart_with_token(&routes::user_avatar(id), form, &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let url = res.body["avatarUrl"].as_str().unwrap();
        assert!(url.starts_with("http://cdn.test/avatars/"), "{url}");
        assert_ne!(url, "http://cdn.test/avatars/default.png");

        let res = app.delete_with_token(&routes::user_avatar(id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["avatarUrl"], "http://cdn.test/avatars/default.png");
    }

    #[tokio::test]
    async fn non_image_avatar_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let form = Form::new().part(
            "avatar",
            Part::bytes(b"plain text".to_vec()).file_name("me.png"),
        );
        let res = app
            .multipart_with_token(&routes::user_avatar(id), form, &token)
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNPROCESSABLE");
    }
}

mod account_deletion {
    use super::*;

    #[tokio::test]
    async fn self_deletion_requires_the_password() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;

        let res = app
            .delete_with_token_and_body(
                &routes::user(id),
                &json!({"password": "wrongpass"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");

        let res = app
            .delete_with_token_and_body(
                &routes::user(id),
                &json!({"password": "securepass"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "securepass"}),
            )
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn deleting_an_account_removes_its_rices() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.user_id(&token).await;
        let rice_id = app.create_rice(&token, "Orphaned Rice").await;

        let res = app
            .delete_with_token_and_body(
                &routes::user(id),
                &json!({"password": "securepass"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.get_without_token(&routes::rice(&rice_id)).await;
        assert_eq!(res.status, 404);

        let feed = app.get_without_token(routes::RICES).await;
        assert_eq!(feed.body.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn admins_can_delete_other_accounts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let alice_id = app.user_id(&alice).await;

        let res = app
            .delete_with_token_and_body(&routes::user(alice_id), &json!({"password": ""}), &admin)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);
    }
}

mod bans {
    use super::*;

    async fn ban(app: &TestApp, admin: &str, target: uuid::Uuid) -> crate::common::TestResponse {
        app.post_with_token(
            &routes::user_ban(target),
            &json!({"reason": "spam uploads"}),
            admin,
        )
        .await
    }

    #[tokio::test]
    async fn banned_users_cannot_write() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let bad = app.create_authenticated_user("badactor", "securepass").await;
        let bad_id = app.user_id(&bad).await;
        let rice_id = app.create_rice(&bad, "Preban Rice").await;

        let res = ban(&app, &admin, bad_id).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["reason"], "spam uploads");
        assert!(res.body["expiresAt"].is_null(), "ban should be permanent");

        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"riceId": rice_id, "content": "still here though"}),
                &bad,
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "USER_BANNED");
    }

    #[tokio::test]
    async fn double_ban_is_a_conflict_and_unban_restores_writes() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let other = app.create_authenticated_user("someone", "securepass").await;
        let bad = app.create_authenticated_user("badactor", "securepass").await;
        let bad_id = app.user_id(&bad).await;
        let rice_id = app.create_rice(&other, "Commentable Rice").await;

        assert_eq!(ban(&app, &admin, bad_id).await.status, 201);
        let res = ban(&app, &admin, bad_id).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app.delete_with_token(&routes::user_ban(bad_id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"riceId": rice_id, "content": "back from the ban"}),
                &bad,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        // Unbanning again finds no active ban.
        let res = app.delete_with_token(&routes::user_ban(bad_id), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn admins_cannot_ban_themselves() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let admin_id = app.user_id(&admin).await;

        let res = ban(&app, &admin, admin_id).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn banning_an_admin_strips_the_flag() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let second = app.create_admin_user("deputy", "securepass").await;
        let second_id = app.user_id(&second).await;

        assert_eq!(ban(&app, &admin, second_id).await.status, 201);

        let res = app.get_with_token(&routes::user(second_id), &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["isAdmin"], false);
    }

    #[tokio::test]
    async fn only_admins_can_ban() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bobby", "securepass").await;
        let bob_id = app.user_id(&bob).await;

        let res = ban(&app, &alice, bob_id).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn ban_validation_rejects_bad_input() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let bad = app.create_authenticated_user("badactor", "securepass").await;
        let bad_id = app.user_id(&bad).await;

        let res = app
            .post_with_token(&routes::user_ban(bad_id), &json!({"reason": "meh"}), &admin)
            .await;
        assert_eq!(res.status, 400, "reason below minimum length");

        let res = app
            .post_with_token(
                &routes::user_ban(bad_id),
                &json!({"reason": "spam uploads", "durationHours": 0}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400, "non-positive duration");
    }
}

mod admin_stats {
    use super::*;

    #[tokio::test]
    async fn stats_require_an_admin() {
        let app = TestApp::spawn().await;
        let plain = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_with_token(routes::ADMIN_STATS, &plain).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn stats_count_the_service_contents() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let rice_id = app.create_rice(&alice, "Counted Rice").await;
        let res = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"riceId": rice_id, "content": "counted comment"}),
                &alice,
            )
            .await;
        assert_eq!(res.status, 201);
        let res = app
            .post_with_token(
                routes::REPORTS,
                &json!({"riceId": rice_id, "reason": "counted report"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.get_with_token(routes::ADMIN_STATS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["userCount"], 2);
        assert_eq!(res.body["riceCount"], 1);
        assert_eq!(res.body["commentCount"], 1);
        assert_eq!(res.body["reportCount"], 1);
        assert_eq!(res.body["openReportCount"], 1);
        assert_eq!(res.body["usersLastDay"], 2);
        assert_eq!(res.body["ricesLastDay"], 1);
    }
}
