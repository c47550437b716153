use serde_json::json;

use crate::common::{TestApp, routes};

async fn report_rice(app: &TestApp, token: &str, rice_id: &str) -> crate::common::TestResponse {
    app.post_with_token(
        routes::REPORTS,
        &json!({"riceId": rice_id, "reason": "spam in the previews"}),
        token,
    )
    .await
}

mod filing {
    use super::*;

    #[tokio::test]
    async fn a_rice_can_be_reported_once_per_reporter() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let snitch = app.create_authenticated_user("snitch", "securepass").await;
        let rice_id = app.create_rice(&author, "Suspect Rice").await;

        let res = report_rice(&app, &snitch, &rice_id).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = report_rice(&app, &snitch, &rice_id).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        // A different reporter still can.
        let other = app.create_authenticated_user("someone", "securepass").await;
        let res = report_rice(&app, &other, &rice_id).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn a_comment_can_be_reported() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let snitch = app.create_authenticated_user("snitch", "securepass").await;
        let rice_id = app.create_rice(&author, "Discussed Rice").await;

        let comment = app
            .post_with_token(
                routes::COMMENTS,
                &json!({"riceId": rice_id, "content": "rude comment here"}),
                &author,
            )
            .await;
        assert_eq!(comment.status, 201);

        let res = app
            .post_with_token(
                routes::REPORTS,
                &json!({
                    "commentId": comment.body["id"],
                    "reason": "harassment in the comment",
                }),
                &snitch,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn exactly_one_target_is_required() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let rice_id = app.create_rice(&author, "Target Rice").await;

        let res = app
            .post_with_token(
                routes::REPORTS,
                &json!({"reason": "no target given"}),
                &author,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_with_token(
                routes::REPORTS,
                &json!({
                    "riceId": rice_id,
                    "commentId": "00000000-0000-0000-0000-000000000000",
                    "reason": "both targets given",
                }),
                &author,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn a_short_reason_is_rejected() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let rice_id = app.create_rice(&author, "Target Rice").await;

        let res = app
            .post_with_token(
                routes::REPORTS,
                &json!({"riceId": rice_id, "reason": "meh"}),
                &author,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn reporting_an_unknown_target_is_not_found() {
        let app = TestApp::spawn().await;
        let snitch = app.create_authenticated_user("snitch", "securepass").await;

        let res = report_rice(&app, &snitch, "00000000-0000-0000-0000-000000000000").await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod triage {
    use super::*;

    #[tokio::test]
    async fn only_admins_can_read_reports() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let rice_id = app.create_rice(&author, "Reported Rice").await;
        assert_eq!(report_rice(&app, &author, &rice_id).await.status, 201);

        let res = app.get_with_token(routes::REPORTS, &author).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let admin = app.create_admin_user("moderator", "securepass").await;
        let res = app.get_with_token(routes::REPORTS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let rows = res.body.as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "author");
        assert_eq!(rows[0]["riceId"], rice_id.as_str());
        assert_eq!(rows[0]["isClosed"], false);
        assert!(rows[0].get("commentId").is_none(), "rice report has no comment");
    }

    #[tokio::test]
    async fn open_reports_list_before_closed_ones() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let snitch = app.create_authenticated_user("snitch", "securepass").await;
        let first = app.create_rice(&author, "First Rice").await;
        let second = app.create_rice(&author, "Second Rice").await;

        assert_eq!(report_rice(&app, &snitch, &first).await.status, 201);
        assert_eq!(report_rice(&app, &snitch, &second).await.status, 201);

        // Close the report on the second rice.
        let list = app.get_with_token(routes::REPORTS, &admin).await;
        let second_report = list.body.as_array().unwrap()[0]["id"].as_str().unwrap().to_string();
        let res = app
            .post_with_token(&routes::report_close(&second_report), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let list = app.get_with_token(routes::REPORTS, &admin).await;
        let rows = list.body.as_array().unwrap();
        assert_eq!(rows[0]["isClosed"], false);
        assert_eq!(rows[0]["riceId"], first.as_str());
        assert_eq!(rows[1]["isClosed"], true);
    }

    #[tokio::test]
    async fn a_single_report_can_be_fetched_and_closed_idempotently() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let rice_id = app.create_rice(&author, "Reported Rice").await;
        assert_eq!(report_rice(&app, &author, &rice_id).await.status, 201);

        let list = app.get_with_token(routes::REPORTS, &admin).await;
        let report_id = list.body.as_array().unwrap()[0]["id"].as_str().unwrap().to_string();

        let res = app.get_with_token(&routes::report(&report_id), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["reason"], "spam in the previews");

        for _ in 0..2 {
            let res = app
                .post_with_token(&routes::report_close(&report_id), &json!({}), &admin)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let res = app.get_with_token(&routes::report(&report_id), &admin).await;
        assert_eq!(res.body["isClosed"], true);
    }

    #[tokio::test]
    async fn closing_an_unknown_report_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin_user("moderator", "securepass").await;

        let res = app
            .post_with_token(
                &routes::report_close("00000000-0000-0000-0000-000000000000"),
                &json!({}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}
