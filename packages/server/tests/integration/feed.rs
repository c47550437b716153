use chrono::{DateTime, Utc};
use serde_json::Value;

use server::feed::cursor::CURSOR_TIMESTAMP_FORMAT;

use crate::common::{TestApp, routes};

/// Reformat a `createdAt` JSON value into the cursor timestamp format
/// the feed accepts (numeric offset, six fractional digits).
fn cursor_timestamp(raw: &Value) -> String {
    let raw = raw.as_str().expect("createdAt should be a string");
    DateTime::parse_from_rfc3339(raw)
        .expect("createdAt should be RFC 3339")
        .with_timezone(&Utc)
        .format(CURSOR_TIMESTAMP_FORMAT)
        .to_string()
}

fn titles(page: &Value) -> Vec<String> {
    page.as_array()
        .expect("feed page should be an array")
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

mod recent_pagination {
    use super::*;

    #[tokio::test]
    async fn twenty_one_rices_paginate_exactly() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("paginator", "securepass").await;

        for i in 1..=21 {
            app.create_rice(&token, &format!("Rice Number {i:02}")).await;
        }

        let page1 = app
            .get_with_query(routes::RICES, &[("sort", "recent".to_string())])
            .await;
        assert_eq!(page1.status, 200, "{}", page1.text);

        let rows = page1.body.as_array().expect("array");
        assert_eq!(rows.len(), 20, "page size is fixed at 20");
        assert_eq!(rows[0]["title"], "Rice Number 21");
        assert_eq!(rows[19]["title"], "Rice Number 02");

        let last = &rows[19];
        let page2 = app
            .get_with_query(
                routes::RICES,
                &[
                    ("sort", "recent".to_string()),
                    ("lastId", last["id"].as_str().unwrap().to_string()),
                    ("lastCreatedAt", cursor_timestamp(&last["createdAt"])),
                ],
            )
            .await;
        assert_eq!(page2.status, 200, "{}", page2.text);

        // No overlap, no gap: exactly the one remaining rice.
        assert_eq!(titles(&page2.body), vec!["Rice Number 01"]);
    }

    #[tokio::test]
    async fn resubmitting_the_last_row_never_repeats_it() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("paginator", "securepass").await;

        for i in 1..=5 {
            app.create_rice(&token, &format!("Small Feed {i}")).await;
        }

        let page1 = app
            .get_with_query(routes::RICES, &[("sort", "recent".to_string())])
            .await;
        let rows = page1.body.as_array().expect("array");
        assert_eq!(rows.len(), 5);

        // Continue from the middle; the boundary row must not reappear.
        let boundary = &rows[2];
        let page2 = app
            .get_with_query(
                routes::RICES,
                &[
                    ("sort", "recent".to_string()),
                    ("lastId", boundary["id"].as_str().unwrap().to_string()),
                    ("lastCreatedAt", cursor_timestamp(&boundary["createdAt"])),
                ],
            )
            .await;

        let next_titles = titles(&page2.body);
        assert_eq!(next_titles, vec!["Small Feed 2", "Small Feed 1"]);
    }
}

mod sort_modes {
    use super::*;

    #[tokio::test]
    async fn absent_sort_defaults_to_trending() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("sorter", "securepass").await;
        app.create_rice(&token, "Lone Rice").await;

        let res = app.get_without_token(routes::RICES).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(titles(&res.body), vec!["Lone Rice"]);
    }

    #[tokio::test]
    async fn unknown_sort_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_query(routes::RICES, &[("sort", "alphabetical".to_string())])
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .get_with_query(routes::RICES, &[("sort", String::new())])
            .await;
        assert_eq!(res.status, 400, "empty sort is not the default");
    }

    #[tokio::test]
    async fn trending_decays_old_engagement() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let fan1 = app.create_authenticated_user("fanone", "securepass").await;
        let fan2 = app.create_authenticated_user("fantwo", "securepass").await;

        let veteran = app.create_rice(&author, "Veteran Rice").await;
        let rising = app.create_rice(&author, "Rising Rice").await;
        let quiet = app.create_rice(&author, "Quiet Rice").await;

        // The veteran has the most engagement overall, but is a week old.
        app.star_rice(&fan1, &veteran).await;
        app.star_rice(&fan2, &veteran).await;
        app.download_rice(&veteran).await;
        app.backdate_rice(&veteran, chrono::Duration::days(7)).await;

        app.star_rice(&fan1, &rising).await;
        let _ = quiet;

        let res = app
            .get_with_query(routes::RICES, &[("sort", "trending".to_string())])
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        // (downloads + stars) / (hours + 2)^1.5: a fresh rice with one
        // star outscores a week-old rice with three times the
        // engagement, and any engagement beats none.
        assert_eq!(
            titles(&res.body),
            vec!["Rising Rice", "Veteran Rice", "Quiet Rice"]
        );
    }

    #[tokio::test]
    async fn most_stars_orders_by_star_count() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let fan1 = app.create_authenticated_user("fanone", "securepass").await;
        let fan2 = app.create_authenticated_user("fantwo", "securepass").await;

        let plain = app.create_rice(&author, "Plain Rice").await;
        let popular = app.create_rice(&author, "Popular Rice").await;
        let middling = app.create_rice(&author, "Middling Rice").await;

        app.star_rice(&fan1, &popular).await;
        app.star_rice(&fan2, &popular).await;
        app.star_rice(&fan1, &middling).await;
        let _ = plain;

        let res = app
            .get_with_query(routes::RICES, &[("sort", "mostStars".to_string())])
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            titles(&res.body),
            vec!["Popular Rice", "Middling Rice", "Plain Rice"]
        );

        let rows = res.body.as_array().unwrap();
        assert_eq!(rows[0]["starCount"], 2);
        assert_eq!(rows[1]["starCount"], 1);
        assert_eq!(rows[2]["starCount"], 0);
    }

    #[tokio::test]
    async fn most_downloads_orders_and_paginates_by_count() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("author", "securepass").await;

        let hot = app.create_rice(&token, "Hot Rice").await;
        let warm = app.create_rice(&token, "Warm Rice").await;
        let cold = app.create_rice(&token, "Cold Rice").await;

        for _ in 0..3 {
            app.download_rice(&hot).await;
        }
        app.download_rice(&warm).await;
        let _ = cold;

        let res = app
            .get_with_query(routes::RICES, &[("sort", "mostDownloads".to_string())])
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(titles(&res.body), vec!["Hot Rice", "Warm Rice", "Cold Rice"]);

        // Continue after the first row by resubmitting its own fields.
        let rows = res.body.as_array().unwrap();
        let res = app
            .get_with_query(
                routes::RICES,
                &[
                    ("sort", "mostDownloads".to_string()),
                    ("lastId", rows[0]["id"].as_str().unwrap().to_string()),
                    (
                        "lastDownloads",
                        rows[0]["downloadCount"].as_i64().unwrap().to_string(),
                    ),
                ],
            )
            .await;
        assert_eq!(titles(&res.body), vec!["Warm Rice", "Cold Rice"]);
    }
}

mod cursor_validation {
    use super::*;

    #[tokio::test]
    async fn malformed_cursor_fields_fail_before_any_query() {
        let app = TestApp::spawn().await;

        for (field, value) in [
            ("lastId", "not-a-uuid"),
            ("lastCreatedAt", "2026-01-01T00:00:00Z"),
            ("lastCreatedAt", "yesterday"),
            ("lastDownloads", "many"),
            ("lastDownloads", "1.5"),
        ] {
            let res = app
                .get_with_query(
                    routes::RICES,
                    &[
                        ("sort", "recent".to_string()),
                        (field, value.to_string()),
                    ],
                )
                .await;
            assert_eq!(res.status, 400, "{field}={value}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn empty_cursor_fields_mean_first_page() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("author", "securepass").await;
        app.create_rice(&token, "Only Rice").await;

        let res = app
            .get_with_query(
                routes::RICES,
                &[
                    ("sort", "recent".to_string()),
                    ("lastId", String::new()),
                    ("lastCreatedAt", String::new()),
                    ("lastDownloads", String::new()),
                ],
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(titles(&res.body), vec!["Only Rice"]);
    }
}

mod viewer_stars {
    use super::*;

    #[tokio::test]
    async fn anonymous_viewers_see_is_starred_false() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let fan = app.create_authenticated_user("fanuser", "securepass").await;

        let rice = app.create_rice(&author, "Starred Rice").await;
        app.star_rice(&fan, &rice).await;

        let res = app.get_without_token(routes::RICES).await;
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows[0]["isStarred"], false);
        assert_eq!(rows[0]["starCount"], 1);
    }

    #[tokio::test]
    async fn viewer_sees_only_their_own_stars() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        let fan = app.create_authenticated_user("fanuser", "securepass").await;
        let other = app.create_authenticated_user("someone", "securepass").await;

        let starred = app.create_rice(&author, "Starred Rice").await;
        let unstarred = app.create_rice(&author, "Unstarred Rice").await;
        app.star_rice(&fan, &starred).await;
        app.star_rice(&other, &unstarred).await;

        let res = app
            .get_with_query_and_token(
                routes::RICES,
                &[("sort", "recent".to_string())],
                &fan,
            )
            .await;
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows[0]["title"], "Unstarred Rice");
        assert_eq!(rows[0]["isStarred"], false);
        assert_eq!(rows[1]["title"], "Starred Rice");
        assert_eq!(rows[1]["isStarred"], true);
    }

    #[tokio::test]
    async fn a_stale_token_degrades_to_anonymous_instead_of_failing() {
        let app = TestApp::spawn().await;
        let author = app.create_authenticated_user("author", "securepass").await;
        app.create_rice(&author, "Visible Rice").await;

        let res = app.get_with_token(routes::RICES, "garbage-token").await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(titles(&res.body), vec!["Visible Rice"]);
    }
}

mod feed_projection {
    use super::*;

    #[tokio::test]
    async fn rows_carry_author_and_thumbnail_fields() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("author", "securepass").await;
        app.create_rice(&token, "Projected Rice").await;

        let res = app.get_without_token(routes::RICES).await;
        let row = &res.body.as_array().unwrap()[0];

        assert_eq!(row["authorUsername"], "author");
        assert_eq!(row["authorDisplayName"], "author display");
        assert_eq!(row["slug"], "projected-rice");
        assert_eq!(row["downloadCount"], 0);
        assert!(
            row["thumbnailUrl"]
                .as_str()
                .unwrap()
                .starts_with("http://cdn.test/previews/"),
            "thumbnail should point at the stored preview: {}",
            row["thumbnailUrl"]
        );
        assert!(row["createdAt"].is_string());
    }
}
