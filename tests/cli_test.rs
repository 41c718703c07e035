use std::path::PathBuf;

use clap::Parser;
use mockito::{Matcher, Server};
use sf_core::config::AppConfig;
use sf_core::RouteDomain;
use snapfeed_lib::{run, Cli, Command};
use tempfile::TempDir;

fn config(server: &Server, data_dir: &TempDir) -> AppConfig {
    AppConfig {
        backend_url: server.url(),
        anon_key: "anon-key".to_string(),
        data_dir: data_dir.path().to_path_buf(),
        retry_base_delay_ms: 1,
        retry_jitter_ms: 0,
        ..AppConfig::default()
    }
}

#[test]
fn parses_global_flags_after_the_subcommand() {
    let cli = Cli::try_parse_from([
        "snapfeed",
        "sign-in",
        "--email",
        "ada@example.com",
        "--password",
        "secret1",
        "--config",
        "/tmp/snapfeed.toml",
        "--dump-logs",
    ])
    .unwrap();

    assert!(cli.dump_logs);
    assert_eq!(cli.config_path(), PathBuf::from("/tmp/snapfeed.toml"));
    assert_eq!(
        cli.command,
        Command::SignIn {
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
        }
    );
}

#[test]
fn upload_avatar_takes_a_positional_file() {
    let cli = Cli::try_parse_from(["snapfeed", "upload-avatar", "me.png"]).unwrap();

    assert_eq!(
        cli.command,
        Command::UploadAvatar {
            file: PathBuf::from("me.png"),
            content_type: None,
        }
    );
    assert!(cli.config_path().ends_with("snapfeed/config.toml"));
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["snapfeed"]).is_err());
    assert!(Cli::try_parse_from(["snapfeed", "onboard"]).is_err());
}

#[tokio::test]
async fn status_without_cached_session_reports_auth_route() {
    let server = Server::new_async().await;
    let data_dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from(["snapfeed", "status", "--dump-logs"]).unwrap();

    let output = run(cli, config(&server, &data_dir)).await.unwrap();

    assert_eq!(output.snapshot.route, Some(RouteDomain::Auth));
    assert!(output.detail.is_none());
    assert!(output.logs.is_some());
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["snapshot"]["route"], "auth");
    assert!(json["snapshot"].get("session").is_none());
}

#[tokio::test]
async fn sign_in_then_status_restores_the_cached_session() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/auth/v1/token".into()))
        .with_status(200)
        .with_body(
            r#"{"access_token":"user-token","refresh_token":"r1","expires_in":3600,
                "user":{"id":"user-1","email":"ada@example.com"}}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/rest/v1/profiles".into()))
        .with_status(200)
        .with_body(r#"[{"id":"user-1","name":"Ada Lovelace"}]"#)
        .create_async()
        .await;
    let data_dir = TempDir::new().unwrap();

    let sign_in = Cli::try_parse_from([
        "snapfeed",
        "sign-in",
        "--email",
        "ada@example.com",
        "--password",
        "secret1",
    ])
    .unwrap();
    let output = run(sign_in, config(&server, &data_dir)).await.unwrap();
    assert_eq!(output.snapshot.route, Some(RouteDomain::Main));
    assert_eq!(output.detail.as_deref(), Some("signed in as user-1"));

    let status = Cli::try_parse_from(["snapfeed", "status"]).unwrap();
    let output = run(status, config(&server, &data_dir)).await.unwrap();
    assert_eq!(output.snapshot.route, Some(RouteDomain::Main));
    assert_eq!(
        output.snapshot.profile.map(|p| p.handle()),
        Some("@adalovelace".to_string())
    );
}

#[tokio::test]
async fn upload_with_unknown_extension_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", Matcher::Regex(r"^/storage/".into()))
        .expect(0)
        .create_async()
        .await;
    let data_dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from(["snapfeed", "upload-avatar", "notes.txt"]).unwrap();

    let err = run(cli, config(&server, &data_dir)).await.unwrap_err();

    assert!(err.to_string().contains("notes.txt"), "got: {err}");
    upload.assert_async().await;
}

#[test]
fn toggle_like_takes_the_currently_seen_state() {
    let cli =
        Cli::try_parse_from(["snapfeed", "toggle-like", "post-9", "--liked", "--likes", "3"])
            .unwrap();

    assert_eq!(
        cli.command,
        Command::ToggleLike {
            post_id: "post-9".to_string(),
            liked: true,
            likes: 3,
        }
    );
}

#[tokio::test]
async fn toggle_follow_follows_when_no_row_exists() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", Matcher::Regex(r"^/auth/v1/token".into()))
        .with_status(200)
        .with_body(
            r#"{"access_token":"user-token","refresh_token":"r1","expires_in":3600,
                "user":{"id":"user-1","email":"ada@example.com"}}"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/rest/v1/profiles".into()))
        .with_status(200)
        .with_body(r#"[{"id":"user-1","name":"Ada Lovelace"}]"#)
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/rest/v1/followers".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("follower_id".into(), "eq.user-1".into()),
            Matcher::UrlEncoded("following_id".into(), "eq.user-2".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/followers")
        .match_header("authorization", "Bearer user-token")
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let data_dir = TempDir::new().unwrap();

    let sign_in = Cli::try_parse_from([
        "snapfeed",
        "sign-in",
        "--email",
        "ada@example.com",
        "--password",
        "secret1",
    ])
    .unwrap();
    run(sign_in, config(&server, &data_dir)).await.unwrap();

    let follow = Cli::try_parse_from(["snapfeed", "toggle-follow", "user-2"]).unwrap();
    let output = run(follow, config(&server, &data_dir)).await.unwrap();

    insert.assert_async().await;
    assert_eq!(output.detail.as_deref(), Some("following user-2"));
}
