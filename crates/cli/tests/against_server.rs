//! The client driving a real server on a loopback port.
use backend_lib::{
    clock::SystemClock,
    config::{AuthSettings, Settings},
    create_router,
    store::FlatFileStore,
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tempfile::TempDir;
use tokio::net::TcpListener;
use towernotes_cli::{AuthApi, CliAuth, ClientError, HttpAuthApi};
use towernotes_common::CredentialFile;

async fn spawn_server() -> SocketAddr {
    let settings = Settings {
        auth: AuthSettings {
            jwt_secret: "cli-integration-secret-0123456789ab".to_string(),
            scrypt_log_n: 4,
            ..AuthSettings::default()
        },
        ..Settings::default()
    };
    let state =
        AppState::from_store(FlatFileStore::in_memory(), Arc::new(SystemClock), settings).unwrap();
    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(base_url: &str) -> (CliAuth<HttpAuthApi>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let file = CredentialFile::new(dir.path().join("tokens.json"));
    (CliAuth::new(HttpAuthApi::new(base_url).unwrap(), file), dir)
}

#[tokio::test]
async fn register_logout_revokes_on_the_server() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}");
    let (cli, _dir) = client(&base);

    let stored = cli.register("alice", "secret1").await.unwrap();
    assert_eq!(cli.credential_file().current_user().as_deref(), Some("alice"));

    assert_eq!(cli.logout().await.unwrap().as_deref(), Some("alice"));
    assert!(!cli.credential_file().path().exists());

    // The revoked refresh token no longer works
    let response = reqwest::Client::new()
        .post(format!("{base}/auth/refresh"))
        .json(&serde_json::json!({"refreshToken": stored.refresh_token}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn wrong_password_surfaces_the_server_code() {
    let addr = spawn_server().await;
    let (cli, _dir) = client(&format!("http://{addr}"));
    cli.register("bob", "secret1").await.unwrap();
    cli.logout().await.unwrap();

    let err = cli.login("bob", "secret9").await.unwrap_err();

    match err {
        ClientError::Rejected { status, code, .. } => {
            assert_eq!(status, 401);
            assert_eq!(code, "AUTH_001");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert!(!cli.credential_file().path().exists());
}

#[tokio::test]
async fn logout_with_server_gone_still_clears_the_file() {
    // Reserve a port, then close it so connections are refused
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (cli, _dir) = client(&format!("http://{addr}"));
    cli.credential_file()
        .store(
            &towernotes_common::TokenPair {
                access_token: "stale-access".into(),
                refresh_token: "stale-refresh".into(),
            },
            "carol",
            chrono::Utc::now(),
        )
        .unwrap();

    let remote = HttpAuthApi::new(format!("http://{addr}"))
        .unwrap()
        .logout("stale-refresh")
        .await;
    assert!(matches!(remote, Err(ClientError::Http(_))));

    assert_eq!(cli.logout().await.unwrap().as_deref(), Some("carol"));
    assert!(!cli.credential_file().path().exists());
}
