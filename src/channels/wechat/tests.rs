use super::*;
use crate::error::{BridgeError, CompletionError, SessionError};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> WechatGatewayClient {
    WechatGatewayClient::new(&server.uri(), Duration::from_secs(10))
}

fn temp_store(dir: &tempfile::TempDir) -> JsonFileCredentialStore {
    JsonFileCredentialStore::new(dir.path().join("token.json"))
}

#[tokio::test]
async fn hot_login_with_stored_credential_persists_refreshed_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"credential": {"wxsid": "old"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "credential": {"wxsid": "new"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    store
        .save(&SessionCredential::new(json!({"wxsid": "old"})))
        .unwrap();

    gateway(&server).hot_login(&store).await.unwrap();
    assert_eq!(
        store.load(),
        Some(SessionCredential::new(json!({"wxsid": "new"})))
    );
}

#[tokio::test]
async fn hot_login_without_credential_waits_for_qr_scan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"credential": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "pending",
            "uuid": "wx-uuid-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login/status"))
        .and(query_param("uuid", "wx-uuid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "credential": {"wxsid": "scanned"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    gateway(&server).hot_login(&store).await.unwrap();
    assert!(store.path().exists());
}

#[tokio::test]
async fn rejected_login_does_not_persist_anything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "message": "session expired"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let err = gateway(&server).hot_login(&store).await.unwrap_err();
    assert!(err.to_string().contains("session expired"));
    assert!(!store.path().exists());
}

#[tokio::test]
async fn http_error_on_login_is_a_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    assert!(gateway(&server).hot_login(&temp_store(&dir)).await.is_err());
}

#[tokio::test]
async fn contact_queries_decode_gateway_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/self"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"UserName": "@me", "NickName": "bridge"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "@@g1", "nickname": "family"}
        ])))
        .mount(&server)
        .await;

    let client = gateway(&server);
    let me = client.current_user().await.unwrap();
    assert_eq!(me.id, "@me");
    assert_eq!(me.display_name(), "bridge");
    let groups = client.groups().await.unwrap();
    assert_eq!(groups[0].nickname, "family");
}

#[tokio::test]
async fn block_contact_requests_posts_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contact-requests/block"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server).block_contact_requests().await.unwrap();
}

#[tokio::test]
async fn send_posts_reply_to_recipient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_json(json!({"to": "@friend", "text": "你好"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server).send("你好", "@friend").await.unwrap();
}

#[tokio::test]
async fn listen_skips_self_and_non_text_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "m1", "from": "@me", "text": "echo", "is_self": true},
            {"id": "m2", "from": "@friend", "image": "..."},
            {"id": "m3", "from": "@friend", "text": "hello"}
        ])))
        .mount(&server)
        .await;

    let client = gateway(&server);
    let (tx, mut rx) = tokio::sync::mpsc::channel(4);
    let listener = tokio::spawn(async move { client.listen(tx).await });

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.id, "m3");
    assert_eq!(msg.sender, "@friend");
    assert_eq!(msg.channel, "wechat");

    drop(rx);
    listener.abort();
}

struct CountingProvider {
    calls: AtomicUsize,
}

impl Provider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn complete<'a>(
        &'a self,
        _message: &'a str,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, CompletionError>> + Send + 'a>>
    {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("reply".to_string())
        })
    }
}

#[tokio::test]
async fn start_wechat_never_reaches_dispatch_when_login_keeps_failing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "message": "blocked account"
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contact-requests/block"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    store
        .save(&SessionCredential::new(json!({"wxsid": "stale"})))
        .unwrap();
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    });

    let err = start_wechat(Arc::new(gateway(&server)), &store, provider.clone())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::Session(SessionError::RetryExhausted { .. })
    ));
    assert!(err.to_string().contains("blocked account"));
    assert!(!store.path().exists());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}
