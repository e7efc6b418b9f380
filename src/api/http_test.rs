use std::io::Write;

use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

use super::*;

fn setup_api(url: String) -> HttpApi {
    HttpApi::new()
        .expect("failed to build api")
        .with_endpoint(&url)
        .with_csrf_token("csrf_token")
        .with_session_id("session")
}

#[tokio::test]
async fn test_list_conversations() {
    let body = json!([
        {
            "id": "c1",
            "title": "First",
            "active_version": "v1",
            "versions": [
                {"id": "v1", "conversation_id": "c1", "root_message": null, "parent_version": null, "active": true, "messages": [
                    {"id": "m1", "role": "user", "content": "hi"}
                ]}
            ]
        },
        {"id": "c2", "title": "Second", "versions": []}
    ]);

    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("GET", "/chat/conversations_branched/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("page_size".into(), "10".into()),
        ]))
        .match_header("X-CSRFToken", "csrf_token")
        .match_header("Cookie", "sessionid=session")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let api = setup_api(server.url());
    let conversations = api
        .list_conversations(2, 10)
        .await
        .expect("failed to list conversations");

    handler.assert_async().await;
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].title(), "First");
    assert_eq!(conversations[0].versions()[0].messages()[0].content(), "hi");
    assert!(conversations.iter().all(|c| !c.active()));
}

#[tokio::test]
async fn test_create_conversation() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/chat/conversations/add/")
        .match_body(Matcher::Json(json!({
            "title": "Greeting",
            "messages": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi there"}
            ]
        })))
        .with_status(201)
        .with_body(
            json!({
                "id": "c1",
                "title": "Greeting",
                "active_version": "v1",
                "versions": [{"id": "v1", "conversation_id": "c1", "active": true, "messages": []}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = setup_api(server.url());
    let convo = api
        .create_conversation(
            "Greeting".to_string(),
            vec![
                Message::new_user("hello"),
                Message::new_assistant("hi there"),
            ],
        )
        .await
        .expect("failed to create conversation");

    handler.assert_async().await;
    assert_eq!(convo.id(), "c1");
    assert!(convo.active());
    assert_eq!(convo.active_version().map(|v| v.id()), Some("v1"));
}

#[tokio::test]
async fn test_add_message() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/chat/conversations/c1/add_message/")
        .match_body(Matcher::Json(json!({"role": "user", "content": "hello"})))
        .with_status(201)
        .with_body(
            json!({
                "conversation_id": "c1",
                "message": {"id": "m9", "role": "user", "content": "hello", "created_at": "2024-05-01T10:00:00Z"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = setup_api(server.url());
    let added = api
        .add_message("c1".to_string(), Role::User, "hello".to_string())
        .await
        .expect("failed to add message");

    handler.assert_async().await;
    assert_eq!(added.conversation_id, "c1");
    assert_eq!(added.hidden, false);
    assert_eq!(added.message.unwrap().id(), "m9");
}

#[tokio::test]
async fn test_add_version_and_switch() {
    let mut server = mockito::Server::new_async().await;
    let add_handler = server
        .mock("POST", "/chat/conversations/c1/add_version/")
        .match_body(Matcher::Json(json!({"root_message_id": "m1"})))
        .with_status(201)
        .with_body(
            json!({"id": "v2", "conversation_id": "c1", "root_message": "m1", "parent_version": "v1", "messages": []})
                .to_string(),
        )
        .create_async()
        .await;
    let switch_handler = server
        .mock("PUT", "/chat/conversations/c1/switch_version/v2/")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let api = setup_api(server.url());
    let version = api
        .add_version("c1".to_string(), "m1".to_string())
        .await
        .expect("failed to add version");
    assert_eq!(version.parent_version(), Some("v1"));

    api.switch_version("c1".to_string(), "v2".to_string())
        .await
        .expect("failed to switch version");

    add_handler.assert_async().await;
    switch_handler.assert_async().await;
}

#[tokio::test]
async fn test_error_response() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("PUT", "/chat/conversations/c1/switch_version/v9/")
        .with_status(404)
        .with_body(json!({"detail": "Version not found"}).to_string())
        .create_async()
        .await;

    let api = setup_api(server.url());
    let err = api
        .switch_version("c1".to_string(), "v9".to_string())
        .await
        .unwrap_err();

    handler.assert_async().await;
    let err = err.downcast_ref::<ApiError>().expect("expected an api error");
    assert_eq!(err.http_code, 404);
    assert_eq!(err.detail, "Version not found");
}

#[tokio::test]
async fn test_change_title_and_delete() {
    let mut server = mockito::Server::new_async().await;
    let title_handler = server
        .mock("PUT", "/chat/conversations/c1/change_title/")
        .match_body(Matcher::Json(json!({"title": "Renamed"})))
        .with_status(200)
        .with_body(json!({"id": "c1", "title": "Renamed"}).to_string())
        .create_async()
        .await;
    let delete_handler = server
        .mock("PUT", "/chat/conversations/c1/delete/")
        .with_status(200)
        .with_body("\"c1\"")
        .create_async()
        .await;

    let api = setup_api(server.url());
    api.change_title("c1".to_string(), "Renamed".to_string())
        .await
        .expect("failed to change title");
    api.delete_conversation("c1".to_string())
        .await
        .expect("failed to delete conversation");

    title_handler.assert_async().await;
    delete_handler.assert_async().await;
}

#[tokio::test]
async fn test_chat_completion_stream() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/gpt/conversation/")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "Say hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_chunked_body(|w| {
            w.write_all("Hello, ".as_bytes())?;
            w.write_all("world".as_bytes())
        })
        .create_async()
        .await;

    let api = setup_api(server.url());
    let mut stream = api
        .chat_completion(vec![Message::new_user("Say hello")], "gpt-4".to_string())
        .await
        .expect("failed to start completion");

    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend(chunk.expect("failed to read chunk"));
    }

    handler.assert_async().await;
    assert_eq!(String::from_utf8(body).unwrap(), "Hello, world");
}

#[tokio::test]
async fn test_generate_title_accepts_content_field() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/gpt/title/")
        .match_body(Matcher::Json(json!({
            "user_question": "What is Rust?",
            "chatbot_response": "A language."
        })))
        .with_status(200)
        .with_body(json!({"content": "About Rust"}).to_string())
        .create_async()
        .await;

    let api = setup_api(server.url());
    let title = api
        .generate_title("What is Rust?".to_string(), "A language.".to_string())
        .await
        .expect("failed to generate title");

    handler.assert_async().await;
    assert_eq!(title, "About Rust");
}

#[test]
fn test_from_server_config() {
    let config = ServerConfig {
        endpoint: "https://chat.example.com/".to_string(),
        timeout_secs: Some(5),
        ..Default::default()
    };
    let api = HttpApi::try_from(&config).expect("failed to build api");
    assert_eq!(api.endpoint(), "https://chat.example.com");
    assert_eq!(api.timeout(), Some(time::Duration::from_secs(5)));
}

#[test]
fn test_api_error_from_plain_body() {
    let err = ApiError::from_body(502, "Bad Gateway\n");
    assert_eq!(err.detail, "Bad Gateway");
    assert_eq!(err.to_string(), "backend error (502): Bad Gateway");
}
