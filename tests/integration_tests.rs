//! Integration tests using wiremock to simulate question engines.

use qengine_client::{
    Client, ConnectionFailure, EngineConfig, Error, FileAttachment, NormalizedResult,
    QuestionEngine, RequestUrl, SoapCall, StartSession, Warning, USER_AGENT,
};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_json_post_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", USER_AGENT))
        .and(body_json(json!({"questionID": "q1", "questionVersion": "1.0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"questionSession": "s1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client
        .call(
            client
                .post("/session")
                .json(json!({"questionID": "q1", "questionVersion": "1.0"}))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(result, NormalizedResult::Decoded(json!({"questionSession": "s1"})));
}

#[tokio::test]
async fn test_query_string_body_is_sent_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/question/bank/q1/1.0"))
        .and(body_json(json!({"questionFile": "q1.xml", "passKey": "abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let builder = client
        .post("/question/bank/q1/1.0")
        .body_str("questionFile=q1.xml&passKey=abc")
        .unwrap();
    let response = client.send(builder).await.unwrap();

    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_server_error_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Error"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let response = client.send(client.get("/info")).await.unwrap();
    assert_eq!(response.status_line, "HTTP/1.1 500 Internal Server Error");
    assert_eq!(response.body, "Internal Error");

    let result = client.call(client.get("/info")).await.unwrap();
    assert_eq!(
        result,
        NormalizedResult::Error {
            status: 500,
            raw_body: "Internal Error".to_string()
        }
    );
    assert_eq!(
        result.into_value(),
        json!({"errors": "Status: 500<br>Body: Internal Error"})
    );
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let builder = client
        .post("/upload")
        .json(json!({"questionID": "q1"}))
        .unwrap()
        .file(FileAttachment::from_bytes("notes.txt", "hello"))
        .file(FileAttachment::from_bytes("diagram.png", b"\x89PNG\r\n\x1a\nrest".to_vec()));
    client.send(builder).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];

    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file-0\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n",
        boundary
    )));
    assert!(body.contains("name=\"file-1\"; filename=\"diagram.png\"\r\nContent-Type: image/png"));
    assert!(body.contains(
        "Content-Disposition: form-data; name=\"json\"\r\nContent-Type: application/json\r\n\r\n{\"questionID\":\"q1\"}"
    ));
    assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    assert!(body.find("file-0").unwrap() < body.find("file-1").unwrap());
    assert!(body.find("file-1").unwrap() < body.find("name=\"json\"").unwrap());
}

#[tokio::test]
async fn test_get_with_body_warns_but_sends() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .and(body_json(json!({"verbose": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client
        .get("/info")
        .json(json!({"verbose": true}))
        .unwrap()
        .build()
        .unwrap();

    assert!(request
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::BodyWithBodilessMethod(_))));

    let response = client.execute(&request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let start = Instant::now();
    let err = client.send(client.get("/slow")).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
    assert!(err.is_connection());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = Client::builder()
        .base_url(format!("http://127.0.0.1:{}", port))
        .unwrap()
        .build()
        .unwrap();

    let err = client.send(client.get("/info")).await.unwrap_err();
    assert_eq!(err.connection_failure(), Some(ConnectionFailure::Connect));
}

#[tokio::test]
async fn test_configuration_error_before_io() {
    let mock_server = MockServer::start().await;
    let client = client_for(&mock_server);

    let err = client
        .post("/session")
        .body_str("not a body")
        .unwrap_err();
    assert!(matches!(err, Error::MalformedBodyInput(_)));

    let err = client
        .send(client.get("/info").header("Bad Header", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidHeader { .. }));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_basic_auth_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .send(client.get("/info").basic_auth("user", "pass"))
        .await
        .unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_engine_session_lifecycle() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/info"))
        .and(query_param("passKey", "pk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "om-qe"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(body_json(json!({
            "questionID": "q1",
            "questionVersion": "1.0",
            "questionBaseURL": "bank",
            "initialParamNames": ["randomseed"],
            "initialParamValues": ["3"],
            "cachedResources": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"questionSession": "s1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/session/s1"))
        .and(body_json(json!({"names": ["ans"], "values": ["4"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"questionEnd": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/session/s1"))
        .and(query_param("passKey", "pk"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = EngineConfig::new(format!("{}/api", mock_server.uri()));
    config.question_banks.push("bank".to_string());
    config.timeout = 2.0;
    let engine = QuestionEngine::connect(&mut config).unwrap();
    assert_eq!(config.url_used, Some(format!("{}/api", mock_server.uri())));

    let info = engine.get_engine_info(Some("pk")).await.unwrap();
    assert_eq!(info.decoded(), Some(&json!({"name": "om-qe"})));

    let started = engine
        .start(StartSession::new("q1", "1.0").param("randomseed", "3"))
        .await
        .unwrap();
    let session_id = started.decoded().unwrap()["questionSession"]
        .as_str()
        .unwrap()
        .to_string();

    let processed = engine
        .process(&session_id, &["ans".to_string()], &["4".to_string()])
        .await
        .unwrap();
    assert_eq!(processed.decoded().unwrap()["questionEnd"], Value::Bool(true));

    let stopped = engine.stop(&session_id, Some("pk")).await.unwrap();
    assert_eq!(
        stopped,
        NormalizedResult::Error {
            status: 204,
            raw_body: String::new()
        }
    );
}

#[tokio::test]
async fn test_logging_transport_passthrough() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/resource"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build_with_logging()
        .unwrap();

    let result = client.call(client.put("/resource")).await.unwrap();
    assert_eq!(
        result,
        NormalizedResult::Error {
            status: 404,
            raw_body: "<html>Not Found</html>".to_string()
        }
    );
}

#[tokio::test]
async fn test_soap_call() {
    let mock_server = MockServer::start().await;
    let envelope = "<soapenv:Envelope><soapenv:Body><getEngineInfo/></soapenv:Body></soapenv:Envelope>";

    Mock::given(method("POST"))
        .and(path("/services/Om"))
        .and(header("content-type", "text/xml"))
        .and(header("soapaction", "getEngineInfo"))
        .and(body_string(envelope))
        .respond_with(ResponseTemplate::new(500).set_body_string("<fault/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let location = RequestUrl::parse(&format!("{}/services/Om", mock_server.uri())).unwrap();
    let call = SoapCall::new(location, envelope).with_action("getEngineInfo");

    let reply = client.soap(&call).await.unwrap();
    assert_eq!(reply, "<fault/>");
}

#[tokio::test]
async fn test_raw_header_line_reaches_wire_without_leading_space() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client
        .get("/info")
        .header_line("X-Trace: abc")
        .unwrap()
        .build()
        .unwrap();

    let wire = String::from_utf8(request.to_wire().unwrap()).unwrap();
    assert!(wire.contains("\r\nX-Trace: abc\r\n"));

    client.execute(&request).await.unwrap();
    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].headers.get("x-trace").unwrap(), "abc");
}
