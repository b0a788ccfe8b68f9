use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tether_http::{
    Body, Method, QueryValue, RequestBuilder, RequestDescriptor, RequestError, ResponseType,
    Transport,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("transport failed ({code})")]
struct FakeError {
    code: u32,
}

/// Records every descriptor it receives and answers with a canned result.
#[derive(Clone)]
struct RecordingTransport {
    calls: Arc<Mutex<Vec<RequestDescriptor>>>,
    reply: Result<Value, FakeError>,
}

impl RecordingTransport {
    fn ok(reply: Value) -> Self {
        Self {
            calls: Arc::default(),
            reply: Ok(reply),
        }
    }

    fn failing(code: u32) -> Self {
        Self {
            calls: Arc::default(),
            reply: Err(FakeError { code }),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last(&self) -> RequestDescriptor {
        self.calls.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    type Response = Value;
    type Error = FakeError;

    async fn send(&self, request: RequestDescriptor) -> Result<Value, FakeError> {
        self.calls.lock().unwrap().push(request);
        self.reply.clone()
    }
}

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn test_end_to_end_get() {
    tether_log::init_for_tests();
    let transport = RecordingTransport::ok(json!([{ "id": 1 }]));

    let response = RequestBuilder::new(transport.clone(), "https://api.example.com", Some("T"))
        .as_get()
        .set_relative_path("/users")
        .set_query_parameters([("limit", 10)])
        .execute()
        .await
        .unwrap();

    assert_eq!(response, json!([{ "id": 1 }]));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(
        transport.last(),
        RequestDescriptor {
            method: Method::Get,
            url: "https://api.example.com/users".to_string(),
            headers: headers(&[("Authorization", "Bearer T")]),
            body: None,
            query_parameters: [("limit".to_string(), QueryValue::Integer(10))]
                .into_iter()
                .collect(),
            response_type: ResponseType::Json,
        }
    );
}

#[tokio::test]
async fn test_empty_base_url_never_reaches_transport() {
    let transport = RecordingTransport::ok(Value::Null);
    let builder = RequestBuilder::new(transport.clone(), "", Some("T"))
        .as_post(Body::from(json!({ "a": 1 })))
        .set_relative_path("/users");

    let err = builder.execute().await.unwrap_err();
    assert!(matches!(
        err,
        RequestError::MissingConfiguration { field: "base_url", setter: "set_base_url" }
    ));
    assert_eq!(transport.call_count(), 0);

    let response = builder.set_base_url("https://api.example.com").execute().await;
    assert!(response.is_ok());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_transport_error_returned_unchanged() {
    tether_log::init_for_tests();
    let transport = RecordingTransport::failing(503);

    let err = RequestBuilder::new(&transport, "https://api.example.com", None)
        .execute()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "transport failed (503)");
    assert_eq!(err.into_transport(), Some(FakeError { code: 503 }));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_post_sends_body_and_get_does_not() {
    let transport = RecordingTransport::ok(Value::Null);
    let body = Body::from(json!({ "name": "ada" }));

    let builder = RequestBuilder::new(&transport, "https://api.example.com", None)
        .set_relative_path("/users")
        .as_post(body.clone());
    builder.execute().await.unwrap();
    assert_eq!(transport.last().method, Method::Post);
    assert_eq!(transport.last().body, Some(body.clone()));

    let builder = builder.as_get();
    builder.execute().await.unwrap();
    assert_eq!(transport.last().method, Method::Get);
    assert_eq!(transport.last().body, None);
    assert_eq!(builder.body(), Some(&body));
}

#[tokio::test]
async fn test_absent_body_passed_through() {
    let transport = RecordingTransport::ok(Value::Null);
    let builder = RequestBuilder::new(&transport, "https://api.example.com", None)
        .set_relative_path("/jobs")
        .as_post(None);
    builder.execute().await.unwrap();
    assert_eq!(
        transport.last(),
        RequestDescriptor {
            method: Method::Post,
            url: "https://api.example.com/jobs".to_string(),
            headers: BTreeMap::new(),
            body: None,
            query_parameters: BTreeMap::new(),
            response_type: ResponseType::Json,
        }
    );

    let builder = builder.as_put(Body::from("draft")).as_put(None);
    builder.execute().await.unwrap();
    assert_eq!(transport.last().method, Method::Put);
    assert_eq!(transport.last().body, None);

    builder.as_patch(None).execute().await.unwrap();
    assert_eq!(transport.last().method, Method::Patch);
    assert_eq!(transport.last().body, None);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_lowercase_authorization_header_replaces_token() {
    let transport = RecordingTransport::ok(Value::Null);
    RequestBuilder::new(&transport, "https://api.example.com", Some("T"))
        .set_header("authorization", "Basic abc")
        .execute()
        .await
        .unwrap();

    assert_eq!(transport.last().headers, headers(&[("authorization", "Basic abc")]));
}

#[tokio::test]
async fn test_builder_reusable_after_execute() {
    let transport = RecordingTransport::ok(Value::Null);
    let shared = Arc::new(transport.clone());
    let builder = RequestBuilder::new(shared, "https://api.example.com", None)
        .set_relative_path("/a")
        .set_response_type(ResponseType::Text);

    builder.execute().await.unwrap();
    builder.execute().await.unwrap();
    let builder = builder.set_relative_path("/b").as_delete();
    builder.execute().await.unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[2].url, "https://api.example.com/b");
    assert_eq!(calls[2].method, Method::Delete);
    assert_eq!(calls[2].response_type, ResponseType::Text);
}

#[tokio::test]
async fn test_no_separator_inserted() {
    let transport = RecordingTransport::ok(Value::Null);
    RequestBuilder::new(&transport, "https://api.example.com/", None)
        .set_relative_path("/users")
        .execute()
        .await
        .unwrap();
    assert_eq!(transport.last().url, "https://api.example.com//users");

    RequestBuilder::new(&transport, "https://api.example.com", None)
        .execute()
        .await
        .unwrap();
    assert_eq!(transport.last().url, "https://api.example.com");
}

#[tokio::test]
async fn test_set_token_overwrites_authorization_only() {
    let transport = RecordingTransport::ok(Value::Null);
    RequestBuilder::new(&transport, "https://api.example.com", Some("first"))
        .set_header("Accept", "application/json")
        .set_token("x")
        .execute()
        .await
        .unwrap();

    assert_eq!(
        transport.last().headers,
        headers(&[("Accept", "application/json"), ("Authorization", "Bearer x")])
    );
}

#[tokio::test]
async fn test_query_parameters_last_call_wins() {
    let transport = RecordingTransport::ok(Value::Null);
    RequestBuilder::new(&transport, "https://api.example.com", None)
        .set_query_parameters([("a", 1)])
        .set_query_parameters([
            ("b", QueryValue::from("two")),
            ("c", QueryValue::from(3.5)),
        ])
        .execute()
        .await
        .unwrap();

    let query = transport.last().query_parameters;
    assert_eq!(query.len(), 2);
    assert_eq!(query.get("b"), Some(&QueryValue::Text("two".to_string())));
    assert_eq!(query.get("c"), Some(&QueryValue::Float(3.5)));
    assert!(query.get("a").is_none());
}
