//! Calls shaped like generated operations, against a canned transport

use std::sync::{Arc, Mutex};

use openclient_core::runtime::{
    auth, decode_body, ApiKeyLocation, Client, ClientError, ClientResult, Credentials,
    HttpRequest, Method, QueryStyle, RawResponse, RequestParts, ResponseDispatcher,
    SecurityContext, StatusPattern, Transport, TransportFuture,
};
use serde::{Deserialize, Serialize};

/// Answers every request with one response and keeps what it was sent
struct Canned {
    status: u16,
    body: &'static str,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Canned {
    fn client(status: u16, body: &'static str) -> (Client, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = Canned {
            status,
            body,
            seen: seen.clone(),
        };
        let client = Client::new("https://api.example.com/v1", transport).unwrap();
        (client, seen)
    }
}

impl Transport for Canned {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        self.seen.lock().unwrap().push(request);
        let response = RawResponse {
            status: self.status,
            headers: vec![("content-type".into(), "application/json".into())],
            body: self.body.as_bytes().to_vec(),
        };
        Box::pin(async move { Ok::<_, ClientError>(response) })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Pet {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct Filter {
    status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ListPetsParams {
    limit: Option<i32>,
    filter: Option<Filter>,
    #[serde(rename = "X-Trace")]
    trace: Option<String>,
}

#[derive(Debug)]
enum ListPetsOutcome {
    Status200(Vec<Pet>),
    Status4xx(ApiError),
    Default(serde_json::Value),
}

fn list_pets_dispatcher() -> ResponseDispatcher<ListPetsOutcome> {
    ResponseDispatcher::new()
        .on(StatusPattern::exact(200), |body: &[u8]| {
            decode_body("application/json", body).map(ListPetsOutcome::Status200)
        })
        .on(StatusPattern::Range { min: 400, max: 499 }, |body: &[u8]| {
            decode_body("application/json", body).map(ListPetsOutcome::Status4xx)
        })
        .on(StatusPattern::Default, |body: &[u8]| {
            decode_body("application/json", body).map(ListPetsOutcome::Default)
        })
}

async fn list_pets_with<T>(
    client: &Client,
    params: &ListPetsParams,
    security: &SecurityContext,
    dispatcher: ResponseDispatcher<T>,
) -> ClientResult<T> {
    let mut request = RequestParts::new(Method::Get, "/pets");
    request.query("limit", &params.limit, QueryStyle::Form { explode: true })?;
    request.query("filter", &params.filter, QueryStyle::DeepObject)?;
    request.header("X-Trace", &params.trace)?;
    security.apply(&mut request);
    let response = client.send(request).await?;
    dispatcher.dispatch(response.status, &response.body)
}

fn params() -> ListPetsParams {
    ListPetsParams {
        limit: Some(10),
        filter: Some(Filter {
            status: Some("sold".into()),
        }),
        trace: None,
    }
}

fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_request_assembly() -> ClientResult<()> {
    let (client, seen) = Canned::client(200, r#"[{"id": 1, "name": "Rex"}]"#);
    let security = SecurityContext::new();
    security.configure(Credentials::api_key(ApiKeyLocation::Header, "X-API-Key", "secret"));

    let outcome = list_pets_with(&client, &params(), &security, list_pets_dispatcher()).await?;
    match outcome {
        ListPetsOutcome::Status200(pets) => assert_eq!(
            pets,
            vec![Pet {
                id: 1,
                name: "Rex".into()
            }]
        ),
        other => panic!("unexpected outcome {other:?}"),
    }

    let seen = seen.lock().unwrap();
    let request = &seen[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(
        request.url.as_str(),
        "https://api.example.com/v1/pets?limit=10&filter%5Bstatus%5D=sold"
    );
    assert_eq!(header(request, "X-API-Key"), Some("secret"));
    assert_eq!(header(request, "X-Trace"), None);
    assert!(request.body.is_none());
    Ok(())
}

#[tokio::test]
async fn test_range_and_default_responses() -> ClientResult<()> {
    let security = SecurityContext::new();

    let (client, _) = Canned::client(404, r#"{"code": 404, "message": "not found"}"#);
    let outcome = list_pets_with(&client, &params(), &security, list_pets_dispatcher()).await?;
    assert!(matches!(outcome, ListPetsOutcome::Status4xx(ApiError { code: 404, .. })));

    let (client, _) = Canned::client(503, r#"{"retry": true}"#);
    let outcome = list_pets_with(&client, &params(), &security, list_pets_dispatcher()).await?;
    assert!(matches!(outcome, ListPetsOutcome::Default(_)));
    Ok(())
}

#[tokio::test]
async fn test_caller_overrides_handler() -> ClientResult<()> {
    let (client, _) = Canned::client(404, "gone");
    let mut dispatcher = list_pets_dispatcher();
    dispatcher.set(StatusPattern::exact(404), |_body: &[u8]| {
        Ok(ListPetsOutcome::Status200(Vec::new()))
    });

    let outcome = list_pets_with(&client, &params(), &SecurityContext::new(), dispatcher).await?;
    assert!(matches!(outcome, ListPetsOutcome::Status200(pets) if pets.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_unhandled_status() {
    let (client, _) = Canned::client(500, "boom");
    let dispatcher: ResponseDispatcher<Pet> = ResponseDispatcher::new()
        .on(StatusPattern::exact(200), |body: &[u8]| decode_body("application/json", body));

    let err = list_pets_with(&client, &params(), &SecurityContext::new(), dispatcher)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, ClientError::UnhandledStatusCode { ref body, .. } if body.as_slice() == b"boom"));
}

#[tokio::test]
async fn test_global_credentials() -> ClientResult<()> {
    let (client, seen) = Canned::client(201, "");

    auth::global().configure(Credentials::bearer("t0ken"));
    let mut request = RequestParts::new(Method::Post, "/pets/{petId}");
    request.path_param("petId", "a b/c")?;
    request.body("application/json", &Pet {
        id: 7,
        name: "Tom".into(),
    })?;
    auth::global().apply(&mut request);
    auth::global().clear();
    client.send(request).await?;

    let seen = seen.lock().unwrap();
    let request = &seen[0];
    assert_eq!(request.url.as_str(), "https://api.example.com/v1/pets/a%20b%2Fc");
    assert_eq!(header(request, "Authorization"), Some("Bearer t0ken"));
    assert_eq!(header(request, "Content-Type"), Some("application/json"));
    assert_eq!(
        request.body.as_deref(),
        Some(br#"{"id":7,"name":"Tom"}"#.as_slice())
    );
    assert!(auth::global().active().is_none());
    Ok(())
}
