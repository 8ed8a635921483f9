//! End-to-end client scenarios against a mock annotation server.

use crate::graph::{vocab, Term};
use crate::{
    AnnotationClient, AnnotationResponse, Configuration, CONTENT_TYPE_IIIF, CONTENT_TYPE_OA,
    JSONLD_TYPE,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use crate::logging::capture::capture_logs;
use serde_json::json;

const CONTAINER: &str = "/annotations/foo/";

fn config(server: &ServerGuard) -> Configuration {
    Configuration::default()
        .with_host(server.url())
        .with_container("annotations/foo")
        .with_retries(3, 1)
}

fn client(server: &ServerGuard) -> AnnotationClient {
    AnnotationClient::new(config(server)).unwrap()
}

fn authed_client(server: &ServerGuard) -> AnnotationClient {
    let config = config(server)
        .with_client_credentials("clientA", "secretA")
        .with_container_login("joe", "org:wg-A");
    AnnotationClient::new(config).unwrap()
}

async fn mock_auth(server: &mut ServerGuard, hits: usize) -> Vec<Mock> {
    let identity = server
        .mock("POST", "/auth/client_identity")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"authorizationCode":"code123"}"#)
        .expect(hits)
        .create_async()
        .await;
    let login = server
        .mock("POST", "/auth/login")
        .match_query(Matcher::Any)
        .with_status(200)
        .expect(hits)
        .create_async()
        .await;
    let token = server
        .mock("GET", "/auth/access_token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"tok-1","tokenType":"Bearer","expiresIn":3600}"#)
        .expect(hits)
        .create_async()
        .await;
    vec![identity, login, token]
}

async fn assert_all(mocks: &[Mock]) {
    for mock in mocks {
        mock.assert_async().await;
    }
}

fn annotation_jsonld(uri: &str) -> String {
    json!({
        "@context": {
            "oa": "http://www.w3.org/ns/oa#",
            "cnt": "http://www.w3.org/2011/content#"
        },
        "@id": uri,
        "@type": "oa:Annotation",
        "oa:motivatedBy": {"@id": "oa:commenting"},
        "oa:hasBody": {
            "@type": "cnt:ContentAsText",
            "cnt:chars": "I love this!"
        }
    })
    .to_string()
}

// ========== Delete ==========

#[tokio::test]
async fn test_delete_success_statuses() {
    for status in [200, 202, 204, 404, 410] {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/annotations/foo/abc")
            .with_status(status)
            .expect(1)
            .create_async()
            .await;

        let (logs, _guard) = capture_logs();
        let deleted = client(&server).delete_annotation("abc").await.unwrap();
        assert!(deleted, "status {status}");
        assert!(logs.error_lines().is_empty(), "status {status}: {}", logs.contents());
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_delete_failure_statuses() {
    for status in [201, 400, 403, 450, 500, 503] {
        let mut server = Server::new_async().await;
        let auth = mock_auth(&mut server, 0).await;
        let mock = server
            .mock("DELETE", "/annotations/foo/abc")
            .with_status(status)
            .with_body("delete_exception")
            .expect(1)
            .create_async()
            .await;

        let (logs, _guard) = capture_logs();
        let deleted = authed_client(&server).delete_annotation("abc").await.unwrap();
        assert!(!deleted, "status {status}");

        let errors = logs.error_lines();
        assert_eq!(errors.len(), 1, "status {status}: {}", logs.contents());
        assert!(errors[0].contains("abc"));
        assert!(errors[0].contains("delete_exception"));

        assert_all(&auth).await;
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_delete_unreachable_server() {
    let config = Configuration::default()
        .with_host("http://127.0.0.1:1")
        .with_container("annotations/foo");
    let client = AnnotationClient::new(config).unwrap();

    let (logs, _guard) = capture_logs();
    assert!(!client.delete_annotation("abc").await.unwrap());
    assert_eq!(logs.error_lines().len(), 1, "{}", logs.contents());
}

#[tokio::test]
async fn test_delete_dot_segment_never_reaches_container() {
    let mut server = Server::new_async().await;
    let root = server
        .mock("DELETE", CONTAINER)
        .expect(0)
        .create_async()
        .await;
    let parent = server
        .mock("DELETE", "/annotations/")
        .expect(0)
        .create_async()
        .await;

    let client = client(&server);
    for id in [".", "..", "%2e", "%2e%2e", ".%2E"] {
        let err = client.delete_annotation(id).await.unwrap_err();
        assert!(err.is_invalid_argument(), "id {id}");
        assert!(client.get_annotation(id).await.unwrap_err().is_invalid_argument());
    }
    root.assert_async().await;
    parent.assert_async().await;
}

#[tokio::test]
async fn test_delete_unauthorized_reauthenticates_once() {
    let mut server = Server::new_async().await;
    let auth = mock_auth(&mut server, 1).await;
    let anonymous = server
        .mock("DELETE", "/annotations/foo/abc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let authorized = server
        .mock("DELETE", "/annotations/foo/abc")
        .match_header("authorization", "Bearer tok-1")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = authed_client(&server);
    assert!(client.delete_annotation("abc").await.unwrap());
    assert_eq!(client.auth_token().unwrap().access_token, "tok-1");

    assert_all(&auth).await;
    anonymous.assert_async().await;
    authorized.assert_async().await;
}

#[tokio::test]
async fn test_delete_unauthorized_twice_fails() {
    let mut server = Server::new_async().await;
    let auth = mock_auth(&mut server, 1).await;
    let delete = server
        .mock("DELETE", "/annotations/foo/abc")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let client = authed_client(&server);
    assert!(!client.delete_annotation("abc").await.unwrap());

    assert_all(&auth).await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_delete_invalid_id_makes_no_request() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client(&server);
    let err = client.delete_annotation("").await.unwrap_err();
    assert!(err.is_invalid_argument());
    delete.assert_async().await;
}

#[tokio::test]
async fn test_delete_whitespace_id_is_accepted() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/annotations/foo/%20%20")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    assert!(client(&server).delete_annotation("  ").await.unwrap());
    delete.assert_async().await;
}

// ========== Create ==========

#[tokio::test]
async fn test_post_annotation_created() {
    let mut server = Server::new_async().await;
    let uri = format!("{}{}abc", server.url(), CONTAINER);
    let payload = annotation_jsonld("_:new");

    let post = server
        .mock("POST", CONTAINER)
        .match_header("content-type", JSONLD_TYPE)
        .match_header("accept", JSONLD_TYPE)
        .match_body(Matcher::PartialJson(json!({
            "commit": "Create Annotation",
            "annotation": {"data": payload}
        })))
        .with_status(201)
        .with_header("content-type", "application/ld+json")
        .with_header("location", &uri)
        .with_body(annotation_jsonld(&uri))
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    let response = client.post_annotation(&payload).await.unwrap();
    assert_eq!(response.status, 201);

    let graph = client.response_to_graph(Some(&response)).await.unwrap();
    let uris = client.annotation_uris(&graph);
    assert_eq!(uris.len(), 1);
    assert_eq!(uris[0].as_str(), uri);
    assert_eq!(client.annotation_id(&uris[0]).unwrap(), "abc");
    post.assert_async().await;
}

#[tokio::test]
async fn test_post_unauthorized_reauthenticates_once() {
    let mut server = Server::new_async().await;
    let auth = mock_auth(&mut server, 1).await;
    let anonymous = server
        .mock("POST", CONTAINER)
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let authorized = server
        .mock("POST", CONTAINER)
        .match_header("authorization", "Bearer tok-1")
        .with_status(201)
        .with_header("content-type", "application/ld+json")
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = authed_client(&server);
    let response = client.post_annotation("{}").await.unwrap();
    assert_eq!(response.status, 201);

    assert_all(&auth).await;
    anonymous.assert_async().await;
    authorized.assert_async().await;
}

#[tokio::test]
async fn test_post_exhausts_attempts() {
    let mut server = Server::new_async().await;
    let auth = mock_auth(&mut server, 0).await;
    let post = server
        .mock("POST", CONTAINER)
        .with_status(500)
        .with_body("post_exception")
        .expect(3)
        .create_async()
        .await;

    let client = authed_client(&server);
    let response = client.post_annotation("{}").await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.text(), "post_exception");

    assert_all(&auth).await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_post_unreachable_server() {
    let config = Configuration::default()
        .with_host("http://127.0.0.1:1")
        .with_retries(2, 1);
    let client = AnnotationClient::new(config).unwrap();
    assert!(client.post_annotation("{}").await.is_none());
}

// ========== Read ==========

#[tokio::test]
async fn test_get_annotations_turtle() {
    let mut server = Server::new_async().await;
    let body = r#"
        @prefix oa: <http://www.w3.org/ns/oa#> .
        @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .

        <a1> a oa:Annotation ; oa:motivatedBy oa:commenting .
        <a2> a oa:Annotation ; oa:motivatedBy oa:tagging .
    "#;
    let get = server
        .mock("GET", CONTAINER)
        .match_header("accept", "text/turtle")
        .with_status(200)
        .with_header("content-type", "text/turtle; charset=utf-8")
        .with_body(body)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    let graph = client.get_annotations_as("text/turtle").await.unwrap();
    assert_eq!(graph.len(), 4);

    let ids: Vec<String> = client
        .annotation_uris(&graph)
        .iter()
        .map(|uri| client.annotation_id(uri).unwrap())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    get.assert_async().await;
}

#[tokio::test]
async fn test_get_annotations_server_error_is_empty() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", CONTAINER)
        .with_status(500)
        .with_body("get_exception")
        .expect(1)
        .create_async()
        .await;

    let graph = client(&server).get_annotations().await.unwrap();
    assert!(graph.is_empty());
    get.assert_async().await;
}

#[tokio::test]
async fn test_get_annotation_unexpected_content_type_is_empty() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/annotations/foo/abc")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html></html>")
        .create_async()
        .await;

    let graph = client(&server).get_annotation("abc").await.unwrap();
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_get_iiif_and_oa_profiles() {
    let mut server = Server::new_async().await;
    let uri = format!("{}{}abc", server.url(), CONTAINER);
    let iiif = server
        .mock("GET", "/annotations/foo/abc")
        .match_header("accept", CONTENT_TYPE_IIIF)
        .with_status(200)
        .with_header("content-type", CONTENT_TYPE_IIIF)
        .with_body(annotation_jsonld(&uri))
        .expect(1)
        .create_async()
        .await;
    let oa = server
        .mock("GET", "/annotations/foo/abc")
        .match_header("accept", CONTENT_TYPE_OA)
        .with_status(200)
        .with_header("content-type", CONTENT_TYPE_OA)
        .with_body(annotation_jsonld(&uri))
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    let from_iiif = client.get_iiif_annotation("abc").await.unwrap();
    let from_oa = client.get_oa_annotation("abc").await.unwrap();
    assert_eq!(from_iiif.len(), 5);
    assert_eq!(from_oa.len(), from_iiif.len());
    iiif.assert_async().await;
    oa.assert_async().await;
}

#[tokio::test]
async fn test_get_invalid_arguments_make_no_request() {
    let mut server = Server::new_async().await;
    let get = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let client = client(&server);
    assert!(client.get_annotation("").await.unwrap_err().is_invalid_argument());
    assert!(client
        .get_annotation_as("abc", "text/html")
        .await
        .unwrap_err()
        .is_invalid_argument());
    assert!(client
        .get_annotations_as("application/trix")
        .await
        .unwrap_err()
        .is_invalid_argument());
    get.assert_async().await;
}

#[test]
fn test_empty_id_rejected_without_runtime_io() {
    let client = AnnotationClient::new(Configuration::default()).unwrap();
    let err = tokio_test::block_on(client.get_oa_annotation("")).unwrap_err();
    assert!(err.is_invalid_argument());
}

// ========== Response processing ==========

#[tokio::test]
async fn test_response_to_graph_invalid_arguments() {
    let client = AnnotationClient::new(Configuration::default()).unwrap();
    assert!(client.response_to_graph(None).await.unwrap_err().is_invalid_argument());

    let empty = AnnotationResponse::default();
    assert!(client
        .response_to_graph(Some(&empty))
        .await
        .unwrap_err()
        .is_invalid_argument());
}

#[tokio::test]
async fn test_response_to_graph_unparseable_body_is_empty() {
    let client = AnnotationClient::new(Configuration::default()).unwrap();
    let mut response = AnnotationResponse::default();
    response.status = 200;
    response
        .headers
        .insert("content-type".into(), "application/ld+json".into());
    response.body = "not json".into();

    let graph = client.response_to_graph(Some(&response)).await.unwrap();
    assert!(graph.is_empty());
}

#[tokio::test]
async fn test_remote_context_is_fetched_once() {
    let mut server = Server::new_async().await;
    let context_url = format!("{}/contexts/oa.json", server.url());
    let uri = format!("{}{}abc", server.url(), CONTAINER);
    let body = json!({
        "@context": context_url,
        "@id": uri,
        "@type": "oa:Annotation"
    })
    .to_string();

    let context = server
        .mock("GET", "/contexts/oa.json")
        .with_status(200)
        .with_header("content-type", "application/ld+json")
        .with_body(r#"{"@context": {"oa": "http://www.w3.org/ns/oa#"}}"#)
        .expect(1)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/annotations/foo/abc")
        .with_status(200)
        .with_header("content-type", "application/ld+json")
        .with_body(body)
        .expect(2)
        .create_async()
        .await;

    let client = client(&server);
    for _ in 0..2 {
        let graph = client.get_annotation("abc").await.unwrap();
        assert!(graph.contains(&crate::Triple::new(
            Term::iri(&uri),
            Term::iri(vocab::RDF_TYPE),
            Term::iri(vocab::OA_ANNOTATION),
        )));
    }
    context.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_registered_context_is_not_fetched() {
    let mut server = Server::new_async().await;
    let context_url = "http://iiif.io/api/presentation/2/context.json";
    let uri = format!("{}{}abc", server.url(), CONTAINER);
    let _get = server
        .mock("GET", "/annotations/foo/abc")
        .with_status(200)
        .with_header("content-type", CONTENT_TYPE_IIIF)
        .with_body(json!({"@context": context_url, "@id": uri, "@type": "oa:Annotation"}).to_string())
        .create_async()
        .await;

    let client = client(&server);
    client.register_context(
        context_url,
        json!({"@context": {"oa": "http://www.w3.org/ns/oa#"}}),
    );
    let graph = client.get_iiif_annotation("abc").await.unwrap();
    assert_eq!(client.annotation_uris(&graph).len(), 1);
}

// ========== Round trip ==========

#[tokio::test]
async fn test_create_read_delete_round_trip() {
    let mut server = Server::new_async().await;
    let id = uuid::Uuid::new_v4().to_string();
    let path = format!("{}{}", CONTAINER, id);
    let uri = format!("{}{}", server.url(), path);

    let _post = server
        .mock("POST", CONTAINER)
        .with_status(201)
        .with_header("content-type", "application/ld+json")
        .with_body(annotation_jsonld(&uri))
        .create_async()
        .await;
    let get = server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_header("content-type", "application/ld+json")
        .with_body(annotation_jsonld(&uri))
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", path.as_str())
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    let response = client.post_annotation(&annotation_jsonld("_:a")).await;
    let created = client.response_to_graph(response.as_ref()).await.unwrap();
    let uris = client.annotation_uris(&created);
    assert_eq!(uris.len(), 1);

    let found = client.annotation_id(&uris[0]).unwrap();
    assert_eq!(found, id);
    assert_eq!(client.annotation_id(&client.container().annotation_url(&found).unwrap()).unwrap(), found);

    let stored = client.get_annotation(&found).await.unwrap();
    assert_eq!(stored.len(), created.len());
    assert!(client.delete_annotation(&found).await.unwrap());
    get.assert_async().await;
    delete.assert_async().await;

    get.remove_async().await;
    let _gone = server
        .mock("GET", path.as_str())
        .with_status(404)
        .create_async()
        .await;
    assert!(client.get_annotation(&found).await.unwrap().is_empty());
    assert!(client.delete_annotation(&found).await.unwrap());
}
