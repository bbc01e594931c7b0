//! Adapter behavior against a mocked Fedora endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use isle_fedora::{
    FedoraAdapter, FedoraClient, Metadata, RenameError, RepositoryError, ResourceKind,
    Visibility, DEFAULT_TIMEOUT, JSON_LD, LDP_CONTAINS,
};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
const BINARY: &str = r#"<http://www.w3.org/ns/ldp#Resource>;rel="type", <http://www.w3.org/ns/ldp#NonRDFSource>;rel="type""#;
const CONTAINER: &str = r#"<http://www.w3.org/ns/ldp#Resource>;rel="type", <http://www.w3.org/ns/ldp#BasicContainer>;rel="type""#;

fn adapter(server: &MockServer) -> FedoraAdapter {
    adapter_with_token(server, None)
}

fn adapter_with_token(server: &MockServer, token: Option<&str>) -> FedoraAdapter {
    let base = format!("{}/rest", server.uri());
    FedoraAdapter::new(FedoraClient::new(&base, token, DEFAULT_TIMEOUT).unwrap())
}

fn file_response(mimetype: &str, body: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Last-Modified", MODIFIED)
        .insert_header("Link", BINARY)
        .set_body_raw(body.to_vec(), mimetype)
}

fn dir_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Last-Modified", MODIFIED)
        .insert_header("Link", CONTAINER)
}

async fn mount_file(server: &MockServer, at: &str, mimetype: &str, body: &[u8]) {
    for verb in ["HEAD", "GET"] {
        Mock::given(method(verb))
            .and(path(format!("/rest/{at}")))
            .respond_with(file_response(mimetype, body))
            .mount(server)
            .await;
    }
}

async fn mount_dir(server: &MockServer, at: &str, children: &[&str]) {
    Mock::given(method("HEAD"))
        .and(path(format!("/rest/{at}")))
        .respond_with(dir_response())
        .mount(server)
        .await;

    let base = format!("{}/rest/", server.uri());
    let contains: Vec<_> = children
        .iter()
        .map(|child| json!({"@id": format!("{base}{child}")}))
        .collect();
    let graph = json!([
        {"@id": format!("{base}{at}/fcr:acl")},
        {"@id": format!("{base}{at}"), LDP_CONTAINS: contains}
    ]);

    Mock::given(method("GET"))
        .and(path(format!("/rest/{at}")))
        .and(header("Accept", JSON_LD))
        .respond_with(dir_response().set_body_raw(graph.to_string().into_bytes(), JSON_LD))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_write_then_read() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rest/collection/item1"))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(&server, "collection/item1", "text/plain", b"hello").await;

    let fedora = adapter(&server);
    let written = fedora
        .write("/collection/item1", &b"hello"[..], Some("text/plain"))
        .await
        .unwrap();
    assert!(written.is_file());
    assert_eq!(written.mimetype(), Some("text/plain"));

    let read = fedora.read("/collection/item1").await.unwrap();
    assert_eq!(&read.contents[..], b"hello");
    assert!(read.metadata.is_file());
    assert_eq!(read.metadata.mimetype(), Some("text/plain"));
    assert_eq!(read.metadata.visibility, Visibility::Public);
    assert_eq!(read.metadata.path, "/collection/item1");
}

#[tokio::test]
async fn test_write_guesses_content_type_from_path() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rest/images/photo.jpg"))
        .and(header("Content-Type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(&server, "images/photo.jpg", "image/jpeg", b"\xff\xd8").await;

    let meta = adapter(&server)
        .write("images/photo.jpg", &b"\xff\xd8"[..], None)
        .await
        .unwrap();
    assert_eq!(meta.mimetype(), Some("image/jpeg"));
}

#[tokio::test]
async fn test_write_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .write("collection/item1", "x", Some("text/plain"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RepositoryError::WriteFailed {
            path: "collection/item1".into(),
            status: 409
        }
    );
}

#[tokio::test]
async fn test_read_dir_has_no_contents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/collection"))
        .respond_with(dir_response().set_body_raw(b"<> a ldp:Container .".to_vec(), "text/turtle"))
        .mount(&server)
        .await;

    let read = adapter(&server).read("collection").await.unwrap();
    assert!(read.metadata.is_dir());
    assert!(read.contents.is_empty());
    assert_eq!(read.metadata.size(), None);
}

#[tokio::test]
async fn test_read_stream_of_file_and_dir() {
    use futures_util::TryStreamExt;

    let server = MockServer::start().await;
    mount_file(&server, "collection/item1", "text/plain", b"streamed body").await;
    Mock::given(method("GET"))
        .and(path("/rest/collection"))
        .respond_with(dir_response())
        .mount(&server)
        .await;

    let fedora = adapter(&server);
    let file = fedora.read_stream("collection/item1").await.unwrap();
    let chunks: Vec<_> = file.stream.unwrap().try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"streamed body");

    let dir = fedora.read_stream("collection").await.unwrap();
    assert!(dir.stream.is_none());
}

#[tokio::test]
async fn test_has() {
    let server = MockServer::start().await;
    mount_file(&server, "present", "text/plain", b"x").await;
    Mock::given(method("HEAD"))
        .and(path("/rest/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fedora = adapter(&server);
    assert!(fedora.has("present").await.unwrap());
    assert!(!fedora.has("missing").await.unwrap());
    assert!(!fedora.has("forbidden").await.unwrap());
}

#[tokio::test]
async fn test_metadata_errors() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fedora = adapter(&server);
    assert_eq!(
        fedora.get_metadata("missing").await.unwrap_err(),
        RepositoryError::NotFound {
            path: "missing".into(),
            status: 404
        }
    );
    assert!(fedora.get_metadata("broken").await.unwrap_err().is_unavailable());
    assert!(fedora.read("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_metadata_aliases() {
    let server = MockServer::start().await;
    mount_file(&server, "doc.pdf", "application/pdf", b"%PDF").await;
    mount_dir(&server, "collection", &[]).await;

    let fedora = adapter(&server);
    assert_eq!(
        fedora.get_mimetype("doc.pdf").await.unwrap().as_deref(),
        Some("application/pdf")
    );
    assert_eq!(fedora.get_mimetype("collection").await.unwrap(), None);
    assert_eq!(fedora.get_size("collection").await.unwrap(), None);
    assert_eq!(
        fedora.get_timestamp("doc.pdf").await.unwrap().timestamp(),
        1_445_412_480
    );
    assert_eq!(
        fedora.get_visibility("doc.pdf").await.unwrap(),
        Visibility::Public
    );

    let meta = fedora
        .set_visibility("doc.pdf", Visibility::Private)
        .await
        .unwrap();
    assert_eq!(meta.visibility, Visibility::Public);
}

#[tokio::test]
async fn test_create_dir() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/rest/collection"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    mount_dir(&server, "collection", &[]).await;

    let meta = adapter(&server).create_dir("collection").await.unwrap();
    assert_eq!(meta.kind, ResourceKind::Dir);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/collection/item1"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/collection/item1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/rest/collection/item1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fedora = adapter(&server);
    fedora.delete("collection/item1").await.unwrap();
    fedora.delete("collection/item1").await.unwrap();
    fedora.delete_dir("collection/item1").await.unwrap();
    assert!(!fedora.has("collection/item1").await.unwrap());
}

#[tokio::test]
async fn test_delete_failure() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let err = adapter(&server).delete("tombstoned").await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::WriteFailed {
            path: "tombstoned".into(),
            status: 410
        }
    );
}

#[tokio::test]
async fn test_rename_moves_file() {
    let server = MockServer::start().await;
    mount_file(&server, "old.txt", "text/plain", b"payload").await;
    Mock::given(method("PUT"))
        .and(path("/rest/new.txt"))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    mount_file(&server, "new.txt", "text/plain", b"payload").await;
    Mock::given(method("DELETE"))
        .and(path("/rest/old.txt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let meta = adapter(&server).rename("old.txt", "new.txt").await.unwrap();
    assert_eq!(meta.path, "new.txt");
}

#[tokio::test]
async fn test_rename_reports_copy_failure() {
    let server = MockServer::start().await;
    mount_file(&server, "old.txt", "text/plain", b"payload").await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter(&server).rename("old.txt", "new.txt").await.unwrap_err();
    assert!(matches!(
        err,
        RenameError::Copy(RepositoryError::WriteFailed { status: 500, .. })
    ));
    assert!(!err.left_both());
}

#[tokio::test]
async fn test_rename_reports_source_left_behind() {
    let server = MockServer::start().await;
    mount_file(&server, "old.txt", "text/plain", b"payload").await;
    Mock::given(method("PUT"))
        .and(path("/rest/new.txt"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    mount_file(&server, "new.txt", "text/plain", b"payload").await;
    Mock::given(method("DELETE"))
        .and(path("/rest/old.txt"))
        .respond_with(ResponseTemplate::new(423))
        .mount(&server)
        .await;

    let err = adapter(&server).rename("old.txt", "new.txt").await.unwrap_err();
    assert!(err.left_both());
    assert_eq!(err.cause().path(), Some("old.txt"));
}

async fn mount_tree(server: &MockServer) {
    mount_dir(server, "col", &["col/a.txt", "col/sub"]).await;
    mount_file(server, "col/a.txt", "text/plain", b"a").await;
    mount_dir(server, "col/sub", &["col/sub/b.txt", "col/sub/deeper"]).await;
    mount_file(server, "col/sub/b.txt", "text/plain", b"b").await;
    mount_dir(server, "col/sub/deeper", &[]).await;
}

fn by_path(listing: Vec<Metadata>) -> BTreeMap<String, Metadata> {
    listing
        .into_iter()
        .map(|meta| (meta.path.clone(), meta))
        .collect()
}

#[tokio::test]
async fn test_list_direct_children() {
    let server = MockServer::start().await;
    mount_tree(&server).await;

    let listing = by_path(adapter(&server).list_contents(" /col/ ", false).await.unwrap());

    assert_eq!(
        listing.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["col/a.txt", "col/sub"]
    );
    assert!(listing["col/a.txt"].is_file());
    assert!(listing["col/sub"].is_dir());
}

#[tokio::test]
async fn test_recursive_listing_is_superset() {
    let server = MockServer::start().await;
    mount_tree(&server).await;
    let fedora = adapter(&server);

    let shallow = by_path(fedora.list_contents("col", false).await.unwrap());
    let deep = by_path(fedora.list_contents("col", true).await.unwrap());

    assert_eq!(
        deep.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["col/a.txt", "col/sub", "col/sub/b.txt", "col/sub/deeper"]
    );
    for (path, meta) in &shallow {
        assert_eq!(deep.get(path), Some(meta));
    }
}

#[tokio::test]
async fn test_self_containing_container_lists_once() {
    let server = MockServer::start().await;
    mount_dir(&server, "col", &["col", "col/a.txt"]).await;
    mount_file(&server, "col/a.txt", "text/plain", b"a").await;

    let listing = tokio::time::timeout(
        Duration::from_secs(5),
        adapter(&server).list_contents("col", true),
    )
    .await
    .expect("listing should terminate")
    .unwrap();

    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].path, "col/a.txt");
}

#[tokio::test]
async fn test_containment_cycle_terminates() {
    let server = MockServer::start().await;
    mount_dir(&server, "col", &["col/sub", "col/a.txt"]).await;
    mount_dir(&server, "col/sub", &["col", "col/a.txt"]).await;
    mount_file(&server, "col/a.txt", "text/plain", b"a").await;

    let listing = tokio::time::timeout(
        Duration::from_secs(5),
        adapter(&server).list_contents("col", true),
    )
    .await
    .expect("listing should terminate")
    .unwrap();

    let mut paths: Vec<_> = listing.iter().map(|meta| meta.path.as_str()).collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["col/a.txt", "col/sub"]);
}

#[tokio::test]
async fn test_list_file_is_empty() {
    let server = MockServer::start().await;
    mount_file(&server, "col/a.txt", "text/plain", b"a").await;

    assert!(adapter(&server)
        .list_contents("col/a.txt", true)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_bearer_token_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/secured"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(dir_response())
        .expect(1)
        .mount(&server)
        .await;

    assert!(adapter_with_token(&server, Some("s3cret"))
        .has("secured")
        .await
        .unwrap());
    assert!(!adapter(&server).has("secured").await.unwrap());
}

#[tokio::test]
async fn test_ensure() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/"))
        .respond_with(dir_response())
        .mount(&server)
        .await;
    assert!(adapter(&server).ensure().await.is_empty());

    let failing = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&failing)
        .await;
    let issues = adapter(&failing).ensure().await;
    assert_eq!(issues.len(), 1);
    assert!(issues[0].is_error());
    assert_eq!(
        issues[0].message,
        format!("{}/rest/ returned 401", failing.uri())
    );
}

#[tokio::test]
async fn test_unreachable_repository_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = FedoraClient::new(&format!("http://{addr}/rest"), None, DEFAULT_TIMEOUT).unwrap();
    let fedora = FedoraAdapter::new(client);

    assert!(fedora.has("x").await.unwrap_err().is_unavailable());
    assert!(fedora.get_metadata("x").await.unwrap_err().is_unavailable());
    assert_eq!(fedora.ensure().await.len(), 1);
}
