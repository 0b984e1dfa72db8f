//! Shared fixtures for integration tests: mock catalog service and zip payloads.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use gopro_sync::{ClientConfig, CloudClient, Credential};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

pub const TOKEN: &str = "test-token-123";
pub const COOKIE: &str = "gp_access_token=test-token-123";

pub fn client_for(server: &MockServer) -> CloudClient {
    CloudClient::new(Credential::new(TOKEN), ClientConfig::with_base_url(server.uri()))
        .expect("client builds against mock server")
}

/// Accepts the token on the primary current-user endpoint.
pub async fn mount_valid_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "user-42"})))
        .mount(server)
        .await;
}

/// Rejects the token on both auth schemes.
pub async fn mount_rejected_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
}

/// Catalog response body in the service's wire format.
pub fn page_body(items: &[Value], total_pages: Option<u64>) -> Value {
    let mut body = json!({ "_embedded": { "media": items } });
    if let Some(total) = total_pages {
        body["_pages"] = json!({ "current_page": 1, "per_page": 30, "total_items": items.len(), "total_pages": total });
    }
    body
}

/// Mounts one catalog page, expected to be requested exactly once.
pub async fn mount_page(server: &MockServer, page: u32, items: &[Value], total_pages: Option<u64>) {
    Mock::given(method("GET"))
        .and(path("/media/search"))
        .and(query_param("page", page.to_string().as_str()))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(items, total_pages)))
        .expect(1)
        .mount(server)
        .await;
}

/// Item with a pre-signed source variation pointing at the mock server.
pub fn direct_item(server: &MockServer, id: &str, filename: &str, size: usize) -> Value {
    json!({
        "id": id,
        "filename": filename,
        "file_extension": "mp4",
        "file_size": size,
        "type": "Video",
        "variations": [
            { "type": "source", "label": "source", "url": format!("{}/cdn/{id}", server.uri()) }
        ]
    })
}

/// Item that can only be fetched through the archive endpoint.
pub fn archive_only_item(id: &str, filename: &str, size: Option<usize>) -> Value {
    json!({
        "id": id,
        "filename": filename,
        "file_size": size,
        "variations": []
    })
}

/// Serves `body` on the direct variation URL of `id`.
pub async fn mount_direct(server: &MockServer, id: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/cdn/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "video/mp4"))
        .mount(server)
        .await;
}

/// Builds an in-memory zip with the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        zip.write_all(data).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Sorted file names in `dir`.
pub fn dir_listing(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
