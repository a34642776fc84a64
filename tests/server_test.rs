//! HTTP surface tests for docxfill
//!
//! Drives the axum router end to end: upload -> templater -> process,
//! plus the error statuses of the typed boundary.

use std::io::{Cursor, Read, Write};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use docxfill::run::RunStore;
use docxfill::server::{app, AppState};
use docxfill::RendererBuilder;
use zip::ZipArchive;

const BOUNDARY: &str = "test-boundary-7b1c3d";

mod fixtures {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Minimal DOCX template with {{name}} and {{amount}} placeholders
    pub fn letter_template() -> Vec<u8> {
        let document_xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body><w:p><w:r><w:t>Dear {{name}}, your amount is {{amount}}.</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#,
        );

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        writer
            .start_file("[Content_Types].xml", options)
            .unwrap();
        writer
            .write_all(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                    r#"</Types>"#,
                )
                .as_bytes(),
            )
            .unwrap();

        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();

        writer.finish().unwrap().into_inner()
    }

    /// Spreadsheet with columns client/value and rows (Alice, 10), (Bob, 20)
    pub fn clients_xlsx() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "client").unwrap();
        worksheet.write_string(0, 1, "value").unwrap();
        worksheet.write_string(1, 0, "Alice").unwrap();
        worksheet.write_number(1, 1, 10.0).unwrap();
        worksheet.write_string(2, 0, "Bob").unwrap();
        worksheet.write_number(2, 1, 20.0).unwrap();

        workbook.save_to_buffer().unwrap()
    }
}

/// Build a multipart/form-data body by hand
fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn test_app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = RunStore::new(dir.path()).unwrap();
    let renderer = RendererBuilder::new().build().unwrap();
    let state = AppState::new(store, renderer);
    (dir, app(state, 33_554_432))
}

async fn upload_fixtures(router: &Router) -> String {
    let body = multipart_body(&[
        (
            "template_file",
            "letter.docx",
            &fixtures::letter_template(),
        ),
        ("data_file", "clients.xlsx", &fixtures::clients_xlsx()),
    ]);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let run = location
        .strip_prefix("/templater?run=")
        .expect("redirect should carry the run token")
        .to_string();
    run
}

#[tokio::test]
async fn test_index_serves_upload_page() {
    let (_dir, router) = test_app();

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("template_file"));
    assert!(page.contains("data_file"));
}

#[tokio::test]
async fn test_upload_redirects_to_templater_with_run_token() {
    let (_dir, router) = test_app();

    let run = upload_fixtures(&router).await;

    // The token is opaque: digits and dashes, no filesystem paths
    assert!(run.chars().all(|c| c.is_ascii_digit() || c == '-'));
    assert!(!run.contains('/'));
}

#[tokio::test]
async fn test_templater_lists_sorted_placeholders_and_columns() {
    let (_dir, router) = test_app();
    let run = upload_fixtures(&router).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/templater?run={}", run))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(body.to_vec()).unwrap();

    assert!(page.contains("{{amount}}"));
    assert!(page.contains("{{name}}"));
    assert!(page.contains("client"));
    assert!(page.contains("value"));
    // amount sorts before name in the placeholder table
    assert!(page.find("{{amount}}").unwrap() < page.find("{{name}}").unwrap());
}

#[tokio::test]
async fn test_process_returns_archive_with_rendered_documents() {
    let (_dir, router) = test_app();
    let run = upload_fixtures(&router).await;

    let request_body = serde_json::json!({
        "mapping": {"name": "client", "amount": "value"},
        "run": run,
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("{}.zip", run)));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let mut archive = ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 2);

    let mut rendered = String::new();
    {
        let mut entry = archive.by_name("0.docx").unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        let mut document = ZipArchive::new(Cursor::new(bytes)).unwrap();
        document
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut rendered)
            .unwrap();
    }
    assert!(rendered.contains("Dear Alice, your amount is 10."));
}

#[tokio::test]
async fn test_upload_with_missing_field_redirects_home() {
    let (_dir, router) = test_app();

    let body = multipart_body(&[(
        "template_file",
        "letter.docx",
        &fixtures::letter_template(),
    )]);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn test_templater_with_unknown_run_returns_404() {
    let (_dir, router) = test_app();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/templater?run=20260101000000-9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: docxfill::server::ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("not found"));
}

#[tokio::test]
async fn test_templater_with_malformed_token_returns_400() {
    let (_dir, router) = test_app();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/templater?run=..%2F..%2Fetc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_with_missing_column_returns_422() {
    let (_dir, router) = test_app();
    let run = upload_fixtures(&router).await;

    let request_body = serde_json::json!({
        "mapping": {"name": "absent_column"},
        "run": run,
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: docxfill::server::ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("absent_column"));
}
