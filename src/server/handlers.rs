//! Handlers Module
//!
//! HTTPルートのハンドラーと、エラー種別をユーザー向けレスポンスに
//! 対応付ける単一の境界（`ApiError`）を定義するモジュール。

use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{error, info};

use crate::archive;
use crate::error::DocxFillError;
use crate::server::{pages, AppState};
use crate::types::Mapping;

/// エラーレスポンスの本文
///
/// すべてのAPIエラーはこの形で返されます。
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// ユーザー向けのエラーメッセージ
    pub error: String,
}

/// HTTP境界のエラー型
///
/// `DocxFillError`の種別をHTTPステータスコードとJSON本文に対応付けます。
/// すべてのハンドラーがこの1つの境界を通るため、伝播方針は一様です。
pub(crate) struct ApiError(DocxFillError);

impl From<DocxFillError> for ApiError {
    fn from(err: DocxFillError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DocxFillError::RunNotFound { .. } => StatusCode::NOT_FOUND,
            DocxFillError::Upload(_) | DocxFillError::SecurityViolation(_) => {
                StatusCode::BAD_REQUEST
            }
            DocxFillError::UnknownPlaceholder { .. }
            | DocxFillError::MissingColumn { .. }
            | DocxFillError::UnmappedPlaceholder { .. }
            | DocxFillError::BatchFailed { .. }
            | DocxFillError::Sheet(_)
            | DocxFillError::Zip(_)
            | DocxFillError::Xml(_)
            | DocxFillError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DocxFillError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // 失敗行の一覧はまとめて報告する
        let message = match &self.0 {
            DocxFillError::BatchFailed { failures, .. } => {
                let mut message = self.0.to_string();
                for failure in failures {
                    message.push_str(&format!(
                        "; row {} ({}): {}",
                        failure.row, failure.file_stem, failure.reason
                    ));
                }
                message
            }
            _ => self.0.to_string(),
        };

        error!(status = %status, "request failed: {}", message);
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// `GET /` - アップロードページ
pub(crate) async fn index() -> Html<&'static str> {
    Html(pages::UPLOAD_PAGE)
}

/// `POST /upload` - ファイルのアップロード
///
/// 2つのファイルを実行ディレクトリに保存し、マッピングページへ
/// リダイレクトします。失敗した場合はログに記録してトップページへ
/// リダイレクトします（部分的に作成された実行ディレクトリは残ります）。
pub(crate) async fn upload(State(state): State<AppState>, multipart: Multipart) -> Redirect {
    match handle_upload(&state, multipart).await {
        Ok(run_id) => Redirect::to(&format!("/templater?run={}", run_id)),
        Err(e) => {
            error!("upload failed: {}", e);
            Redirect::to("/")
        }
    }
}

async fn handle_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<String, DocxFillError> {
    let mut template: Option<(String, Vec<u8>)> = None;
    let mut data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DocxFillError::Upload(format!("{}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DocxFillError::Upload(format!("{}", e)))?;

        match name.as_str() {
            "template_file" => {
                let file_name = file_name.unwrap_or_else(|| "template.docx".to_string());
                template = Some((file_name, bytes.to_vec()));
            }
            "data_file" => {
                let file_name = file_name.unwrap_or_else(|| "data.xlsx".to_string());
                data = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (template_name, template_bytes) = template.ok_or_else(|| {
        DocxFillError::Upload("Missing multipart field 'template_file'".to_string())
    })?;
    let (data_name, data_bytes) = data.ok_or_else(|| {
        DocxFillError::Upload("Missing multipart field 'data_file'".to_string())
    })?;

    let run = state.store.create_run()?;
    run.save_template(&template_name, &template_bytes)?;
    run.save_data(&data_name, &data_bytes)?;

    info!(
        run = run.id(),
        template = %template_name,
        data = %data_name,
        "run created"
    );

    Ok(run.id().to_string())
}

/// `GET /templater`のクエリパラメータ
#[derive(Debug, Deserialize)]
pub(crate) struct TemplaterParams {
    /// 実行トークン
    run: String,
}

/// `GET /templater` - マッピングページ
///
/// 実行トークンを解決し、テンプレートのプレースホルダとデータファイルの
/// 列名（どちらもソート済み）を表示します。
pub(crate) async fn templater(
    State(state): State<AppState>,
    Query(params): Query<TemplaterParams>,
) -> Result<Html<String>, ApiError> {
    let run = state.store.resolve(&params.run)?;
    let inspection = state
        .renderer
        .inspect(&run.template_path()?, &run.data_path()?)?;

    Ok(Html(pages::mapping_page(
        run.id(),
        &inspection.placeholders,
        &inspection.columns,
    )))
}

/// `POST /process`のJSON本文
#[derive(Debug, Deserialize)]
pub(crate) struct ProcessRequest {
    /// プレースホルダ名から列名へのマッピング
    mapping: Mapping,

    /// 実行トークン
    run: String,
}

/// `POST /process` - 一括レンダリングとアーカイブのダウンロード
///
/// すべての行のレンダリングが完了した後にアーカイブを作成し、
/// `<run>.zip`としてダウンロードさせます。アーカイブはダウンロード後も
/// ディスク上に残ります。
pub(crate) async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Response, ApiError> {
    let run = state.store.resolve(&request.run)?;
    let output_dir = run.output_dir()?;

    let report = state.renderer.render_batch(
        &run.template_path()?,
        &run.data_path()?,
        &request.mapping,
        &output_dir,
    )?;

    let archive_path = state.store.archive_path(&run);
    let entry_count = archive::write_archive(&output_dir, &archive_path)?;

    info!(
        run = run.id(),
        documents = report.documents.len(),
        failures = report.failures.len(),
        archived = entry_count,
        "batch rendered"
    );

    let bytes = fs::read(&archive_path).map_err(DocxFillError::Io)?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.zip\"",
        run.id()
    ))
    .map_err(|e| DocxFillError::Config(format!("Invalid archive file name: {}", e)))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/zip"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
