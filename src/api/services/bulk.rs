//! 批量签发 `/bulk`
//!
//! 请求为 JSON `{rows: [...]}` 或 `text/csv`，响应按请求的格式编码。
//! CSV 响应按块流式写出，JSON 响应是一个完整的信封。

use std::io::Cursor;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, info};

use crate::api::error_code::ErrorCode;
use crate::api::helpers::{error_from_snaplink, error_response, success_response};
use crate::api::types::BulkJsonBody;
use crate::errors::SnaplinkError;
use crate::services::{BulkOutcome, BulkProcessor, BulkRow, DecodedRow, RowDecodeError};
use crate::utils::csv_handler::{encode_outcome_chunk, read_bulk_rows};

/// 将 JSON 行逐个解码，单行失败不影响其他行
fn decode_json_row(value: serde_json::Value) -> DecodedRow {
    let url = value
        .get("url")
        .and_then(|u| u.as_str())
        .unwrap_or_default()
        .to_string();
    serde_json::from_value::<BulkRow>(value).map_err(|e| RowDecodeError {
        url,
        error: SnaplinkError::validation(format!("Malformed row: {}", e)),
    })
}

fn is_csv(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/csv"))
}

/// 每个响应块最多包含的结果行数
const CSV_CHUNK_ROWS: usize = 64;

/// 结果按就绪顺序分块编码，首块带表头
fn csv_body<I>(
    bulk: Arc<BulkProcessor>,
    rows: I,
) -> impl Stream<Item = Result<web::Bytes, actix_web::Error>>
where
    I: Iterator<Item = DecodedRow> + 'static,
{
    let mut first = true;
    bulk.process_shared(stream::iter(rows))
        .ready_chunks(CSV_CHUNK_ROWS)
        .map(move |chunk| {
            let with_header = std::mem::replace(&mut first, false);
            debug!("Bulk CSV stream: sending {} rows", chunk.len());
            encode_outcome_chunk(&chunk, with_header)
                .map(web::Bytes::from)
                .map_err(actix_web::error::ErrorInternalServerError)
        })
}

/// POST /bulk
pub async fn bulk_issue(
    req: HttpRequest,
    body: web::Bytes,
    bulk: web::Data<Arc<BulkProcessor>>,
) -> HttpResponse {
    if is_csv(&req) {
        let rows = match read_bulk_rows(Cursor::new(body)) {
            Ok(rows) => rows,
            Err(e) => return error_from_snaplink(&e),
        };
        info!("Bulk CSV request accepted, streaming results");
        return HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
            .streaming(csv_body(Arc::clone(bulk.get_ref()), rows));
    }

    let parsed: BulkJsonBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                &format!("Invalid JSON body: {}", e),
            );
        }
    };
    let rows = parsed.rows.into_iter().map(decode_json_row);
    let outcomes: Vec<BulkOutcome> = bulk.process_decoded(stream::iter(rows)).collect().await;
    log_summary(&outcomes);
    success_response(outcomes)
}

fn log_summary(outcomes: &[BulkOutcome]) {
    let issued = outcomes.iter().filter(|o| o.is_issued()).count();
    info!(
        "Bulk request processed: {} rows, {} issued, {} failed",
        outcomes.len(),
        issued,
        outcomes.len() - issued
    );
}

pub fn bulk_routes() -> actix_web::Scope {
    web::scope("/bulk").route("", web::post().to(bulk_issue))
}
