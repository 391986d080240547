//! Bulk issuance
//!
//! Rows are pulled lazily, issued with bounded concurrency and emitted in
//! input order. A failing row is reported and the batch continues.

use std::sync::Arc;

use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::link_service::{CreateLinkRequest, LinkService};
use crate::errors::SnaplinkError;

/// Error code for rows past `bulk.max_rows`
pub const BATCH_TOO_LARGE: &str = "BatchTooLarge";

/// One input row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRow {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub one_time: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

impl BulkRow {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl From<BulkRow> for CreateLinkRequest {
    fn from(row: BulkRow) -> Self {
        CreateLinkRequest {
            url: row.url,
            expires_at: row.expires_at,
            password: row.password,
            one_time: row.one_time,
            code: None,
            owner: row.owner,
        }
    }
}

/// A row that could not be decoded from its wire format
#[derive(Debug, Clone)]
pub struct RowDecodeError {
    /// Raw url field, when it could be recovered
    pub url: String,
    pub error: SnaplinkError,
}

pub type DecodedRow = std::result::Result<BulkRow, RowDecodeError>;

/// Per-row result, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub index: usize,
    pub url: String,
    pub code: Option<String>,
    pub short_url: Option<String>,
    pub error_code: Option<String>,
    pub error: Option<String>,
}

impl BulkOutcome {
    fn issued(index: usize, url: String, code: String, short_url: String) -> Self {
        Self {
            index,
            url,
            code: Some(code),
            short_url: Some(short_url),
            error_code: None,
            error: None,
        }
    }

    fn failed(index: usize, url: String, error_code: &str, error: String) -> Self {
        Self {
            index,
            url,
            code: None,
            short_url: None,
            error_code: Some(error_code.to_string()),
            error: Some(error),
        }
    }

    pub fn is_issued(&self) -> bool {
        self.code.is_some()
    }
}

pub struct BulkProcessor {
    links: Arc<LinkService>,
    max_rows: usize,
    concurrency: usize,
}

impl BulkProcessor {
    pub fn new(links: Arc<LinkService>, max_rows: usize, concurrency: usize) -> Self {
        Self {
            links,
            max_rows,
            concurrency: concurrency.max(1),
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Issue every row; the output stream has one outcome per input row.
    pub fn process_batch<'a, S>(&'a self, rows: S) -> impl Stream<Item = BulkOutcome> + 'a
    where
        S: Stream<Item = BulkRow> + 'a,
    {
        self.process_decoded(rows.map(Ok))
    }

    /// Like [`process_batch`](Self::process_batch), for inputs whose rows may
    /// have failed to decode.
    pub fn process_decoded<'a, S>(&'a self, rows: S) -> impl Stream<Item = BulkOutcome> + 'a
    where
        S: Stream<Item = DecodedRow> + 'a,
    {
        rows.enumerate()
            .map(move |(index, row)| self.issue_row(index, row))
            .buffered(self.concurrency)
    }

    /// Owned variant of [`process_decoded`](Self::process_decoded) for
    /// response bodies that outlive the request handler.
    pub fn process_shared<S>(self: Arc<Self>, rows: S) -> impl Stream<Item = BulkOutcome> + 'static
    where
        S: Stream<Item = DecodedRow> + 'static,
    {
        let concurrency = self.concurrency;
        rows.enumerate()
            .map(move |(index, row)| {
                let this = Arc::clone(&self);
                async move { this.issue_row(index, row).await }
            })
            .buffered(concurrency)
    }

    async fn issue_row(&self, index: usize, row: DecodedRow) -> BulkOutcome {
        let row = match row {
            Ok(row) => row,
            Err(decode) => {
                return BulkOutcome::failed(
                    index,
                    decode.url,
                    decode.error.kind(),
                    decode.error.message().to_string(),
                );
            }
        };

        if index >= self.max_rows {
            return BulkOutcome::failed(
                index,
                row.url,
                BATCH_TOO_LARGE,
                format!("Batch exceeds the limit of {} rows", self.max_rows),
            );
        }

        let url = row.url.clone();
        match self.links.create_link(row.into()).await {
            Ok(issued) => BulkOutcome::issued(index, url, issued.record.code, issued.short_url),
            Err(e) => {
                debug!("Bulk row {} failed: {}", index, e);
                BulkOutcome::failed(index, url, e.kind(), e.message().to_string())
            }
        }
    }
}
