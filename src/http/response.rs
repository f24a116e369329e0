//! Response post-processing hook.
//!
//! # Responsibilities
//! - Decide from the backend status whether the body is rewritten
//! - Prepend the configured annotation and recompute Content-Length
//!
//! # Design Decisions
//! - Default policy rewrites only statuses outside {200, 201, 203, 204};
//!   `always` keeps the legacy behaviour of touching every response
//! - Bodyless responses (HEAD, 1xx, 204, 304) are never rewritten
//! - An empty annotation or a compressed body leaves the response streaming
//! - Bodies larger than `max_body_bytes` are passed through unannotated;
//!   the size limit never turns a backend response into a gateway error

use axum::body::{Body, BodyDataStream, Bytes};
use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use futures_util::{stream, StreamExt};

use crate::config::{ResponseHookConfig, RewritePolicy};

/// Statuses left untouched under `RewritePolicy::NonSuccess`.
const SUCCESS_STATUSES: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::NON_AUTHORITATIVE_INFORMATION,
    StatusCode::NO_CONTENT,
];

/// Body read up to the rewrite limit.
enum Buffered {
    Complete(Vec<Bytes>),
    /// Limit exceeded; `rest` is the unread tail of the backend body.
    Overflow {
        head: Vec<Bytes>,
        rest: BodyDataStream,
    },
}

/// Status-dependent body rewrite applied to every backend response.
#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    enabled: bool,
    policy: RewritePolicy,
    annotation: String,
    max_body_bytes: usize,
}

impl ResponseRewriter {
    pub fn from_config(config: &ResponseHookConfig) -> Self {
        Self {
            enabled: config.enabled,
            policy: config.policy,
            annotation: config.annotation.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn should_rewrite(&self, method: &Method, status: StatusCode) -> bool {
        if !self.enabled
            || method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            return false;
        }

        match self.policy {
            RewritePolicy::Always => true,
            RewritePolicy::NonSuccess => !SUCCESS_STATUSES.contains(&status),
        }
    }

    /// Rewrite `response` if its status calls for it.
    ///
    /// Fails only when reading the backend body fails.
    pub async fn apply(&self, method: &Method, response: Response) -> Result<Response, axum::Error> {
        if self.annotation.is_empty() || !self.should_rewrite(method, response.status()) {
            return Ok(response);
        }
        if response.headers().contains_key(CONTENT_ENCODING) {
            tracing::debug!(status = %response.status(), "Skipping rewrite of encoded body");
            return Ok(response);
        }
        if declared_length(response.headers()).is_some_and(|len| len > self.max_body_bytes) {
            tracing::debug!(status = %response.status(), "Body exceeds rewrite limit, passing through");
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let chunks = match buffer_up_to(body, self.max_body_bytes).await? {
            Buffered::Complete(chunks) => chunks,
            Buffered::Overflow { head, rest } => {
                tracing::debug!(status = %parts.status, "Body exceeds rewrite limit, passing through");
                let replay = stream::iter(head.into_iter().map(Ok::<_, axum::Error>));
                return Ok(Response::from_parts(parts, Body::from_stream(replay.chain(rest))));
            }
        };

        let payload_len: usize = chunks.iter().map(Bytes::len).sum();
        let mut rewritten = Vec::with_capacity(self.annotation.len() + payload_len);
        rewritten.extend_from_slice(self.annotation.as_bytes());
        for chunk in &chunks {
            rewritten.extend_from_slice(chunk);
        }

        parts.headers.remove(TRANSFER_ENCODING);
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(rewritten.len()));

        tracing::debug!(status = %parts.status, bytes = rewritten.len(), "Rewrote backend response");
        Ok(Response::from_parts(parts, Body::from(rewritten)))
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Read `body` until it ends or more than `limit` bytes have arrived.
async fn buffer_up_to(body: Body, limit: usize) -> Result<Buffered, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut head = Vec::new();
    let mut total = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        total += chunk.len();
        head.push(chunk);
        if total > limit {
            return Ok(Buffered::Overflow { head, rest: stream });
        }
    }
    Ok(Buffered::Complete(head))
}
