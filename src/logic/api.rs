//! Client side of the server-manager API.
//!
//! [`ServerApi`] is the seam the projector talks to; [`HttpServerApi`] is the
//! real implementation, a plain HTTP/1 client over one TCP connection per
//! request.

use super::error::RemoteCallFailure;
use crate::model::{AppSettings, ResponseEnvelope, ServerDraft, Snapshot, StatusFilter};
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::header::{ACCEPT, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

pub type ApiResult = Result<ResponseEnvelope, RemoteCallFailure>;

/// Bytes kept verbatim in a path segment; IPv6 colons stay readable.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~')
    .remove(b':');

/// Message used when an operation needs a snapshot and none is loaded.
pub const NOTHING_LOADED: &str = "No servers loaded";

pub trait ServerApi: Send + Sync {
    fn list_servers(&self) -> BoxFuture<'_, ApiResult>;

    fn ping_server<'a>(&'a self, address: &'a str) -> BoxFuture<'a, ApiResult>;

    /// Filtering is done against the snapshot the caller already has.
    fn filter_servers<'a>(
        &'a self,
        filter: StatusFilter,
        snapshot: Option<&'a Snapshot>,
    ) -> BoxFuture<'a, ApiResult> {
        let result = filter_snapshot(filter, snapshot);
        async move { result }.boxed()
    }

    fn create_server<'a>(&'a self, draft: &'a ServerDraft) -> BoxFuture<'a, ApiResult>;

    fn delete_server(&self, id: u64) -> BoxFuture<'_, ApiResult>;
}

/// Builds the envelope for a status filter over `snapshot`.
pub fn filter_snapshot(filter: StatusFilter, snapshot: Option<&Snapshot>) -> ApiResult {
    let snapshot = snapshot.ok_or_else(|| RemoteCallFailure::new(NOTHING_LOADED))?;
    match filter {
        StatusFilter::All => Ok(snapshot
            .envelope()
            .clone()
            .with_message("Servers filtered by ALL status")),
        StatusFilter::Only(status) => {
            let servers = snapshot.filtered(filter);
            let message = if servers.is_empty() {
                format!("No servers of {} found", status.as_wire())
            } else {
                format!("Servers filtered by {} status", status.label())
            };
            Ok(snapshot
                .envelope()
                .with_servers(servers)
                .with_message(message))
        }
    }
}

const CLIENT_AGENT: &str = concat!("egui_fleet/", env!("CARGO_PKG_VERSION"));

/// HTTP/JSON client for the server-manager backend.
#[derive(Debug, Clone)]
pub struct HttpServerApi {
    address: String,
    timeout: Duration,
}

impl HttpServerApi {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.api_address.clone(), settings.request_timeout())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn request(&self, method: Method, path: String, body: Option<Vec<u8>>) -> ApiResult {
        debug!(%method, address = %self.address, %path, "api request");
        match tokio::time::timeout(self.timeout, self.exchange(method, &path, body)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(address = %self.address, %path, "api request timed out");
                Err(RemoteCallFailure::new(format!(
                    "Request to {}{} timed out",
                    self.address, path
                )))
            }
        }
    }

    async fn exchange(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> ApiResult {
        let stream = TcpStream::connect(self.address.as_str()).await?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "api connection closed with error");
            }
        });

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, self.address.as_str())
            .header(USER_AGENT, CLIENT_AGENT)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.unwrap_or_default())))?;

        let resp = sender.send_request(req).await?;
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            debug!(%status, %path, "api answered non-2xx");
            let message = serde_json::from_slice::<ResponseEnvelope>(&bytes)
                .ok()
                .map(|envelope| envelope.message)
                .filter(|m| !m.is_empty());
            return Err(RemoteCallFailure::from_status(status.as_u16(), message));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ServerApi for HttpServerApi {
    fn list_servers(&self) -> BoxFuture<'_, ApiResult> {
        self.request(Method::GET, "/server/list".to_string(), None)
            .boxed()
    }

    fn ping_server<'a>(&'a self, address: &'a str) -> BoxFuture<'a, ApiResult> {
        let segment = utf8_percent_encode(address, PATH_SEGMENT);
        self.request(Method::GET, format!("/server/ping/{segment}"), None)
            .boxed()
    }

    fn create_server<'a>(&'a self, draft: &'a ServerDraft) -> BoxFuture<'a, ApiResult> {
        async move {
            let body = serde_json::to_vec(draft)?;
            self.request(Method::POST, "/server/save".to_string(), Some(body))
                .await
        }
        .boxed()
    }

    fn delete_server(&self, id: u64) -> BoxFuture<'_, ApiResult> {
        self.request(Method::DELETE, format!("/server/delete/{id}"), None)
            .boxed()
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
