use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

use crate::envelope;
use crate::xml;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// Errors surfaced by the protocol layer.
#[derive(Debug, Error)]
pub enum WsmanError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP status {0}")]
    Status(u16),

    #[error("endpoint returned a protocol fault")]
    Fault,

    #[error("unreadable response body: {0}")]
    Parse(String),

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
}

/// A management-protocol response body.
///
/// Owns the raw text; [`Response::body`] parses it on demand for element
/// search and traversal.
#[derive(Debug, Clone)]
pub struct Response {
    raw: String,
}

impl Response {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Whether the body carries a SOAP fault.
    pub fn is_fault(&self) -> bool {
        self.body()
            .map(|doc| xml::first(doc.root(), "Fault").is_some())
            .unwrap_or(false)
    }

    /// Parses the body into a searchable document.
    pub fn body(&self) -> Result<roxmltree::Document<'_>, WsmanError> {
        roxmltree::Document::parse(&self.raw).map_err(|e| WsmanError::Parse(e.to_string()))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// The operations probe logic needs from a management endpoint.
///
/// Wire concerns (SOAP framing, authentication, transport) live behind this
/// trait; see [`HttpClient`] for the real thing and
/// [`crate::testing::ScriptedClient`] for the in-memory one.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Endpoint URL, for log messages.
    fn endpoint(&self) -> &str;

    /// WS-Management capability probe.
    async fn identify(&self) -> Result<Response, WsmanError>;

    /// Optimized enumeration of every instance of `resource`.
    async fn enumerate(
        &self,
        resource: &str,
        selectors: &[(&str, &str)],
    ) -> Result<Response, WsmanError>;

    /// WS-Transfer Get of a single instance.
    async fn get(&self, resource: &str, selectors: &[(&str, &str)])
    -> Result<Response, WsmanError>;

    /// Invokes `method` on `resource` with the given input parameters.
    async fn invoke(
        &self,
        resource: &str,
        method: &str,
        selectors: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> Result<Response, WsmanError>;
}

/// WS-Management over HTTPS with basic authentication.
///
/// Controllers ship self-signed certificates, so certificate validation is
/// disabled; the credentials are the only trust anchor on these management
/// networks.
pub struct HttpClient {
    endpoint: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(address: IpAddr, username: &str, password: &str) -> Result<Self, WsmanError> {
        let endpoint = match address {
            IpAddr::V4(v4) => format!("https://{v4}/wsman"),
            IpAddr::V6(v6) => format!("https://[{v6}]/wsman"),
        };
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint,
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    async fn post(&self, envelope: String) -> Result<Response, WsmanError> {
        debug!("POST {} ({} bytes)", self.endpoint, envelope.len());
        let res = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(envelope)
            .send()
            .await?;
        let status = res.status();
        // Faults come back as HTTP 500 with a fault body; let those through
        // so they surface as Fault rather than a bare status code.
        if !status.is_success() && status.as_u16() != 500 {
            return Err(WsmanError::Status(status.as_u16()));
        }
        let response = Response::new(res.text().await?);
        response.body()?;
        if response.is_fault() {
            return Err(WsmanError::Fault);
        }
        Ok(response)
    }
}

#[async_trait]
impl ManagementClient for HttpClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn identify(&self) -> Result<Response, WsmanError> {
        self.post(envelope::identify()).await
    }

    async fn enumerate(
        &self,
        resource: &str,
        selectors: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.post(envelope::enumerate(&self.endpoint, resource, selectors))
            .await
    }

    async fn get(
        &self,
        resource: &str,
        selectors: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.post(envelope::get(&self.endpoint, resource, selectors))
            .await
    }

    async fn invoke(
        &self,
        resource: &str,
        method: &str,
        selectors: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> Result<Response, WsmanError> {
        self.post(envelope::invoke(
            &self.endpoint,
            resource,
            method,
            selectors,
            params,
        ))
        .await
    }
}
