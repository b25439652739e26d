//! Grading service over JSON/HTTP.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result, TransportError};
use crate::protocol::traits::GradingService;
use crate::protocol::wire::{self, AnswerSubmission, NextResponse, ViolationReport};
use crate::question::SelectionSet;
use crate::storage::ServiceConfig;

pub struct HttpGradingService {
    client: Client,
    report_url: Url,
    answer_url: Url,
    next_url: Url,
}

impl HttpGradingService {
    /// Build a client for the service described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the base URL or an endpoint path does not form a valid URL,
    /// or the session cookie is not a valid header value.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|_| TransportError::InvalidUrl(config.base_url.clone()))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|_| TransportError::InvalidUrl(format!("{}{}", config.base_url, path)))
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookie) = config.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie).map_err(|e| ConfigError::InvalidValue {
                key: "service.session_cookie".into(),
                message: e.to_string(),
            })?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| TransportError::Request {
                endpoint: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            report_url: join(&config.report_path)?,
            answer_url: join(&config.answer_path)?,
            next_url: join(&config.next_path)?,
        })
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        body: Option<&B>,
    ) -> Result<Response> {
        let endpoint = url.path().to_string();
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        debug!(%endpoint, status = status.as_u16(), "grading service responded");
        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint,
                status: status.as_u16(),
            }
            .into());
        }
        Ok(resp)
    }
}

#[async_trait]
impl GradingService for HttpGradingService {
    async fn report_violation(&self, report: &ViolationReport) -> Result<()> {
        self.post(&self.report_url, Some(report)).await?;
        Ok(())
    }

    async fn submit_answer(&self, selection: &SelectionSet) -> Result<()> {
        let body = AnswerSubmission {
            answer: selection.clone(),
        };
        self.post(&self.answer_url, Some(&body)).await?;
        Ok(())
    }

    async fn next_question(&self) -> Result<NextResponse> {
        let endpoint = self.next_url.path().to_string();
        let resp = self.post::<()>(&self.next_url, None).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(wire::decode_next(&endpoint, &body)?)
    }
}
