//! JSON/HTTP client for the control-plane ClassicLink API.

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, ApiErrorKind, ApiResult, ClassicLinkApi, ClassicLinkRecord};
use crate::config::{ClientConfig, ConfigError};

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachRequest {
    pub instance_id: String,
    pub vpc_id: String,
    pub groups: Vec<String>,
}

/// Detach request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct DetachRequest {
    pub instance_id: String,
    pub vpc_id: String,
}

/// One linked instance in a describe response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkedInstance {
    pub instance_id: String,
    pub vpc_id: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Describe response body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DescribeResponse {
    #[serde(default)]
    pub instances: Vec<LinkedInstance>,
}

/// Error body of a non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl From<LinkedInstance> for ClassicLinkRecord {
    fn from(i: LinkedInstance) -> Self {
        ClassicLinkRecord {
            instance_id: i.instance_id,
            network_id: i.vpc_id,
            security_group_ids: i.groups.into_iter().collect(),
        }
    }
}

/// Client for a control plane speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, tagging it with a fresh request ID.
    async fn send(&self, request: RequestBuilder, action: &str) -> ApiResult<Response> {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(request_id = %request_id, "Sending {} request", action);

        let response = request
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("{} request failed: {}", action, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }
}

/// Turn a non-2xx response into a classified [`ApiError`].
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let text = match response.text().await {
        Ok(t) => t,
        Err(e) => return ApiError::transport(format!("HTTP {}: {}", status, e)),
    };

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            code: Some(code),
            message,
        }) => ApiError {
            kind: ApiErrorKind::from_code(Some(&code), Some(status.as_u16())),
            code: Some(code),
            message,
        },
        _ => ApiError {
            kind: ApiErrorKind::from_code(None, Some(status.as_u16())),
            code: None,
            message: format!("HTTP {}: {}", status, text.trim()),
        },
    }
}

#[async_trait]
impl ClassicLinkApi for HttpClient {
    async fn attach(
        &self,
        instance_id: &str,
        network_id: &str,
        security_group_ids: &BTreeSet<String>,
    ) -> ApiResult<()> {
        let body = AttachRequest {
            instance_id: instance_id.to_string(),
            vpc_id: network_id.to_string(),
            groups: security_group_ids.iter().cloned().collect(),
        };
        debug!("Attach request: {:?}", body);

        let request = self
            .client
            .post(self.url("/classic-links/attach"))
            .json(&body);
        self.send(request, "attach").await?;
        Ok(())
    }

    async fn describe(&self, instance_id: &str) -> ApiResult<Vec<ClassicLinkRecord>> {
        let request = self
            .client
            .get(self.url("/classic-links"))
            .query(&[("instance_id", instance_id)]);
        let response = self.send(request, "describe").await?;

        let body: DescribeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::malformed(format!("Invalid describe response: {}", e)))?;
        Ok(body.instances.into_iter().map(Into::into).collect())
    }

    async fn detach(&self, instance_id: &str, network_id: &str) -> ApiResult<()> {
        let body = DetachRequest {
            instance_id: instance_id.to_string(),
            vpc_id: network_id.to_string(),
        };
        debug!("Detach request: {:?}", body);

        let request = self
            .client
            .post(self.url("/classic-links/detach"))
            .json(&body);
        self.send(request, "detach").await?;
        Ok(())
    }
}
