use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::adapters::response_sink::ResponseSink;
use crate::error::AdapterError;

/// PUTs the response to the pre-signed S3 URL handed out by CloudFormation.
#[derive(Debug, Clone, Default)]
pub struct HttpsResponseSink {
    http: reqwest::Client,
}

impl HttpsResponseSink {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ResponseSink for HttpsResponseSink {
    async fn put_response(&self, response_url: &str, body: Vec<u8>) -> Result<u16, AdapterError> {
        // The URL is signed without a content type, so the header must stay empty.
        let response = self
            .http
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|error| AdapterError::Transport(error.to_string()))?;

        Ok(response.status().as_u16())
    }
}
