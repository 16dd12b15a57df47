//! Analysis Server Client
//!
//! HTTP client for the batch analysis server: upload, event stream,
//! single-item judge and judge-context reset.

use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::sse::SseDecoder;
use super::{BatchFile, EventChannel, ProbeClient, RemoteSession, SessionId, CHANNEL_CAPACITY};
use crate::logic::config::MonitorConfig;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::probe::{JudgeResponse, ProbeInput, ProbeResult};
use crate::logic::record::{decode_message, StreamEvent};

/// Remote endpoint configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub server_url: String,
    pub timeout_seconds: u64,
}

impl From<&MonitorConfig> for RemoteConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            server_url: config.server_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.request_timeout_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_id: Option<String>,
    error: Option<String>,
}

/// HTTP implementation of `RemoteSession` and `ProbeClient`
pub struct HttpRemote {
    config: RemoteConfig,
    /// Request/response calls (bounded by the timeout)
    http_client: reqwest::Client,
    /// Long-lived stream (no overall timeout; the server closes it)
    stream_client: reqwest::Client,
}

impl HttpRemote {
    /// Create new remote client
    pub fn new(config: RemoteConfig) -> MonitorResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MonitorError::Submission(format!("Failed to create HTTP client: {}", e)))?;

        let stream_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MonitorError::Submission(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http_client, stream_client })
    }

    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.server_url, path)
    }
}

impl RemoteSession for HttpRemote {
    async fn submit_batch(&self, file: &BatchFile) -> MonitorResult<SessionId> {
        let url = self.url("/api/upload");

        let part = reqwest::multipart::Part::bytes(file.contents.clone())
            .file_name(file.name.clone())
            .mime_str("text/csv")
            .map_err(|e| MonitorError::Submission(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        log::info!("Uploading batch '{}' ({} bytes) to {}", file.name, file.contents.len(), url);

        let response = self.http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MonitorError::Submission(format!("Network error: {}", e)))?;

        let status = response.status();
        let body: UploadResponse = response.json().await
            .map_err(|e| MonitorError::Submission(format!("Upload failed ({}): {}", status.as_u16(), e)))?;

        match (status.is_success(), body.file_id, body.error) {
            (true, Some(file_id), _) => {
                log::info!("Batch accepted: {}", file_id);
                Ok(SessionId(file_id))
            }
            (_, _, Some(error)) => Err(MonitorError::Submission(error)),
            _ => Err(MonitorError::Submission(format!("Upload failed ({})", status.as_u16()))),
        }
    }

    async fn open_analysis_stream(&self, session_id: &SessionId) -> MonitorResult<EventChannel> {
        let url = self.url(&format!("/api/analyze/{}", session_id));

        let mut response = self.stream_client
            .get(&url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| MonitorError::Stream { message: format!("Network error: {}", e), ingested: 0 })?;

        if !response.status().is_success() {
            return Err(MonitorError::Stream {
                message: format!("Server error: {}", response.status().as_u16()),
                ingested: 0,
            });
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            loop {
                match response.chunk().await {
                    Ok(Some(bytes)) => {
                        for payload in decoder.push(&bytes) {
                            for event in decode_message(&payload) {
                                if tx.send(event).await.is_err() {
                                    log::debug!("Event channel receiver dropped; stopping reader");
                                    return;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        if let Some(payload) = decoder.finish() {
                            for event in decode_message(&payload) {
                                let _ = tx.send(event).await;
                            }
                        }
                        log::debug!("Analysis stream closed by server");
                        return;
                    }
                    Err(e) => {
                        log::warn!("Analysis stream broke: {}", e);
                        let _ = tx.send(StreamEvent::Error(format!("Stream interrupted: {}", e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

impl ProbeClient for HttpRemote {
    async fn analyze_single_item(&self, input: &ProbeInput) -> MonitorResult<ProbeResult> {
        let request = input.to_request()?;
        let url = self.url("/api/judge");

        let response = self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MonitorError::Probe(format!("Network error: {}", e)))?;

        let status = response.status();
        let body: JudgeResponse = response.json().await
            .map_err(|e| MonitorError::Probe(format!("Parse error ({}): {}", status.as_u16(), e)))?;

        if !status.is_success() && body.error.is_none() {
            return Err(MonitorError::Probe(format!("Server error: {}", status.as_u16())));
        }

        body.into_result()
    }

    async fn reset_remote_context(&self) -> MonitorResult<()> {
        let url = self.url("/api/reset_judge");

        let response = self.http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Probe(format!("Network error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(MonitorError::Probe(format!("Server error: {}", response.status().as_u16())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_config_trims_trailing_slash() {
        let config = MonitorConfig {
            server_url: "http://analysis.local:5000/".into(),
            ..MonitorConfig::deterministic()
        };
        let remote = HttpRemote::new(RemoteConfig::from(&config)).unwrap();
        assert_eq!(remote.server_url(), "http://analysis.local:5000");
        assert_eq!(remote.url("/api/upload"), "http://analysis.local:5000/api/upload");
    }

    #[tokio::test]
    async fn test_invalid_probe_input_never_hits_network() {
        let config = MonitorConfig {
            server_url: "http://127.0.0.1:9".into(),
            ..MonitorConfig::deterministic()
        };
        let remote = HttpRemote::new(RemoteConfig::from(&config)).unwrap();
        let result = remote.analyze_single_item(&ProbeInput::default()).await;
        assert_eq!(result, Err(MonitorError::InvalidProbeInput("amount".into())));
    }
}
