use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::base::AgentApi;
use crate::config::Settings;
use crate::errors::{ConfigError, DispatchError, DispatchResult};
use crate::models::AgentResult;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Talks to the agent's invoke endpoint over HTTP.
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
}

impl HttpAgentClient {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn remote_error(status: StatusCode, body: &[u8]) -> DispatchError {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        DispatchError::remote(status.as_u16(), message)
    }
}

#[async_trait]
impl AgentApi for HttpAgentClient {
    async fn invoke(&self, query: &str, credential: Option<&str>) -> DispatchResult<AgentResult> {
        tracing::debug!(endpoint = %self.endpoint, "invoking agent");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", credential.unwrap_or_default()))
            .json(&json!({ "input": query }))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            AgentResult::from_slice(&body)
        } else {
            Err(Self::remote_error(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AGENT_PATH: &str = "/agent/test-agent/invoke";

    async fn _setup_mock_server(response: ResponseTemplate) -> (MockServer, HttpAgentClient) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let settings = Settings::with_base_url(mock_server.uri())
            .agent_id("test-agent")
            .timeout_secs(1);
        let client = HttpAgentClient::new(&settings).unwrap();
        (mock_server, client)
    }

    fn json_response(status: u16, body: Value) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(body)
    }

    #[tokio::test]
    async fn test_request_shape() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AGENT_PATH))
            .and(header("authorization", "Bearer secret-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"input": "coffee near me"})))
            .respond_with(json_response(200, json!({"text": "Found it"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let settings =
            Settings::with_base_url(format!("{}/", mock_server.uri())).agent_id("test-agent");
        let client = HttpAgentClient::new(&settings)?;

        let result = client.invoke("coffee near me", Some("secret-token")).await?;
        assert_eq!(result.text.as_deref(), Some("Found it"));

        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_sends_empty_bearer() -> anyhow::Result<()> {
        let (server, client) = _setup_mock_server(json_response(200, json!({}))).await;

        let result = client.invoke("museums", None).await?;
        assert_eq!(result, AgentResult::default());

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        let auth = requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(auth.trim_end(), "Bearer");

        Ok(())
    }

    #[tokio::test]
    async fn test_remote_error_message() {
        let body = json!({"message": "rate limited", "retryAfter": 30});
        let (_server, client) = _setup_mock_server(json_response(429, body)).await;

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert_eq!(err, DispatchError::remote(429, "rate limited"));
    }

    #[tokio::test]
    async fn test_remote_error_without_message() {
        let (_server, client) =
            _setup_mock_server(ResponseTemplate::new(502).set_body_string("Bad Gateway")).await;

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert_eq!(err, DispatchError::remote(502, "HTTP 502"));
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[tokio::test]
    async fn test_remote_error_with_empty_message() {
        let (_server, client) =
            _setup_mock_server(json_response(401, json!({"message": ""}))).await;

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert_eq!(err, DispatchError::remote(401, "HTTP 401"));
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let (_server, client) =
            _setup_mock_server(ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let (_server, client) = _setup_mock_server(
            json_response(200, json!({"text": "too late"})).set_delay(Duration::from_secs(3)),
        )
        .await;

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Network(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let settings = Settings::with_base_url(format!("http://{}", addr)).timeout_secs(1);
        let client = HttpAgentClient::new(&settings).unwrap();

        let err = client.invoke("parks", Some("tok")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Network(_)), "got {:?}", err);
    }
}
