//! Natural-language to shell-command translation over the remote API.

use crate::config::{EffectiveConfig, ProviderSettings};
use crate::error::TranslateError;
use crate::http_client::{HttpClient, ReqwestHttpClient, TransportError};
use reqwest::Url;
use tracing::{debug, info};

pub const HEADER_PROVIDER: &str = "X-Provider";
pub const HEADER_API_KEY: &str = "X-API-Key";
pub const HEADER_MODEL: &str = "X-Model";

/// A trimmed, non-empty command returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedCommand(String);

impl TranslatedCommand {
    /// Wraps a body that is already known to be usable, such as a cache hit.
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TranslatedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Joins command-line words into the query string sent to the API.
pub fn join_query<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Headers that identify a custom provider. Empty for the default provider.
pub fn provider_headers(provider: &ProviderSettings) -> Vec<(&'static str, &str)> {
    match provider {
        ProviderSettings::Anonymous => Vec::new(),
        ProviderSettings::Custom { name, api_key, model } => {
            let mut headers = vec![(HEADER_PROVIDER, name.as_str()), (HEADER_API_KEY, api_key.as_str())];
            if let Some(model) = model {
                headers.push((HEADER_MODEL, model.as_str()));
            }
            headers
        }
    }
}

/// Endpoint for the query-parameter form: the base URL with exactly one
/// trailing slash.
fn endpoint(api_url: &Url) -> Url {
    let mut url = api_url.clone();
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{trimmed}/"));
    url.set_query(None);
    url
}

/// Sends one query to the translation API and returns the command.
///
/// There are no retries: one request, one attempt.
pub struct Translator<C: HttpClient> {
    client: C,
}

impl Translator<ReqwestHttpClient> {
    /// Creates a translator backed by reqwest with the configured timeout.
    pub fn from_config(config: &EffectiveConfig) -> Result<Self, TranslateError> {
        let client = ReqwestHttpClient::new(config.timeout)
            .map_err(|e| TranslateError::Network(e.to_string()))?;
        Ok(Self::new(client))
    }
}

impl<C: HttpClient> Translator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn translate(
        &self,
        query: &str,
        config: &EffectiveConfig,
    ) -> Result<TranslatedCommand, TranslateError> {
        let url = endpoint(&config.api_url);
        let headers = provider_headers(&config.provider);

        info!(
            "Translating query via {} (provider: {})",
            url,
            config.provider.name().unwrap_or("default")
        );

        let response = self
            .client
            .get(&url, &[("q", query)], &headers)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(d) => TranslateError::Timeout(d.as_secs().max(1)),
                TransportError::Connection(msg) => TranslateError::Network(msg),
            })?;

        if !response.is_success() {
            let body = response.body.trim();
            return Err(TranslateError::Http {
                status: response.status,
                body: (!body.is_empty()).then(|| body.to_string()),
            });
        }

        let command = response.body.trim();
        if command.is_empty() {
            return Err(TranslateError::EmptyResponse);
        }

        debug!("API returned {} bytes", command.len());
        Ok(TranslatedCommand::new(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;
    use crate::http_client::HttpResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // =========================================================================
    // Mock implementations
    // =========================================================================

    /// Records every request and answers with a canned result.
    struct MockHttpClient {
        result: Mutex<Option<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        url: String,
        query: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    }

    impl MockHttpClient {
        fn responding(status: u16, body: &str) -> Self {
            Self::with_result(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }))
        }

        fn failing(error: TransportError) -> Self {
            Self::with_result(Err(error))
        }

        fn with_result(result: Result<HttpResponse, TransportError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(
            &self,
            url: &Url,
            query: &[(&str, &str)],
            headers: &[(&str, &str)],
        ) -> Result<HttpResponse, TransportError> {
            let own = |pairs: &[(&str, &str)]| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<Vec<_>>()
            };
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                query: own(query),
                headers: own(headers),
            });
            self.result
                .lock()
                .unwrap()
                .take()
                .expect("mock client called more than once")
        }
    }

    fn config_with(flags: CliOverrides) -> EffectiveConfig {
        EffectiveConfig::resolve(&flags, &HashMap::new(), None).unwrap()
    }

    fn default_config() -> EffectiveConfig {
        config_with(CliOverrides::default())
    }

    // =========================================================================
    // Query and header construction
    // =========================================================================

    #[test]
    fn test_join_query_preserves_words_exactly() {
        let words = ["find", "files", "named", "\"a b\"", "&&", "*.txt", "files"];
        assert_eq!(join_query(&words), "find files named \"a b\" && *.txt files");
    }

    #[test]
    fn test_endpoint_normalises_trailing_slash() {
        let with_slash = Url::parse("https://cmd.xaw.me/api//").unwrap();
        let without = Url::parse("https://cmd.xaw.me/api").unwrap();
        assert_eq!(endpoint(&with_slash).as_str(), "https://cmd.xaw.me/api/");
        assert_eq!(endpoint(&without).as_str(), "https://cmd.xaw.me/api/");
    }

    #[test]
    fn test_anonymous_provider_sends_no_headers() {
        assert!(provider_headers(&ProviderSettings::Anonymous).is_empty());
    }

    #[test]
    fn test_custom_provider_headers_skip_missing_model() {
        let provider = ProviderSettings::Custom {
            name: "openai".to_string(),
            api_key: "sk-test".to_string(),
            model: None,
        };
        assert_eq!(
            provider_headers(&provider),
            vec![(HEADER_PROVIDER, "openai"), (HEADER_API_KEY, "sk-test")]
        );
    }

    // =========================================================================
    // translate
    // =========================================================================

    #[tokio::test]
    async fn test_translate_trims_body() {
        let translator = Translator::new(MockHttpClient::responding(200, "  ls -la\n"));

        let command = translator.translate("list files", &default_config()).await.unwrap();

        assert_eq!(command.as_str(), "ls -la");
        let requests = translator.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://cmd.xaw.me/");
        assert_eq!(requests[0].query, vec![("q".to_string(), "list files".to_string())]);
        assert!(requests[0].headers.is_empty());
    }

    #[tokio::test]
    async fn test_translate_sends_provider_headers() {
        let config = config_with(CliOverrides {
            provider: Some("gemini".to_string()),
            api_key: Some("key-123".to_string()),
            model: Some("gemini-pro".to_string()),
            ..Default::default()
        });
        let translator = Translator::new(MockHttpClient::responding(200, "pwd"));

        translator.translate("where am i", &config).await.unwrap();

        let headers = &translator.client.requests()[0].headers;
        assert!(headers.contains(&(HEADER_PROVIDER.to_string(), "gemini".to_string())));
        assert!(headers.contains(&(HEADER_API_KEY.to_string(), "key-123".to_string())));
        assert!(headers.contains(&(HEADER_MODEL.to_string(), "gemini-pro".to_string())));
    }

    #[tokio::test]
    async fn test_translate_empty_body_is_empty_response() {
        let translator = Translator::new(MockHttpClient::responding(200, " \n\t "));
        let result = translator.translate("nothing", &default_config()).await;
        assert!(matches!(result, Err(TranslateError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_translate_non_success_status_is_http_error() {
        let translator = Translator::new(MockHttpClient::responding(429, "slow down\n"));
        let result = translator.translate("anything", &default_config()).await;

        match result {
            Err(TranslateError::Http { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body.as_deref(), Some("slow down"));
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translate_http_error_without_body() {
        let translator = Translator::new(MockHttpClient::responding(502, ""));
        let result = translator.translate("anything", &default_config()).await;
        assert!(matches!(result, Err(TranslateError::Http { status: 502, body: None })));
    }

    #[tokio::test]
    async fn test_translate_maps_timeout() {
        let translator = Translator::new(MockHttpClient::failing(TransportError::Timeout(
            std::time::Duration::from_secs(10),
        )));
        let result = translator.translate("anything", &default_config()).await;
        assert!(matches!(result, Err(TranslateError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_translate_maps_connection_failure() {
        let translator = Translator::new(MockHttpClient::failing(TransportError::Connection(
            "connection refused".to_string(),
        )));
        let result = translator.translate("anything", &default_config()).await;
        assert!(matches!(result, Err(TranslateError::Network(msg)) if msg.contains("refused")));
    }
}
