use async_trait::async_trait;
use reqwest::{
    Client,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use snafu::{IntoError, ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{request_params::SeriesRequest, series_table::SeriesTable},
    providers::{
        AttemptError, ClientBuildSnafu, DataProvider, InvalidHeaderNameSnafu,
        InvalidHeaderValueSnafu, MalformedSnafu, NoEndpointsSnafu, ProviderError,
        ProviderInitError, StatusSnafu, TimeoutSnafu, TransportSnafu,
        eastmoney::{params::construct_params, response::parse_body},
        fallback::{Endpoint, FetchPolicy, QuoteSource, RequestIdentity, fetch_with_fallback},
    },
};

pub struct EastmoneyProvider {
    client: Client,
    policy: FetchPolicy,
}

impl EastmoneyProvider {
    /// Creates a provider that walks `policy.endpoints` in order.
    ///
    /// The request identity (user agent, referer, extra headers) becomes the
    /// client's default headers.
    pub fn new(policy: FetchPolicy) -> Result<Self, ProviderInitError> {
        ensure!(!policy.endpoints.is_empty(), NoEndpointsSnafu);

        let headers = build_headers(&policy.identity)?;
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self { client, policy })
    }
}

fn build_headers(identity: &RequestIdentity) -> Result<HeaderMap, ProviderInitError> {
    let mut headers = HeaderMap::new();
    if let Some(ua) = &identity.user_agent {
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(ua).context(InvalidHeaderValueSnafu { name: "User-Agent" })?,
        );
    }
    if let Some(referer) = &identity.referer {
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(referer).context(InvalidHeaderValueSnafu { name: "Referer" })?,
        );
    }
    for (name, value) in &identity.extra_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .context(InvalidHeaderNameSnafu { name: name.as_str() })?;
        let header_value =
            HeaderValue::from_str(value).context(InvalidHeaderValueSnafu { name: name.as_str() })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn classify(endpoint: &Endpoint, e: reqwest::Error) -> AttemptError {
    if e.is_timeout() {
        TimeoutSnafu {
            url: endpoint.url.as_str(),
            timeout: endpoint.timeout,
        }
        .build()
    } else {
        TransportSnafu {
            url: endpoint.url.as_str(),
        }
        .into_error(e)
    }
}

#[async_trait]
impl QuoteSource for EastmoneyProvider {
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        request: &SeriesRequest,
    ) -> Result<SeriesTable, AttemptError> {
        let response = self
            .client
            .get(&endpoint.url)
            .query(&construct_params(request))
            .timeout(endpoint.timeout)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        ensure!(
            status.is_success(),
            StatusSnafu {
                url: endpoint.url.as_str(),
                status: status.as_u16(),
            }
        );

        let body = response.text().await.map_err(|e| classify(endpoint, e))?;
        debug!(url = %endpoint.url, bytes = body.len(), "received kline body");

        parse_body(&request.index, &body).map_err(|e| {
            MalformedSnafu {
                url: endpoint.url.as_str(),
                message: e.to_string(),
            }
            .build()
        })
    }
}

#[async_trait]
impl DataProvider for EastmoneyProvider {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<SeriesTable, ProviderError> {
        fetch_with_fallback(self, &self.policy.endpoints, &self.policy.retry, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indexmap::IndexMap;

    use super::*;

    fn policy(identity: RequestIdentity) -> FetchPolicy {
        FetchPolicy {
            endpoints: vec![Endpoint::new("http://127.0.0.1:9", Duration::from_secs(1))],
            identity,
            ..Default::default()
        }
    }

    #[test]
    fn requires_an_endpoint() {
        let err = EastmoneyProvider::new(FetchPolicy::default()).err().unwrap();
        assert!(matches!(err, ProviderInitError::NoEndpoints { .. }));
    }

    #[test]
    fn builds_identity_headers() {
        let mut extra = IndexMap::new();
        extra.insert("Accept-Language".to_string(), "zh-CN".to_string());
        let identity = RequestIdentity {
            user_agent: Some("Mozilla/5.0".to_string()),
            referer: Some("https://quote.eastmoney.com/".to_string()),
            extra_headers: extra,
        };
        let headers = build_headers(&identity).unwrap();
        assert_eq!(headers[header::USER_AGENT], "Mozilla/5.0");
        assert_eq!(headers[header::REFERER], "https://quote.eastmoney.com/");
        assert_eq!(headers["accept-language"], "zh-CN");
        assert!(EastmoneyProvider::new(policy(identity)).is_ok());
    }

    #[test]
    fn rejects_invalid_header_names() {
        let mut extra = IndexMap::new();
        extra.insert("bad header".to_string(), "x".to_string());
        let identity = RequestIdentity {
            extra_headers: extra,
            ..Default::default()
        };
        let err = EastmoneyProvider::new(policy(identity)).err().unwrap();
        assert!(matches!(err, ProviderInitError::InvalidHeaderName { .. }));
    }
}
