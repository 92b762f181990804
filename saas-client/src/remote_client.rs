//! HTTP backend for partner apps deployed outside the platform.
//!
//! Reads favor availability over correctness signaling: any transport-level
//! failure (connect error, timeout, non-success status, malformed body)
//! degrades to an empty resource so display code sees one shape for "not
//! found" and "backend down". ACL checks degrade to `false` instead -
//! authorization fails closed.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use async_trait::async_trait;

use saas_sdk::{Credential, PlatformClient, ResourceCollection, ResourceObject, SdkError};

use crate::config::PlatformConfig;

/// Header carrying the inbound request's host on every platform call.
pub const ORIGIN_DOMAIN_HEADER: &str = "X-Saas-Origin-Domain";

/// HTTP platform backend.
pub struct RemoteClient {
    client: reqwest::Client,
    base: Url,
}

impl RemoteClient {
    /// Create a remote backend talking to the configured platform root on
    /// behalf of the partner app serving `origin_host`.
    pub fn new(
        credential: &Credential,
        origin_host: &str,
        config: &PlatformConfig,
    ) -> Result<Self, SdkError> {
        let base = Url::parse(&format!("{}{}", config.scheme, config.root))
            .map_err(|e| SdkError::configuration(format!("invalid platform root: {e}")))?;

        let mut headers = HeaderMap::new();
        let origin = HeaderValue::from_str(origin_host)
            .map_err(|e| SdkError::configuration(format!("invalid origin host: {e}")))?;
        headers.insert(ORIGIN_DOMAIN_HEADER, origin);
        let mut authorization =
            HeaderValue::from_str(&format!("Basic {}", credential.basic_token()))
                .map_err(|e| SdkError::configuration(format!("invalid credential: {e}")))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| SdkError::configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// Endpoint URL under the platform root.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, SdkError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| SdkError::configuration("platform root cannot be a base URL"))?
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SdkError> {
        let response = request
            .send()
            .await
            .map_err(|e| SdkError::upstream(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::upstream(format!("HTTP {status}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SdkError::upstream(e.to_string()))
    }

    async fn get_object(
        &self,
        operation: &'static str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> ResourceObject {
        let result = async {
            let url = self.endpoint(segments, query)?;
            self.read_json::<ResourceObject>(self.client.get(url)).await
        }
        .await;
        degrade(operation, result)
    }

    async fn get_collection(
        &self,
        operation: &'static str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> ResourceCollection {
        let result = async {
            let url = self.endpoint(segments, query)?;
            self.read_json::<ResourceCollection>(self.client.get(url)).await
        }
        .await;
        degrade(operation, result)
    }
}

/// Swallow a failed read, logging what was lost.
fn degrade<T: Default>(operation: &'static str, result: Result<T, SdkError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(operation, error = %e, "platform call degraded to empty result");
            T::default()
        }
    }
}

#[async_trait]
impl PlatformClient for RemoteClient {
    async fn get_owner_app(&self) -> Result<ResourceObject, SdkError> {
        Ok(self.get_object("get_owner_app", &["api", "instance"], &[]).await)
    }

    async fn get_owner_app_identity(&self) -> Result<ResourceObject, SdkError> {
        Ok(self
            .get_object("get_owner_app_identity", &["api", "instance", "identity"], &[])
            .await)
    }

    async fn get_user(&self, id: &str) -> Result<ResourceObject, SdkError> {
        Ok(self.get_object("get_user", &["api", "user", id], &[]).await)
    }

    async fn get_company(&self, id: &str) -> Result<ResourceObject, SdkError> {
        Ok(self.get_object("get_company", &["api", "company", id], &[]).await)
    }

    async fn switch_company(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<ResourceObject, SdkError> {
        let result = async {
            let url = self.endpoint(&["api", "switch"], &[])?;
            let body = serde_json::json!({
                "user_id": user_id,
                "company_id": company_id,
            });
            self.read_json::<ResourceObject>(self.client.post(url).json(&body))
                .await
        }
        .await;
        Ok(degrade("switch_company", result))
    }

    async fn get_companies_by_user(
        &self,
        user_id: &str,
        only_active: bool,
    ) -> Result<ResourceCollection, SdkError> {
        let only_active = if only_active { "true" } else { "false" };
        Ok(self
            .get_collection(
                "get_companies_by_user",
                &["api", "company"],
                &[("user_id", user_id), ("only_active", only_active)],
            )
            .await)
    }

    async fn get_current_subscription(
        &self,
        company_id: &str,
    ) -> Result<ResourceObject, SdkError> {
        Ok(self
            .get_object(
                "get_current_subscription",
                &["api", "company", company_id, "subscription"],
                &[],
            )
            .await)
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), SdkError> {
        // Best-effort invalidation; the caller cannot retry meaningfully.
        let result = async {
            let url = self.endpoint(&["api", "clearsession", session_id], &[])?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SdkError::upstream(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(SdkError::upstream(format!("HTTP {status}")));
            }
            Ok(())
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "session invalidation was not acknowledged");
        }
        Ok(())
    }

    async fn get_plans(&self) -> Result<ResourceCollection, SdkError> {
        Ok(self.get_collection("get_plans", &["api", "plans"], &[]).await)
    }

    async fn get_rules(&self) -> Result<ResourceCollection, SdkError> {
        Ok(self.get_collection("get_rules", &["api", "rules"], &[]).await)
    }

    async fn get_rule(&self, slug: &str) -> Result<ResourceObject, SdkError> {
        Ok(self.get_object("get_rule", &["api", "rules", slug], &[]).await)
    }

    async fn check_acl(
        &self,
        rule: &str,
        user_id: &str,
        company_id: &str,
        subscription_id: &str,
    ) -> Result<bool, SdkError> {
        let result = async {
            let url = self.endpoint(
                &["api", "acl"],
                &[
                    ("rule", rule),
                    ("user_id", user_id),
                    ("company_id", company_id),
                    ("subscription_id", subscription_id),
                ],
            )?;
            self.read_json::<Value>(self.client.get(url)).await
        }
        .await;
        match result {
            Ok(Value::Bool(allowed)) => Ok(allowed),
            Ok(Value::Object(body)) => {
                Ok(body.get("allowed").and_then(Value::as_bool).unwrap_or(false))
            }
            Ok(_) => Ok(false),
            Err(e) => {
                tracing::warn!(rule, error = %e, "ACL check degraded to deny");
                Ok(false)
            }
        }
    }
}
