//! In-process backend for partner apps deployed inside the platform.
//!
//! When the inbound request already lands on a platform-hosted instance,
//! resources come straight from the instance's directory store instead of
//! a loopback HTTP call. Capabilities that only the platform's central
//! deployment has (tracked sessions, plans, the rule engine) fail fast with
//! an explicit unsupported error - "not implemented here" must never read
//! as "looked up and found nothing".

use std::path::{MAIN_SEPARATOR, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use saas_sdk::{Credential, PlatformClient, ResourceCollection, ResourceObject, SdkError};

use crate::ports::{DirectoryGateway, GatewayError, Query, Row};

const BACKEND: &str = "local";

const BRANDS_TABLE: &str = "brands";
const USERS_TABLE: &str = "users";
const MEMBERSHIPS_TABLE: &str = "brands_users";
const SUBSCRIPTIONS_TABLE: &str = "subscriptions";

// Path template of a tenant instance: `…/instances/<host>/app` rewrites to
// the master bootstrap artifact of the deployment.
const INSTANCES_SEGMENT: &str = "instances";
const APP_SEGMENT: &str = "app";
const PLATFORM_ROOT_DIR: &str = "app-saasapi";
const BOOTSTRAP_SEGMENT: &str = "bootstrap";
const BOOTSTRAP_FILE: &str = "app.php";

/// Subscription statuses in order of relevance.
const SUBSCRIPTION_STATUS_PREFERENCE: [&str; 4] = ["active", "suspended", "pending", "expired"];

/// In-process platform backend.
pub struct LocalClient {
    credential: Credential,
    host: String,
    instance_dir: PathBuf,
    gateway: Arc<dyn DirectoryGateway>,
}

impl LocalClient {
    /// Create a local backend for the instance serving `host`.
    ///
    /// `instance_dir` is the per-instance application directory the host
    /// runs from (`…/instances/<host>/app`).
    pub fn new(
        credential: Credential,
        host: impl Into<String>,
        instance_dir: impl Into<PathBuf>,
        gateway: Arc<dyn DirectoryGateway>,
    ) -> Self {
        Self {
            credential,
            host: host.into(),
            instance_dir: instance_dir.into(),
            gateway,
        }
    }

    /// The master bootstrap path derived from the instance path template.
    fn bootstrap_path(&self) -> Option<PathBuf> {
        let raw = self.instance_dir.to_str()?;
        let instance_segment =
            format!("{INSTANCES_SEGMENT}{MAIN_SEPARATOR}{}{MAIN_SEPARATOR}{APP_SEGMENT}", self.host);
        if !raw.contains(&instance_segment) {
            return None;
        }
        let bootstrap_segment =
            format!("{PLATFORM_ROOT_DIR}{MAIN_SEPARATOR}{BOOTSTRAP_SEGMENT}{MAIN_SEPARATOR}{BOOTSTRAP_FILE}");
        Some(PathBuf::from(raw.replace(&instance_segment, &bootstrap_segment)))
    }

    /// Fail with a configuration error unless the deployment's bootstrap
    /// artifact is where the instance path says it must be.
    fn verify_instance(&self) -> Result<(), SdkError> {
        match self.bootstrap_path() {
            Some(path) if path.is_file() => Ok(()),
            _ => Err(SdkError::configuration("invalid instance path")),
        }
    }

    async fn fetch_first(&self, operation: &'static str, query: Query) -> Result<Option<Row>, SdkError> {
        self.verify_instance()?;
        self.gateway
            .fetch_first(&query)
            .await
            .map_err(|e| log_and_convert(operation, e))
    }

    async fn fetch_all(&self, operation: &'static str, query: Query) -> Result<Vec<Row>, SdkError> {
        self.verify_instance()?;
        self.gateway
            .fetch_all(&query)
            .await
            .map_err(|e| log_and_convert(operation, e))
    }
}

fn log_and_convert(operation: &str, e: GatewayError) -> SdkError {
    tracing::error!(operation, error = ?e, "directory gateway call failed");
    SdkError::Gateway(e.to_string())
}

fn row_to_object(row: Option<Row>) -> ResourceObject {
    row.map(ResourceObject::from_pairs).unwrap_or_default()
}

#[async_trait]
impl PlatformClient for LocalClient {
    async fn get_owner_app(&self) -> Result<ResourceObject, SdkError> {
        let query = Query::table(BRANDS_TABLE)
            .filter_eq("key", self.credential.key())
            .filter_eq("secret", self.credential.secret());
        let row = self.fetch_first("get_owner_app", query).await?;
        Ok(row_to_object(row))
    }

    async fn get_owner_app_identity(&self) -> Result<ResourceObject, SdkError> {
        Err(SdkError::unsupported(BACKEND, "get_owner_app_identity"))
    }

    async fn get_user(&self, id: &str) -> Result<ResourceObject, SdkError> {
        let query = Query::table(USERS_TABLE).filter_eq("id", id);
        let row = self.fetch_first("get_user", query).await?;
        Ok(row_to_object(row))
    }

    async fn get_company(&self, id: &str) -> Result<ResourceObject, SdkError> {
        let query = Query::table(BRANDS_TABLE).filter_eq("id", id);
        let row = self.fetch_first("get_company", query).await?;
        Ok(row_to_object(row))
    }

    async fn switch_company(
        &self,
        _user_id: &str,
        _company_id: &str,
    ) -> Result<ResourceObject, SdkError> {
        Err(SdkError::unsupported(BACKEND, "switch_company"))
    }

    async fn get_companies_by_user(
        &self,
        user_id: &str,
        only_active: bool,
    ) -> Result<ResourceCollection, SdkError> {
        let mut query = Query::table(BRANDS_TABLE)
            .join(MEMBERSHIPS_TABLE, "id", "brand_id")
            .filter_eq("brands_users.user_id", user_id)
            .filter_null("brands_users.deleted_at");
        if only_active {
            query = query.filter_eq("brands_users.active", true);
        }
        let rows = self.fetch_all("get_companies_by_user", query).await?;
        Ok(rows.into_iter().map(ResourceObject::from_pairs).collect())
    }

    async fn get_current_subscription(
        &self,
        company_id: &str,
    ) -> Result<ResourceObject, SdkError> {
        let query = Query::table(SUBSCRIPTIONS_TABLE).filter_eq("brand_id", company_id);
        let rows = self.fetch_all("get_current_subscription", query).await?;
        let best = rows
            .into_iter()
            .map(ResourceObject::from_pairs)
            .filter_map(|subscription| {
                status_rank(&subscription).map(|rank| (rank, subscription))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, subscription)| subscription);
        Ok(best.unwrap_or_default())
    }

    async fn clear_session(&self, _session_id: &str) -> Result<(), SdkError> {
        Err(SdkError::unsupported(BACKEND, "clear_session"))
    }

    async fn get_plans(&self) -> Result<ResourceCollection, SdkError> {
        Err(SdkError::unsupported(BACKEND, "get_plans"))
    }

    async fn get_rules(&self) -> Result<ResourceCollection, SdkError> {
        Err(SdkError::unsupported(BACKEND, "get_rules"))
    }

    async fn get_rule(&self, _slug: &str) -> Result<ResourceObject, SdkError> {
        Err(SdkError::unsupported(BACKEND, "get_rule"))
    }

    async fn check_acl(
        &self,
        _rule: &str,
        _user_id: &str,
        _company_id: &str,
        _subscription_id: &str,
    ) -> Result<bool, SdkError> {
        Err(SdkError::unsupported(BACKEND, "check_acl"))
    }
}

/// Preference rank of a subscription row; untracked statuses are ignored.
fn status_rank(subscription: &ResourceObject) -> Option<usize> {
    let status = subscription.get_str("status")?;
    SUBSCRIPTION_STATUS_PREFERENCE
        .iter()
        .position(|preferred| *preferred == status)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use super::*;

    /// Gateway double that records queries and replays canned rows.
    struct FixtureGateway {
        rows: Vec<Row>,
        queries: Mutex<Vec<Query>>,
    }

    impl FixtureGateway {
        fn with_rows(rows: Vec<Row>) -> Self {
            Self {
                rows,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self::with_rows(Vec::new())
        }

        fn recorded(&self) -> Vec<Query> {
            self.queries.lock().expect("not poisoned").clone()
        }
    }

    #[async_trait]
    impl DirectoryGateway for FixtureGateway {
        async fn fetch_first(&self, query: &Query) -> Result<Option<Row>, GatewayError> {
            self.queries.lock().expect("not poisoned").push(query.clone());
            Ok(self.rows.first().cloned())
        }

        async fn fetch_all(&self, query: &Query) -> Result<Vec<Row>, GatewayError> {
            self.queries.lock().expect("not poisoned").push(query.clone());
            Ok(self.rows.clone())
        }
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    /// Lay out `instances/<host>/app` plus the bootstrap artifact under a
    /// temp root and return the instance dir.
    fn configured_instance(root: &std::path::Path, host: &str) -> PathBuf {
        let instance_dir = root.join(INSTANCES_SEGMENT).join(host).join(APP_SEGMENT);
        fs::create_dir_all(&instance_dir).expect("instance dir");
        let bootstrap_dir = root.join(PLATFORM_ROOT_DIR).join(BOOTSTRAP_SEGMENT);
        fs::create_dir_all(&bootstrap_dir).expect("bootstrap dir");
        fs::write(bootstrap_dir.join(BOOTSTRAP_FILE), "<?php return [];\n").expect("bootstrap file");
        instance_dir
    }

    fn client_with(
        gateway: Arc<FixtureGateway>,
        instance_dir: PathBuf,
        host: &str,
    ) -> LocalClient {
        LocalClient::new(
            Credential::new("some-key", "s0m3s3cr3t"),
            host,
            instance_dir,
            gateway,
        )
    }

    #[tokio::test]
    async fn owner_app_filters_by_key_and_secret() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let gateway = Arc::new(FixtureGateway::with_rows(vec![row(&[
            ("id", json!(1)),
            ("slug", json!("foo")),
        ])]));
        let client = client_with(Arc::clone(&gateway), instance_dir, "foo.saasapi.com");

        let app = client.get_owner_app().await.expect("owner app");
        assert_eq!(app.get_str("slug"), Some("foo"));

        let queries = gateway.recorded();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].table, BRANDS_TABLE);
        assert_eq!(
            queries[0].filters,
            vec![
                crate::ports::Filter::Eq("key".to_owned(), json!("some-key")),
                crate::ports::Filter::Eq("secret".to_owned(), json!("s0m3s3cr3t")),
            ]
        );
    }

    #[tokio::test]
    async fn owner_app_without_row_is_empty_not_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let client = client_with(
            Arc::new(FixtureGateway::empty()),
            instance_dir,
            "foo.saasapi.com",
        );

        let app = client.get_owner_app().await.expect("owner app");
        assert!(app.is_empty());
    }

    #[tokio::test]
    async fn missing_bootstrap_artifact_is_a_configuration_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = root
            .path()
            .join(INSTANCES_SEGMENT)
            .join("foo.saasapi.com")
            .join(APP_SEGMENT);
        fs::create_dir_all(&instance_dir).expect("instance dir");
        // No app-saasapi/bootstrap/app.php anywhere.
        let client = client_with(
            Arc::new(FixtureGateway::empty()),
            instance_dir,
            "foo.saasapi.com",
        );

        let err = client.get_user("1").await.expect_err("must fail");
        assert_eq!(err, SdkError::Configuration("invalid instance path".to_owned()));
    }

    #[tokio::test]
    async fn instance_dir_outside_template_is_a_configuration_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let client = client_with(
            Arc::new(FixtureGateway::empty()),
            root.path().join("somewhere-else"),
            "foo.saasapi.com",
        );

        let err = client.get_owner_app().await.expect_err("must fail");
        assert_eq!(err, SdkError::Configuration("invalid instance path".to_owned()));
    }

    #[tokio::test]
    async fn memberships_exclude_deleted_and_optionally_inactive() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let gateway = Arc::new(FixtureGateway::with_rows(vec![
            row(&[("id", json!(2)), ("name", json!("acme"))]),
            row(&[("id", json!(5)), ("name", json!("globex"))]),
        ]));
        let client = client_with(Arc::clone(&gateway), instance_dir, "foo.saasapi.com");

        let companies = client
            .get_companies_by_user("1", true)
            .await
            .expect("companies");
        let ids: Vec<i64> = companies.iter().filter_map(|c| c.get_i64("id")).collect();
        assert_eq!(ids, [2, 5]);

        let queries = gateway.recorded();
        let query = &queries[0];
        assert_eq!(query.table, BRANDS_TABLE);
        let join = query.join.as_ref().expect("join");
        assert_eq!(join.table, MEMBERSHIPS_TABLE);
        assert_eq!(
            query.filters,
            vec![
                crate::ports::Filter::Eq("brands_users.user_id".to_owned(), json!("1")),
                crate::ports::Filter::IsNull("brands_users.deleted_at".to_owned()),
                crate::ports::Filter::Eq("brands_users.active".to_owned(), json!(true)),
            ]
        );
    }

    #[tokio::test]
    async fn current_subscription_prefers_active_status() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let gateway = Arc::new(FixtureGateway::with_rows(vec![
            row(&[("id", json!(11)), ("status", json!("expired"))]),
            row(&[("id", json!(12)), ("status", json!("active"))]),
            row(&[("id", json!(13)), ("status", json!("suspended"))]),
            row(&[("id", json!(14)), ("status", json!("draft"))]),
        ]));
        let client = client_with(gateway, instance_dir, "foo.saasapi.com");

        let subscription = client
            .get_current_subscription("2")
            .await
            .expect("subscription");
        assert_eq!(subscription.get_i64("id"), Some(12));
    }

    #[tokio::test]
    async fn current_subscription_with_only_untracked_statuses_is_empty() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let gateway = Arc::new(FixtureGateway::with_rows(vec![row(&[
            ("id", json!(14)),
            ("status", json!("draft")),
        ])]));
        let client = client_with(gateway, instance_dir, "foo.saasapi.com");

        let subscription = client
            .get_current_subscription("2")
            .await
            .expect("subscription");
        assert!(subscription.is_empty());
    }

    #[tokio::test]
    async fn central_capabilities_are_explicitly_unsupported() {
        let root = tempfile::tempdir().expect("tempdir");
        let instance_dir = configured_instance(root.path(), "foo.saasapi.com");
        let client = client_with(
            Arc::new(FixtureGateway::empty()),
            instance_dir,
            "foo.saasapi.com",
        );

        assert_eq!(
            client.get_plans().await.expect_err("unsupported"),
            SdkError::unsupported("local", "get_plans")
        );
        assert_eq!(
            client.clear_session("3").await.expect_err("unsupported"),
            SdkError::unsupported("local", "clear_session")
        );
        assert_eq!(
            client
                .check_acl("publish", "1", "2", "9")
                .await
                .expect_err("unsupported"),
            SdkError::unsupported("local", "check_acl")
        );
    }
}
