//! The partner-facing `Api` facade.
//!
//! One facade is built per inbound request and composes the partner
//! [`Credential`], exactly one [`PlatformClient`] backend, the request's
//! [`SessionState`], and the [`PlatformConfig`]. The backend is bound at
//! construction and never re-selected.

use std::path::PathBuf;
use std::sync::Arc;

use url::form_urlencoded;

use saas_sdk::{Credential, PlatformClient, ResourceCollection, ResourceObject, SdkError};

use crate::config::PlatformConfig;
use crate::local_client::LocalClient;
use crate::ports::DirectoryGateway;
use crate::remote_client::RemoteClient;
use crate::session::{HandshakeOutcome, HandshakeQuery, SessionState};

// Fixed partner-facing paths under `scheme + slug + separator + root`.
const LOGIN_PATH: &str = "/auth/login";
const PROFILE_PATH: &str = "/user/profile/edit";
const WALLET_PATH: &str = "/user/wallet";
const SUBSCRIPTION_PATH: &str = "/brand/subscription";
const PURCHASE_PATH: &str = "/start";

// SSO entry point, rooted at the platform domain directly.
const EXCHANGE_PATH: &str = "/exchange";

/// Partner-facing surface of the SDK.
pub struct Api {
    credential: Credential,
    config: PlatformConfig,
    client: Arc<dyn PlatformClient>,
    session: SessionState,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `PlatformClient` is a bare trait object without a `Debug`
        // supertrait, so the bound backend is shown as an opaque marker.
        f.debug_struct("Api")
            .field("credential", &self.credential)
            .field("config", &self.config)
            .field("client", &"<dyn PlatformClient>")
            .field("session", &self.session)
            .finish()
    }
}

/// Builder for [`Api`].
///
/// The inbound request's host is an explicit input: it selects the backend
/// (local for platform-hosted instances, remote otherwise) and becomes the
/// origin-domain header of the remote path. An explicitly supplied client
/// always wins over selection.
pub struct ApiBuilder {
    credential: Credential,
    config: PlatformConfig,
    session: SessionState,
    request_host: Option<String>,
    client: Option<Arc<dyn PlatformClient>>,
    directory: Option<(Arc<dyn DirectoryGateway>, PathBuf)>,
}

impl ApiBuilder {
    /// Override the connection configuration.
    #[must_use]
    pub fn config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    /// Adopt the session state the host loaded for this request.
    #[must_use]
    pub fn session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    /// The host name the inbound request was addressed to.
    #[must_use]
    pub fn request_host(mut self, host: impl Into<String>) -> Self {
        self.request_host = Some(host.into());
        self
    }

    /// Bind this backend instead of selecting one from the request host.
    #[must_use]
    pub fn client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Provide the directory gateway (and the per-instance application
    /// directory) that the local backend needs when the request host turns
    /// out to be platform-hosted.
    #[must_use]
    pub fn directory_gateway(
        mut self,
        gateway: Arc<dyn DirectoryGateway>,
        instance_dir: impl Into<PathBuf>,
    ) -> Self {
        self.directory = Some((gateway, instance_dir.into()));
        self
    }

    /// Bind a backend and produce the facade.
    pub fn build(self) -> Result<Api, SdkError> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let host = self.request_host.ok_or_else(|| {
                    SdkError::configuration("request host is required to select a backend")
                })?;
                if self.config.is_platform_host(&host) {
                    let (gateway, instance_dir) = self.directory.ok_or_else(|| {
                        SdkError::configuration("local backend requires a directory gateway")
                    })?;
                    Arc::new(LocalClient::new(
                        self.credential.clone(),
                        host,
                        instance_dir,
                        gateway,
                    )) as Arc<dyn PlatformClient>
                } else {
                    Arc::new(RemoteClient::new(&self.credential, &host, &self.config)?)
                        as Arc<dyn PlatformClient>
                }
            }
        };
        Ok(Api {
            credential: self.credential,
            config: self.config,
            client,
            session: self.session,
        })
    }
}

impl Api {
    /// Start building a facade for the given partner credential.
    pub fn builder(key: impl Into<String>, secret: impl Into<String>) -> ApiBuilder {
        ApiBuilder {
            credential: Credential::new(key, secret),
            config: PlatformConfig::default(),
            session: SessionState::new(),
            request_host: None,
            client: None,
            directory: None,
        }
    }

    /// Compose a facade from already-constructed parts.
    #[must_use]
    pub fn new(
        credential: Credential,
        client: Arc<dyn PlatformClient>,
        session: SessionState,
        config: PlatformConfig,
    ) -> Self {
        Self {
            credential,
            config,
            client,
            session,
        }
    }

    /// The session state, for the host to persist when the request ends.
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // === URL builders ===

    /// URL of the owner app on its own domain.
    pub async fn original_app_url(&self) -> Result<String, SdkError> {
        let app = self.owner_app().await?;
        Ok(format!(
            "{}{}",
            self.config.scheme,
            app.get_str("url").unwrap_or_default()
        ))
    }

    /// Login URL on the owner app's platform domain.
    pub async fn login_url(&self) -> Result<String, SdkError> {
        self.app_url(LOGIN_PATH).await
    }

    /// Profile-edit URL for the active user.
    pub async fn profile_url(&self) -> Result<String, SdkError> {
        self.app_url(PROFILE_PATH).await
    }

    /// Wallet URL for the active user.
    pub async fn wallet_url(&self) -> Result<String, SdkError> {
        self.app_url(WALLET_PATH).await
    }

    /// Subscription-management URL for the active company.
    pub async fn subscription_url(&self) -> Result<String, SdkError> {
        self.app_url(SUBSCRIPTION_PATH).await
    }

    /// Purchase URL for the given plan.
    pub async fn purchase_url(&self, plan: &str) -> Result<String, SdkError> {
        self.app_url(&format!("{PURCHASE_PATH}/{plan}")).await
    }

    /// Entry point of the SSO handshake.
    ///
    /// Key and secret are always present; `user_id` and `company_id` ride
    /// along only when both are non-empty, `session_id` only when non-empty.
    /// Parameter order is stable.
    #[must_use]
    pub fn exchange_url(
        &self,
        user_id: Option<&str>,
        company_id: Option<&str>,
        session_id: Option<&str>,
    ) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("key", self.credential.key());
        query.append_pair("secret", self.credential.secret());
        let user_id = user_id.filter(|value| !value.is_empty());
        let company_id = company_id.filter(|value| !value.is_empty());
        if let (Some(user_id), Some(company_id)) = (user_id, company_id) {
            query.append_pair("user_id", user_id);
            query.append_pair("company_id", company_id);
        }
        if let Some(session_id) = session_id.filter(|value| !value.is_empty()) {
            query.append_pair("session_id", session_id);
        }
        format!(
            "{}{}{}?{}",
            self.config.scheme,
            self.config.root,
            EXCHANGE_PATH,
            query.finish()
        )
    }

    // === SSO handshake ===

    /// Complete the handshake from the signed redirect's query parameters.
    ///
    /// The session becomes authenticated iff the inbound hash equals the
    /// hex MD5 of the partner key; the platform identifiers from the same
    /// query are adopted at that moment. Anything else leaves the session
    /// untouched - a failed handshake is indistinguishable from no attempt.
    /// Re-running with the same valid redirect is idempotent.
    pub fn check_session(&mut self, query: &HandshakeQuery) -> HandshakeOutcome {
        let Some(hash) = query.hash.as_deref() else {
            return HandshakeOutcome::rejected();
        };
        if hash != self.credential.key_digest() {
            tracing::debug!("handshake hash mismatch, session unchanged");
            return HandshakeOutcome::rejected();
        }
        self.session.authenticate(
            query.session_id.clone(),
            query.user_id.clone(),
            query.company_id.clone(),
        );
        HandshakeOutcome {
            accepted: true,
            session_id: query.session_id.clone(),
            user_id: query.user_id.clone(),
            company_id: query.company_id.clone(),
        }
    }

    /// Whether the session completed the handshake.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.session.is_login()
    }

    /// Drop the local session and best-effort invalidate the platform one.
    ///
    /// The local clear always happens, and the backend invalidation is
    /// attempted with the session id captured before the clear - even when
    /// that call cannot succeed (the local backend has no tracked sessions).
    pub async fn logout(&mut self) -> Result<(), SdkError> {
        let captured = self.session.clear();
        self.client
            .clear_session(captured.as_deref().unwrap_or_default())
            .await
    }

    // === Session-derived accessors ===

    /// The authenticated user's record.
    pub async fn active_user(&self) -> Result<ResourceObject, SdkError> {
        match self.session.user_id() {
            Some(id) => self.client.get_user(id).await,
            None => Ok(ResourceObject::new()),
        }
    }

    /// The company the user currently acts in: the first of their active
    /// memberships.
    pub async fn active_company(&self) -> Result<ResourceObject, SdkError> {
        let Some(user_id) = self.session.user_id() else {
            return Ok(ResourceObject::new());
        };
        let companies = self.client.get_companies_by_user(user_id, true).await?;
        Ok(companies.first().cloned().unwrap_or_default())
    }

    /// All companies the authenticated user is a member of.
    pub async fn active_user_companies(&self) -> Result<ResourceCollection, SdkError> {
        match self.session.user_id() {
            Some(id) => self.client.get_companies_by_user(id, false).await,
            None => Ok(ResourceCollection::new()),
        }
    }

    /// The active company's current subscription.
    pub async fn active_subscription(&self) -> Result<ResourceObject, SdkError> {
        match self.session.company_id() {
            Some(id) => self.client.get_current_subscription(id).await,
            None => Ok(ResourceObject::new()),
        }
    }

    /// Make `company_id` the authenticated user's active company.
    ///
    /// Without an authenticated user this is a no-op returning an empty
    /// record; with one, the switch is asked of the backend and the new
    /// company id is recorded in the session.
    pub async fn set_active_company(&mut self, company_id: &str) -> Result<ResourceObject, SdkError> {
        let Some(user_id) = self.session.user_id().map(ToOwned::to_owned) else {
            return Ok(ResourceObject::new());
        };
        let company = self.client.switch_company(&user_id, company_id).await?;
        self.session.set_company_id(company_id);
        Ok(company)
    }

    // === Resource accessors ===

    /// Branding identity of the owner app.
    pub async fn owner_app_identity(&self) -> Result<ResourceObject, SdkError> {
        self.client.get_owner_app_identity().await
    }

    /// User by id, independent of session state.
    pub async fn get_user(&self, id: &str) -> Result<ResourceObject, SdkError> {
        self.client.get_user(id).await
    }

    /// Company by id, independent of session state.
    pub async fn get_company(&self, id: &str) -> Result<ResourceObject, SdkError> {
        self.client.get_company(id).await
    }

    /// Companies a user is a member of, independent of session state.
    pub async fn get_user_companies(
        &self,
        user_id: &str,
        only_active: bool,
    ) -> Result<ResourceCollection, SdkError> {
        self.client.get_companies_by_user(user_id, only_active).await
    }

    /// Plans available for purchase.
    pub async fn plans(&self) -> Result<ResourceCollection, SdkError> {
        self.client.get_plans().await
    }

    /// All access rules.
    pub async fn rules(&self) -> Result<ResourceCollection, SdkError> {
        self.client.get_rules().await
    }

    /// A single access rule by slug.
    pub async fn rule(&self, slug: &str) -> Result<ResourceObject, SdkError> {
        self.client.get_rule(slug).await
    }

    /// Assert an access rule for the authenticated user in their active
    /// company. Anonymous sessions are always denied.
    pub async fn is_allowed(&self, rule: &str) -> Result<bool, SdkError> {
        let (Some(user_id), Some(company_id)) = (self.session.user_id(), self.session.company_id())
        else {
            return Ok(false);
        };
        let subscription = self.client.get_current_subscription(company_id).await?;
        let subscription_id = field_text(&subscription, "id").unwrap_or_default();
        self.client
            .check_acl(rule, user_id, company_id, &subscription_id)
            .await
    }

    // === Internals ===

    /// Owner-app lookup for identity-bound URLs.
    ///
    /// There is no safe slug to substitute, so unlike every other read this
    /// re-raises a backend failure, with the original message attached.
    async fn owner_app(&self) -> Result<ResourceObject, SdkError> {
        self.client
            .get_owner_app()
            .await
            .map_err(|e| SdkError::OwnerAppLookup(e.to_string()))
    }

    async fn app_url(&self, path: &str) -> Result<String, SdkError> {
        let app = self.owner_app().await?;
        Ok(format!(
            "{}{}{}{}{}",
            self.config.scheme,
            app.get_str("slug").unwrap_or_default(),
            self.config.domain_separator,
            self.config.root,
            path
        ))
    }
}

/// A field rendered as text, whether the backend sent a string or a number.
fn field_text(object: &ResourceObject, name: &str) -> Option<String> {
    let value = object.get(name)?;
    value
        .as_str()
        .map(ToOwned::to_owned)
        .or_else(|| value.as_i64().map(|n| n.to_string()))
}
