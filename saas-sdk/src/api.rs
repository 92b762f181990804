//! Capability trait implemented by every platform backend.
//!
//! Exactly one implementation is bound per `Api` facade for its whole
//! lifetime - backends are never re-selected per call. The first-party
//! implementations live in `saas-client` (`LocalClient`, `RemoteClient`);
//! hosts and tests may bring their own.

use async_trait::async_trait;

use crate::error::SdkError;
use crate::models::{ResourceCollection, ResourceObject};

/// Client capability set of the SaaS platform.
///
/// Read operations return an *empty* [`ResourceObject`] /
/// [`ResourceCollection`] when the platform has nothing for the query; an
/// `Err` means the backend itself could not serve the call (misconfigured
/// deployment, unsupported capability, failed gateway). The first-party
/// HTTP backend additionally degrades its own upstream failures to empty
/// resources, so display code sees one shape for "not found" and "backend
/// down".
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// The partner app that owns this credential.
    ///
    /// An unknown key/secret pair yields an empty record, not an error.
    async fn get_owner_app(&self) -> Result<ResourceObject, SdkError>;

    /// Branding identity of the owner app.
    async fn get_owner_app_identity(&self) -> Result<ResourceObject, SdkError>;

    /// User by id.
    async fn get_user(&self, id: &str) -> Result<ResourceObject, SdkError>;

    /// Company (tenant) by id.
    async fn get_company(&self, id: &str) -> Result<ResourceObject, SdkError>;

    /// Make `company_id` the user's active company.
    async fn switch_company(
        &self,
        user_id: &str,
        company_id: &str,
    ) -> Result<ResourceObject, SdkError>;

    /// Companies the user is a member of.
    ///
    /// Deleted memberships are always excluded; `only_active` additionally
    /// restricts to memberships whose active flag is set.
    async fn get_companies_by_user(
        &self,
        user_id: &str,
        only_active: bool,
    ) -> Result<ResourceCollection, SdkError>;

    /// The company's most relevant subscription.
    ///
    /// Among the tracked statuses (`active`, `suspended`, `pending`,
    /// `expired`), an `active` subscription always wins.
    async fn get_current_subscription(
        &self,
        company_id: &str,
    ) -> Result<ResourceObject, SdkError>;

    /// Invalidate a centrally tracked session.
    ///
    /// Best-effort: the caller cannot retry meaningfully, so the HTTP
    /// backend never surfaces a failure here.
    async fn clear_session(&self, session_id: &str) -> Result<(), SdkError>;

    /// Plans available for purchase.
    async fn get_plans(&self) -> Result<ResourceCollection, SdkError>;

    /// All access rules.
    async fn get_rules(&self) -> Result<ResourceCollection, SdkError>;

    /// A single access rule by slug.
    async fn get_rule(&self, slug: &str) -> Result<ResourceObject, SdkError>;

    /// Assert an access rule for the given identifiers.
    ///
    /// Authorization decisions fail closed: any doubt is `false`.
    async fn check_acl(
        &self,
        rule: &str,
        user_id: &str,
        company_id: &str,
        subscription_id: &str,
    ) -> Result<bool, SdkError>;
}
