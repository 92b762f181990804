//! Per-request session state and the SSO handshake wire types.
//!
//! The host owns the storage medium: it loads a [`SessionState`] from its
//! session store when a request arrives, hands it to the `Api` facade, and
//! persists it again when the request ends. The serde field names are the
//! fixed keys the platform convention uses for the session bag, so a bag
//! written by another SDK reads back unchanged.

use serde::{Deserialize, Serialize};

/// Authentication state of one user session.
///
/// `login` can only become `true` through the facade's handshake; there is
/// no public setter. Absent keys read as their defaults (`false` / `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    #[serde(rename = "saas_api_login")]
    login: bool,
    #[serde(rename = "saas_api_session", skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(rename = "saas_api_user", skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(rename = "saas_api_company", skip_serializing_if = "Option::is_none")]
    company_id: Option<String>,
}

impl SessionState {
    /// A fresh, anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session completed the handshake.
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.login
    }

    /// The platform session id, when authenticated.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The active user id, when authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The active company id, when authenticated.
    #[must_use]
    pub fn company_id(&self) -> Option<&str> {
        self.company_id.as_deref()
    }

    /// Record a successful handshake.
    pub(crate) fn authenticate(
        &mut self,
        session_id: Option<String>,
        user_id: Option<String>,
        company_id: Option<String>,
    ) {
        self.login = true;
        self.session_id = session_id;
        self.user_id = user_id;
        self.company_id = company_id;
    }

    /// Record a company switch.
    pub(crate) fn set_company_id(&mut self, company_id: impl Into<String>) {
        self.company_id = Some(company_id.into());
    }

    /// Reset all keys, returning the session id held before the reset.
    pub(crate) fn clear(&mut self) -> Option<String> {
        let captured = self.session_id.take();
        self.login = false;
        self.user_id = None;
        self.company_id = None;
        captured
    }
}

/// Query parameters of the signed redirect that completes the handshake.
///
/// Unknown parameters in the inbound query string are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HandshakeQuery {
    /// Signature hash asserted by the platform.
    #[serde(rename = "saas_hash")]
    pub hash: Option<String>,
    /// Platform session id to adopt.
    pub session_id: Option<String>,
    /// Authenticated user id.
    pub user_id: Option<String>,
    /// Active company id.
    pub company_id: Option<String>,
}

impl HandshakeQuery {
    /// Parse from a raw query string (`saas_hash=…&user_id=…`).
    ///
    /// An unparsable query reads as an empty one - the handshake then
    /// rejects it, which is indistinguishable from no attempt at all.
    #[must_use]
    pub fn from_query(raw: &str) -> Self {
        serde_urlencoded::from_str(raw).unwrap_or_default()
    }
}

/// Outcome of a handshake attempt.
///
/// Replaces the legacy on-success callback: the caller decides what a
/// completed login triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeOutcome {
    /// Whether the redirect carried a valid signature.
    pub accepted: bool,
    /// Session id adopted on acceptance.
    pub session_id: Option<String>,
    /// User id adopted on acceptance.
    pub user_id: Option<String>,
    /// Company id adopted on acceptance.
    pub company_id: Option<String>,
}

impl HandshakeOutcome {
    pub(crate) fn rejected() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_all_keys_and_captures_session_id() {
        let mut state = SessionState::new();
        state.authenticate(
            Some("3".to_owned()),
            Some("1".to_owned()),
            Some("2".to_owned()),
        );
        assert!(state.is_login());

        let captured = state.clear();
        assert_eq!(captured.as_deref(), Some("3"));
        assert!(!state.is_login());
        assert!(state.session_id().is_none());
        assert!(state.user_id().is_none());
        assert!(state.company_id().is_none());
    }

    #[test]
    fn serializes_under_platform_bag_keys() {
        let mut state = SessionState::new();
        state.authenticate(
            Some("3".to_owned()),
            Some("1".to_owned()),
            Some("2".to_owned()),
        );
        let bag = serde_json::to_value(&state).expect("serializable");
        assert_eq!(
            bag,
            serde_json::json!({
                "saas_api_login": true,
                "saas_api_session": "3",
                "saas_api_user": "1",
                "saas_api_company": "2",
            })
        );
    }

    #[test]
    fn absent_bag_keys_read_as_defaults() {
        let state: SessionState = serde_json::from_str("{}").expect("deserializable");
        assert!(!state.is_login());
        assert!(state.user_id().is_none());
    }

    #[test]
    fn handshake_query_tolerates_unknown_parameters() {
        let query = HandshakeQuery::from_query("saas_hash=abc&user_id=1&utm_source=mail");
        assert_eq!(query.hash.as_deref(), Some("abc"));
        assert_eq!(query.user_id.as_deref(), Some("1"));
        assert!(query.session_id.is_none());
    }

    #[test]
    fn handshake_query_from_garbage_is_empty() {
        let query = HandshakeQuery::from_query("%ZZ=%%%");
        assert_eq!(query, HandshakeQuery::default());
    }
}
