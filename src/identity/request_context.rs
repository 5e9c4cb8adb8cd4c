use super::principal::Principal;
use super::token::SessionManager;

/// The resolved authentication outcome for one inbound request.
/// Built once at request-context construction; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Derive a context from a raw `Authorization` header value.
    ///
    /// Strips an optional `Bearer ` prefix and validates the remainder as a
    /// session token. Missing header, malformed token, bad signature, and
    /// expiry all yield an anonymous context; this path never raises.
    pub fn resolve(
        sm: &SessionManager,
        authorization: Option<&str>,
        request_id: Option<String>,
    ) -> Self {
        let principal = authorization
            .map(str::trim)
            .map(|raw| raw.strip_prefix("Bearer ").unwrap_or(raw))
            .and_then(|token| sm.validate(token))
            .map(|user_id| Principal { user_id });
        Self { principal, request_id }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sm() -> SessionManager {
        SessionManager::new("request-context-test-secret").expect("manager")
    }

    #[test]
    fn missing_empty_and_corrupt_headers_resolve_anonymous() {
        let sm = sm();
        assert!(RequestContext::resolve(&sm, None, None).is_anonymous());
        assert!(RequestContext::resolve(&sm, Some(""), None).is_anonymous());
        assert!(RequestContext::resolve(&sm, Some("Bearer "), None).is_anonymous());
        assert!(RequestContext::resolve(&sm, Some("Bearer garbage"), None).is_anonymous());
        assert!(RequestContext::resolve(&sm, Some("garbage"), None).is_anonymous());
    }

    #[test]
    fn valid_token_resolves_with_and_without_bearer_prefix() {
        let sm = sm();
        let token = sm.issue("user-9").expect("issue");

        let with_prefix = RequestContext::resolve(&sm, Some(&format!("Bearer {token}")), None);
        assert_eq!(with_prefix.principal.as_ref().map(|p| p.user_id.as_str()), Some("user-9"));

        let bare = RequestContext::resolve(&sm, Some(&token), None);
        assert_eq!(bare.principal.as_ref().map(|p| p.user_id.as_str()), Some("user-9"));
    }

    #[test]
    fn request_id_is_carried_through() {
        let sm = sm();
        let ctx = RequestContext::resolve(&sm, None, Some("req-42".to_string()));
        assert_eq!(ctx.request_id.as_deref(), Some("req-42"));
    }
}
