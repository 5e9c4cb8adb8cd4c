//! The authorization gate: identity and ownership checks consulted before
//! operations that require a caller or mutate an owned resource.

use crate::error::AppError;

use super::request_context::RequestContext;

/// Return the caller's user id, or Unauthenticated for an anonymous context.
pub fn require_identity(ctx: &RequestContext) -> Result<&str, AppError> {
    ctx.principal
        .as_ref()
        .map(|p| p.user_id.as_str())
        .ok_or_else(|| AppError::auth("unauthenticated", "not authenticated"))
}

/// Enforce that the caller owns the resource. Anonymous contexts fail as
/// Unauthenticated; a mismatched identity fails as Forbidden. Must run before
/// every mutating or deleting operation on an owned resource.
pub fn require_ownership(ctx: &RequestContext, owner_id: &str) -> Result<(), AppError> {
    let user_id = require_identity(ctx)?;
    if user_id != owner_id {
        return Err(AppError::forbidden("forbidden", "not authorized to modify this resource"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext {
            principal: Some(Principal { user_id: user_id.to_string() }),
            request_id: None,
        }
    }

    #[test]
    fn anonymous_context_is_unauthenticated() {
        let ctx = RequestContext::anonymous();
        assert!(matches!(require_identity(&ctx), Err(AppError::Auth { .. })));
        assert!(matches!(require_ownership(&ctx, "u1"), Err(AppError::Auth { .. })));
    }

    #[test]
    fn ownership_mismatch_is_forbidden() {
        let ctx = ctx_for("u1");
        assert!(matches!(require_ownership(&ctx, "u2"), Err(AppError::Forbidden { .. })));
    }

    #[test]
    fn matching_owner_passes() {
        let ctx = ctx_for("u1");
        assert_eq!(require_identity(&ctx).expect("identity"), "u1");
        assert!(require_ownership(&ctx, "u1").is_ok());
    }
}
