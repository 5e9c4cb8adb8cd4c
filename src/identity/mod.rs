//! Central identity and session management for quillboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod provider;
mod request_context;
mod authorizer;

pub use principal::Principal;
pub use token::{Claims, SessionManager, SessionToken, DEFAULT_TTL_SECS};
pub use provider::{signup, login, current_user, AuthResponse, LoginRequest, SignupRequest};
pub use request_context::RequestContext;
pub use authorizer::{require_identity, require_ownership};
