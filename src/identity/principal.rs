use serde::{Deserialize, Serialize};

/// The authenticated identity attached to a request after token validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}
