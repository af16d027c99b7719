//! Error types for the Feishu/Lark client and the local library.

use thiserror::Error;

/// API codes the platform uses for missing permissions.
const PERMISSION_CODES: &[i64] = &[131006, 1770032, 91403, 99991672, 99991679];

/// Message fragments that indicate an access denial.
const PERMISSION_KEYWORDS: &[&str] = &["permission", "forbidden", "no access", "denied"];

/// API codes for an invalid or expired access token.
const INVALID_TOKEN_CODES: &[i64] = &[99991661, 99991663, 99991668];

pub type Result<T, E = LarkError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LarkError {
    /// The credential exchange failed. Not retried.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-zero code.
    #[error("Lark API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("No permission to access '{token}': {msg}. Add the app as a collaborator of the space or document")]
    PermissionDenied { token: String, msg: String },

    #[error("Unsupported object type: {0}")]
    NotSupported(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LarkError {
    /// Whether this is an API error caused by a missing permission
    pub fn is_permission_denied(&self) -> bool {
        match self {
            LarkError::PermissionDenied { .. } => true,
            LarkError::Api { code, msg } => {
                if PERMISSION_CODES.contains(code) {
                    return true;
                }
                let msg = msg.to_lowercase();
                PERMISSION_KEYWORDS.iter().any(|k| msg.contains(k))
            }
            _ => false,
        }
    }

    /// Whether the API rejected the access token itself
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, LarkError::Api { code, .. } if INVALID_TOKEN_CODES.contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_by_code() {
        let err = LarkError::Api {
            code: 131006,
            msg: "something".to_string(),
        };
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_permission_by_message() {
        let err = LarkError::Api {
            code: 1,
            msg: "Permission Denied for node".to_string(),
        };
        assert!(err.is_permission_denied());

        let err = LarkError::Api {
            code: 1,
            msg: "internal error".to_string(),
        };
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_other_errors_are_not_permission() {
        assert!(!LarkError::Auth("bad secret".to_string()).is_permission_denied());
        assert!(!LarkError::NotSupported("bitable".to_string()).is_permission_denied());
    }

    #[test]
    fn test_invalid_token_code() {
        let err = LarkError::Api {
            code: 99991663,
            msg: "token expired".to_string(),
        };
        assert!(err.is_invalid_token());
        assert!(!err.is_permission_denied());
    }
}
