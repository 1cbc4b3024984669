//! Opaque session tokens.

use base64::Engine as _;

use crate::error::AuthError;

const TOKEN_BYTES: usize = 32;

/// Generate a 256-bit random token, base64url-encoded without padding.
///
/// # Errors
///
/// Returns `AuthError::TokenGeneration` if the OS random source fails.
pub fn generate_session_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|e| AuthError::TokenGeneration(format!("failed to read OS randomness: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Cheap shape check run before a token is looked up in the database.
#[must_use]
pub fn looks_like_session_token(token: &str) -> bool {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .is_ok_and(|bytes| bytes.len() == TOKEN_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_well_formed() {
        let a = generate_session_token().unwrap();
        let b = generate_session_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(looks_like_session_token(&a));
    }

    #[test]
    fn rejects_foreign_values() {
        assert!(!looks_like_session_token(""));
        assert!(!looks_like_session_token("abc"));
        assert!(!looks_like_session_token("not base64 at all!"));
    }
}
