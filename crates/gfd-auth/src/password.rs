//! bcrypt password hashing.
//!
//! bcrypt is deliberately slow, so both operations run on the blocking pool.

use crate::error::AuthError;

/// Hash `password` with the given bcrypt work factor.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if bcrypt rejects the cost or the blocking task panics.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(format!("spawn_blocking join: {e}")))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check `password` against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns `AuthError::Hashing` only if the blocking task panics.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(format!("spawn_blocking join: {e}")))?;
    match outcome {
        Ok(matches) => Ok(matches),
        Err(error) => {
            tracing::warn!(%error, "stored password hash is not valid bcrypt");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the tests fast.
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("admin123", TEST_COST).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("admin123", &hash).await.unwrap());
        assert!(!verify_password("admin124", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let a = hash_password("same", TEST_COST).await.unwrap();
        let b = hash_password("same", TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("admin123", "not-a-hash").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_cost_is_an_error() {
        let err = hash_password("admin123", 2).await.unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }
}
