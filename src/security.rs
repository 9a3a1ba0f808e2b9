use subtle::ConstantTimeEq;

/// Constant-time comparison for the admin bearer token.
/// Avoids leaking how many leading characters of a guess were correct.
pub fn token_matches(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Extract the bearer token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret123", "secret123"));
        assert!(!token_matches("secret123", "secret124"));
        assert!(!token_matches("secret123", "secret12"));
        assert!(!token_matches("", "secret"));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer abc123"), None);
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token(""), None);
    }
}
