//! Session cookie formatting and parsing.

use chrono::TimeDelta;

/// `Set-Cookie` value that stores `token` for `ttl`.
#[must_use]
pub fn session_cookie(name: &str, token: &str, ttl: TimeDelta, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds().max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", TimeDelta::zero(), secure)
}

/// Find cookie `name` in a `Cookie` request header.
#[must_use]
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("GFD_SESSION", "abc", TimeDelta::hours(8), false);
        assert_eq!(
            cookie,
            "GFD_SESSION=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=28800"
        );
        assert!(session_cookie("S", "abc", TimeDelta::hours(1), true).ends_with("; Secure"));
    }

    #[test]
    fn clearing_expires_immediately() {
        assert!(clear_session_cookie("GFD_SESSION", false).contains("Max-Age=0"));
    }

    #[rstest]
    #[case("GFD_SESSION=abc", Some("abc"))]
    #[case("theme=dark; GFD_SESSION=xyz; lang=en", Some("xyz"))]
    #[case("theme=dark", None)]
    #[case("GFD_SESSION=", None)]
    #[case("GFD_SESSIONX=abc", None)]
    fn finds_cookie(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(find_cookie(header, "GFD_SESSION"), expected);
    }
}
