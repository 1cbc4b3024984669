//! Request extractors shared by the handlers.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use gfd_auth::Principal;
use gfd_db::repos::game_session::SessionClient;
use gfd_db::service::ActionContext;

use crate::error::ApiError;

/// JSON body whose rejections render as `400 {"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as `400 {"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Caller address and user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First usable proxy-reported address, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = header_str(headers, "x-forwarded-for").and_then(|value| {
        value
            .split(',')
            .map(str::trim)
            .find(|ip| !ip.is_empty() && !ip.eq_ignore_ascii_case("unknown"))
    });
    let real_ip = header_str(headers, "x-real-ip").filter(|ip| !ip.eq_ignore_ascii_case("unknown"));

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

impl ClientInfo {
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self {
            ip_address: client_ip(&parts.headers, peer),
            user_agent: header_str(&parts.headers, USER_AGENT.as_str()).map(str::to_string),
        }
    }

    /// Audit context for an action taken by `username` from this client.
    #[must_use]
    pub fn acting_as(&self, username: &str) -> ActionContext {
        ActionContext::user(username).with_client(self.ip_address.clone(), self.user_agent.clone())
    }

    /// Audit context for an anonymous action from this client.
    #[must_use]
    pub fn anonymous(&self) -> ActionContext {
        ActionContext::system().with_client(self.ip_address.clone(), self.user_agent.clone())
    }

    #[must_use]
    pub fn into_session_client(self, screen_resolution: Option<String>) -> SessionClient {
        SessionClient {
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            screen_resolution,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// The signed-in admin, placed in request extensions by
/// [`crate::auth::require_admin`], plus an audit context for their actions.
#[derive(Debug, Clone)]
pub struct Admin {
    pub principal: Principal,
    pub ctx: ActionContext,
}

impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::Unauthorized)?;
        let ctx = ClientInfo::from_parts(parts).acting_as(&principal.username);
        Ok(Self { principal, ctx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parts(headers: &[(&'static str, &'static str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, HeaderValue::from_static(value));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[rstest]
    #[case(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")], Some("203.0.113.9"))]
    #[case(&[("x-forwarded-for", "unknown, 198.51.100.4")], Some("198.51.100.4"))]
    #[case(&[("x-forwarded-for", "unknown"), ("x-real-ip", "192.0.2.1")], Some("192.0.2.1"))]
    #[case(&[("x-real-ip", "192.0.2.7")], Some("192.0.2.7"))]
    #[case(&[], None)]
    fn resolves_client_ip(
        #[case] headers: &[(&'static str, &'static str)],
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(ClientInfo::from_parts(&parts(headers)).ip_address.as_deref(), expected);
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut parts = parts(&[]);
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(
            ClientInfo::from_parts(&parts).ip_address.as_deref(),
            Some("127.0.0.1")
        );
    }

    #[test]
    fn reads_user_agent() {
        let client = ClientInfo::from_parts(&parts(&[("user-agent", "Mozilla/5.0 (iPhone)")]));
        assert_eq!(client.user_agent.as_deref(), Some("Mozilla/5.0 (iPhone)"));
        let ctx = client.acting_as("admin");
        assert_eq!(ctx.username.as_deref(), Some("admin"));
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0 (iPhone)"));
    }
}
