//! 요청에서 세션 토큰을 찾는 위치 추상화.
//!
//! 우선순위는 고정입니다:
//!
//! 1. `Authorization: Bearer <token>` 헤더
//! 2. `token` 쿠키
//! 3. `token` 쿼리 파라미터 (레거시 호환)
//!
//! 하위 코드(세션 캐시, 접근 정책, 미들웨어)는 모두 이 순서에 의존합니다.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request, Uri},
};
use axum_extra::extract::cookie::CookieJar;

/// 토큰 쿠키 이름.
pub const TOKEN_COOKIE: &str = "token";
/// 토큰 쿼리 파라미터 이름.
pub const TOKEN_QUERY_PARAM: &str = "token";

const BEARER_PREFIX: &str = "Bearer ";

/// 토큰이 발견된 위치.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Bearer,
    Cookie,
    Query,
}

/// 토큰 추출 실패.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CarrierError {
    #[error("요청에 토큰이 없습니다")]
    Missing,
    #[error("Authorization 헤더 형식이 잘못되었습니다")]
    Malformed,
}

/// 요청 헤더와 URI를 빌려 토큰을 찾습니다.
#[derive(Debug, Clone, Copy)]
pub struct Carrier<'a> {
    headers: &'a HeaderMap,
    uri: &'a Uri,
}

impl<'a> Carrier<'a> {
    pub fn new(headers: &'a HeaderMap, uri: &'a Uri) -> Self {
        Self { headers, uri }
    }

    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::new(&parts.headers, &parts.uri)
    }

    pub fn from_request<B>(request: &'a Request<B>) -> Self {
        Self::new(request.headers(), request.uri())
    }

    /// Bearer 헤더의 토큰.
    ///
    /// 다른 스킴(`Basic` 등)의 Authorization 헤더는 없는 것으로 취급합니다.
    /// `Bearer` 뒤가 비어 있거나 헤더가 ASCII가 아니면 [`CarrierError::Malformed`].
    pub fn bearer(&self) -> Result<Option<String>, CarrierError> {
        let Some(value) = self.headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value.to_str().map_err(|_| CarrierError::Malformed)?;

        match value.strip_prefix(BEARER_PREFIX) {
            Some(token) => {
                let token = token.trim();
                if token.is_empty() || token.contains(' ') {
                    Err(CarrierError::Malformed)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            None => Ok(None),
        }
    }

    /// `token` 쿠키 값.
    pub fn cookie(&self) -> Option<String> {
        CookieJar::from_headers(self.headers)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// `token` 쿼리 파라미터 값.
    pub fn query(&self) -> Option<String> {
        Query::<HashMap<String, String>>::try_from_uri(self.uri)
            .ok()
            .and_then(|Query(mut params)| params.remove(TOKEN_QUERY_PARAM))
            .filter(|v| !v.is_empty())
    }

    /// 우선순위에 따라 토큰과 출처를 찾습니다.
    pub fn source(&self) -> Result<(TokenSource, String), CarrierError> {
        if let Some(token) = self.bearer()? {
            return Ok((TokenSource::Bearer, token));
        }
        if let Some(token) = self.cookie() {
            return Ok((TokenSource::Cookie, token));
        }
        if let Some(token) = self.query() {
            return Ok((TokenSource::Query, token));
        }
        Err(CarrierError::Missing)
    }

    pub fn token(&self) -> Result<String, CarrierError> {
        self.source().map(|(_, token)| token)
    }
}

/// 붙여넣기 과정에서 생긴 공백과 감싸는 따옴표를 제거합니다.
pub fn unquote(token: &str) -> &str {
    let token = token.trim();
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return token[1..token.len() - 1].trim();
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn request(auth: Option<&str>, cookie: Option<&str>, uri: &str) -> Request<()> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_header_wins_over_cookie_and_query() {
        let req = request(
            Some("Bearer header-token"),
            Some("token=cookie-token"),
            "/x?token=query-token",
        );
        let carrier = Carrier::from_request(&req);

        assert_eq!(
            carrier.source().unwrap(),
            (TokenSource::Bearer, "header-token".to_string())
        );
    }

    #[test]
    fn test_cookie_wins_over_query() {
        let req = request(None, Some("lang=en; token=cookie-token"), "/x?token=query-token");
        assert_eq!(
            Carrier::from_request(&req).source().unwrap(),
            (TokenSource::Cookie, "cookie-token".to_string())
        );
    }

    #[test]
    fn test_query_fallback() {
        let req = request(None, None, "/x?page=2&token=query-token");
        assert_eq!(
            Carrier::from_request(&req).source().unwrap(),
            (TokenSource::Query, "query-token".to_string())
        );
    }

    #[test]
    fn test_missing_token() {
        let req = request(None, Some("lang=en"), "/x?token=");
        assert_eq!(Carrier::from_request(&req).token(), Err(CarrierError::Missing));
    }

    #[test]
    fn test_other_scheme_falls_through() {
        let req = request(Some("Basic dXNlcjpwYXNz"), Some("token=cookie-token"), "/x");
        assert_eq!(
            Carrier::from_request(&req).token().unwrap(),
            "cookie-token"
        );
    }

    #[test]
    fn test_malformed_bearer() {
        for auth in ["Bearer ", "Bearer a b"] {
            let req = request(Some(auth), Some("token=cookie-token"), "/x");
            assert_eq!(
                Carrier::from_request(&req).token(),
                Err(CarrierError::Malformed),
                "{:?}",
                auth
            );
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("'abc'"), "abc");
        assert_eq!(unquote("  abc  "), "abc");
        assert_eq!(unquote("\"abc"), "\"abc");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote(""), "");
    }
}
