//! 세션 저장소와 요청 토큰 추출.
//!
//! - [`SessionCache`]: 토큰 ↔ 세션 레코드 캐시
//! - [`Carrier`]: 헤더/쿠키/쿼리에서 토큰 찾기

mod cache;
mod carrier;

pub use cache::SessionCache;
pub use carrier::{unquote, Carrier, CarrierError, TokenSource, TOKEN_COOKIE, TOKEN_QUERY_PARAM};
