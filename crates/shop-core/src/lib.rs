//! # Shop Core
//!
//! 스토어프런트 인증 코어의 I/O 없는 기반 모듈을 제공합니다:
//! - 설정 관리
//! - 로깅 인프라
//! - 키 해시 (HMAC-SHA256)
//! - 할인 쿠폰 코덱
//! - HTML/파일 이름 정리
//! - 리다이렉트 허용 목록

pub mod config;
pub mod coupon;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod redirect;
pub mod sanitize;

pub use self::config::*;
pub use coupon::{Coupon, CouponError};
pub use crypto::{CryptoError, KeyedDigest};
pub use error::*;
pub use logging::*;
pub use redirect::RedirectAllowlist;
