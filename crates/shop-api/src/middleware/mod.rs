//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 middleware 모듈.

mod session;

pub use session::{append_user_id, deny_all, update_authenticated_users, CurrentUserId};
