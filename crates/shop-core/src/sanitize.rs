//! 신뢰할 수 없는 입력의 정리.
//!
//! - [`sanitize_strict`]: 허용 목록 기반 HTML 정리를 출력이 더 이상 바뀌지 않을 때까지 반복
//! - [`sanitize_legacy`]: 단일 패스 태그 제거 정규식 (의도적으로 약함)
//! - [`sanitize_filename`]: 경로 조작 문자와 파일 시스템 금지 문자 제거
//! - [`cut_off_poison_null_byte`]: `%00` 이후 절단

use once_cell::sync::Lazy;
use regex::Regex;

/// [`sanitize_strict`]의 최대 반복 횟수.
pub const MAX_SANITIZE_PASSES: usize = 16;

/// 파일 이름 최대 길이 (바이트).
pub const MAX_FILENAME_BYTES: usize = 255;

static LEGACY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z0-9_]+[^A-Za-z0-9_]+?[A-Za-z0-9_]").expect("legacy tag regex"));

static ILLEGAL_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/?<>\\:*|"]"#).expect("illegal filename regex"));
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1f\x80-\x9f]").expect("control char regex"));
static RESERVED_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.+$").expect("reserved name regex"));
static WINDOWS_RESERVED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("windows reserved regex")
});
static WINDOWS_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[. ]+$").expect("windows trailing regex"));

/// 허용 목록 기반 HTML 정리 1회.
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// 출력이 안정될 때까지 [`sanitize_html`]을 반복합니다.
///
/// 연속된 두 패스의 결과를 비교해 고정점을 확인합니다. 중첩/변형 페이로드가
/// 한 패스 후 새 마크업을 만들어내는 경우를 막기 위함입니다.
/// [`MAX_SANITIZE_PASSES`] 안에 안정되지 않으면 빈 문자열을 반환합니다.
pub fn sanitize_strict(html: &str) -> String {
    let mut current = html.to_string();

    for _ in 0..MAX_SANITIZE_PASSES {
        let next = sanitize_html(&current);
        if next == current {
            return current;
        }
        current = next;
    }

    tracing::warn!(
        passes = MAX_SANITIZE_PASSES,
        input_len = html.len(),
        "Sanitizer did not stabilize, discarding input"
    );
    String::new()
}

/// 단일 패스 태그 제거.
///
/// `<` + 단어 + 비단어 문자 + 단어 문자 패턴을 지울 뿐이며 완전한 정리기가 아닙니다.
/// 이 동작(우회 가능성 포함)에 의존하는 호출부가 있으므로 강화하지 않습니다.
/// 새 코드에서는 [`sanitize_strict`]를 사용하세요.
pub fn sanitize_legacy(input: &str) -> String {
    LEGACY_TAG.replace_all(input, "").into_owned()
}

/// 파일 이름에서 경로 구분자, 금지 문자, 제어 문자, 예약 이름을 제거합니다.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = ILLEGAL_FILENAME.replace_all(name, "");
    let cleaned = CONTROL_CHARS.replace_all(&cleaned, "");
    let cleaned = RESERVED_NAME.replace(&cleaned, "");
    let cleaned = WINDOWS_RESERVED.replace(&cleaned, "");
    let cleaned = WINDOWS_TRAILING.replace(&cleaned, "");

    truncate_on_char_boundary(&cleaned, MAX_FILENAME_BYTES).to_string()
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// 첫 `%00` 이전까지만 남깁니다.
pub fn cut_off_poison_null_byte(input: &str) -> &str {
    match input.find("%00") {
        Some(idx) => &input[..idx],
        None => input,
    }
}
