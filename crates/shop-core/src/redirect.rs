//! 외부 리다이렉트 허용 목록.

use std::collections::BTreeSet;

/// 스토어프런트가 링크하는 외부 URL 기본 목록.
pub const DEFAULT_ALLOWLIST: &[&str] = &[
    "https://github.com/juice-shop/juice-shop",
    "https://blockchain.info/address/1AbKfgvw9psQ41NbLi8kufDQTezwG8DRZm",
    "https://explorer.dash.org/address/Xr556RzuwX6hg5EGpkybbv5RanJoZN17kW",
    "https://etherscan.io/address/0x0f933ab9fcaaa782d0279c300d73750e1311eae6",
    "http://shop.spreadshirt.com/juiceshop",
    "http://shop.spreadshirt.de/juiceshop",
    "https://www.stickeryou.com/products/owasp-juice-shop/794",
    "http://leanpub.com/juice-shop",
];

/// 프로세스 시작 시 한 번 만들어지는 불변 URL 집합.
#[derive(Debug, Clone)]
pub struct RedirectAllowlist {
    urls: BTreeSet<String>,
}

impl RedirectAllowlist {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    /// 정확히 일치하는 항목이 있는지.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// 허용된 URL 중 하나를 부분 문자열로 포함하면 허용.
    ///
    /// 부분 문자열 검사라서 `https://evil.example/?https://github.com/juice-shop/juice-shop`
    /// 같은 URL도 통과합니다. 엄격한 판정이 필요하면 [`Self::contains`]를 사용하세요.
    pub fn is_redirect_allowed(&self, url: &str) -> bool {
        self.urls.iter().any(|allowed| url.contains(allowed.as_str()))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl Default for RedirectAllowlist {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWLIST.iter().copied())
    }
}
