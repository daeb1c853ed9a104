//! 请求头认证与客户端地址提取

use http::HeaderMap;
use subtle::ConstantTimeEq;

/// 提取 `Authorization: Bearer <token>` 中的 token
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 提取 API Key，支持 `x-api-key` 和 `Authorization: Bearer`
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| extract_bearer(headers).map(str::to_string))
}

/// 常量时间字符串比较（防止时序攻击）
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// 从转发头中提取客户端地址
///
/// 依次尝试 `x-forwarded-for`（取第一个地址）、`cf-connecting-ip`、`x-real-ip`
pub fn client_address(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(addr) = forwarded {
        return Some(addr.to_string());
    }

    ["cf-connecting-ip", "x-real-ip"].iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret-longer"));
    }

    #[test]
    fn test_extract_api_key_prefers_header() {
        let map = headers(&[("x-api-key", "k1"), ("authorization", "Bearer k2")]);
        assert_eq!(extract_api_key(&map).as_deref(), Some("k1"));

        let map = headers(&[("authorization", "Bearer k2")]);
        assert_eq!(extract_api_key(&map).as_deref(), Some("k2"));

        let map = headers(&[("authorization", "Basic abc")]);
        assert_eq!(extract_api_key(&map), None);
    }

    #[test]
    fn test_client_address_uses_first_forwarded_hop() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_address(&map).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_address_fallbacks() {
        let map = headers(&[("cf-connecting-ip", "198.51.100.2")]);
        assert_eq!(client_address(&map).as_deref(), Some("198.51.100.2"));

        let map = headers(&[("x-real-ip", "192.0.2.9")]);
        assert_eq!(client_address(&map).as_deref(), Some("192.0.2.9"));

        assert_eq!(client_address(&HeaderMap::new()), None);
    }
}
