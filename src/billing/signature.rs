//! Stripe webhook 签名
//!
//! 头格式 `t=<unix 秒>,v1=<hex>[,v1=<hex>...]`，签名为
//! HMAC-SHA256(secret, "{t}.{原始请求体}")。任一 v1 匹配即通过。

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// 缺少 t 或 v1
    MalformedHeader,
    /// 没有匹配的 v1 签名
    Mismatch,
    /// 时间戳超出允许偏差
    Expired,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader => write!(f, "malformed Stripe-Signature header"),
            Self::Mismatch => write!(f, "no signature matches the payload"),
            Self::Expired => write!(f, "signature timestamp outside tolerance"),
        }
    }
}

impl std::error::Error for SignatureError {}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(mac)
}

/// 计算 v1 签名（hex）
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Option<String> {
    mac_for(secret, timestamp, payload).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// 构造完整的 `Stripe-Signature` 头
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Option<String> {
    compute_signature(secret, timestamp, payload).map(|sig| format!("t={},v1={}", timestamp, sig))
}

/// 校验签名
///
/// `tolerance_secs <= 0` 时不检查时间戳
pub fn verify(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    // verify_slice 为常量时间比较
    let matched = candidates.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        mac_for(secret, timestamp, payload)
            .map(|mac| mac.verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if tolerance_secs > 0 && (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }
    Ok(())
}
