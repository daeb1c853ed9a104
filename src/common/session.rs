//! 用户会话 Token
//!
//! 登录由外部认证服务完成，本服务只校验其签发的 HS256 JWT，`sub` 即用户 ID

use anyhow::{Result, anyhow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    /// 签发时间 (Unix timestamp)
    pub iat: usize,
    /// 过期时间 (Unix timestamp)
    pub exp: usize,
}

/// 会话 Token 默认有效期（30 天）
pub const TOKEN_EXPIRY_SECONDS: u64 = 30 * 24 * 60 * 60;

/// 使用 SHA256 哈希会话密钥作为 JWT 签名密钥
fn derive_secret_key(session_secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(session_secret.as_bytes());
    hasher.finalize().to_vec()
}

/// 为指定用户签发会话 Token
///
/// # Returns
/// * `Ok((token, expires_in))` - JWT Token 字符串和过期秒数
pub fn generate_token(session_secret: &str, user_id: &str) -> Result<(String, u64)> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + TOKEN_EXPIRY_SECONDS) as usize,
    };

    let secret = derive_secret_key(session_secret);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&secret),
    )?;

    Ok((token, TOKEN_EXPIRY_SECONDS))
}

/// 验证会话 Token
///
/// # Returns
/// * `Ok(Claims)` - 验证成功
/// * `Err(_)` - 验证失败（过期、签名错误等）
pub fn verify_token(token: &str, session_secret: &str) -> Result<Claims> {
    let secret = derive_secret_key(session_secret);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&secret),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}
