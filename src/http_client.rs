//! HTTP Client 构建模块

use std::time::Duration;

use reqwest::{Client, Proxy};

use crate::model::config::{Config, TlsBackend};

/// 代理配置
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// 从全局配置读取代理（未配置时返回 None）
    pub fn from_config(config: &Config) -> Option<Self> {
        config.proxy_url.as_ref().map(|url| Self {
            url: url.clone(),
            username: config.proxy_username.clone(),
            password: config.proxy_password.clone(),
        })
    }
}

/// 构建 HTTP Client
///
/// # Arguments
/// * `proxy` - 可选的代理配置，支持 http/https/socks5
/// * `timeout_secs` - 超时时间（秒）
/// * `tls_backend` - TLS 实现
pub fn build_client(
    proxy: Option<&ProxyConfig>,
    timeout_secs: u64,
    tls_backend: TlsBackend,
) -> anyhow::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));

    builder = match tls_backend {
        TlsBackend::Rustls => builder.use_rustls_tls(),
        #[cfg(feature = "native-tls")]
        TlsBackend::NativeTls => builder.use_native_tls(),
        #[cfg(not(feature = "native-tls"))]
        TlsBackend::NativeTls => {
            tracing::warn!("未启用 native-tls 特性，回退到 rustls");
            builder.use_rustls_tls()
        }
    };

    if let Some(proxy) = proxy {
        let mut p = Proxy::all(&proxy.url)?;
        if let (Some(username), Some(password)) = (&proxy.username, &proxy.password) {
            p = p.basic_auth(username, password);
        }
        builder = builder.proxy(p);
        tracing::debug!("HTTP Client 使用代理: {}", proxy.url);
    }

    Ok(builder.build()?)
}
