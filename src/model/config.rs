use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    #[default]
    Rustls,
    NativeTls,
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite 数据库文件路径
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Google PageSpeed Insights API 密钥（未配置时分析接口返回配置错误）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psi_api_key: Option<String>,

    #[serde(default = "default_psi_api_url")]
    pub psi_api_url: String,

    /// PSI 请求超时（秒）
    #[serde(default = "default_psi_timeout_secs")]
    pub psi_timeout_secs: u64,

    /// 免费用户每日分析次数上限
    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: u32,

    /// HTTP 代理地址（可选）
    /// 支持格式: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// 代理认证用户名（可选）
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// 代理认证密码（可选）
    #[serde(default)]
    pub proxy_password: Option<String>,

    #[serde(default)]
    pub tls_backend: TlsBackend,

    /// 用户会话 Token 签名密钥（HS256）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_secret: Option<String>,

    /// Admin API 密钥（可选，启用 Admin API 功能）
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_api_key: Option<String>,

    /// Stripe webhook 签名密钥
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_webhook_secret: Option<String>,

    /// Stripe 签名时间戳允许偏差（秒）
    #[serde(default = "default_stripe_tolerance_secs")]
    pub stripe_tolerance_secs: i64,

    /// 定时清理任务的共享密钥
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_secret: Option<String>,

    /// 配置文件路径（运行时元数据，不写入 JSON）
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "pagespeed.db".to_string()
}

fn default_psi_api_url() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
}

fn default_psi_timeout_secs() -> u64 {
    300
}

fn default_free_daily_limit() -> u32 {
    5
}

fn default_stripe_tolerance_secs() -> i64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            psi_api_key: None,
            psi_api_url: default_psi_api_url(),
            psi_timeout_secs: default_psi_timeout_secs(),
            free_daily_limit: default_free_daily_limit(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
            tls_backend: TlsBackend::default(),
            session_secret: None,
            admin_api_key: None,
            stripe_webhook_secret: None,
            stripe_tolerance_secs: default_stripe_tolerance_secs(),
            cron_secret: None,
            config_path: None,
        }
    }
}

/// 可由环境变量覆盖的密钥项
const ENV_OVERRIDES: &[&str] = &[
    "GOOGLE_PSI_API_KEY",
    "STRIPE_WEBHOOK_SECRET",
    "CRON_SECRET",
    "SESSION_SECRET",
    "ADMIN_API_KEY",
];

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// 用环境变量覆盖密钥配置（空字符串视为未设置）
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for &name in ENV_OVERRIDES {
            let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let slot = match name {
                "GOOGLE_PSI_API_KEY" => &mut self.psi_api_key,
                "STRIPE_WEBHOOK_SECRET" => &mut self.stripe_webhook_secret,
                "CRON_SECRET" => &mut self.cron_secret,
                "SESSION_SECRET" => &mut self.session_secret,
                "ADMIN_API_KEY" => &mut self.admin_api_key,
                _ => continue,
            };
            *slot = Some(value);
        }
    }

    /// 获取配置文件路径（如果有）
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.free_daily_limit, 5);
        assert_eq!(config.psi_timeout_secs, 300);
        assert_eq!(config.tls_backend, TlsBackend::Rustls);
        assert!(config.psi_api_key.is_none());
    }

    #[test]
    fn test_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{"psiApiKey":"k","freeDailyLimit":3,"tlsBackend":"native-tls","cronSecret":"c"}"#,
        )
        .unwrap();
        assert_eq!(config.psi_api_key.as_deref(), Some("k"));
        assert_eq!(config.free_daily_limit, 3);
        assert_eq!(config.tls_backend, TlsBackend::NativeTls);
        assert_eq!(config.cron_secret.as_deref(), Some("c"));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let config = Config::load("/nonexistent/pagespeed-config.json").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.config_path().is_some());
    }

    #[test]
    fn test_load_from_file_records_path() {
        let path = std::env::temp_dir().join(format!("pagespeed-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"port":9090,"freeDailyLimit":2}"#).unwrap();

        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.free_daily_limit, 2);
        assert_eq!(config.config_path(), Some(path.as_path()));
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = Config {
            psi_api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_overrides(|name| match name {
            "GOOGLE_PSI_API_KEY" => Some("from-env".to_string()),
            "CRON_SECRET" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.psi_api_key.as_deref(), Some("from-env"));
        // 空白值不覆盖
        assert!(config.cron_secret.is_none());
    }
}
