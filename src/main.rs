use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use pagespeed_rs::admin::{AdminService, AdminState};
use pagespeed_rs::analysis::AnalysisService;
use pagespeed_rs::api::{AppState, create_router};
use pagespeed_rs::billing::SubscriptionService;
use pagespeed_rs::model::config::Config;
use pagespeed_rs::pagespeed::PsiClient;
use pagespeed_rs::store::Database;
use pagespeed_rs::usage::UsageLedger;

/// PageSpeed 分析服务
#[derive(Parser, Debug)]
#[command(name = "pagespeed-rs", version, about)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = Config::default_config_path())]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::load(&args.config)?;
    config.apply_env();
    if let Some(path) = config.config_path() {
        if path.exists() {
            tracing::info!("已加载配置文件: {}", path.display());
        } else {
            tracing::info!("配置文件不存在，使用默认配置: {}", path.display());
        }
    }

    let db = Database::open(&config.db_path)?;
    tracing::info!("数据库已打开: {}", config.db_path);

    let psi = PsiClient::from_config(&config).context("创建 PSI 客户端失败")?;
    if !psi.has_api_key() {
        tracing::warn!("未配置 GOOGLE_PSI_API_KEY，分析请求将返回配置错误");
    }

    let ledger = UsageLedger::new(db.clone(), config.free_daily_limit);
    let analysis = AnalysisService::new(Arc::new(psi), ledger, db.clone());

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("未配置 STRIPE_WEBHOOK_SECRET，Stripe webhook 将被拒绝");
    }
    let billing = SubscriptionService::new(
        db.clone(),
        config.stripe_webhook_secret.clone(),
        config.stripe_tolerance_secs,
    );

    let admin = config
        .admin_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .map(|key| {
            tracing::info!("Admin API 已启用: /api/admin");
            AdminState::new(key, AdminService::new(db.clone(), config.session_secret.clone()))
        });

    let state = AppState::new(
        analysis,
        billing,
        config.session_secret.clone(),
        config.cron_secret.clone(),
    );
    let app = create_router(state, admin);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;
    tracing::info!("服务已启动: http://{}", addr);
    tracing::info!("  POST /api/analyze");
    tracing::info!("  GET  /api/usage");
    tracing::info!("  GET  /api/history");

    axum::serve(listener, app).await?;
    Ok(())
}
