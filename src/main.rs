use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use site_lead_analyzer::{
    api::routes::create_router,
    auth::{AllowList, Authorizer, OpenGate},
    cache::{AnalysisCache, SystemClock},
    config::Config,
    assessor::Assessor,
    fetcher::HttpFetcher,
    llm::OpenRouterClient,
    pipeline::Analyzer,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;

    let completion = OpenRouterClient::new(config.openrouter_api_key.clone())
        .with_base_url(config.llm_base_url.clone())
        .with_site(None, Some("site-lead-analyzer".to_string()));
    let assessor = Assessor::new(Arc::new(completion))
        .with_timeout(Duration::from_secs(config.ai_timeout_seconds));
    let analyzer = Analyzer::with_assessor(Arc::new(HttpFetcher::new()?), assessor)
        .with_policy(config.scoring_policy, config.speed_thresholds);

    let authorizer: Arc<dyn Authorizer> = if config.authorized_emails.is_empty() {
        info!("No allow-list configured, analysis is open");
        Arc::new(OpenGate)
    } else {
        Arc::new(AllowList::new(&config.authorized_emails))
    };

    let cache = AnalysisCache::new(
        chrono::Duration::seconds(config.cache_ttl_seconds),
        Arc::new(SystemClock),
    );

    // Create application state
    let app_state = AppState {
        config: Arc::new(config),
        analyzer,
        authorizer,
        cache: Arc::new(cache),
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(server_addr).await?;
    info!(addr = %server_addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
