use crate::config::Settings;
use crate::domain::{UpstreamTarget, ViewStore};
use crate::infrastructure::PgViewStore;
use crate::proxy::{ProxyConfig, ProxyService};
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    upstream: UpstreamTarget,
    store: Arc<dyn ViewStore>,
}

impl Application {
    /// Load settings and connect to the view store.
    ///
    /// An unparseable upstream or an unreachable store is fatal.
    #[instrument]
    pub async fn new() -> Result<Self> {
        let settings = Settings::new()?;
        let upstream = UpstreamTarget::parse(&settings.cdn_url)?;

        info!("Connecting to view store");
        let store = PgViewStore::connect(
            &settings.database_url,
            settings.database_max_connections,
            settings.views_table()?,
        )
        .await?;

        Ok(Self::with_store(settings, upstream, Arc::new(store)))
    }

    /// Assemble the application around an already initialised store
    pub fn with_store(
        settings: Settings,
        upstream: UpstreamTarget,
        store: Arc<dyn ViewStore>,
    ) -> Self {
        Self {
            settings,
            upstream,
            store,
        }
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        let mut config = ProxyConfig::new(self.upstream.clone());
        config.request_timeout = self.settings.request_timeout();
        config.accounting_timeout = self.settings.accounting_timeout();
        config
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.settings.listen_addr()).await?;
        self.serve(listener).await
    }

    /// Serve the proxy on an already bound listener until Ctrl-C
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = ProxyService::new(self.proxy_config(), self.store.clone()).into_router();

        info!(
            addr = %listener.local_addr()?,
            upstream = %self.upstream,
            "Proxy server listening"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("Proxy server stopped");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        &self.upstream
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
