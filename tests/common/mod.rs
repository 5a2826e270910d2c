#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use link_lifecycle::application::services::LinkService;
use link_lifecycle::domain::entities::NewLink;
use link_lifecycle::domain::repositories::LinkRepository;
use link_lifecycle::infrastructure::cache::{CacheService, MokaCache};
use link_lifecycle::infrastructure::persistence::InMemoryLinkRepository;
use link_lifecycle::infrastructure::rate_limit::{InMemoryRateLimiter, RateLimitPolicy};
use link_lifecycle::routes::router;
use link_lifecycle::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const BASE_URL: &str = "http://s.example.com";

/// Inserts a fixed peer address, standing in for `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct MockConnectInfoLayer {
    pub addr: SocketAddr,
}

impl Default for MockConnectInfoLayer {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:12345".parse().unwrap(),
        }
    }
}

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.addr,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

/// A fully wired application backed by in-process components.
pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<InMemoryLinkRepository>,
    pub cache: Arc<MokaCache>,
    pub service: Arc<LinkService>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_policy(RateLimitPolicy::default(), false)
}

pub fn create_test_app_with_policy(policy: RateLimitPolicy, behind_proxy: bool) -> TestApp {
    let repository = Arc::new(InMemoryLinkRepository::new());
    let cache = Arc::new(MokaCache::new(1_000, 3600));
    let service = Arc::new(LinkService::new(repository.clone(), cache.clone()));

    let state = AppState::new(
        service.clone(),
        repository.clone(),
        cache.clone(),
        Arc::new(InMemoryRateLimiter::new(policy)),
        BASE_URL,
    )
    .with_behind_proxy(behind_proxy);

    TestApp {
        server: server_for(state),
        repository,
        cache,
        service,
    }
}

pub fn create_test_state(
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
) -> AppState {
    let service = Arc::new(LinkService::new(repository.clone(), cache.clone()));

    AppState::new(
        service,
        repository,
        cache,
        Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::default())),
        BASE_URL,
    )
}

pub fn server_for(state: AppState) -> TestServer {
    let app = router(state).layer(MockConnectInfoLayer::default());
    TestServer::new(app).unwrap()
}

pub async fn create_test_link(
    repository: &InMemoryLinkRepository,
    code: &str,
    url: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    repository
        .insert(NewLink {
            code: code.to_string(),
            long_url: url.to_string(),
            expires_at,
        })
        .await
        .unwrap();
}
