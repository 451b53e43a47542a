//! Axum integration for condoguard.
//!
//! [`TenantLayer`] resolves the tenant of every request from its `Host`
//! header (or, outside production, an override query parameter on shared
//! hosts) and runs the rest of the stack inside that tenant's context. Every
//! repository call made while handling the request is confined to the
//! resolved condominium.
//!
//! # Features
//!
//! - **Middleware**: Tower layer that resolves and activates the tenant
//! - **Route classification**: which paths work without a tenant
//! - **Extractors**: [`CurrentTenant`] and [`RequiredTenant`] for handlers
//! - **Uniform rejections**: unknown tenants are a plain `404 Not Found`
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use condoguard_axum::prelude::*;
//!
//! async fn dashboard(RequiredTenant(tenant): RequiredTenant) -> String {
//!     format!("Welcome to {}", tenant.name)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = StaticDirectory::from_tenants([
//!         Tenant::new(1_i64, "algarrobos").with_name("Los Algarrobos"),
//!     ]);
//!     let resolver = TenantResolver::new(directory, TenancyConfig::from_env()?);
//!
//!     let app = Router::new()
//!         .route("/dashboard", get(dashboard))
//!         .layer(TenantLayer::new(resolver));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Request, StatusCode, header::HOST, request::Parts},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use thiserror::Error;
use tower_layer::Layer;
use tower_service::Service;
use tracing::{debug, error};

use condoguard_query::tenant::{self, RequestInfo, Tenant, TenantDirectory, TenantResolver, TenantState};
use condoguard_query::{QueryError, TenancyConfig};

/// Rejections produced by the tenancy layer and extractors.
///
/// The response body never names the attempted tenant.
#[derive(Error, Debug)]
pub enum TenancyRejection {
    /// No tenant for a route that requires one.
    #[error("Not Found")]
    NotFound,

    /// The tenant directory failed.
    #[error("Internal Server Error")]
    Internal(#[source] QueryError),
}

impl From<QueryError> for TenancyRejection {
    fn from(err: QueryError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Internal(err)
        }
    }
}

impl TenancyRejection {
    /// The HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TenancyRejection {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!(error = %err, "Tenant resolution failed");
        }
        (self.status(), self.to_string()).into_response()
    }
}

/// Which paths work without a tenant.
///
/// A path is tenant-optional if it equals one of the optional paths, or
/// equals or lies under one of the optional prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteClassifier {
    optional_paths: Vec<String>,
    optional_prefixes: Vec<String>,
}

impl Default for RouteClassifier {
    /// The landing page plus static assets, the API, platform administration
    /// (`/master`), authentication, public pages and the Drive callback.
    fn default() -> Self {
        Self::strict()
            .optional_path("/")
            .optional_prefix("/static")
            .optional_prefix("/api")
            .optional_prefix("/master")
            .optional_prefix("/auth")
            .optional_prefix("/public")
            .optional_prefix("/google_drive")
    }
}

impl RouteClassifier {
    /// A classifier under which every path requires a tenant.
    pub fn strict() -> Self {
        Self {
            optional_paths: Vec::new(),
            optional_prefixes: Vec::new(),
        }
    }

    /// Mark one exact path as tenant-optional.
    pub fn optional_path(mut self, path: impl Into<String>) -> Self {
        self.optional_paths.push(path.into());
        self
    }

    /// Mark a path prefix as tenant-optional.
    pub fn optional_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.optional_prefixes
            .push(prefix.trim_end_matches('/').to_string());
        self
    }

    /// Whether `path` works without a tenant.
    pub fn is_tenant_optional(&self, path: &str) -> bool {
        if self.optional_paths.iter().any(|p| p == path) {
            return true;
        }
        self.optional_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Layer that resolves the tenant of each request.
///
/// On success the inner service runs inside the tenant's context and the
/// [`TenantState`] is added to the request extensions. When a route needs a
/// tenant and none can be established, the request is answered with
/// `404 Not Found` without reaching the inner service.
pub struct TenantLayer<D> {
    resolver: TenantResolver<D>,
    routes: Arc<RouteClassifier>,
}

impl<D> Clone for TenantLayer<D> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            routes: Arc::clone(&self.routes),
        }
    }
}

impl<D: TenantDirectory> TenantLayer<D> {
    /// Create a layer with the default route classification.
    pub fn new(resolver: TenantResolver<D>) -> Self {
        Self {
            resolver,
            routes: Arc::new(RouteClassifier::default()),
        }
    }

    /// Create a layer from a directory and configuration.
    pub fn from_config(directory: D, config: TenancyConfig) -> Self {
        Self::new(TenantResolver::new(directory, config))
    }

    /// Replace the route classification.
    pub fn with_routes(mut self, routes: RouteClassifier) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    /// The resolver in use.
    pub fn resolver(&self) -> &TenantResolver<D> {
        &self.resolver
    }
}

impl<S, D> Layer<S> for TenantLayer<D> {
    type Service = TenantService<S, D>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService {
            inner,
            resolver: self.resolver.clone(),
            routes: Arc::clone(&self.routes),
        }
    }
}

/// Tower service created by [`TenantLayer`].
pub struct TenantService<S, D> {
    inner: S,
    resolver: TenantResolver<D>,
    routes: Arc<RouteClassifier>,
}

impl<S: Clone, D> Clone for TenantService<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            resolver: self.resolver.clone(),
            routes: Arc::clone(&self.routes),
        }
    }
}

impl<S, D, ReqBody> Service<Request<ReqBody>> for TenantService<S, D>
where
    S: Service<Request<ReqBody>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    D: TenantDirectory + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let resolver = self.resolver.clone();
        let routes = Arc::clone(&self.routes);

        Box::pin(async move {
            let host = request_host(&request);
            let override_id = query_param(&request, &resolver.config().override_param);
            let optional = routes.is_tenant_optional(request.uri().path());
            let remote_addr = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip());

            let info = RequestInfo {
                host: &host,
                override_id: override_id.as_deref(),
                tenant_optional: optional,
                remote_addr,
            };

            let state = match resolver.resolve(&info).await {
                Ok(state) => state,
                Err(err) => {
                    debug!(path = request.uri().path(), "Rejecting request without tenant");
                    return Ok(TenancyRejection::from(err).into_response());
                }
            };

            request.extensions_mut().insert(state.clone());
            tenant::with_state(state, async move { inner.call(request).await }).await
        })
    }
}

fn request_host<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_string()
}

fn query_param<B>(request: &Request<B>, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn state_from_parts(parts: &Parts) -> TenantState {
    parts
        .extensions
        .get::<TenantState>()
        .cloned()
        .unwrap_or_else(tenant::current)
}

/// Extractor for the active tenant, if any.
///
/// ```rust,ignore
/// async fn landing(CurrentTenant(tenant): CurrentTenant) -> String {
///     match tenant {
///         Some(tenant) => format!("Condominium {}", tenant.name),
///         None => "Platform home".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Option<Arc<Tenant>>);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(state_from_parts(parts).tenant().cloned()))
    }
}

/// Extractor for handlers that only make sense inside a condominium.
///
/// Rejects with `404 Not Found` when no tenant is active.
#[derive(Debug, Clone)]
pub struct RequiredTenant(pub Arc<Tenant>);

impl<S> FromRequestParts<S> for RequiredTenant
where
    S: Send + Sync,
{
    type Rejection = TenancyRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        state_from_parts(parts)
            .tenant()
            .cloned()
            .map(Self)
            .ok_or(TenancyRejection::NotFound)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CurrentTenant, RequiredTenant, RouteClassifier, TenancyRejection, TenantLayer,
        TenantService,
    };
    pub use condoguard_query::prelude::*;
    pub use condoguard_query::tenant::StaticDirectory;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use condoguard_query::config::DeploymentMode;
    use condoguard_query::tenant::{DynamicDirectory, StaticDirectory, current_tenant};
    use tower::ServiceExt;

    fn directory() -> StaticDirectory {
        StaticDirectory::from_tenants([
            Tenant::new(1_i64, "t1").with_name("Algarrobos"),
            Tenant::new(2_i64, "t2").with_name("Punta Blanca"),
        ])
    }

    fn config(mode: DeploymentMode) -> TenancyConfig {
        TenancyConfig::builder()
            .mode(mode)
            .root_host("condo.app")
            .build()
            .unwrap()
    }

    async fn whoami() -> String {
        current_tenant().map_or_else(|| "none".to_string(), |t| t.name.clone())
    }

    async fn units(RequiredTenant(tenant): RequiredTenant) -> String {
        format!("units of {}", tenant.name)
    }

    async fn landing(CurrentTenant(tenant): CurrentTenant) -> String {
        tenant.map_or_else(|| "platform".to_string(), |t| t.name.clone())
    }

    fn app(layer: TenantLayer<StaticDirectory>) -> Router {
        Router::new()
            .route("/", get(landing))
            .route("/units", get(units))
            .route("/whoami", get(whoami))
            .route("/api/ping", get(whoami))
            .layer(layer)
    }

    async fn send(app: Router, host: &str, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .header(HOST, host)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_tenant_host_activates_context() {
        let app = app(TenantLayer::from_config(directory(), config(DeploymentMode::Production)));

        assert_eq!(
            send(app.clone(), "t1.condo.app", "/units").await,
            (StatusCode::OK, "units of Algarrobos".to_string())
        );
        assert_eq!(
            send(app.clone(), "T2.condo.app:8443", "/whoami").await,
            (StatusCode::OK, "Punta Blanca".to_string())
        );
        assert_eq!(
            send(app, "t1.condo.app", "/").await,
            (StatusCode::OK, "Algarrobos".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_tenant_on_required_route_is_plain_404() {
        let app = app(TenantLayer::from_config(directory(), config(DeploymentMode::Production)));
        let (status, body) = send(app, "demo.condo.app", "/units").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_unknown_tenant_on_optional_route_proceeds() {
        let app = app(TenantLayer::from_config(directory(), config(DeploymentMode::Production)));
        assert_eq!(
            send(app.clone(), "demo.condo.app", "/api/ping").await,
            (StatusCode::OK, "none".to_string())
        );
        assert_eq!(
            send(app, "demo.condo.app", "/").await,
            (StatusCode::OK, "platform".to_string())
        );
    }

    #[tokio::test]
    async fn test_override_on_shared_host() {
        let dev = app(TenantLayer::from_config(directory(), config(DeploymentMode::Development)));
        assert_eq!(
            send(dev, "localhost:5000", "/units?tenant=t2").await,
            (StatusCode::OK, "units of Punta Blanca".to_string())
        );

        let prod = app(TenantLayer::from_config(directory(), config(DeploymentMode::Production)));
        let (status, _) = send(prod, "localhost:5000", "/units?tenant=t2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_required_tenant_extractor_rejects_without_layer_state() {
        let layer = TenantLayer::from_config(directory(), config(DeploymentMode::Production))
            .with_routes(RouteClassifier::strict().optional_prefix("/units"));
        let (status, body) = send(app(layer), "condo.app", "/units").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_directory_failure_is_500() {
        let directory = DynamicDirectory::new(|_| async {
            Err::<Option<Tenant>, _>(QueryError::connection("db down"))
        });
        let app = Router::new()
            .route("/units", get(units))
            .layer(TenantLayer::from_config(directory, config(DeploymentMode::Production)));

        let request = Request::builder()
            .uri("/units")
            .header(HOST, "t1.condo.app")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_inner_service_call_runs_in_tenant_scope() {
        // Reads the tenant in `call` itself, before its future is polled.
        let inner = tower::service_fn(|_request: Request<Body>| {
            let seen = current_tenant().map_or_else(|| "none".to_string(), |t| t.name.clone());
            async move { Ok::<_, Infallible>(seen.into_response()) }
        });
        let service = TenantLayer::from_config(directory(), config(DeploymentMode::Production))
            .layer(inner);

        let request = Request::builder()
            .uri("/units")
            .header(HOST, "t2.condo.app")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Punta Blanca");
    }

    #[test]
    fn test_route_classifier() {
        let routes = RouteClassifier::default();
        assert!(routes.is_tenant_optional("/"));
        assert!(routes.is_tenant_optional("/static/app.css"));
        assert!(routes.is_tenant_optional("/api"));
        assert!(routes.is_tenant_optional("/master/condominiums"));
        assert!(!routes.is_tenant_optional("/apiary"));
        assert!(!routes.is_tenant_optional("/units"));
        assert!(!RouteClassifier::strict().is_tenant_optional("/"));
    }

    #[test]
    fn test_rejection_mapping() {
        assert_eq!(
            TenancyRejection::from(QueryError::tenant_not_found()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TenancyRejection::from(QueryError::not_found("Unit")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TenancyRejection::from(QueryError::connection("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
