//! Tower middleware attaching the substitution target to requests.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use tower::{Layer, Service};

use crate::autoresp::RuleStore;

/// Request extension carrying the matched local file pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSubstitute(pub Arc<str>);

impl LocalSubstitute {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Layer that looks up every request path in a [`RuleStore`].
#[derive(Debug, Clone)]
pub struct AutoRespondLayer {
    store: Arc<RuleStore>,
}

impl AutoRespondLayer {
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for AutoRespondLayer {
    type Service = AutoRespond<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AutoRespond {
            inner,
            store: self.store.clone(),
        }
    }
}

/// Service produced by [`AutoRespondLayer`].
#[derive(Debug, Clone)]
pub struct AutoRespond<S> {
    inner: S,
    store: Arc<RuleStore>,
}

impl<S, B> Service<Request<B>> for AutoRespond<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(target) = self.store.lookup(req.uri().path()) {
            tracing::debug!(path = %req.uri().path(), target = %target, "Local substitute matched");
            req.extensions_mut().insert(LocalSubstitute(target));
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::io::Write;
    use tower::{service_fn, ServiceExt};

    async fn echo_extension(req: Request<()>) -> Result<Option<LocalSubstitute>, Infallible> {
        Ok(req.extensions().get::<LocalSubstitute>().cloned())
    }

    fn store_with(contents: &str) -> (tempfile::NamedTempFile, Arc<RuleStore>) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let store = Arc::new(RuleStore::with_rules_path(file.path()));
        store.init().unwrap();
        (file, store)
    }

    #[tokio::test]
    async fn test_match_inserts_extension() {
        let (_file, store) = store_with("^/status$ \"/var/www/status.html\"\n");
        let svc = AutoRespondLayer::new(store).layer(service_fn(echo_extension));

        let req = Request::builder().uri("http://example.com/status?x=1").body(()).unwrap();
        let got = svc.oneshot(req).await.unwrap();
        assert_eq!(got.as_ref().map(LocalSubstitute::as_str), Some("/var/www/status.html"));
    }

    #[tokio::test]
    async fn test_miss_leaves_request_untouched() {
        let (_file, store) = store_with("^/status$ \"/var/www/status.html\"\n");
        let svc = AutoRespondLayer::new(store).layer(service_fn(echo_extension));

        let req = Request::builder().uri("/other").body(()).unwrap();
        assert_eq!(svc.oneshot(req).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disabled_store_passes_through() {
        let svc = AutoRespondLayer::new(Arc::new(RuleStore::disabled()))
            .layer(service_fn(echo_extension));

        let req = Request::builder().uri("/status").body(()).unwrap();
        assert_eq!(svc.oneshot(req).await.unwrap(), None);
    }
}
