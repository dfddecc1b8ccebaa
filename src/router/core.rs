use crate::call::CallContext;
use crate::dispatcher::{typed_handler, BoundArgs, Handler, Signature};
use crate::typed::CallParams;
use std::sync::Arc;
use tracing::debug;

/// Detached collection of routes.
///
/// Handler modules fill a `Router` without access to the server; the
/// application merges it with [`RouteTable::include_router`] before
/// serving.
///
/// [`RouteTable::include_router`]: crate::dispatcher::RouteTable::include_router
#[derive(Default, Clone)]
pub struct Router {
    routes: Vec<(String, Arc<Signature>, Handler)>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|(path, _, _)| path))
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handler` under `path` and hand it back unchanged.
    ///
    /// Duplicates are kept here; the route table decides when merging. As
    /// with [`RouteTable::route`](crate::dispatcher::RouteTable::route), bind
    /// an inline closure's return to `_name`.
    pub fn route<F>(&mut self, path: &str, signature: Signature, handler: F) -> F
    where
        F: Fn(&mut CallContext, BoundArgs) -> anyhow::Result<()> + Clone + Send + Sync + 'static,
    {
        debug!(path = %path, params = ?signature.names(), "Route collected");
        self.routes
            .push((path.to_string(), Arc::new(signature), Arc::new(handler.clone())));
        handler
    }

    /// Record a handler whose parameters are the fields of `P`.
    pub fn route_typed<P, F>(&mut self, path: &str, handler: F) -> F
    where
        P: CallParams + 'static,
        F: Fn(&mut CallContext, P) -> anyhow::Result<()> + Clone + Send + Sync + 'static,
    {
        let signature = P::signature();
        debug!(path = %path, params = ?signature.names(), "Route collected");
        self.routes.push((
            path.to_string(),
            Arc::new(signature),
            typed_handler(path, handler.clone()),
        ));
        handler
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Arc<Signature>, &Handler)> {
        self.routes
            .iter()
            .map(|(path, sig, handler)| (path.as_str(), sig, handler))
    }

    /// Collected paths in registration order
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|(p, _, _)| p.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
