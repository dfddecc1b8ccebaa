use super::binder::{bind, BoundArgs};
use super::signature::Signature;
use crate::call::CallContext;
use crate::protocol::AgiError;
use crate::router::Router;
use crate::typed::CallParams;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Type-erased route handler.
pub type Handler = Arc<dyn Fn(&mut CallContext, BoundArgs) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a typed handler so it can sit in the route table.
///
/// The bound arguments are turned into `P` before the handler runs; a
/// mismatch is [`AgiError::InvalidParams`] and the handler is not called.
pub(crate) fn typed_handler<P, F>(path: &str, handler: F) -> Handler
where
    P: CallParams + 'static,
    F: Fn(&mut CallContext, P) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let path: Arc<str> = Arc::from(path);
    Arc::new(
        move |ctx: &mut CallContext, args: BoundArgs| -> anyhow::Result<()> {
            let params = P::from_args(&args).map_err(|e| AgiError::InvalidParams {
                path: path.to_string(),
                target: std::any::type_name::<P>(),
                message: e.to_string(),
            })?;
            handler(ctx, params)
        },
    )
}

/// A registered route: path, parameter shape and handler.
#[derive(Clone)]
pub struct Route {
    path: Arc<str>,
    signature: Arc<Signature>,
    handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Route {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Bind this route's parameters against `ctx` and run the handler.
    ///
    /// # Errors
    ///
    /// [`AgiError::Binding`] when a required parameter has no value, or
    /// whatever the handler returns.
    pub fn invoke(&self, ctx: &mut CallContext) -> anyhow::Result<()> {
        let args = bind(&self.path, &self.signature, ctx.args(), ctx.query_params())?;
        (self.handler)(ctx, args)
    }
}

/// Mutable route table filled during startup.
///
/// Keyed by path: registering a second handler under the same path replaces
/// the first. Call [`RouteTable::freeze`] once registration is complete to
/// get the shareable [`Dispatcher`].
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `path` and hand it back unchanged.
    ///
    /// The parameter shape is recorded here, once; dispatch only looks it up.
    /// Returning the handler lets a plain `fn` stay callable directly; an
    /// inline closure that is only registered should be bound to `_name`,
    /// as unused closures are `must_use`.
    ///
    /// ```
    /// use agirouter::dispatcher::{BoundArgs, Param, RouteTable, Signature};
    /// use agirouter::call::CallContext;
    ///
    /// let mut table = RouteTable::new();
    /// let hello = table.route(
    ///     "hello",
    ///     Signature::new().param(Param::context("request")),
    ///     |ctx: &mut CallContext, _args: BoundArgs| {
    ///         ctx.answer()?;
    ///         Ok(())
    ///     },
    /// );
    /// assert!(table.contains("hello"));
    /// # let _ = hello;
    /// ```
    pub fn route<F>(&mut self, path: &str, signature: Signature, handler: F) -> F
    where
        F: Fn(&mut CallContext, BoundArgs) -> anyhow::Result<()> + Clone + Send + Sync + 'static,
    {
        self.add_route(path, Arc::new(signature), Arc::new(handler.clone()));
        handler
    }

    /// Register a handler whose parameters are the fields of `P`.
    ///
    /// The signature comes from [`CallParams::signature`]; at dispatch the
    /// bound arguments are turned into `P` and handed to the handler.
    /// Returns the handler unchanged, like [`RouteTable::route`].
    ///
    /// ```
    /// use agirouter::call::CallContext;
    /// use agirouter::dispatcher::RouteTable;
    /// use agirouter::CallParams;
    ///
    /// #[derive(CallParams, serde::Deserialize)]
    /// struct Greeting {
    ///     #[agi(default = "en")]
    ///     lang: String,
    /// }
    ///
    /// let mut table = RouteTable::new();
    /// let greet = table.route_typed("greet", |ctx: &mut CallContext, p: Greeting| {
    ///     ctx.set_variable("CHANNEL(language)", &p.lang)?;
    ///     Ok(())
    /// });
    /// assert!(table.contains("greet"));
    /// # let _ = greet;
    /// ```
    pub fn route_typed<P, F>(&mut self, path: &str, handler: F) -> F
    where
        P: CallParams + 'static,
        F: Fn(&mut CallContext, P) -> anyhow::Result<()> + Clone + Send + Sync + 'static,
    {
        self.add_route(
            path,
            Arc::new(P::signature()),
            typed_handler(path, handler.clone()),
        );
        handler
    }

    pub(crate) fn add_route(&mut self, path: &str, signature: Arc<Signature>, handler: Handler) {
        let params = signature.names().join(", ");
        let route = Route {
            path: Arc::from(path),
            signature,
            handler,
        };

        if self.routes.insert(path.to_string(), route).is_some() {
            warn!(
                path = %path,
                total_routes = self.routes.len(),
                "Replaced existing route - last registration wins"
            );
        }

        info!(
            path = %path,
            params = %params,
            total_routes = self.routes.len(),
            "Route registered"
        );
    }

    /// Register every route collected by `router`.
    ///
    /// Each entry goes through the same registration path as
    /// [`RouteTable::route`]. Returns the number of routes merged.
    pub fn include_router(&mut self, router: &Router) -> usize {
        let mut merged = 0;
        for (path, signature, handler) in router.entries() {
            self.add_route(path, Arc::clone(signature), Arc::clone(handler));
            merged += 1;
        }
        debug!(merged, total_routes = self.routes.len(), "Router merged");
        merged
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// End registration. The returned dispatcher is read-only and cheap to
    /// clone into every connection coroutine.
    #[must_use]
    pub fn freeze(self) -> Dispatcher {
        info!(total_routes = self.routes.len(), "Route table frozen");
        Dispatcher {
            routes: Arc::new(self.routes),
        }
    }
}

/// Read-only route table shared by all connections.
#[derive(Clone, Default)]
pub struct Dispatcher {
    routes: Arc<HashMap<String, Route>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve the call's path, bind parameters and run the handler.
    ///
    /// # Errors
    ///
    /// [`AgiError::MissingPath`] when the headers named no path,
    /// [`AgiError::NoRoute`] when nothing is registered under it,
    /// [`AgiError::Binding`] for unresolved parameters; handler errors are
    /// passed through unchanged.
    pub fn dispatch(&self, ctx: &mut CallContext) -> anyhow::Result<()> {
        let path = ctx.path().ok_or(AgiError::MissingPath)?;
        let route = self
            .resolve(path)
            .ok_or_else(|| AgiError::NoRoute(path.to_string()))?;
        debug!(call_id = %ctx.call_id(), path = %route.path(), "Route resolved");
        route.invoke(ctx)
    }
}
