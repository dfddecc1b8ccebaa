use crate::call::CallContext;
use crate::dispatcher::{BoundArgs, Param, Signature};
use crate::protocol::VerboseLevel;
use crate::router::Router;

/// Log `hello world` on the backend.
pub fn hello_handler(ctx: &mut CallContext, _args: BoundArgs) -> anyhow::Result<()> {
    ctx.verbose("hello world", VerboseLevel::Info)?;
    Ok(())
}

/// Answer, then read every positional argument back through `VERBOSE`.
pub fn echo_handler(ctx: &mut CallContext, _args: BoundArgs) -> anyhow::Result<()> {
    ctx.answer()?;
    let args = ctx.args().to_vec();
    for (idx, arg) in args.iter().enumerate() {
        ctx.verbose(&format!("arg {}: {arg}", idx + 1), VerboseLevel::Info)?;
    }
    Ok(())
}

/// Demo routes served by `agirouter serve`
#[must_use]
pub fn demo_routes() -> Router {
    let mut router = Router::new();
    router.route(
        "hello",
        Signature::new().param(Param::context("request")),
        hello_handler,
    );
    router.route(
        "echo",
        Signature::new().param(Param::context("request")),
        echo_handler,
    );
    router
}
