use std::sync::Arc;

use cornercut_web::{
    Context, HandlerError, MethodTable, ModuleRegistry, QueryParams, Request, ResponseWriter, Route, Router,
    ServerConfig, handler_fn,
};
use http::StatusCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn operands(req: &Request) -> Result<(i64, i64), HandlerError> {
    let query = QueryParams::from_uri(req.uri());
    let a = query.get("a").ok_or("missing operand a")?.parse()?;
    let b = query.get("b").ok_or("missing operand b")?.parse()?;
    Ok((a, b))
}

fn add(req: &Request, res: &mut ResponseWriter, _ctx: &Context<'_>) -> Result<(), HandlerError> {
    let (a, b) = operands(req)?;
    res.end(format!("{}\r\n", a + b));
    Ok(())
}

fn div(req: &Request, res: &mut ResponseWriter, _ctx: &Context<'_>) -> Result<(), HandlerError> {
    let (a, b) = operands(req)?;
    let quotient = a.checked_div(b).ok_or("division by zero")?;
    res.end(format!("{quotient}\r\n"));
    Ok(())
}

// curl -v "http://127.0.0.1:8080/calc?op=add&a=1&b=2"
// curl -v "http://127.0.0.1:8080/calc?op=div&a=1&b=0"
// curl -v "http://127.0.0.1:8080/calc?a=1&b=2"
#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let calc = MethodTable::new().method("add", handler_fn(add)).method("div", handler_fn(div));
    let router = Arc::new(Router::builder().loader(ModuleRegistry::new().register("calc", calc)).build());

    router
        .add(Route::new("/").endpoint(handler_fn(|_req, res, _ctx| {
            res.end("hello world\r\n");
            Ok(())
        })))
        .add(Route::new("/calc").module("calc").method_param("op"))
        .add(Route::new("/created").http_code(StatusCode::CREATED).endpoint(handler_fn(|_req, res, ctx| {
            res.end(format!("{} routes\r\n", ctx.router().routes().len()));
            Ok(())
        })));

    router.set_error_handler(
        "404",
        handler_fn(|req, res, _ctx| {
            res.end(format!("nothing at {}\r\n", req.uri().path()));
            Ok(())
        }),
    );

    let server = match router.create_server(ServerConfig::new().port(8080)).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "start server error");
            return;
        }
    };
    info!(address = %server.local_addr(), "calculator ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "can't listen for ctrl-c");
    }
    router.shutdown_server();
}
