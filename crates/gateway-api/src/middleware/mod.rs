pub mod concurrency;
pub mod rate_limit;
pub mod validation;

/// Installs a panic hook that logs via `tracing` instead of writing to
/// stderr directly, so a panicking handler task shows up in the same
/// structured log stream as everything else. Paired with
/// `tower_http::catch_panic::CatchPanicLayer` in the router, which turns
/// the panic into a `500` instead of tearing down the connection.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(panic = %panic_info, "panic in request handler");
        default_hook(panic_info);
    }));
}
