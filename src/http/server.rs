use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;

use super::handlers;
use crate::service::OrderService;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Access log line: client address (forwarded-for aware), request line,
/// status, body size, caller-supplied request id, latency.
const ACCESS_LOG_FORMAT: &str = r#"%{r}a "%r" %s %b request_id=%{X-Request-Id}i %Dms"#;

/// Bind the public HTTP server. Signal handling is left to the caller,
/// which stops the server through its handle.
pub fn start_http_server(service: Arc<OrderService>, port: u16) -> std::io::Result<Server> {
    tracing::info!("Starting HTTP server on http://0.0.0.0:{}", port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new(ACCESS_LOG_FORMAT))
            .app_data(web::Data::new(service.clone()))
            .configure(handlers::configure)
    })
    .client_request_timeout(REQUEST_TIMEOUT)
    .shutdown_timeout(SHUTDOWN_TIMEOUT.as_secs())
    .disable_signals()
    .bind(("0.0.0.0", port))?
    .run();

    Ok(server)
}
