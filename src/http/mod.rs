// ============================================================================
// HTTP Read Path
// ============================================================================
//
// Public lookup endpoint: GET /order/{order_uid}, served from the order
// service (cache first, then store).
//
// ============================================================================

mod handlers;
mod server;

pub use server::start_http_server;
