use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::service::{OrderService, ServiceError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/order/{order_uid}", web::get().to(get_order))
        .route("/order/", web::get().to(missing_order_uid));
}

async fn get_order(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> impl Responder {
    let order_uid = path.into_inner();
    if order_uid.trim().is_empty() {
        return HttpResponse::BadRequest().body("order_uid is required");
    }

    match service.get_order(&order_uid).await {
        Ok(order) => HttpResponse::Ok().json(&*order),
        Err(ServiceError::NotFound(_)) => HttpResponse::NotFound().body("order not found"),
        Err(e) => {
            tracing::error!(error = %e, order_uid = %order_uid, "Order lookup failed");
            HttpResponse::InternalServerError().body("internal error")
        }
    }
}

async fn missing_order_uid() -> impl Responder {
    HttpResponse::BadRequest().body("order_uid is required")
}
