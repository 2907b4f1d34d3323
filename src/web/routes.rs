// src/web/routes.rs

use actix_web::web;

// Simple liveness probe.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// This function is called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Authentication Routes
      .service(
        web::scope("/auth")
          .route(
            "/signup",
            web::post().to(crate::web::handlers::auth_handlers::signup_handler),
          )
          .route(
            "/signin",
            web::post().to(crate::web::handlers::auth_handlers::signin_handler),
          )
          .route(
            "/signout",
            web::post().to(crate::web::handlers::auth_handlers::signout_handler),
          )
          .route("/me", web::get().to(crate::web::handlers::auth_handlers::me_handler)),
      )
      // Cart Routes
      .service(
        web::scope("/cart")
          .route("", web::get().to(crate::web::handlers::cart_handlers::view_cart_handler))
          .route(
            "/add",
            web::post().to(crate::web::handlers::cart_handlers::add_to_cart_handler),
          )
          .route(
            "/remove",
            web::post().to(crate::web::handlers::cart_handlers::remove_from_cart_handler),
          ),
      )
      // Checkout Routes
      .service(
        web::scope("/checkout")
          .route(
            "",
            web::post().to(crate::web::handlers::checkout_handlers::start_checkout_handler),
          )
          .route(
            "/confirm",
            web::post().to(crate::web::handlers::checkout_handlers::confirm_payment_handler),
          ),
      )
      // Order history
      .service(
        web::scope("/orders")
          .route("", web::get().to(crate::web::handlers::order_handlers::list_orders_handler))
          .route(
            "/{order_id}",
            web::get().to(crate::web::handlers::order_handlers::get_order_handler),
          ),
      )
      // Webhook Routes
      // Unauthenticated; gated by the signature over the raw body instead.
      .service(web::scope("/webhooks").route(
        "/payment",
        web::post().to(crate::web::handlers::webhook_handlers::payment_webhook_handler),
      ))
      // Public catalog
      .service(
        web::scope("/products")
          .route(
            "",
            web::get().to(crate::web::handlers::product_handlers::list_products_handler),
          )
          .route(
            "/{product_id}",
            web::get().to(crate::web::handlers::product_handlers::get_product_handler),
          ),
      )
      // Admin console (role-gated per handler via the AdminUser extractor)
      .service(
        web::scope("/admin")
          .route(
            "/products",
            web::post().to(crate::web::handlers::admin_handlers::create_product_handler),
          )
          .route(
            "/products/{product_id}",
            web::put().to(crate::web::handlers::admin_handlers::update_product_handler),
          )
          .route(
            "/products/{product_id}",
            web::delete().to(crate::web::handlers::admin_handlers::delete_product_handler),
          )
          .route(
            "/orders",
            web::get().to(crate::web::handlers::admin_handlers::list_all_orders_handler),
          )
          .route(
            "/stats",
            web::get().to(crate::web::handlers::admin_handlers::order_stats_handler),
          ),
      ),
  );
}
