use actix_web::web;

use crate::handlers::applies;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/routes").route("", web::post().to(applies::create_route)))
        .service(
            web::scope("/applies")
                // POST takes an apply type name in place of the id
                .route("/{id}", web::get().to(applies::get_apply))
                .route("/{id}", web::post().to(applies::submit_apply))
                .route("/{id}/options", web::get().to(applies::get_apply_options))
                .route("/{id}/approvers", web::get().to(applies::get_current_approvers))
                .route("/{id}/approve", web::post().to(applies::approve_apply))
                .route("/{id}/reject", web::post().to(applies::reject_apply)),
        );
}
