use actix_web::web;

pub mod applies;
pub mod attendance;
pub mod records;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(applies::configure)
            .configure(records::configure)
            .configure(attendance::configure),
    );
}
