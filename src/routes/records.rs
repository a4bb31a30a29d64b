use actix_web::web;

use crate::handlers::records;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/records").route("/{record_type}", web::post().to(records::submit_record)),
    );
}
