use actix_web::web;

use crate::handlers::attendance;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/attendance").route("", web::get().to(attendance::get_attendance)));
}
