pub mod apply;
pub mod record;
pub mod route;
pub mod schedule;
pub mod user;
pub mod work_pattern;
