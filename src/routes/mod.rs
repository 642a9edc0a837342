// Route exports
pub mod triage;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(triage::configure);
}
