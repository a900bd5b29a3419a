pub mod auth_handlers;
pub mod logbook_handlers;
pub mod matching_handlers;
pub mod notification_handlers;
pub mod proposal_handlers;
pub mod settings_handlers;
pub mod user_handlers;

use actix_web::web;

/// The full route table, shared by the server binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/me", web::get().to(auth_handlers::me)),
    );
    cfg.service(
        web::scope("/matching")
            .route("/supervisors", web::get().to(matching_handlers::rank_supervisors))
            .route("/duplicate-check", web::get().to(matching_handlers::duplicate_check)),
    );
    cfg.route("/supervisors", web::get().to(user_handlers::list_supervisors));
    cfg.service(
        web::scope("/proposals")
            .route("", web::post().to(proposal_handlers::create))
            .route("", web::get().to(proposal_handlers::list))
            .route("/{id}", web::get().to(proposal_handlers::read))
            .route("/{id}", web::patch().to(proposal_handlers::patch)),
    );
    cfg.service(
        web::scope("/logbooks")
            .route("", web::post().to(logbook_handlers::create))
            .route("", web::get().to(logbook_handlers::list))
            .route("/{id}", web::get().to(logbook_handlers::read))
            .route("/{id}", web::patch().to(logbook_handlers::patch)),
    );
    cfg.service(
        web::scope("/notifications")
            .route("", web::post().to(notification_handlers::create))
            .route("", web::get().to(notification_handlers::list))
            .route("/{id}/read", web::patch().to(notification_handlers::mark_read)),
    );
    cfg.service(
        web::scope("/settings")
            .route("", web::get().to(settings_handlers::show))
            .route("", web::put().to(settings_handlers::update)),
    );
}
