pub mod auth;
pub mod health;
pub mod oauth;
pub mod tasks;

use crate::auth::AuthMiddleware;
use actix_web::web;

/// Routes mounted under the `/api/v1` prefix.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::me)
            .service(oauth::yandex_config)
            .service(oauth::yandex_login)
            .service(oauth::yandex_callback),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::statistics)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
