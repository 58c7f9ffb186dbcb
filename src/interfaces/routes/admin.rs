use actix_web::web;

use crate::{
    entities::{blog_post::BlogPost, certificate::Certificate, hackathon::Hackathon, project::Project},
    handlers::admin::{self, ListEntity},
    middlewares::admin_gate::AdminGate,
};

fn list_routes<E: ListEntity>(path: &str) -> actix_web::Scope {
    web::scope(path)
        .service(web::resource("").route(web::get().to(admin::list_records::<E>)))
        .service(web::resource("/new").route(web::get().to(admin::new_record::<E>)))
        .service(web::resource("/edit").route(web::post().to(admin::edit_record::<E>)))
        .service(web::resource("/save").route(web::post().to(admin::save_records::<E>)))
        .service(web::resource("/{record_id}").route(web::delete().to(admin::delete_record::<E>)))
}

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(AdminGate)
            .service(web::resource("/dashboard").route(web::get().to(admin::dashboard)))
            .service(list_routes::<Project>("/projects"))
            .service(list_routes::<BlogPost>("/blog-posts"))
            .service(list_routes::<Certificate>("/certificates"))
            .service(list_routes::<Hackathon>("/hackathons"))
            .service(
                web::resource("/profile")
                    .route(web::get().to(admin::get_profile))
                    .route(web::put().to(admin::put_profile))
            )
            .service(
                web::resource("/coding-profile")
                    .route(web::get().to(admin::get_coding_profile))
                    .route(web::put().to(admin::put_coding_profile))
            )
            .service(
                web::resource("/coding-profile/json")
                    .route(web::post().to(admin::put_coding_profile_json))
            )
    );
}
