use actix_web::web;

use crate::handlers::{contact, content, navigation};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/home").route(web::get().to(content::home)))
        .service(web::resource("/about").route(web::get().to(content::about)))
        .service(web::resource("/profile").route(web::get().to(content::profile)))
        .service(
            web::scope("/projects")
                .service(web::resource("").route(web::get().to(content::list_projects)))
                .service(web::resource("/{project_id}").route(web::get().to(content::get_project)))
        )
        .service(
            web::scope("/blog")
                .service(web::resource("").route(web::get().to(content::list_posts)))
                .service(web::resource("/{slug}").route(web::get().to(content::get_post)))
        )
        .service(web::resource("/certifications").route(web::get().to(content::list_certificates)))
        .service(web::resource("/hackathons").route(web::get().to(content::list_hackathons)))
        .service(web::resource("/coding-profile").route(web::get().to(content::coding_profile)))
        .service(web::resource("/content/{table}/refresh").route(web::post().to(content::refresh)))
        .service(web::resource("/contact").route(web::post().to(contact::submit_contact_form)))
        .service(web::resource("/navigate").route(web::get().to(navigation::navigate)));
}
