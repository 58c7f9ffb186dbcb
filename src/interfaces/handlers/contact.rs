use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::contact_message::ContactForm,
    errors::AppError,
    utils::get_client_ip::get_client_ip,
    AppState,
};

#[instrument(skip(request, state, form), fields(client_ip = tracing::field::Empty))]
pub async fn submit_contact_form(
    request: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<impl Responder, AppError> {
    let client_ip = get_client_ip(&request, state.config.trust_forwarded_for);
    tracing::Span::current().record("client_ip", client_ip.as_str());

    let receipt = state.contact.submit(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(receipt))
}
