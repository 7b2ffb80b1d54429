use actix_web::{web, HttpResponse, Responder, ResponseError};
use registration_common::requests::AccountCreationContext;
use rusqlite::Connection;

use crate::components::{account_request_metadata, data_structure_element, template, user_data_structure};
use crate::error::{RegistrationError, Result};
use crate::services::{blocking, AppState};
use crate::xsd::{generate_form, render_xml};

pub async fn process(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (data_structure_id, account_id) = path.into_inner();
    let db = state.db.clone();
    let result = blocking(move || {
        db.with_transaction(|conn| load_registration_form(conn, &data_structure_id, &account_id))
    })
    .await;
    match result {
        Ok(context) => HttpResponse::Ok().json(context),
        Err(e) => e.error_response(),
    }
}

/// Rebuild the form of a scratch document from its template and content.
///
/// The current tree is rendered into `form_string` first, so values entered
/// since the last save survive the regeneration.
fn load_registration_form(conn: &Connection, data_structure_id: &str, account_id: &str) -> Result<AccountCreationContext> {
    let request = account_request_metadata::get_by_id(conn, account_id)?;
    let mut data_structure = user_data_structure::get_by_id(conn, data_structure_id)?;
    if data_structure.user != request.username {
        return Err(RegistrationError::AccessControl(
            "This form does not belong to the account request.".to_string(),
        ));
    }
    let template = template::get_by_id(conn, &data_structure.template_id)?;

    if let Some(root_id) = data_structure.data_structure_element_root.as_deref() {
        let current = data_structure_element::load_tree(conn, root_id)?;
        data_structure.form_string = Some(render_xml(&current)?);
        user_data_structure::upsert(conn, &mut data_structure)?;
    }

    let form = generate_form(&template.content, data_structure.form_string.as_deref())?;
    let root_id = user_data_structure::update_data_structure_root(conn, &data_structure.id, &form)?;

    Ok(AccountCreationContext {
        edit: data_structure.data_id.is_some(),
        form: data_structure_element::load_tree(conn, &root_id)?,
        data_structure: user_data_structure::get_by_id(conn, &data_structure.id)?,
        account_id: request.id,
    })
}
