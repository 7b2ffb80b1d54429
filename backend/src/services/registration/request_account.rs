use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::info;
use regex::Regex;
use registration_common::model::account_request::AccountRequest;
use registration_common::model::data_structure::UserDataStructure;
use registration_common::requests::{AccountRequestCreated, RequestAccountForm};

use crate::components::user::NewUser;
use crate::components::user_template_version_manager as vm_api;
use crate::components::{account_request_metadata, user_data_structure};
use crate::error::{RegistrationError, Result};
use crate::password::hash_password;
use crate::services::{blocking, AppState};
use crate::xsd::generate_form;

const USERNAME_MAX_LENGTH: usize = 150;
const PASSWORD_MIN_LENGTH: usize = 8;

/// Record an account request and answer `201 Created` with where to continue.
pub async fn process(state: web::Data<AppState>, form: web::Json<RequestAccountForm>) -> impl Responder {
    match request_new_account(state, form.into_inner()).await {
        Ok(created) => HttpResponse::Created().json(created),
        Err(e) => e.error_response(),
    }
}

/// Field errors of the public request form, empty when the form is valid.
fn validate_form(form: &RequestAccountForm) -> Result<Vec<String>> {
    let username_re = Regex::new(r"^[\w.@+-]+$").map_err(|e| RegistrationError::Model(e.to_string()))?;
    let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_err(|e| RegistrationError::Model(e.to_string()))?;

    let mut errors = Vec::new();
    if form.username.is_empty() || form.username.chars().count() > USERNAME_MAX_LENGTH {
        errors.push(format!(
            "username: required, {} characters or fewer.",
            USERNAME_MAX_LENGTH
        ));
    } else if !username_re.is_match(&form.username) {
        errors.push("username: letters, digits and @/./+/-/_ only.".to_string());
    }
    if form.firstname.trim().is_empty() {
        errors.push("firstname: this field is required.".to_string());
    }
    if form.lastname.trim().is_empty() {
        errors.push("lastname: this field is required.".to_string());
    }
    if !email_re.is_match(form.email.trim()) {
        errors.push("email: enter a valid email address.".to_string());
    }
    if form.password1 != form.password2 {
        errors.push("password2: the two password fields didn't match.".to_string());
    } else if form.password1.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(format!(
            "password1: the password must contain at least {} characters.",
            PASSWORD_MIN_LENGTH
        ));
    }
    Ok(errors)
}

async fn request_new_account(state: web::Data<AppState>, form: RequestAccountForm) -> Result<AccountRequestCreated> {
    let errors = validate_form(&form)?;
    if !errors.is_empty() {
        return Err(RegistrationError::Validation(errors));
    }

    let db = state.db.clone();
    let (request, data_structure) = blocking(move || {
        let new_user = NewUser {
            username: form.username.clone(),
            first_name: form.firstname.trim().to_string(),
            last_name: form.lastname.trim().to_string(),
            email: form.email.trim().to_string(),
            password: hash_password(&form.password1)?,
        };
        db.with_transaction(|conn| create_request(conn, &new_user))
    })
    .await?;
    info!(
        "Account request {} recorded for {}",
        request.id, request.username
    );

    let mailer = state.mailer.clone();
    let server_uri = state.settings.server_uri.clone();
    let notified = request.clone();
    blocking(move || {
        account_request_metadata::notify_administrators(mailer.as_ref(), &notified, &server_uri);
        Ok(())
    })
    .await?;

    Ok(AccountRequestCreated {
        url: format!(
            "/registration/request-metadata/{}/{}",
            data_structure.id, request.id
        ),
        data_structure_id: data_structure.id,
        account_request_id: request.id,
    })
}

/// Inactive user, account request and empty registration form, all or nothing.
fn create_request(conn: &rusqlite::Connection, new_user: &NewUser) -> Result<(AccountRequest, UserDataStructure)> {
    let manager = vm_api::get_default_version_manager(conn).map_err(|e| match e {
        RegistrationError::DoesNotExist(message) => RegistrationError::Unavailable(message),
        other => other,
    })?;
    let template = vm_api::get_current_template(conn, &manager)?;

    let request = account_request_metadata::create_account_request(conn, new_user)?;

    let mut data_structure = user_data_structure::new(&new_user.username, &template.id, &new_user.username);
    user_data_structure::upsert(conn, &mut data_structure)?;
    let form = generate_form(&template.content, None)?;
    let root_id = user_data_structure::update_data_structure_root(conn, &data_structure.id, &form)?;
    data_structure.data_structure_element_root = Some(root_id);

    Ok((request, data_structure))
}
