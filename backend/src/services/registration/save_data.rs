use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::{debug, info};
use registration_common::model::data_structure::UserDataStructure;
use registration_common::requests::{SaveDataRequest, SaveDataResponse};
use rusqlite::Connection;

use crate::components::{
    account_request_metadata, data_structure_element, template, user_data_structure, user_metadata, workspace,
};
use crate::error::{RegistrationError, Result};
use crate::services::{blocking, AppState};
use crate::xsd::{render_xml, validate_xml_data, Schema};

pub async fn process(state: web::Data<AppState>, payload: web::Json<SaveDataRequest>) -> impl Responder {
    match save_data(state, payload.into_inner()).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => e.error_response(),
    }
}

async fn save_data(state: web::Data<AppState>, payload: SaveDataRequest) -> Result<SaveDataResponse> {
    let db = state.db.clone();
    let data_id = blocking(move || {
        // The rendering is kept even when it does not validate.
        let (data_structure, xml_content) = db.with_transaction(|conn| store_rendering(conn, &payload.id))?;
        let xsd = db.with_conn(|conn| Ok(template::get_by_id(conn, &data_structure.template_id)?.content))?;

        let schema = Schema::compile(&xsd)?;
        if let Some(errors) = validate_xml_data(&schema, &xml_content) {
            debug!(
                "Registration form {} is not valid yet: {} error(s)",
                data_structure.id,
                errors.len()
            );
            return Err(RegistrationError::Validation(errors));
        }

        db.with_transaction(|conn| promote(conn, &payload.id, &payload.metadata, xml_content))
    })
    .await?;
    info!("Registration data {} saved", data_id);
    Ok(SaveDataResponse { data_id })
}

/// Render the form tree and store the result as the form string.
fn store_rendering(conn: &Connection, data_structure_id: &str) -> Result<(UserDataStructure, String)> {
    let mut data_structure = user_data_structure::get_by_id(conn, data_structure_id)?;
    let root_id = data_structure
        .data_structure_element_root
        .clone()
        .ok_or_else(|| RegistrationError::Api("The form has not been generated yet.".to_string()))?;
    let root = data_structure_element::load_tree(conn, &root_id)?;
    let xml_content = render_xml(&root)?;
    data_structure.form_string = Some(xml_content.clone());
    user_data_structure::upsert(conn, &mut data_structure)?;
    Ok((data_structure, xml_content))
}

/// Turn a validated scratch document into metadata of the account request.
///
/// The scratch document is deleted in the same transaction, so a second
/// submission finds nothing to promote.
fn promote(conn: &Connection, data_structure_id: &str, account_id: &str, xml_content: String) -> Result<String> {
    let data_structure = user_data_structure::get_by_id(conn, data_structure_id)?;
    let request = account_request_metadata::get_by_id(conn, account_id)?;
    if data_structure.user != request.username {
        return Err(RegistrationError::AccessControl(
            "This form does not belong to the account request.".to_string(),
        ));
    }
    let global = workspace::get_global_workspace(conn)?;

    let mut metadata = user_metadata::new(
        &data_structure.id,
        &data_structure.name,
        &data_structure.template_id,
        &data_structure.user,
        Some(&global.id),
        xml_content,
    );
    user_metadata::upsert(conn, &mut metadata)?;
    account_request_metadata::insert_metadata(conn, &request.id, &metadata.id)?;
    user_data_structure::delete(conn, &data_structure.id)?;
    Ok(metadata.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::GLOBAL_WORKSPACE_ID;
    use crate::services::registration::configure_routes;
    use crate::services::registration::request_account::tests::requested;
    use crate::services::registration::tests::first_input;
    use crate::services::tests::{app_state, seeded_state};
    use crate::system::insert_registry_user_schema;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;

    fn fill_first_input(state: &AppState, scratch: &UserDataStructure, value: &str) {
        state
            .db
            .with_conn(|conn| {
                let root = scratch.data_structure_element_root.as_deref().unwrap_or_default();
                let tree = data_structure_element::load_tree(conn, root)?;
                let input = first_input(&tree).and_then(|input| input.id.clone()).unwrap();
                data_structure_element::set_value(conn, &input, value)?;
                Ok(())
            })
            .unwrap();
    }

    #[actix_web::test]
    async fn valid_form_becomes_metadata_of_the_request() {
        let state = seeded_state();
        let (request, scratch) = requested(&state, "ada");
        fill_first_input(&state, &scratch, "NIST");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let payload = SaveDataRequest {
            id: scratch.id.clone(),
            metadata: request.id.clone(),
        };
        let req = test::TestRequest::post()
            .uri("/registration/save-data")
            .set_json(&payload)
            .to_request();
        let saved: SaveDataResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(saved.data_id, scratch.id);

        state
            .db
            .with_conn(|conn| {
                let metadata = user_metadata::get_by_id(conn, &saved.data_id)?;
                assert_eq!(metadata.title, "ada");
                assert_eq!(metadata.user_id, "ada");
                assert_eq!(metadata.workspace_id.as_deref(), Some(GLOBAL_WORKSPACE_ID));
                assert!(metadata.xml_content.contains("NIST"));
                let request = account_request_metadata::get_by_id(conn, &request.id)?;
                assert_eq!(request.metadata_id.as_deref(), Some(saved.data_id.as_str()));
                assert!(user_data_structure::get_by_id(conn, &scratch.id).is_err());
                Ok(())
            })
            .unwrap();

        // Saving twice does not find the scratch document anymore.
        let req = test::TestRequest::post()
            .uri("/registration/save-data")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_form_keeps_the_scratch_document() {
        let state = app_state();
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="user"><xs:complexType><xs:sequence>
    <xs:element name="age" type="xs:integer"/>
  </xs:sequence></xs:complexType></xs:element>
</xs:schema>"#;
        state
            .db
            .with_transaction(|conn| insert_registry_user_schema(conn, "user.xsd", xsd))
            .unwrap();
        let (request, scratch) = requested(&state, "ada");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let payload = SaveDataRequest {
            id: scratch.id.clone(),
            metadata: request.id.clone(),
        };
        let req = test::TestRequest::post()
            .uri("/registration/save-data")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "validation_error");
        assert!(!body["errors"].as_array().unwrap().is_empty());

        state
            .db
            .with_conn(|conn| {
                let kept = user_data_structure::get_by_id(conn, &scratch.id)?;
                assert!(kept.form_string.is_some());
                assert!(user_metadata::get_all(conn, &[])?.is_empty());
                assert!(account_request_metadata::get_by_id(conn, &request.id)?.metadata_id.is_none());
                Ok(())
            })
            .unwrap();

        fill_first_input(&state, &scratch, "36");
        let req = test::TestRequest::post()
            .uri("/registration/save-data")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
