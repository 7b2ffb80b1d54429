use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use futures_util::StreamExt;
use log::info;

use crate::components::user_template_version_manager as vm_api;
use crate::error::{RegistrationError, Result};
use crate::services::{blocking, require_admin, AppState};

/// One part of a multipart form.
struct Part {
    filename: Option<String>,
    bytes: Vec<u8>,
}

/// Collect every part of a multipart form, keyed by field name.
async fn read_parts(mut payload: Multipart, limit: usize) -> Result<HashMap<String, Part>> {
    let mut parts = HashMap::new();
    let mut total = 0usize;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| RegistrationError::Api(format!("Invalid upload: {}", e)))?;
        let Some(name) = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
        else {
            continue;
        };
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| RegistrationError::Api(format!("Invalid upload: {}", e)))?;
            total += chunk.len();
            if total > limit {
                return Err(RegistrationError::Api("The upload is too large.".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }
        parts.insert(name, Part { filename, bytes });
    }
    Ok(parts)
}

/// The XSD file sent in field `field`, as (filename, content).
fn xsd_file(parts: &mut HashMap<String, Part>, field: &str) -> Result<(String, String)> {
    let part = parts
        .remove(field)
        .ok_or_else(|| RegistrationError::Api(format!("The {} field is required.", field)))?;
    let filename = part
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| RegistrationError::Api("The uploaded file has no name.".to_string()))?;
    if !filename.to_ascii_lowercase().ends_with(".xsd") {
        return Err(RegistrationError::Api("The file must end with .xsd".to_string()));
    }
    let content = String::from_utf8(part.bytes)
        .map_err(|_| RegistrationError::Xsd("The uploaded file is not valid UTF-8.".to_string()))?;
    Ok((filename, content))
}

fn text_field(parts: &mut HashMap<String, Part>, field: &str) -> Result<String> {
    parts
        .remove(field)
        .and_then(|part| String::from_utf8(part.bytes).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RegistrationError::Api(format!("The {} field is required.", field)))
}

/// Multipart `name` and `upload_file`: a new global template.
pub async fn upload_template(req: HttpRequest, state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    if let Err(e) = require_admin(&req, &state.settings) {
        return e.error_response();
    }
    let result = async {
        let mut parts = read_parts(payload, state.settings.payload_limit).await?;
        let title = text_field(&mut parts, "name")?;
        let (filename, content) = xsd_file(&mut parts, "upload_file")?;
        let db = state.db.clone();
        blocking(move || db.with_transaction(|conn| vm_api::insert(conn, &title, &filename, &content))).await
    }
    .await;
    match result {
        Ok(manager) => {
            info!("Template {} uploaded", manager.title);
            HttpResponse::Created().json(manager)
        }
        Err(e) => e.error_response(),
    }
}

/// Multipart `xsd_file`: a new version of template `{vm}`.
pub async fn upload_version(
    req: HttpRequest,
    state: web::Data<AppState>,
    vm: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    if let Err(e) = require_admin(&req, &state.settings) {
        return e.error_response();
    }
    let vm = vm.into_inner();
    let result = async {
        let mut parts = read_parts(payload, state.settings.payload_limit).await?;
        let (filename, content) = xsd_file(&mut parts, "xsd_file")?;
        let db = state.db.clone();
        blocking(move || db.with_transaction(|conn| vm_api::insert_version(conn, &vm, &filename, &content))).await
    }
    .await;
    match result {
        Ok(upload) => {
            info!("Version {} added to template {}", upload.to, upload.version_manager_id);
            HttpResponse::Created().json(upload)
        }
        Err(e) => e.error_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user_template_version_manager::tests::XSD;
    use crate::services::admin::configure_routes;
    use crate::services::admin::tests::authorized;
    use crate::services::tests::seeded_state;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use registration_common::model::template::{VersionManager, VersionUpload};

    const BOUNDARY: &str = "registration-boundary";

    /// A multipart body with text fields and one file field.
    fn multipart(fields: &[(&str, &str)], file: (&str, &str, &str)) -> Vec<u8> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            ));
        }
        let (name, filename, content) = file;
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/xml\r\n\r\n{}\r\n--{}--\r\n",
            BOUNDARY, name, filename, content, BOUNDARY
        ));
        body.into_bytes()
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
        authorized(test::TestRequest::post().uri(uri))
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn templates_and_versions_are_uploaded() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(seeded_state()))
                .service(configure_routes()),
        )
        .await;

        let body = multipart(&[("name", "Partners")], ("upload_file", "partner.xsd", XSD));
        let req = upload_request("/api/admin/templates/upload", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let manager: VersionManager = test::read_body_json(resp).await;
        assert_eq!(manager.title, "Partners");
        assert_eq!(manager.versions.len(), 1);

        let body = multipart(&[], ("xsd_file", "partner-v2.xsd", XSD));
        let uri = format!("/api/admin/templates/{}/versions/upload", manager.id);
        let req = upload_request(&uri, body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let upload: VersionUpload = test::read_body_json(resp).await;
        assert_eq!(upload.from, manager.versions);
        assert_ne!(upload.to, manager.versions[0]);
    }

    #[actix_web::test]
    async fn bad_uploads_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(seeded_state()))
                .service(configure_routes()),
        )
        .await;

        let body = multipart(&[("name", "Partners")], ("upload_file", "partner.txt", XSD));
        let req = upload_request("/api/admin/templates/upload", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = multipart(&[("name", "Broken")], ("upload_file", "broken.xsd", "<xs:schema"));
        let req = upload_request("/api/admin/templates/upload", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = multipart(&[("name", "user.xsd")], ("upload_file", "user.xsd", XSD));
        let req = upload_request("/api/admin/templates/upload", body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
