use actix_web::{web, HttpRequest, Responder};
use log::info;
use registration_common::requests::{EditTitleRequest, SetDefaultQuery};

use crate::components::user_template_version_manager as vm_api;
use crate::services::admin::{json_response, run_admin};
use crate::services::AppState;

/// Global templates, split into available and disabled ones.
pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    json_response(run_admin(&req, &state, |db| db.with_conn(vm_api::get_template_list)).await)
}

pub async fn versions(req: HttpRequest, state: web::Data<AppState>, vm: web::Path<String>) -> impl Responder {
    let vm = vm.into_inner();
    json_response(run_admin(&req, &state, move |db| db.with_conn(|conn| vm_api::get_versions(conn, &vm))).await)
}

pub async fn disable(req: HttpRequest, state: web::Data<AppState>, vm: web::Path<String>) -> impl Responder {
    let vm = vm.into_inner();
    json_response(run_admin(&req, &state, move |db| db.with_transaction(|conn| vm_api::disable(conn, &vm))).await)
}

pub async fn restore(req: HttpRequest, state: web::Data<AppState>, vm: web::Path<String>) -> impl Responder {
    let vm = vm.into_inner();
    json_response(run_admin(&req, &state, move |db| db.with_transaction(|conn| vm_api::restore(conn, &vm))).await)
}

pub async fn edit_title(
    req: HttpRequest,
    state: web::Data<AppState>,
    vm: web::Path<String>,
    body: web::Json<EditTitleRequest>,
) -> impl Responder {
    let vm = vm.into_inner();
    let title = body.into_inner().title;
    json_response(
        run_admin(&req, &state, move |db| {
            db.with_transaction(|conn| vm_api::edit_title(conn, &vm, &title))
        })
        .await,
    )
}

/// `?id=` names the template used for new registration forms.
pub async fn set_default(req: HttpRequest, state: web::Data<AppState>, query: web::Query<SetDefaultQuery>) -> impl Responder {
    let id = query.into_inner().id;
    let result = run_admin(&req, &state, move |db| {
        db.with_transaction(|conn| vm_api::set_default_version_manager(conn, &id))
    })
    .await;
    if let Ok(manager) = &result {
        info!("Template {} is now the registration default", manager.title);
    }
    json_response(result)
}

pub async fn set_current_version(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    json_response(run_admin(&req, &state, move |db| db.with_transaction(|conn| vm_api::set_current(conn, &id))).await)
}

pub async fn disable_version(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    json_response(
        run_admin(&req, &state, move |db| {
            db.with_transaction(|conn| vm_api::disable_version(conn, &id))
        })
        .await,
    )
}

pub async fn restore_version(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    json_response(
        run_admin(&req, &state, move |db| {
            db.with_transaction(|conn| vm_api::restore_version(conn, &id))
        })
        .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user_template_version_manager::tests::XSD;
    use crate::services::admin::configure_routes;
    use crate::services::admin::tests::authorized;
    use crate::services::tests::seeded_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use registration_common::model::template::{TemplateList, TemplateVersion, VersionManager};

    #[actix_web::test]
    async fn templates_are_managed() {
        let state = seeded_state();
        let second = state
            .db
            .with_transaction(|conn| vm_api::insert(conn, "Partners", "partner.xsd", XSD))
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let req = authorized(test::TestRequest::get().uri("/api/admin/templates")).to_request();
        let list: TemplateList = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.available.len(), 2);
        assert!(list.disabled.is_empty());

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/{}/edit", second.id)))
            .set_json(EditTitleRequest {
                title: "External partners".to_string(),
            })
            .to_request();
        let renamed: VersionManager = test::call_and_read_body_json(&app, req).await;
        assert_eq!(renamed.title, "External partners");

        let req = authorized(test::TestRequest::get().uri(&format!("/api/admin/templates/{}/versions", second.id)))
            .to_request();
        let versions: Vec<TemplateVersion> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(versions[0].display_name, "External partners (Version 1)");

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/{}/disable", second.id)))
            .to_request();
        let disabled: VersionManager = test::call_and_read_body_json(&app, req).await;
        assert!(disabled.is_disabled);

        let req = authorized(test::TestRequest::get().uri("/api/admin/templates")).to_request();
        let list: TemplateList = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.disabled.len(), 1);

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/set-default?id={}", second.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/{}/restore", second.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/set-default?id={}", second.id)))
            .to_request();
        let default: VersionManager = test::call_and_read_body_json(&app, req).await;
        assert!(default.is_default);

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/{}/disable", second.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn current_version_cannot_be_disabled() {
        let state = seeded_state();
        let current = state
            .db
            .with_conn(|conn| {
                let manager = vm_api::get_default_version_manager(conn)?;
                Ok(manager.current_version.unwrap_or_default())
            })
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(configure_routes()),
        )
        .await;

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/versions/{}/disable", current)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/templates/versions/{}/current", current)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/templates/versions/{}/restore", current))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
