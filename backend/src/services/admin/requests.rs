use actix_web::{web, HttpRequest, Responder};
use registration_common::requests::DenyRequest;

use crate::components::account_request_metadata;
use crate::services::admin::{json_response, run_admin};
use crate::services::AppState;

pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    json_response(run_admin(&req, &state, |db| db.with_conn(account_request_metadata::get_all)).await)
}

pub async fn accept(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    let mailer = state.mailer.clone();
    let server_uri = state.settings.server_uri.clone();
    json_response(
        run_admin(&req, &state, move |db| {
            account_request_metadata::accept(db, mailer.as_ref(), &id, &server_uri)
        })
        .await,
    )
}

/// The body is optional; without one the denial mail gives no reason.
pub async fn deny(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: Option<web::Json<DenyRequest>>,
) -> impl Responder {
    let id = id.into_inner();
    let reason = body.and_then(|body| body.into_inner().reason);
    let mailer = state.mailer.clone();
    json_response(
        run_admin(&req, &state, move |db| {
            account_request_metadata::deny(db, mailer.as_ref(), &id, reason.as_deref())
        })
        .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::user;
    use crate::notifications::get_outbox;
    use crate::services::admin::configure_routes;
    use crate::services::admin::tests::authorized;
    use crate::services::registration::request_account::tests::requested;
    use crate::services::tests::seeded_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use registration_common::model::account_request::AccountRequest;

    #[actix_web::test]
    async fn requests_are_listed_and_accepted() {
        let state = seeded_state();
        let (request, _) = requested(&state, "ada");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/admin/requests").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = authorized(test::TestRequest::get().uri("/api/admin/requests")).to_request();
        let pending: Vec<AccountRequest> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].username, "ada");

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/requests/{}/accept", request.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let active = state
            .db
            .with_conn(|conn| Ok(user::get_by_username(conn, "ada")?.is_active))
            .unwrap();
        assert!(active);
        let outbox = get_outbox(&state.db).unwrap();
        assert_eq!(outbox.last().unwrap().subject, "Account approved");
    }

    #[actix_web::test]
    async fn denied_requests_remove_the_account() {
        let state = seeded_state();
        let (request, _) = requested(&state, "ada");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(configure_routes()),
        )
        .await;

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/requests/{}/deny", request.id)))
            .set_json(DenyRequest {
                reason: Some("Unknown organization".to_string()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let exists = state.db.with_conn(|conn| user::exists(conn, "ada")).unwrap();
        assert!(!exists);
        let outbox = get_outbox(&state.db).unwrap();
        assert!(outbox.last().unwrap().body.contains("Unknown organization"));

        let req = authorized(test::TestRequest::post().uri(&format!("/api/admin/requests/{}/deny", request.id)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
