use actix_web::{web, HttpRequest, Responder};
use registration_common::requests::ChangeOwnerRequest;

use crate::components::user_data_structure;
use crate::services::admin::{json_response, run_admin};
use crate::services::AppState;

/// Unfinished registration forms, oldest first.
pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    json_response(run_admin(&req, &state, |db| db.with_conn(user_data_structure::get_all)).await)
}

pub async fn change_owner(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<ChangeOwnerRequest>,
) -> impl Responder {
    let id = id.into_inner();
    let user = body.into_inner().user;
    json_response(
        run_admin(&req, &state, move |db| {
            db.with_transaction(|conn| user_data_structure::change_owner(conn, &id, &user))
        })
        .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::admin::configure_routes;
    use crate::services::admin::tests::authorized;
    use crate::services::registration::request_account::tests::requested;
    use crate::services::tests::seeded_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use registration_common::model::data_structure::UserDataStructure;

    #[actix_web::test]
    async fn forms_are_listed_and_reassigned() {
        let state = seeded_state();
        let (_, scratch) = requested(&state, "ada");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(configure_routes()),
        )
        .await;

        let req = authorized(test::TestRequest::get().uri("/api/admin/data-structures")).to_request();
        let forms: Vec<UserDataStructure> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, scratch.id);

        let uri = format!("/api/admin/data-structures/{}/owner", scratch.id);
        let req = authorized(test::TestRequest::post().uri(&uri))
            .set_json(ChangeOwnerRequest {
                user: "grace".to_string(),
            })
            .to_request();
        let changed: UserDataStructure = test::call_and_read_body_json(&app, req).await;
        assert_eq!(changed.user, "grace");

        let req = authorized(test::TestRequest::post().uri(&uri))
            .set_json(ChangeOwnerRequest { user: " ".to_string() })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
