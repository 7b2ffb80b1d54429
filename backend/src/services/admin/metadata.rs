use actix_web::{web, HttpRequest, Responder};

use crate::components::user_metadata;
use crate::services::admin::{json_response, run_admin};
use crate::services::AppState;

/// A finalized registration document with its XML content.
pub async fn view(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    json_response(run_admin(&req, &state, move |db| db.with_conn(|conn| user_metadata::get_by_id(conn, &id))).await)
}
