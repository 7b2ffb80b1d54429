use actix_web::{web, HttpResponse, Responder, ResponseError};
use registration_common::requests::{ElementValue, ElementValueQuery, ElementValueReplaced, ElementValueUpdate};

use crate::components::data_structure_element;
use crate::services::{blocking, AppState};

/// `GET ?id=`: current value of a form element.
pub async fn get_value(state: web::Data<AppState>, query: web::Query<ElementValueQuery>) -> impl Responder {
    let db = state.db.clone();
    let id = query.into_inner().id;
    let result = blocking(move || db.with_conn(|conn| data_structure_element::get_by_id(conn, &id))).await;
    match result {
        Ok(element) => HttpResponse::Ok().json(ElementValue { value: element.value }),
        Err(e) => e.error_response(),
    }
}

/// `POST {id, value}`: replace the value of a form element.
pub async fn set_value(state: web::Data<AppState>, update: web::Json<ElementValueUpdate>) -> impl Responder {
    let db = state.db.clone();
    let update = update.into_inner();
    let result = blocking(move || {
        db.with_transaction(|conn| data_structure_element::set_value(conn, &update.id, &update.value))
    })
    .await;
    match result {
        Ok(replaced) => HttpResponse::Ok().json(ElementValueReplaced { replaced }),
        Err(e) => e.error_response(),
    }
}
