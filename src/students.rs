use axum::body::Bytes;
use axum::extract::Path;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::err::{self, Error};
use crate::models::{new_student_id, parse_student_id, Student, StudentChanges};
use crate::store::SharedStore;
use crate::Payload;

/// Reported when get-by-id matches nothing.
pub const NO_DOCUMENTS: &str = "no documents in result";

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:id",
            get(read_student).put(update_student).delete(delete_student),
        )
        .fallback(err::handler404.into_service())
        .layer(Extension(store))
}

async fn list_students(Extension(store): Extension<SharedStore>) -> Payload<Json<Vec<Student>>> {
    let students = store.list().await?;
    Ok(Json(students))
}

async fn read_student(
    Path(id): Path<String>,
    Extension(store): Extension<SharedStore>,
) -> Payload<Json<Student>> {
    match store.get(&id).await {
        Ok(Some(student)) => Ok(Json(student)),
        Ok(None) => Err(Error::not_found(NO_DOCUMENTS)),
        Err(err) => Err(Error::not_found(err.to_string())),
    }
}

async fn create_student(
    Extension(store): Extension<SharedStore>,
    body: Bytes,
) -> Payload<StatusCode> {
    let changes: StudentChanges = serde_json::from_slice(&body)?;
    let student = changes.into_student(new_student_id());
    store.insert(&student).await?;
    log::debug!("Created student {}", student.id);
    Ok(StatusCode::CREATED)
}

async fn update_student(
    Path(id): Path<String>,
    Extension(store): Extension<SharedStore>,
    body: Bytes,
) -> Payload<StatusCode> {
    let changes: StudentChanges = serde_json::from_slice(&body)?;
    let id = parse_student_id(&id).ok_or_else(|| Error::bad_request("Invalid student ID"))?;
    store.update(id, &changes).await?;
    log::debug!("Updated student {}", id);
    Ok(StatusCode::OK)
}

async fn delete_student(
    Path(id): Path<String>,
    Extension(store): Extension<SharedStore>,
) -> Payload<StatusCode> {
    store.delete(&id).await?;
    log::debug!("Deleted student {}", id);
    Ok(StatusCode::OK)
}
