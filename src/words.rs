use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{Example, NewExample, NewWord, Word, WordUpdate};
use crate::store::DictStore;

#[derive(Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    fn ok(message: &str) -> Json<ApiResponse> {
        Json(ApiResponse {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Serialize)]
pub struct WordDetail {
    #[serde(flatten)]
    pub word: Word,
    pub examples: Vec<Example>,
}

pub async fn list_words(State(store): State<Arc<DictStore>>) -> Json<Vec<Word>> {
    Json(store.all_words())
}

pub async fn create_word(
    State(store): State<Arc<DictStore>>,
    Json(payload): Json<NewWord>,
) -> Result<Json<Word>, ApiError> {
    if payload.chinese.trim().is_empty() {
        return Err(ApiError::BadRequest("Chinese text is required".to_string()));
    }
    Ok(Json(store.create_word(payload)))
}

pub async fn get_word(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
) -> Result<Json<WordDetail>, ApiError> {
    let word = store
        .get_word(id)
        .ok_or_else(|| ApiError::NotFound(format!("Word {} not found", id)))?;
    // Opening a card counts as access.
    store.touch_word(id)?;
    let examples = store.examples_for_word(id);
    Ok(Json(WordDetail { word, examples }))
}

pub async fn update_word(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<WordUpdate>,
) -> Result<Json<Word>, ApiError> {
    Ok(Json(store.update_word(id, payload)?))
}

pub async fn delete_word(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.delete_word(id)?;
    Ok(ApiResponse::ok("Word deleted successfully"))
}

pub async fn toggle_favorite(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
) -> Result<Json<Word>, ApiError> {
    let favorite = !store.is_favorite(id);
    Ok(Json(store.set_favorite(id, favorite)?))
}

pub async fn list_favorites(State(store): State<Arc<DictStore>>) -> Json<Vec<Word>> {
    Json(store.favorites())
}

pub async fn list_examples(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Example>>, ApiError> {
    if store.get_word(id).is_none() {
        return Err(ApiError::NotFound(format!("Word {} not found", id)));
    }
    Ok(Json(store.examples_for_word(id)))
}

pub async fn add_example(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewExample>,
) -> Result<Json<Example>, ApiError> {
    Ok(Json(store.add_example(id, payload)?))
}

pub async fn update_example(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewExample>,
) -> Result<Json<Example>, ApiError> {
    Ok(Json(store.update_example(id, payload)?))
}

pub async fn delete_example(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.delete_example(id)?;
    Ok(ApiResponse::ok("Example deleted successfully"))
}
