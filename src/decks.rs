use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{Deck, Dictionary, Word};
use crate::store::DictStore;
use crate::words::ApiResponse;

#[derive(Deserialize)]
pub struct CreateDeckRequest {
    pub name: String,
    pub word_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct DeckWordRequest {
    pub deck_id: String,
    pub word_id: i64,
}

#[derive(Serialize)]
pub struct DeckWithWords {
    #[serde(flatten)]
    pub deck: Deck,
    pub words: Vec<Word>,
}

#[derive(Deserialize)]
pub struct DictionaryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "cyan".to_string()
}

// ---- Decks ----

pub async fn list_decks(State(store): State<Arc<DictStore>>) -> Json<Vec<Deck>> {
    Json(store.all_decks())
}

pub async fn create_deck(
    State(store): State<Arc<DictStore>>,
    Json(payload): Json<CreateDeckRequest>,
) -> Result<Json<Deck>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Deck name is required".to_string()));
    }
    let deck = store.create_deck(payload.name);
    if let Some(word_id) = payload.word_id {
        store.add_word_to_deck(&deck.id, word_id)?;
    }
    Ok(Json(deck))
}

pub async fn view_deck(
    State(store): State<Arc<DictStore>>,
    Path(deck_id): Path<String>,
) -> Result<Json<DeckWithWords>, ApiError> {
    let deck = store
        .get_deck(&deck_id)
        .ok_or_else(|| ApiError::NotFound(format!("Deck {} not found", deck_id)))?;
    let words = store.deck_words(&deck_id)?;
    Ok(Json(DeckWithWords { deck, words }))
}

pub async fn delete_deck(
    State(store): State<Arc<DictStore>>,
    Path(deck_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.delete_deck(&deck_id)?;
    Ok(Json(ApiResponse {
        success: true,
        message: "Deck deleted successfully".to_string(),
    }))
}

pub async fn add_word_to_deck(
    State(store): State<Arc<DictStore>>,
    Json(payload): Json<DeckWordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.add_word_to_deck(&payload.deck_id, payload.word_id)?;
    Ok(Json(ApiResponse {
        success: true,
        message: "Word added to deck successfully".to_string(),
    }))
}

pub async fn remove_word_from_deck(
    State(store): State<Arc<DictStore>>,
    Json(payload): Json<DeckWordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.remove_word_from_deck(&payload.deck_id, payload.word_id)?;
    Ok(Json(ApiResponse {
        success: true,
        message: "Word removed from deck successfully".to_string(),
    }))
}

// ---- Dictionaries ----

pub async fn list_dictionaries(State(store): State<Arc<DictStore>>) -> Json<Vec<Dictionary>> {
    Json(store.all_dictionaries())
}

pub async fn create_dictionary(
    State(store): State<Arc<DictStore>>,
    Json(payload): Json<DictionaryRequest>,
) -> Result<Json<Dictionary>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Dictionary name is required".to_string()));
    }
    Ok(Json(store.create_dictionary(
        payload.name,
        payload.description,
        payload.color,
    )))
}

pub async fn update_dictionary(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<String>,
    Json(payload): Json<DictionaryRequest>,
) -> Result<Json<Dictionary>, ApiError> {
    Ok(Json(store.update_dictionary(
        &id,
        payload.name,
        payload.description,
        payload.color,
    )?))
}

pub async fn toggle_dictionary(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<String>,
) -> Result<Json<Dictionary>, ApiError> {
    Ok(Json(store.toggle_dictionary_active(&id)?))
}

pub async fn delete_dictionary(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    store.delete_dictionary(&id)?;
    Ok(Json(ApiResponse {
        success: true,
        message: "Dictionary deleted successfully".to_string(),
    }))
}

pub async fn dictionary_words(
    State(store): State<Arc<DictStore>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Word>>, ApiError> {
    if store.all_dictionaries().iter().all(|d| d.id != id) {
        return Err(ApiError::NotFound(format!("Dictionary {} not found", id)));
    }
    Ok(Json(store.words_by_dictionary(&id)))
}
