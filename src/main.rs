use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

mod decks;
mod error;
mod loader;
mod models;
mod pinyin;
mod search;
mod store;
mod words;

use models::Stats;
use store::DictStore;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let store = Arc::new(DictStore::new());

    // Optional bundled dictionary, loaded at startup like the original word
    // list; the service starts empty when the file is absent.
    if let Ok(dict_file) = std::env::var("DICT_FILE") {
        match loader::load_ndjson(&dict_file) {
            Ok(entries) => {
                let count = entries.len();
                for entry in entries {
                    store.create_word(entry);
                }
                log::info!("Loaded {} words from {}", count, dict_file);
            }
            Err(e) => {
                log::error!("Failed to load dictionary {}: {}", dict_file, e);
            }
        }
    }

    let words_router = Router::new()
        .route("/", get(words::list_words).post(words::create_word))
        .route(
            "/{id}",
            get(words::get_word)
                .put(words::update_word)
                .delete(words::delete_word),
        )
        .route("/{id}/favorite", post(words::toggle_favorite))
        .route(
            "/{id}/examples",
            get(words::list_examples).post(words::add_example),
        );

    let decks_router = Router::new()
        .route("/", get(decks::list_decks).post(decks::create_deck))
        .route("/add-word", post(decks::add_word_to_deck))
        .route("/remove-word", post(decks::remove_word_from_deck))
        .route("/{id}", get(decks::view_deck).delete(decks::delete_deck));

    let dictionaries_router = Router::new()
        .route(
            "/",
            get(decks::list_dictionaries).post(decks::create_dictionary),
        )
        .route(
            "/{id}",
            axum::routing::put(decks::update_dictionary).delete(decks::delete_dictionary),
        )
        .route("/{id}/toggle", post(decks::toggle_dictionary))
        .route("/{id}/words", get(decks::dictionary_words));

    let api_router = Router::new()
        .route("/search", get(search::search_api))
        .route("/favorites", get(words::list_favorites))
        .route("/stats", get(get_stats))
        .route(
            "/examples/{id}",
            axum::routing::put(words::update_example).delete(words::delete_example),
        )
        .nest("/words", words_router)
        .nest("/decks", decks_router)
        .nest("/dictionaries", dictionaries_router);

    let app = Router::new()
        .nest("/api", api_router)
        .with_state(store);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".into());
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    println!("Server running on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn get_stats(State(store): State<Arc<DictStore>>) -> Json<Stats> {
    Json(store.stats())
}
