use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dictionary word entry. `pinyin_toned` is always derived from
/// `pinyin_numbered` by the store on every write and never edited by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub chinese: String,
    pub pinyin_numbered: String,
    pub pinyin_toned: String,
    pub definitions: Vec<String>,
    /// HSK proficiency level 1..=6, 0 = not in any HSK list.
    pub hsk_level: u8,
    pub is_favorite: bool,
    pub dictionary_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Payload for creating a word (form submit or dictionary import).
#[derive(Debug, Clone, Deserialize)]
pub struct NewWord {
    pub chinese: String,
    #[serde(default)]
    pub pinyin_numbered: String,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub hsk_level: u8,
    #[serde(default)]
    pub dictionary_id: Option<String>,
}

/// Partial update for a word; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordUpdate {
    pub chinese: Option<String>,
    pub pinyin_numbered: Option<String>,
    pub definitions: Option<Vec<String>>,
    pub hsk_level: Option<u8>,
    pub dictionary_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    System,
    User,
}

/// A named word list ("Favorites", "HSK 1", user decks). Membership is an
/// ordered list of word ids held by the store, not by the deck itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub kind: DeckKind,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

/// An example sentence owned by a word; deleted together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub id: i64,
    pub word_id: i64,
    pub chinese_sentence: String,
    pub pinyin_sentence: String,
    pub russian_translation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExample {
    pub chinese_sentence: String,
    #[serde(default)]
    pub pinyin_sentence: String,
    #[serde(default)]
    pub russian_translation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub words: usize,
    pub dictionaries: usize,
    pub decks: usize,
    pub favorites: usize,
}
