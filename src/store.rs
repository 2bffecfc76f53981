use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use thiserror::Error;

use crate::models::{
    Deck, DeckKind, Dictionary, Example, NewExample, NewWord, Stats, Word, WordUpdate,
};
use crate::pinyin;

pub const FAVORITES_DECK_ID: &str = "favorites";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Word {0} not found")]
    WordNotFound(i64),
    #[error("Dictionary {0} not found")]
    DictionaryNotFound(String),
    #[error("Deck {0} not found")]
    DeckNotFound(String),
    #[error("Example {0} not found")]
    ExampleNotFound(i64),
}

#[derive(Default)]
struct StoreInner {
    words: HashMap<i64, Word>,
    dictionaries: HashMap<String, Dictionary>,
    decks: HashMap<String, Deck>,
    // Ordered membership per deck.
    deck_words: HashMap<String, Vec<i64>>,
    examples: HashMap<i64, Example>,
    next_word_id: i64,
    next_example_id: i64,
}

/// In-memory record store shared as axum state. Every word write path
/// re-derives `pinyin_toned` from `pinyin_numbered`, so the stored display
/// form can never drift from what the user typed.
pub struct DictStore {
    inner: RwLock<StoreInner>,
}

impl DictStore {
    pub fn new() -> Self {
        let store = DictStore {
            inner: RwLock::new(StoreInner {
                next_word_id: 1,
                next_example_id: 1,
                ..StoreInner::default()
            }),
        };
        store.seed_system_decks();
        store
    }

    fn seed_system_decks(&self) {
        let mut inner = self.write();
        let system = [
            (FAVORITES_DECK_ID.to_string(), "Избранное".to_string(), "star_fill"),
            ("hsk1".to_string(), "HSK 1".to_string(), "book_fill"),
        ];
        for (id, name, icon) in system {
            inner.deck_words.entry(id.clone()).or_default();
            inner.decks.entry(id.clone()).or_insert(Deck {
                id,
                name,
                kind: DeckKind::System,
                icon: icon.to_string(),
                created_at: Utc::now(),
            });
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // ---- Words ----

    pub fn all_words(&self) -> Vec<Word> {
        let mut words: Vec<Word> = self.read().words.values().cloned().collect();
        words.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        words
    }

    /// The search corpus: words in active dictionaries plus unassigned ones.
    pub fn active_words(&self) -> Vec<Word> {
        let inner = self.read();
        inner
            .words
            .values()
            .filter(|w| match &w.dictionary_id {
                Some(id) => inner.dictionaries.get(id).is_none_or(|d| d.is_active),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn get_word(&self, id: i64) -> Option<Word> {
        self.read().words.get(&id).cloned()
    }

    pub fn create_word(&self, new: NewWord) -> Word {
        let mut inner = self.write();
        let id = inner.next_word_id;
        inner.next_word_id += 1;

        let word = Word {
            id,
            chinese: new.chinese,
            pinyin_toned: pinyin::numbered_to_toned(&new.pinyin_numbered),
            pinyin_numbered: new.pinyin_numbered,
            definitions: new.definitions,
            hsk_level: new.hsk_level,
            is_favorite: false,
            dictionary_id: new.dictionary_id,
            created_at: Utc::now(),
            last_accessed: None,
        };
        inner.words.insert(id, word.clone());
        word
    }

    pub fn update_word(&self, id: i64, update: WordUpdate) -> Result<Word, StoreError> {
        let mut inner = self.write();
        let word = inner.words.get_mut(&id).ok_or(StoreError::WordNotFound(id))?;

        if let Some(chinese) = update.chinese {
            word.chinese = chinese;
        }
        if let Some(numbered) = update.pinyin_numbered {
            word.pinyin_numbered = numbered;
        }
        if let Some(definitions) = update.definitions {
            word.definitions = definitions;
        }
        if let Some(hsk) = update.hsk_level {
            word.hsk_level = hsk;
        }
        if let Some(dictionary_id) = update.dictionary_id {
            word.dictionary_id = dictionary_id;
        }
        word.pinyin_toned = pinyin::numbered_to_toned(&word.pinyin_numbered);
        Ok(word.clone())
    }

    /// Deletes a word together with its examples and deck memberships.
    pub fn delete_word(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner.words.remove(&id).ok_or(StoreError::WordNotFound(id))?;
        inner.examples.retain(|_, ex| ex.word_id != id);
        for members in inner.deck_words.values_mut() {
            members.retain(|&word_id| word_id != id);
        }
        Ok(())
    }

    pub fn touch_word(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        let word = inner.words.get_mut(&id).ok_or(StoreError::WordNotFound(id))?;
        word.last_accessed = Some(Utc::now());
        Ok(())
    }

    // ---- Favorites ----

    pub fn is_favorite(&self, id: i64) -> bool {
        self.read().words.get(&id).map(|w| w.is_favorite).unwrap_or(false)
    }

    pub fn set_favorite(&self, id: i64, favorite: bool) -> Result<Word, StoreError> {
        let mut inner = self.write();
        let word = inner.words.get_mut(&id).ok_or(StoreError::WordNotFound(id))?;
        word.is_favorite = favorite;
        let word = word.clone();

        // The favorites system deck mirrors the flag.
        let members = inner.deck_words.entry(FAVORITES_DECK_ID.to_string()).or_default();
        if favorite {
            if !members.contains(&id) {
                members.push(id);
            }
        } else {
            members.retain(|&word_id| word_id != id);
        }
        Ok(word)
    }

    pub fn favorites(&self) -> Vec<Word> {
        self.read().words.values().filter(|w| w.is_favorite).cloned().collect()
    }

    // ---- Dictionaries ----

    pub fn create_dictionary(&self, name: String, description: String, color: String) -> Dictionary {
        let now = Utc::now();
        let dictionary = Dictionary {
            id: format!("dict_{}", now.timestamp_millis()),
            name,
            description,
            color,
            is_active: true,
            created_at: now,
        };
        self.write().dictionaries.insert(dictionary.id.clone(), dictionary.clone());
        dictionary
    }

    pub fn all_dictionaries(&self) -> Vec<Dictionary> {
        let mut dicts: Vec<Dictionary> = self.read().dictionaries.values().cloned().collect();
        dicts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        dicts
    }

    pub fn update_dictionary(
        &self,
        id: &str,
        name: String,
        description: String,
        color: String,
    ) -> Result<Dictionary, StoreError> {
        let mut inner = self.write();
        let dict = inner
            .dictionaries
            .get_mut(id)
            .ok_or_else(|| StoreError::DictionaryNotFound(id.to_string()))?;
        dict.name = name;
        dict.description = description;
        dict.color = color;
        Ok(dict.clone())
    }

    pub fn toggle_dictionary_active(&self, id: &str) -> Result<Dictionary, StoreError> {
        let mut inner = self.write();
        let dict = inner
            .dictionaries
            .get_mut(id)
            .ok_or_else(|| StoreError::DictionaryNotFound(id.to_string()))?;
        dict.is_active = !dict.is_active;
        Ok(dict.clone())
    }

    /// Deletes a dictionary and cascades to every word in it.
    pub fn delete_dictionary(&self, id: &str) -> Result<(), StoreError> {
        let word_ids: Vec<i64> = {
            let inner = self.read();
            if !inner.dictionaries.contains_key(id) {
                return Err(StoreError::DictionaryNotFound(id.to_string()));
            }
            inner
                .words
                .values()
                .filter(|w| w.dictionary_id.as_deref() == Some(id))
                .map(|w| w.id)
                .collect()
        };
        for word_id in word_ids {
            // Words listed above still exist; the id cannot be missing.
            let _ = self.delete_word(word_id);
        }
        self.write().dictionaries.remove(id);
        Ok(())
    }

    pub fn words_by_dictionary(&self, id: &str) -> Vec<Word> {
        self.read()
            .words
            .values()
            .filter(|w| w.dictionary_id.as_deref() == Some(id))
            .cloned()
            .collect()
    }

    // ---- Decks ----

    pub fn create_deck(&self, name: String) -> Deck {
        let now = Utc::now();
        let deck = Deck {
            id: format!("user_{}", now.timestamp_millis()),
            name,
            kind: DeckKind::User,
            icon: "folder_fill".to_string(),
            created_at: now,
        };
        let mut inner = self.write();
        inner.deck_words.entry(deck.id.clone()).or_default();
        inner.decks.insert(deck.id.clone(), deck.clone());
        deck
    }

    pub fn all_decks(&self) -> Vec<Deck> {
        let mut decks: Vec<Deck> = self.read().decks.values().cloned().collect();
        decks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        decks
    }

    pub fn get_deck(&self, id: &str) -> Option<Deck> {
        self.read().decks.get(id).cloned()
    }

    pub fn delete_deck(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner
            .decks
            .remove(id)
            .ok_or_else(|| StoreError::DeckNotFound(id.to_string()))?;
        inner.deck_words.remove(id);
        Ok(())
    }

    /// Idempotent; membership keeps insertion order.
    pub fn add_word_to_deck(&self, deck_id: &str, word_id: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        if !inner.decks.contains_key(deck_id) {
            return Err(StoreError::DeckNotFound(deck_id.to_string()));
        }
        if !inner.words.contains_key(&word_id) {
            return Err(StoreError::WordNotFound(word_id));
        }
        let members = inner.deck_words.entry(deck_id.to_string()).or_default();
        if !members.contains(&word_id) {
            members.push(word_id);
        }
        Ok(())
    }

    pub fn remove_word_from_deck(&self, deck_id: &str, word_id: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        let members = inner
            .deck_words
            .get_mut(deck_id)
            .ok_or_else(|| StoreError::DeckNotFound(deck_id.to_string()))?;
        members.retain(|&id| id != word_id);
        Ok(())
    }

    pub fn deck_words(&self, deck_id: &str) -> Result<Vec<Word>, StoreError> {
        let inner = self.read();
        let members = inner
            .deck_words
            .get(deck_id)
            .ok_or_else(|| StoreError::DeckNotFound(deck_id.to_string()))?;
        Ok(members
            .iter()
            .filter_map(|id| inner.words.get(id))
            .cloned()
            .collect())
    }

    // ---- Examples ----

    pub fn add_example(&self, word_id: i64, new: NewExample) -> Result<Example, StoreError> {
        let mut inner = self.write();
        if !inner.words.contains_key(&word_id) {
            return Err(StoreError::WordNotFound(word_id));
        }
        let id = inner.next_example_id;
        inner.next_example_id += 1;
        let example = Example {
            id,
            word_id,
            chinese_sentence: new.chinese_sentence,
            pinyin_sentence: new.pinyin_sentence,
            russian_translation: new.russian_translation,
            created_at: Utc::now(),
        };
        inner.examples.insert(id, example.clone());
        Ok(example)
    }

    pub fn update_example(&self, id: i64, new: NewExample) -> Result<Example, StoreError> {
        let mut inner = self.write();
        let example = inner.examples.get_mut(&id).ok_or(StoreError::ExampleNotFound(id))?;
        example.chinese_sentence = new.chinese_sentence;
        example.pinyin_sentence = new.pinyin_sentence;
        example.russian_translation = new.russian_translation;
        Ok(example.clone())
    }

    pub fn delete_example(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner.examples.remove(&id).ok_or(StoreError::ExampleNotFound(id))?;
        Ok(())
    }

    pub fn examples_for_word(&self, word_id: i64) -> Vec<Example> {
        let mut examples: Vec<Example> = self
            .read()
            .examples
            .values()
            .filter(|ex| ex.word_id == word_id)
            .cloned()
            .collect();
        examples.sort_by_key(|ex| ex.id);
        examples
    }

    // ---- Stats ----

    pub fn stats(&self) -> Stats {
        let inner = self.read();
        Stats {
            words: inner.words.len(),
            dictionaries: inner.dictionaries.len(),
            decks: inner.decks.len(),
            favorites: inner.words.values().filter(|w| w.is_favorite).count(),
        }
    }
}

impl Default for DictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_word(chinese: &str, pinyin: &str) -> NewWord {
        NewWord {
            chinese: chinese.to_string(),
            pinyin_numbered: pinyin.to_string(),
            definitions: vec!["перевод".to_string()],
            hsk_level: 1,
            dictionary_id: None,
        }
    }

    #[test]
    fn create_derives_toned_pinyin() {
        let store = DictStore::new();
        let word = store.create_word(new_word("你好", "ni3 hao3"));
        assert_eq!(word.pinyin_toned, "nǐ hǎo");
        assert_eq!(store.get_word(word.id).map(|w| w.pinyin_toned).as_deref(), Some("nǐ hǎo"));
    }

    #[test]
    fn update_rederives_toned_pinyin() {
        let store = DictStore::new();
        let word = store.create_word(new_word("绿", "lv4"));
        assert_eq!(word.pinyin_toned, "lǜ");

        let updated = store
            .update_word(
                word.id,
                WordUpdate {
                    pinyin_numbered: Some("lu:4".to_string()),
                    ..WordUpdate::default()
                },
            )
            .expect("word exists");
        assert_eq!(updated.pinyin_toned, "lǜ");
    }

    #[test]
    fn update_missing_word_is_an_error() {
        let store = DictStore::new();
        assert!(matches!(
            store.update_word(42, WordUpdate::default()),
            Err(StoreError::WordNotFound(42))
        ));
    }

    #[test]
    fn delete_word_cascades_examples_and_deck_membership() {
        let store = DictStore::new();
        let word = store.create_word(new_word("你好", "ni3 hao3"));
        let deck = store.create_deck("Урок 1".to_string());
        store.add_word_to_deck(&deck.id, word.id).expect("deck and word exist");
        store
            .add_example(
                word.id,
                NewExample {
                    chinese_sentence: "你好，我是学生。".to_string(),
                    pinyin_sentence: "Nǐ hǎo, wǒ shì xuésheng.".to_string(),
                    russian_translation: "Привет, я студент.".to_string(),
                },
            )
            .expect("word exists");

        store.delete_word(word.id).expect("word exists");
        assert!(store.get_word(word.id).is_none());
        assert!(store.examples_for_word(word.id).is_empty());
        assert!(store.deck_words(&deck.id).expect("deck exists").is_empty());
    }

    #[test]
    fn favorite_toggle_mirrors_into_system_deck() {
        let store = DictStore::new();
        let word = store.create_word(new_word("好", "hao3"));
        assert!(!store.is_favorite(word.id));

        store.set_favorite(word.id, true).expect("word exists");
        assert!(store.is_favorite(word.id));
        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.deck_words(FAVORITES_DECK_ID).expect("seeded").len(), 1);

        store.set_favorite(word.id, false).expect("word exists");
        assert!(store.favorites().is_empty());
        assert!(store.deck_words(FAVORITES_DECK_ID).expect("seeded").is_empty());
    }

    #[test]
    fn deck_membership_is_ordered_and_idempotent() {
        let store = DictStore::new();
        let first = store.create_word(new_word("一", "yi1"));
        let second = store.create_word(new_word("二", "er4"));
        let deck = store.create_deck("Числа".to_string());

        store.add_word_to_deck(&deck.id, first.id).expect("exists");
        store.add_word_to_deck(&deck.id, second.id).expect("exists");
        store.add_word_to_deck(&deck.id, first.id).expect("exists");

        let words = store.deck_words(&deck.id).expect("deck exists");
        let ids: Vec<i64> = words.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn inactive_dictionary_words_leave_the_search_corpus() {
        let store = DictStore::new();
        let dict = store.create_dictionary("HSK 1".to_string(), String::new(), "cyan".to_string());
        let mut word = new_word("你", "ni3");
        word.dictionary_id = Some(dict.id.clone());
        store.create_word(word);
        store.create_word(new_word("好", "hao3"));

        assert_eq!(store.active_words().len(), 2);
        store.toggle_dictionary_active(&dict.id).expect("dict exists");
        assert_eq!(store.active_words().len(), 1);
    }

    #[test]
    fn delete_dictionary_cascades_to_words() {
        let store = DictStore::new();
        let dict = store.create_dictionary("Старый".to_string(), String::new(), "blue".to_string());
        let mut word = new_word("旧", "jiu4");
        word.dictionary_id = Some(dict.id.clone());
        let word = store.create_word(word);

        store.delete_dictionary(&dict.id).expect("dict exists");
        assert!(store.get_word(word.id).is_none());
        assert!(store.all_dictionaries().is_empty());
    }

    #[test]
    fn stats_count_everything() {
        let store = DictStore::new();
        let word = store.create_word(new_word("你", "ni3"));
        store.set_favorite(word.id, true).expect("word exists");
        store.create_deck("Мой".to_string());

        let stats = store.stats();
        assert_eq!(stats.words, 1);
        assert_eq!(stats.favorites, 1);
        // Two seeded system decks plus the user deck.
        assert_eq!(stats.decks, 3);
    }
}
