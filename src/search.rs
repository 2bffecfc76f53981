use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::Word;
use crate::pinyin::normalize_for_search;
use crate::store::DictStore;

pub const DEFAULT_LIMIT: usize = 50;

lazy_static! {
    // Leading markup stripped from a first definition before it is compared
    // against the query: "[гл.] ...", "1) ...", "I, bǎi ..." and the like.
    static ref BRACKET_TAG_RE: Regex = Regex::new(r"^\s*\[[^\]]*\]\s*").unwrap();
    static ref ENUM_MARKER_RE: Regex = Regex::new(r"^\s*\d+\)\s*").unwrap();
    static ref ROMAN_PREFIX_RE: Regex =
        Regex::new(r"^\s*(?:i{1,3}|iv|v|vi{0,3}|vii)[,\s]+").unwrap();
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<Word>,
}

pub async fn search_api(
    Query(params): Query<SearchParams>,
    State(store): State<Arc<DictStore>>,
) -> Json<SearchResult> {
    let entries = store.active_words();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let results = search_entries(&params.q, &entries, limit);

    Json(SearchResult {
        query: params.q,
        results,
    })
}

/// The pinyin forms an entry is matched on: the lower-cased tone-marked
/// string and a "plain" form with tone digits stripped.
struct PinyinForms {
    lower: String,
    plain: String,
}

impl PinyinForms {
    fn of(word: &Word) -> Self {
        let lower = word.pinyin_toned.to_lowercase();
        let plain = if word.pinyin_numbered.is_empty() {
            normalize_for_search(&lower)
        } else {
            word.pinyin_numbered
                .to_lowercase()
                .chars()
                .filter(|c| !matches!(c, '1'..='5'))
                .collect()
        };
        PinyinForms { lower, plain }
    }
}

/// Rank `entries` against `query` and return at most `limit` of them.
///
/// Five tiers, earlier tiers always first: Chinese prefix, pinyin exact
/// (single-character headwords), pinyin prefix, pinyin substring, definition
/// substring. Within a tier, more basic words (lower HSK, shorter headword)
/// come first; the definition tier additionally prefers definitions that
/// start with the query or contain it as a standalone token.
///
/// Total over its inputs: an empty query or a collection of half-filled
/// entries yields an empty or shorter result, never a panic.
pub fn search_entries(query: &str, entries: &[Word], limit: usize) -> Vec<Word> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();

    // Dedup across tiers by headword: once accepted, an entry is skipped by
    // every later pass.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut results: Vec<Word> = Vec::new();

    fn take_tier<'a>(matched: Vec<&'a Word>, seen: &mut HashSet<&'a str>, out: &mut Vec<Word>) {
        for word in matched {
            // Also guards against duplicate headwords inside a single tier.
            if seen.insert(word.chinese.as_str()) {
                out.push(word.clone());
            }
        }
    }

    // Tier 1: Chinese prefix match on the raw query.
    let mut tier: Vec<&Word> = entries
        .iter()
        .filter(|w| !w.chinese.is_empty() && !seen.contains(w.chinese.as_str()))
        .filter(|w| w.chinese.starts_with(query))
        .collect();
    tier.sort_by(|a, b| compare_basic(a, b));
    take_tier(tier, &mut seen, &mut results);

    // Tier 2: exact pinyin for single-character headwords, so base syllables
    // float to the top of short lookups.
    let mut tier: Vec<&Word> = entries
        .iter()
        .filter(|w| !w.chinese.is_empty() && !seen.contains(w.chinese.as_str()))
        .filter(|w| {
            w.chinese.chars().count() == 1 && {
                let forms = PinyinForms::of(w);
                !forms.plain.is_empty() && forms.plain == query_lower
            }
        })
        .collect();
    tier.sort_by(|a, b| compare_basic(a, b));
    take_tier(tier, &mut seen, &mut results);

    // Tiers 3 and 4: pinyin prefix, then pinyin substring.
    for prefix_only in [true, false] {
        let mut tier: Vec<&Word> = entries
            .iter()
            .filter(|w| !w.chinese.is_empty() && !seen.contains(w.chinese.as_str()))
            .filter(|w| {
                let forms = PinyinForms::of(w);
                if forms.lower.is_empty() && forms.plain.is_empty() {
                    return false;
                }
                if prefix_only {
                    forms.lower.starts_with(&query_lower) || forms.plain.starts_with(&query_lower)
                } else {
                    forms.lower.contains(&query_lower) || forms.plain.contains(&query_lower)
                }
            })
            .collect();
        tier.sort_by(|a, b| compare_basic(a, b));
        take_tier(tier, &mut seen, &mut results);
    }

    // Tier 5: Russian definition match. Entries with any pinyin hit were
    // consumed above, so only definition-only matches land here.
    let mut tier: Vec<&Word> = entries
        .iter()
        .filter(|w| !w.chinese.is_empty() && !seen.contains(w.chinese.as_str()))
        .filter(|w| {
            !w.definitions.is_empty()
                && w.definitions.join(" ").to_lowercase().contains(&query_lower)
        })
        .collect();
    tier.sort_by(|a, b| compare_definition_matches(a, b, &query_lower));
    take_tier(tier, &mut seen, &mut results);

    results.truncate(limit);
    results
}

// Absent HSK sorts last; shorter headwords are more basic.
fn hsk_rank(word: &Word) -> u8 {
    if word.hsk_level == 0 { 99 } else { word.hsk_level }
}

fn compare_basic(a: &Word, b: &Word) -> Ordering {
    hsk_rank(a)
        .cmp(&hsk_rank(b))
        .then_with(|| a.chinese.chars().count().cmp(&b.chinese.chars().count()))
}

/// Strip leading tag/enumeration/roman-numeral markup off a first definition
/// for comparison. Never touches stored data.
fn clean_definition(def: &str) -> String {
    let lower = def.to_lowercase();
    let stripped = BRACKET_TAG_RE.replace(&lower, "");
    let stripped = ENUM_MARKER_RE.replace(&stripped, "");
    let stripped = ROMAN_PREFIX_RE.replace(&stripped, "");
    stripped.trim().to_string()
}

/// Whether `needle` occurs in `haystack` as a standalone token, bounded by
/// non-alphanumerics or the string edges.
fn contains_standalone(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    for (start, _) in haystack.match_indices(needle) {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

fn compare_definition_matches(a: &Word, b: &Word, query_lower: &str) -> Ordering {
    let a_first = a.definitions.first().map(|d| clean_definition(d));
    let b_first = b.definitions.first().map(|d| clean_definition(d));
    let a_starts = a_first.as_deref().is_some_and(|d| d.starts_with(query_lower));
    let b_starts = b_first.as_deref().is_some_and(|d| d.starts_with(query_lower));
    if a_starts != b_starts {
        return if a_starts { Ordering::Less } else { Ordering::Greater };
    }

    let a_standalone = contains_standalone(&a.definitions.join(" ").to_lowercase(), query_lower);
    let b_standalone = contains_standalone(&b.definitions.join(" ").to_lowercase(), query_lower);
    if a_standalone != b_standalone {
        return if a_standalone { Ordering::Less } else { Ordering::Greater };
    }

    compare_basic(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn word(chinese: &str, pinyin_numbered: &str, definitions: &[&str], hsk: u8) -> Word {
        Word {
            id: 0,
            chinese: chinese.to_string(),
            pinyin_numbered: pinyin_numbered.to_string(),
            pinyin_toned: crate::pinyin::numbered_to_toned(pinyin_numbered),
            definitions: definitions.iter().map(|s| s.to_string()).collect(),
            hsk_level: hsk,
            is_favorite: false,
            dictionary_id: None,
            created_at: Utc::now(),
            last_accessed: None,
        }
    }

    fn sample() -> Vec<Word> {
        vec![
            word("你", "ni3", &["ты"], 1),
            word("你好", "ni3 hao3", &["привет", "здравствуйте"], 1),
            word("您", "nin2", &["Вы (вежливое)"], 2),
            word("好", "hao3", &["хороший", "хорошо"], 1),
            word("谢谢", "xie4xie", &["спасибо"], 1),
            word("学习", "xue2xi2", &["учиться", "изучать"], 2),
            word("汉语", "han4yu3", &["китайский язык"], 3),
        ]
    }

    #[test]
    fn empty_query_yields_nothing() {
        assert!(search_entries("", &sample(), DEFAULT_LIMIT).is_empty());
        assert!(search_entries("   ", &sample(), DEFAULT_LIMIT).is_empty());
        assert!(search_entries("ni", &[], DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn chinese_prefix_outranks_everything() {
        let mut entries = sample();
        entries.push(word("好人", "hao3ren2", &["хороший человек"], 0));
        let results = search_entries("好", &entries, DEFAULT_LIMIT);
        assert_eq!(results[0].chinese, "好");
        assert_eq!(results[1].chinese, "好人");
    }

    #[test]
    fn exact_single_char_pinyin_precedes_prefix_matches() {
        let results = search_entries("ni", &sample(), DEFAULT_LIMIT);
        let chinese: Vec<&str> = results.iter().map(|w| w.chinese.as_str()).collect();
        // "你" matches tier 2 exactly ("ni3" stripped == "ni"); "你好" and
        // "您" ("nin") only reach the prefix tier.
        assert_eq!(chinese[0], "你");
        let pos_nihao = chinese.iter().position(|c| *c == "你好");
        let pos_nin = chinese.iter().position(|c| *c == "您");
        assert!(pos_nihao.is_some() && pos_nin.is_some());
        // Within the prefix tier HSK 2 "您" sorts after HSK 1 "你好".
        assert!(pos_nihao < pos_nin);
    }

    #[test]
    fn toned_queries_match_via_lowered_pinyin() {
        let results = search_entries("nǐ hǎo", &sample(), DEFAULT_LIMIT);
        assert!(results.iter().any(|w| w.chinese == "你好"));
    }

    #[test]
    fn pinyin_substring_ranks_below_prefix() {
        let results = search_entries("hao", &sample(), DEFAULT_LIMIT);
        let chinese: Vec<&str> = results.iter().map(|w| w.chinese.as_str()).collect();
        let pos_hao = chinese.iter().position(|c| *c == "好");
        let pos_nihao = chinese.iter().position(|c| *c == "你好");
        assert!(pos_hao.is_some() && pos_nihao.is_some());
        assert!(pos_hao < pos_nihao);
    }

    #[test]
    fn definition_match_is_the_last_tier() {
        let results = search_entries("спасибо", &sample(), DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chinese, "谢谢");
    }

    #[test]
    fn definition_tier_prefers_leading_match() {
        let entries = vec![
            word("大", "da4", &["большой"], 1),
            word("人", "ren2", &["человек, большой или маленький"], 1),
            word("巨", "ju4", &["[прил.] большой, огромный"], 5),
        ];
        let results = search_entries("большой", &entries, DEFAULT_LIMIT);
        let chinese: Vec<&str> = results.iter().map(|w| w.chinese.as_str()).collect();
        // Both 大 and 巨 start with the query after cleaning; 大 wins on HSK.
        assert_eq!(chinese, vec!["大", "巨", "人"]);
    }

    #[test]
    fn definition_tier_prefers_standalone_token_over_substring() {
        let entries = vec![
            word("冰", "bing1", &["заледенелый кусок"], 0),
            word("冷", "leng3", &["холод, лед и стужа"], 0),
        ];
        let results = search_entries("лед", &entries, DEFAULT_LIMIT);
        let chinese: Vec<&str> = results.iter().map(|w| w.chinese.as_str()).collect();
        // "лед" stands alone in 冷's gloss, only as a substring in 冰's.
        assert_eq!(chinese, vec!["冷", "冰"]);
    }

    #[test]
    fn cleaning_strips_enumeration_and_roman_prefixes() {
        assert_eq!(clean_definition("1) привет"), "привет");
        assert_eq!(clean_definition("[гл.] учиться"), "учиться");
        assert_eq!(clean_definition("II, bǎi делать"), "bǎi делать");
        assert_eq!(clean_definition("просто текст"), "просто текст");
    }

    #[test]
    fn limit_caps_results() {
        let entries: Vec<Word> = (0..20)
            .map(|i| word(&format!("词{i}"), "ci2", &["слово"], 0))
            .collect();
        let results = search_entries("ci", &entries, 5);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn duplicate_headwords_appear_once() {
        let entries = vec![
            word("你", "ni3", &["ты"], 1),
            word("你", "ni3", &["ты (дубликат)"], 1),
        ];
        let results = search_entries("ni", &entries, DEFAULT_LIMIT);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn missing_pinyin_still_matches_chinese_and_definitions() {
        let entries = vec![word("水", "", &["вода"], 1)];
        assert_eq!(search_entries("水", &entries, DEFAULT_LIMIT).len(), 1);
        assert_eq!(search_entries("вода", &entries, DEFAULT_LIMIT).len(), 1);
        // The derived plain form of an empty pinyin never matches a query.
        assert!(search_entries("shui", &entries, DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn no_match_is_an_empty_result_not_an_error() {
        assert!(search_entries("zzzz", &sample(), DEFAULT_LIMIT).is_empty());
    }
}
