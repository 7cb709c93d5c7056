//! Ingestion-boundary normalization. External content sources (seed
//! files, spreadsheet exports, admin payloads) spell the same logical
//! fields in several casings and aliases; everything is mapped to the
//! canonical model here, once, and never deeper in the code.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::content::{AnswerOption, Feedback, Module, Question, QuestionKind, QuizConfig};

const TRUE_TOKENS: &[&str] = &["true", "1", "yes", "y", "aan", "on"];
const FALSE_TOKENS: &[&str] = &["false", "0", "no", "n", "nee", "off", "uit"];

/// Normalizes a raw configuration document into the canonical model and
/// validates it. Unknown fields are ignored.
pub fn normalize_config(raw: &Value) -> Result<QuizConfig, StoreError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| StoreError::validation("quiz configuration must be an object"))?;

    let mut strings = std::collections::BTreeMap::new();
    if let Some(map) = obj.get("strings").and_then(Value::as_object) {
        for (key, value) in map {
            if let Some(text) = value.as_str() {
                strings.insert(key.clone(), text.to_string());
            }
        }
    }

    let modules = obj
        .get("modules")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(normalize_module).collect())
        .unwrap_or_default();

    let config = QuizConfig {
        title: string_field(obj, &["title"]).unwrap_or_default(),
        description: string_field(obj, &["description"]).unwrap_or_default(),
        certificate_message: string_field(obj, &["certificateMessage", "certificate_message"])
            .unwrap_or_default(),
        strings,
        modules,
    };

    config.validate()?;
    Ok(config)
}

/// Maps one raw module. Modules without any usable question are kept;
/// validation decides later whether they may go active.
pub fn normalize_module(raw: &Value) -> Option<Module> {
    let obj = raw.as_object()?;

    let pool = question_pool(obj)
        .map(|list| list.iter().filter_map(normalize_question).collect::<Vec<_>>())
        .unwrap_or_default();

    let fallback = pool.len() as u32;
    let questions_per_session =
        parse_questions_per_session(questions_per_session_field(obj), fallback);

    Some(Module {
        id: string_field(obj, &["id", "moduleId", "module_id"])
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: string_field(obj, &["title"]).unwrap_or_default(),
        intro: string_field(obj, &["intro"]).unwrap_or_default(),
        tips: string_list(obj.get("tips")),
        questions_per_session,
        is_active: normalize_bool(field(obj, &["isActive", "is_active", "active"]), true),
        question_pool: pool,
    })
}

fn normalize_question(raw: &Value) -> Option<Question> {
    let obj = raw.as_object()?;

    let sanitized = sanitize_options(obj.get("options"));
    if sanitized.is_empty() {
        return None;
    }

    // Correct ids come either from an explicit `correct` list or from
    // per-option correctness flags.
    let explicit: Vec<String> = string_list(obj.get("correct"));
    let correct: Vec<String> = if explicit.is_empty() {
        sanitized
            .iter()
            .filter(|(_, is_correct)| *is_correct)
            .map(|(option, _)| option.id.clone())
            .collect()
    } else {
        explicit
            .into_iter()
            .filter(|id| sanitized.iter().any(|(option, _)| &option.id == id))
            .collect()
    };

    let kind = match string_field(obj, &["type", "kind"]).as_deref() {
        Some("multiple") => QuestionKind::Multiple,
        _ => QuestionKind::Single,
    };

    let feedback = obj
        .get("feedback")
        .and_then(Value::as_object)
        .map(|fb| Feedback {
            correct: string_field(fb, &["correct"]).unwrap_or_default(),
            incorrect: string_field(fb, &["incorrect"]).unwrap_or_default(),
        })
        .unwrap_or_default();

    Some(Question {
        id: string_field(obj, &["id", "questionId", "question_id"])
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        text: string_field(obj, &["text"]).unwrap_or_default(),
        kind,
        options: sanitized.into_iter().map(|(option, _)| option).collect(),
        correct,
        feedback,
    })
}

/// Option ingestion: label aliases, trim, drop empties, regenerate
/// missing ids. Returns each option with its correctness flag.
pub fn sanitize_options(raw: Option<&Value>) -> Vec<(AnswerOption, bool)> {
    let Some(list) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let label = string_field(obj, &["label", "text", "value"])?;
            let label = label.trim().to_string();
            if label.is_empty() {
                return None;
            }
            let id = string_field(obj, &["id", "optionId", "option_id"])
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let is_correct =
                normalize_bool(field(obj, &["isCorrect", "is_correct", "correct"]), false);
            Some((AnswerOption { id, label }, is_correct))
        })
        .collect()
}

/// Boolean coercion accepting the UI's yes/no spellings, including the
/// Dutch toggle labels that show up in spreadsheet exports.
pub fn normalize_bool(value: Option<&Value>, fallback: bool) -> bool {
    let Some(value) = value else {
        return fallback;
    };
    match value {
        Value::Null => fallback,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(fallback),
        Value::String(s) => {
            let token = s.trim().to_lowercase();
            if token.is_empty() {
                fallback
            } else if TRUE_TOKENS.contains(&token.as_str()) {
                true
            } else if FALSE_TOKENS.contains(&token.as_str()) {
                false
            } else {
                fallback
            }
        }
        _ => fallback,
    }
}

/// The sampling size is spelled several ways; the bare `questions` key
/// only counts when it is not the question array itself.
pub fn questions_per_session_field<'a>(obj: &'a Map<String, Value>) -> Option<&'a Value> {
    const CANDIDATES: &[&str] = &[
        "questionsPerSession",
        "questions_per_session",
        "questions",
        "questionspersession",
    ];

    CANDIDATES
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null() && !value.is_array() && *value != &Value::String(String::new()))
}

/// Parses a sampling size that may arrive as a number or a numeric
/// string with a decimal comma. Non-finite or non-positive values fall
/// back; fractions are floored.
pub fn parse_questions_per_session(value: Option<&Value>, fallback: u32) -> u32 {
    let Some(value) = value else {
        return fallback;
    };

    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', ".").trim().parse::<f64>().ok(),
        _ => None,
    };

    match numeric {
        Some(n) if n.is_finite() && n > 0.0 => n.floor() as u32,
        _ => fallback,
    }
}

/// Module id lists arrive as arrays or comma-separated strings.
pub fn module_id_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| obj.get(*key)).next()
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn question_pool<'a>(obj: &'a Map<String, Value>) -> Option<&'a Vec<Value>> {
    for key in ["questionPool", "question_pool", "questions"] {
        if let Some(list) = obj.get(key).and_then(Value::as_array) {
            return Some(list);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sampling_size_aliases_are_accepted() {
        for key in ["questionsPerSession", "questions_per_session", "questions"] {
            let raw = json!({ key: "3" });
            let obj = raw.as_object().unwrap();
            assert_eq!(
                parse_questions_per_session(questions_per_session_field(obj), 0),
                3,
                "alias {key}"
            );
        }
    }

    #[test]
    fn questions_array_is_not_a_sampling_size() {
        let raw = json!({ "questions": [{ "id": "q1" }] });
        let obj = raw.as_object().unwrap();
        assert!(questions_per_session_field(obj).is_none());
    }

    #[test]
    fn decimal_comma_and_fractions_floor() {
        assert_eq!(parse_questions_per_session(Some(&json!("2,9")), 1), 2);
        assert_eq!(parse_questions_per_session(Some(&json!(4.7)), 1), 4);
        assert_eq!(parse_questions_per_session(Some(&json!(-1)), 5), 5);
        assert_eq!(parse_questions_per_session(Some(&json!("niks")), 5), 5);
    }

    #[test]
    fn dutch_toggle_tokens_parse() {
        assert!(normalize_bool(Some(&json!("aan")), false));
        assert!(!normalize_bool(Some(&json!("uit")), true));
        assert!(!normalize_bool(Some(&json!("nee")), true));
        assert!(normalize_bool(Some(&json!(1)), false));
        assert!(normalize_bool(None, true));
    }

    #[test]
    fn empty_option_labels_are_dropped() {
        let options = sanitize_options(Some(&json!([
            { "id": "a", "label": "  " },
            { "id": "b", "text": " Goed antwoord ", "isCorrect": "1" },
            { "value": "Zonder id" }
        ])));
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].0.label, "Goed antwoord");
        assert!(options[0].1);
        assert!(!options[1].0.id.is_empty());
    }

    #[test]
    fn module_id_lists_accept_both_shapes() {
        assert_eq!(
            module_id_list(Some(&json!("a, b ,,c"))),
            vec!["a", "b", "c"]
        );
        assert_eq!(module_id_list(Some(&json!(["x", " y "]))), vec!["x", "y"]);
    }

    #[test]
    fn full_config_normalizes_and_validates() {
        let raw = json!({
            "title": "Digitaal Veiligheidsrijbewijs",
            "description": "Oefen veilig online gedrag",
            "certificate_message": "Gefeliciteerd!",
            "strings": { "startButton": "Start de quiz" },
            "modules": [{
                "id": "wachtwoorden",
                "title": "Sterke wachtwoorden",
                "questions_per_session": "1",
                "questionPool": [{
                    "id": "pw-1",
                    "text": "Welk wachtwoord is het veiligst?",
                    "type": "single",
                    "options": [
                        { "id": "a", "label": "123456" },
                        { "id": "c", "label": "H0nd!sPr!ngt" }
                    ],
                    "correct": ["c"]
                }]
            }]
        });

        let config = normalize_config(&raw).unwrap();
        assert_eq!(config.certificate_message, "Gefeliciteerd!");
        assert_eq!(config.modules.len(), 1);
        assert_eq!(config.modules[0].questions_per_session, 1);
        assert_eq!(config.modules[0].question_pool[0].correct, vec!["c"]);
    }
}
