use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::models::TestMeta;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    Text,
}

impl QuestionKind {
    /// Anything the client does not recognise is answered as free text.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("single_choice") => QuestionKind::SingleChoice,
            Some("multiple_choice") => QuestionKind::MultipleChoice,
            _ => QuestionKind::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Text => "text",
        }
    }

    pub fn has_choices(self) -> bool {
        !matches!(self, QuestionKind::Text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Kept as the server sent it; parsed to an integer only at submit time.
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub points: u32,
    pub choices: Vec<Choice>,
}

impl Question {
    /// Build a question from whatever shape the backend returned. Returns
    /// `None` for entries without a usable id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(id_text)?;
        let kind = QuestionKind::from_wire(value.get("question_type").and_then(Value::as_str));
        let points = value
            .get("points")
            .and_then(|p| p.as_u64().or_else(|| p.as_str()?.trim().parse().ok()))
            .filter(|p| *p > 0)
            .map_or(1, |p| u32::try_from(p).unwrap_or(u32::MAX));

        let choices = if kind.has_choices() {
            value
                .get("choices")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(choice_from_value).collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Some(Self {
            id,
            text: value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            kind,
            points,
            choices,
        })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_i64() != Some(0) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn choice_from_value(value: &Value) -> Option<Choice> {
    let raw = value.get("id")?;
    let id = raw
        .as_i64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()));
    let Some(id) = id else {
        tracing::warn!(choice = %value, "dropping choice without an integer id");
        return None;
    };
    Some(Choice {
        id,
        text: value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// One in-progress attempt at a test. Its question list is fixed once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestAttempt {
    pub test_id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<Question>,
    pub started_at: DateTime<Utc>,
}

impl TestAttempt {
    pub fn new(test_id: i64, meta: &TestMeta, raw_questions: &[Value], started_at: DateTime<Utc>) -> Self {
        let mut questions = Vec::with_capacity(raw_questions.len());
        for raw in raw_questions {
            match Question::from_value(raw) {
                Some(question) => questions.push(question),
                None => tracing::warn!(test_id, question = %raw, "dropping question without id"),
            }
        }

        Self {
            test_id,
            title: meta
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Test".to_string()),
            description: meta.description.clone().unwrap_or_default(),
            subject: meta.subject.clone().unwrap_or_default(),
            time_limit_minutes: meta.time_limit.unwrap_or(0),
            questions,
            started_at,
        }
    }

    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }

    /// Seconds left at `now`, measured from `started_at`.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0) as u64;
        self.time_limit_seconds().saturating_sub(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(limit: u32) -> TestMeta {
        TestMeta {
            title: Some("Physics".into()),
            description: None,
            subject: Some("Science".into()),
            time_limit: Some(limit),
        }
    }

    #[test]
    fn questions_without_id_are_dropped() {
        let raw = vec![
            json!({"id": 1, "text": "a", "question_type": "text"}),
            json!({"text": "no id", "question_type": "text"}),
            json!({"id": null, "text": "null id"}),
            json!({"id": "", "text": "blank id"}),
            json!({"id": 2, "text": "b", "question_type": "single_choice"}),
        ];
        let attempt = TestAttempt::new(9, &meta(10), &raw, Utc::now());
        let ids: Vec<_> = attempt.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn points_default_to_one() {
        let q = Question::from_value(&json!({"id": 1, "text": "x"})).unwrap();
        assert_eq!(q.points, 1);
        let q = Question::from_value(&json!({"id": 1, "points": 0})).unwrap();
        assert_eq!(q.points, 1);
        let q = Question::from_value(&json!({"id": 1, "points": 4})).unwrap();
        assert_eq!(q.points, 4);
    }

    #[test]
    fn unknown_type_becomes_text_without_choices() {
        let q = Question::from_value(&json!({
            "id": 3,
            "question_type": "essay",
            "choices": [{"id": 1, "text": "ignored"}]
        }))
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Text);
        assert!(q.choices.is_empty());
    }

    #[test]
    fn choices_with_bad_ids_are_dropped() {
        let q = Question::from_value(&json!({
            "id": 3,
            "question_type": "multiple_choice",
            "choices": [{"id": 10, "text": "a"}, {"id": "11", "text": "b"}, {"id": "x", "text": "c"}]
        }))
        .unwrap();
        let ids: Vec<_> = q.choices.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn metadata_defaults() {
        let attempt = TestAttempt::new(1, &TestMeta::default(), &[], Utc::now());
        assert_eq!(attempt.title, "Test");
        assert_eq!(attempt.time_limit_minutes, 0);
        assert!(attempt.description.is_empty());
    }

    #[test]
    fn remaining_seconds_counts_from_start() {
        let started = Utc::now();
        let attempt = TestAttempt::new(1, &meta(2), &[], started);
        assert_eq!(attempt.remaining_seconds_at(started), 120);
        assert_eq!(
            attempt.remaining_seconds_at(started + chrono::Duration::seconds(50)),
            70
        );
        assert_eq!(
            attempt.remaining_seconds_at(started + chrono::Duration::minutes(5)),
            0
        );
    }
}
