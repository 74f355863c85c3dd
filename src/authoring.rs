use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::api::Client;
use crate::api::models::{NewChoice, NewQuestion, NewTest};
use crate::session::attempt::QuestionKind;

/// A test written by hand as TOML, e.g.
///
/// ```toml
/// title = "Fractions"
/// subject = "Math"
/// time_limit = 20
///
/// [[questions]]
/// text = "1/2 + 1/4 = ?"
/// question_type = "single_choice"
/// choices = [
///   { text = "3/4", is_correct = true },
///   { text = "2/6" },
/// ]
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct TestDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    #[serde(default = "default_question_type")]
    pub question_type: String,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub choices: Vec<ChoiceDraft>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChoiceDraft {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

fn default_time_limit() -> u32 {
    60
}
fn default_is_active() -> bool {
    true
}
fn default_question_type() -> String {
    "single_choice".to_string()
}
fn default_points() -> u32 {
    1
}

impl TestDraft {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading draft {}", path.display()))?;
        let draft: TestDraft =
            toml::from_str(&content).with_context(|| format!("parsing draft {}", path.display()))?;
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("draft has no title");
        }
        for (i, question) in self.questions.iter().enumerate() {
            let kind = question.question_type.as_str();
            if QuestionKind::from_wire(Some(kind)).as_str() != kind {
                bail!("question {}: unknown question_type {kind:?}", i + 1);
            }
            if question.text.trim().is_empty() {
                bail!("question {} has no text", i + 1);
            }
        }
        Ok(())
    }

    pub fn new_test(&self) -> NewTest {
        NewTest {
            title: self.title.clone(),
            description: self.description.clone(),
            subject: self.subject.clone(),
            time_limit: self.time_limit,
            is_active: self.is_active,
        }
    }

    /// Questions as they are posted: `order` is 1-based, blank choices are
    /// dropped and text questions carry no choices.
    pub fn new_questions(&self) -> Vec<NewQuestion> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let choices = if q.question_type == QuestionKind::Text.as_str() {
                    Vec::new()
                } else {
                    q.choices
                        .iter()
                        .filter(|c| !c.text.is_empty())
                        .map(|c| NewChoice {
                            text: c.text.clone(),
                            is_correct: c.is_correct,
                        })
                        .collect()
                };
                NewQuestion {
                    text: q.text.clone(),
                    question_type: q.question_type.clone(),
                    points: q.points.max(1),
                    order: i as u32 + 1,
                    choices,
                }
            })
            .collect()
    }
}

/// Create the test, then each of its questions in order. Returns the new
/// test id.
pub fn publish(client: &mut Client, draft: &TestDraft) -> Result<i64> {
    let test_id = client.create_test(&draft.new_test())?;
    tracing::info!(test_id, title = %draft.title, "test created");
    for question in draft.new_questions() {
        client
            .create_question(test_id, &question)
            .with_context(|| format!("test {test_id} was created but is incomplete"))?;
    }
    Ok(test_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAFT: &str = r#"
title = "Fractions"
subject = "Math"

[[questions]]
text = "1/2 + 1/4 = ?"
question_type = "single_choice"
choices = [
  { text = "3/4", is_correct = true },
  { text = "" },
  { text = "2/6" },
]

[[questions]]
text = "Explain why"
question_type = "text"
points = 3
choices = [{ text = "ignored" }]
"#;

    #[test]
    fn draft_defaults_and_ordering() {
        let draft: TestDraft = toml::from_str(DRAFT).unwrap();
        draft.validate().unwrap();
        assert_eq!(draft.time_limit, 60);
        assert!(draft.is_active);

        let questions = draft.new_questions();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].order, 1);
        assert_eq!(questions[0].choices.len(), 2);
        assert!(questions[0].choices[0].is_correct);
        assert_eq!(questions[1].order, 2);
        assert_eq!(questions[1].points, 3);
        assert!(questions[1].choices.is_empty());
    }

    #[test]
    fn unknown_question_type_rejected() {
        let draft: TestDraft = toml::from_str(
            r#"
title = "T"
subject = "S"
[[questions]]
text = "q"
question_type = "essay"
"#,
        )
        .unwrap();
        let err = draft.validate().unwrap_err().to_string();
        assert!(err.contains("essay"));
    }

    #[test]
    fn blank_title_rejected() {
        let draft: TestDraft = toml::from_str("title = \" \"\nsubject = \"S\"").unwrap();
        assert!(draft.validate().is_err());
    }
}
