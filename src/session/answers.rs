use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::session::attempt::{QuestionKind, TestAttempt};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub question_id: i64,
    pub selected_choice_ids: Vec<i64>,
    pub text_answer: String,
}

/// Answer state of one rendered question, updated as the user interacts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCard {
    pub question_id: String,
    pub kind: QuestionKind,
    pub choice_ids: Vec<i64>,
    selected: HashSet<i64>,
    text: String,
}

impl QuestionCard {
    pub fn new(question_id: impl Into<String>, kind: QuestionKind, choice_ids: Vec<i64>) -> Self {
        Self {
            question_id: question_id.into(),
            kind,
            choice_ids,
            selected: HashSet::new(),
            text: String::new(),
        }
    }

    pub fn is_selected(&self, choice_id: i64) -> bool {
        self.selected.contains(&choice_id)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_answered(&self) -> bool {
        match self.kind {
            QuestionKind::Text => !self.text.trim().is_empty(),
            _ => !self.selected.is_empty(),
        }
    }

    /// Checkbox semantics for multiple choice, radio semantics for single
    /// choice. Returns false when nothing changed.
    pub fn toggle(&mut self, choice_id: i64) -> bool {
        if !self.choice_ids.contains(&choice_id) {
            return false;
        }
        match self.kind {
            QuestionKind::MultipleChoice => {
                if !self.selected.remove(&choice_id) {
                    self.selected.insert(choice_id);
                }
                true
            }
            QuestionKind::SingleChoice => {
                if self.is_selected(choice_id) {
                    return false;
                }
                self.selected.clear();
                self.selected.insert(choice_id);
                true
            }
            QuestionKind::Text => false,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        if self.kind == QuestionKind::Text {
            self.text = text.to_string();
        }
    }

    fn answer(&self) -> Option<Answer> {
        let Ok(question_id) = self.question_id.trim().parse::<i64>() else {
            tracing::warn!(question_id = %self.question_id, "skipping card with non-integer question id");
            return None;
        };

        let mut answer = Answer {
            question_id,
            selected_choice_ids: Vec::new(),
            text_answer: String::new(),
        };
        match self.kind {
            QuestionKind::MultipleChoice => {
                answer.selected_choice_ids = self
                    .choice_ids
                    .iter()
                    .copied()
                    .filter(|id| self.selected.contains(id))
                    .collect();
            }
            QuestionKind::SingleChoice => {
                answer.selected_choice_ids = self
                    .choice_ids
                    .iter()
                    .copied()
                    .find(|id| self.selected.contains(id))
                    .into_iter()
                    .collect();
            }
            QuestionKind::Text => answer.text_answer = self.text.trim().to_string(),
        }
        Some(answer)
    }
}

/// All cards of the current attempt, in question order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    cards: Vec<QuestionCard>,
}

impl AnswerSheet {
    pub fn new(cards: Vec<QuestionCard>) -> Self {
        Self { cards }
    }

    pub fn from_attempt(attempt: &TestAttempt) -> Self {
        Self::new(
            attempt
                .questions
                .iter()
                .map(|q| {
                    QuestionCard::new(q.id.clone(), q.kind, q.choices.iter().map(|c| c.id).collect())
                })
                .collect(),
        )
    }

    pub fn cards(&self) -> &[QuestionCard] {
        &self.cards
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut QuestionCard> {
        self.cards.get_mut(index)
    }

    /// True when the cards line up one-to-one with the attempt's questions.
    pub fn matches(&self, attempt: &TestAttempt) -> bool {
        self.cards.len() == attempt.questions.len()
            && self
                .cards
                .iter()
                .zip(&attempt.questions)
                .all(|(card, question)| card.question_id == question.id && card.kind == question.kind)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn answered_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_answered()).count()
    }

    /// One answer per card with a parseable question id.
    pub fn collect(&self) -> Vec<Answer> {
        self.cards.iter().filter_map(QuestionCard::answer).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_one_answer_per_card_kind() {
        let mut multi = QuestionCard::new("1", QuestionKind::MultipleChoice, vec![10, 11, 12]);
        multi.toggle(12);
        multi.toggle(10);
        let mut single = QuestionCard::new("2", QuestionKind::SingleChoice, vec![20, 21]);
        single.toggle(21);
        let mut text = QuestionCard::new("3", QuestionKind::Text, vec![]);
        text.set_text("  42 \n");

        let answers = AnswerSheet::new(vec![multi, single, text]).collect();
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].selected_choice_ids, vec![10, 12]);
        assert_eq!(answers[1].selected_choice_ids, vec![21]);
        assert!(answers[2].selected_choice_ids.is_empty());
        assert_eq!(answers[2].text_answer, "42");
    }

    #[test]
    fn radio_replaces_previous_selection() {
        let mut card = QuestionCard::new("2", QuestionKind::SingleChoice, vec![1, 2, 3]);
        assert!(card.toggle(1));
        assert!(card.toggle(3));
        assert!(!card.toggle(3));
        assert!(!card.is_selected(1));
        assert!(card.is_selected(3));
    }

    #[test]
    fn checkbox_toggles_off() {
        let mut card = QuestionCard::new("1", QuestionKind::MultipleChoice, vec![1, 2]);
        card.toggle(1);
        card.toggle(1);
        assert!(!card.is_answered());
    }

    #[test]
    fn foreign_choice_ids_are_ignored() {
        let mut card = QuestionCard::new("1", QuestionKind::MultipleChoice, vec![1, 2]);
        assert!(!card.toggle(99));
        assert!(!card.is_answered());
    }

    #[test]
    fn text_is_ignored_on_choice_cards() {
        let mut card = QuestionCard::new("1", QuestionKind::SingleChoice, vec![1]);
        card.set_text("hello");
        assert_eq!(card.text(), "");
    }

    #[test]
    fn unparseable_card_ids_are_skipped() {
        let sheet = AnswerSheet::new(vec![
            QuestionCard::new("abc", QuestionKind::Text, vec![]),
            QuestionCard::new("7", QuestionKind::Text, vec![]),
        ]);
        let answers = sheet.collect();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].question_id, 7);
    }

    #[test]
    fn unanswered_cards_still_produce_answers() {
        let sheet = AnswerSheet::new(vec![QuestionCard::new(
            "4",
            QuestionKind::SingleChoice,
            vec![1, 2],
        )]);
        let answers = sheet.collect();
        assert_eq!(answers.len(), 1);
        assert!(answers[0].selected_choice_ids.is_empty());
        assert_eq!(sheet.answered_count(), 0);
    }

    #[test]
    fn answer_serializes_with_wire_names() {
        let answer = Answer {
            question_id: 1,
            selected_choice_ids: vec![2],
            text_answer: String::new(),
        };
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["question_id"], 1);
        assert_eq!(value["selected_choice_ids"][0], 2);
        assert_eq!(value["text_answer"], "");
    }
}
