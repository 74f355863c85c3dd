use serde::{Deserialize, Serialize};

use crate::session::answers::AnswerSheet;
use crate::session::attempt::TestAttempt;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const CURRENT_TEST_ID_KEY: &str = "currentTestId";
pub const CURRENT_TEST_DATA_KEY: &str = "currentTestData";

const SCHEMA_VERSION: u32 = 1;

/// Recovery mirror of the in-progress attempt, stored under
/// `currentTestData`. Never the source of truth while the attempt is live.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttemptSnapshot {
    pub schema_version: u32,
    pub attempt: TestAttempt,
    /// Answers given so far. Older snapshots without it restore blank cards.
    #[serde(default)]
    pub sheet: AnswerSheet,
}

impl AttemptSnapshot {
    pub fn new(attempt: &TestAttempt, sheet: &AnswerSheet) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            attempt: attempt.clone(),
            sheet: sheet.clone(),
        }
    }

    /// The stored answers when they still fit the attempt, blank cards
    /// otherwise.
    pub fn restored_sheet(&self) -> AnswerSheet {
        if self.sheet.matches(&self.attempt) {
            self.sheet.clone()
        } else {
            if !self.sheet.is_empty() {
                tracing::warn!(test_id = self.attempt.test_id, "stored answers do not match attempt");
            }
            AnswerSheet::from_attempt(&self.attempt)
        }
    }

    /// Snapshots written by an incompatible build are discarded.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
