use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::api::Client;
use crate::api::models::{SubmissionResult, TestMeta};
use crate::error::{ClientError, ClientResult};
use crate::session::answers::{Answer, AnswerSheet};
use crate::session::attempt::TestAttempt;
use crate::session::probe::{self, QuestionProbe};
use crate::session::timer::{Countdown, Tick};
use crate::store::json_store::JsonStore;
use crate::store::schema::{AttemptSnapshot, CURRENT_TEST_DATA_KEY, CURRENT_TEST_ID_KEY};

/// Test ids carried by the test view itself. They back up the in-memory
/// attempt when resolving which test is being submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdHints {
    pub submit_control: Option<i64>,
    pub test_view: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub submission_id: i64,
    pub timed_out: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resumed {
    pub test_id: i64,
    /// The time limit ran out while the client was away.
    pub expired: bool,
}

/// Lifecycle of one test attempt: start, countdown, answer, submit.
pub struct TestSessionController {
    store: JsonStore,
    attempt: Option<TestAttempt>,
    sheet: AnswerSheet,
    countdown: Option<Countdown>,
    found_by: Option<QuestionProbe>,
}

impl TestSessionController {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            attempt: None,
            sheet: AnswerSheet::default(),
            countdown: None,
            found_by: None,
        }
    }

    pub fn attempt(&self) -> Option<&TestAttempt> {
        self.attempt.as_ref()
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    pub fn sheet_mut(&mut self) -> &mut AnswerSheet {
        &mut self.sheet
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref()
    }

    pub fn found_by(&self) -> Option<QuestionProbe> {
        self.found_by
    }

    pub fn start_test(&mut self, client: &mut Client, test_id: i64) -> ClientResult<&TestAttempt> {
        tracing::info!(test_id, "starting test");
        self.stop_countdown();

        let meta_value: Value = client.test_detail(test_id)?;
        let meta: TestMeta = serde_json::from_value(meta_value.clone()).unwrap_or_else(|err| {
            tracing::warn!(test_id, error = %err, "test metadata has unexpected shape");
            TestMeta::default()
        });

        let Some((found_by, raw_questions)) = probe::resolve_questions(client, test_id, &meta_value)?
        else {
            tracing::warn!(test_id, "every question probe came back empty");
            return Err(ClientError::NoQuestionsAvailable);
        };

        let attempt = TestAttempt::new(test_id, &meta, &raw_questions, Utc::now());
        self.found_by = Some(found_by);
        let sheet = AnswerSheet::from_attempt(&attempt);
        self.begin(attempt, sheet, None);
        self.mirror();
        self.attempt.as_ref().ok_or(ClientError::NoQuestionsAvailable)
    }

    /// Install `attempt` as the live attempt with `sheet` as its answers. The
    /// countdown runs for `remaining` seconds, or the full limit when `None`.
    fn begin(&mut self, attempt: TestAttempt, sheet: AnswerSheet, remaining: Option<u64>) {
        self.sheet = sheet;
        self.countdown = if attempt.time_limit_minutes > 0 {
            Some(Countdown::from_seconds(
                remaining.unwrap_or_else(|| attempt.time_limit_seconds()),
            ))
        } else {
            tracing::warn!(test_id = attempt.test_id, "no time limit set for test");
            None
        };
        self.attempt = Some(attempt);
    }

    fn mirror(&self) {
        let Some(attempt) = &self.attempt else {
            return;
        };
        let saved = self
            .store
            .set(CURRENT_TEST_ID_KEY, &attempt.test_id)
            .and_then(|()| {
                self.store.set(
                    CURRENT_TEST_DATA_KEY,
                    &AttemptSnapshot::new(attempt, &self.sheet),
                )
            });
        if let Err(err) = saved {
            tracing::warn!(error = %err, "could not mirror attempt to storage");
        }
    }

    fn clear_mirror(&self) {
        for key in [CURRENT_TEST_ID_KEY, CURRENT_TEST_DATA_KEY] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(key, error = %err, "could not clear stored attempt");
            }
        }
    }

    fn stored_snapshot(&self) -> Option<AttemptSnapshot> {
        self.store
            .get::<AttemptSnapshot>(CURRENT_TEST_DATA_KEY)
            .filter(|s| !s.needs_reset())
    }

    /// Test id of an attempt left behind by an earlier run, if any.
    pub fn stored_test_id(&self) -> Option<i64> {
        self.store.get(CURRENT_TEST_ID_KEY)
    }

    /// Bring back the attempt mirrored by an earlier run, with the countdown
    /// reduced by the time that passed since it started. Answers saved with
    /// it come back too.
    pub fn resume_stored(&mut self, now: DateTime<Utc>) -> Option<Resumed> {
        let snapshot = self.stored_snapshot()?;
        let sheet = snapshot.restored_sheet();
        let attempt = snapshot.attempt;
        let test_id = attempt.test_id;
        let remaining = attempt.remaining_seconds_at(now);
        let expired = attempt.time_limit_minutes > 0 && remaining == 0;

        tracing::info!(test_id, remaining, expired, "resuming stored attempt");
        self.begin(attempt, sheet, Some(remaining));
        Some(Resumed { test_id, expired })
    }

    /// Advance the countdown by one second. When it runs out the attempt is
    /// submitted as timed out and the outcome returned.
    pub fn on_second(
        &mut self,
        client: &mut Client,
        hints: IdHints,
    ) -> Option<ClientResult<Submitted>> {
        match self.countdown.as_mut()?.tick() {
            Tick::Expired => {
                tracing::info!("time limit reached, submitting");
                Some(self.submit_test(client, true, hints))
            }
            Tick::Running(_) | Tick::Idle => None,
        }
    }

    pub fn collect_answers(&self) -> Vec<Answer> {
        self.sheet.collect()
    }

    pub fn submit_test(
        &mut self,
        client: &mut Client,
        timed_out: bool,
        hints: IdHints,
    ) -> ClientResult<Submitted> {
        let was_running = self.countdown.as_ref().is_some_and(Countdown::is_running);
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.cancel();
        }

        let outcome = self.try_submit(client, timed_out, hints);
        if let Err(err) = &outcome {
            tracing::error!(error = %err, timed_out, "submission failed");
            self.mirror();
            if was_running
                && !timed_out
                && let Some(countdown) = self.countdown.as_mut()
            {
                countdown.resume();
            }
        }
        outcome
    }

    fn try_submit(
        &mut self,
        client: &mut Client,
        timed_out: bool,
        hints: IdHints,
    ) -> ClientResult<Submitted> {
        let test_id = self.resolve_test_id(hints).ok_or(ClientError::NoTestId)?;

        let answers = self.collect_answers();
        if answers.is_empty() {
            return Err(ClientError::NoAnswers);
        }

        tracing::info!(test_id, answers = answers.len(), timed_out, "submitting test");
        let response = client.submit(&json!({ "test": test_id, "answers": answers }))?;
        if !response.is_json() {
            tracing::error!(status = response.status, "submission response is not JSON");
            return Err(ClientError::InvalidServerResponse);
        }
        let body: Value = response.json()?;
        if !response.is_success() {
            let message = body
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("Failed to submit test. Please try again.")
                .to_string();
            return Err(ClientError::Request {
                status: response.status,
                message,
            });
        }

        let Some(submission_id) = body.get("id").and_then(Value::as_i64) else {
            tracing::error!(status = response.status, "submission response carries no id");
            return Err(ClientError::InvalidServerResponse);
        };

        self.clear_mirror();
        self.attempt = None;
        self.sheet = AnswerSheet::default();
        self.countdown = None;
        tracing::info!(test_id, submission_id, "test submitted");
        Ok(Submitted {
            submission_id,
            timed_out,
        })
    }

    /// In-memory attempt, then the view's ids, then the storage mirror. Using
    /// the mirror also restores the attempt so answers have context.
    fn resolve_test_id(&mut self, hints: IdHints) -> Option<i64> {
        if let Some(attempt) = &self.attempt {
            return Some(attempt.test_id);
        }
        if let Some(id) = hints.submit_control.or(hints.test_view) {
            tracing::debug!(test_id = id, "test id taken from the test view");
            return Some(id);
        }

        let test_id: i64 = self.store.get(CURRENT_TEST_ID_KEY)?;
        tracing::info!(test_id, "test id restored from storage");
        if let Some(snapshot) = self.stored_snapshot() {
            if self.sheet.is_empty() {
                self.sheet = snapshot.restored_sheet();
            }
            self.attempt = Some(snapshot.attempt);
        }
        Some(test_id)
    }

    pub fn load_submission_result(
        &self,
        client: &mut Client,
        submission_id: i64,
    ) -> ClientResult<SubmissionResult> {
        client.submission(submission_id)
    }

    fn stop_countdown(&mut self) {
        if let Some(mut previous) = self.countdown.take() {
            previous.cancel();
        }
    }

    /// Write the current answers to the storage mirror.
    pub fn save_progress(&self) {
        self.mirror();
    }

    /// Drop the in-memory attempt but keep the storage mirror, answers
    /// included, so it can be offered for resume after signing in again.
    pub fn suspend(&mut self) {
        self.mirror();
        self.stop_countdown();
        self.attempt = None;
        self.sheet = AnswerSheet::default();
    }

    /// Leave the attempt without submitting. Memory and storage are cleared.
    pub fn abandon(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            tracing::info!(test_id = attempt.test_id, "attempt abandoned");
        }
        self.stop_countdown();
        self.sheet = AnswerSheet::default();
        self.found_by = None;
        self.clear_mirror();
    }
}
