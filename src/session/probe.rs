use serde_json::Value;

use crate::api::Client;
use crate::error::ClientResult;

/// The ways a test's questions can be located, in the order they are tried.
///
/// The backend has served questions from several places over time
/// (teacher-only nested route, unslashed route, embedded in the test
/// detail), so each probe is a fallback for the ones before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionProbe {
    Primary,
    Secondary,
    Embedded,
    PrimaryAnyList,
}

impl QuestionProbe {
    pub const ORDER: [QuestionProbe; 4] = [
        QuestionProbe::Primary,
        QuestionProbe::Secondary,
        QuestionProbe::Embedded,
        QuestionProbe::PrimaryAnyList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuestionProbe::Primary => "questions endpoint",
            QuestionProbe::Secondary => "alternate questions endpoint",
            QuestionProbe::Embedded => "embedded in test",
            QuestionProbe::PrimaryAnyList => "any list field",
        }
    }

    fn run(self, client: &mut Client, test_id: i64, meta: &Value) -> ClientResult<Vec<Value>> {
        let endpoints = client.auth().endpoints().clone();
        let found = match self {
            QuestionProbe::Primary => client
                .probe_json(endpoints.questions(test_id))?
                .map(|body| questions_from_shape(&body)),
            QuestionProbe::Secondary => client
                .probe_json(endpoints.questions_alt(test_id))?
                .map(|body| questions_from_shape(&body)),
            QuestionProbe::Embedded => Some(embedded_questions(meta)),
            QuestionProbe::PrimaryAnyList => client
                .probe_json(endpoints.questions(test_id))?
                .map(|body| first_non_empty_list(&body)),
        };
        Ok(found.unwrap_or_default())
    }
}

/// Read a question list out of a paged body (`results`), a bare list, or a
/// `questions` field. The first shape present wins even when it is empty.
pub fn questions_from_shape(body: &Value) -> Vec<Value> {
    if let Some(results) = body.get("results").and_then(Value::as_array) {
        return results.clone();
    }
    if let Some(list) = body.as_array() {
        return list.clone();
    }
    body.get("questions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn embedded_questions(meta: &Value) -> Vec<Value> {
    meta.get("questions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// First non-empty list among the top-level fields, in server order.
pub fn first_non_empty_list(body: &Value) -> Vec<Value> {
    body.as_object()
        .and_then(|fields| {
            fields
                .values()
                .filter_map(Value::as_array)
                .find(|list| !list.is_empty())
        })
        .cloned()
        .unwrap_or_default()
}

/// Try each probe in order and stop at the first non-empty result. A probe
/// that fails at the transport level counts as empty; an expired session
/// aborts the whole sequence.
pub fn resolve_questions(
    client: &mut Client,
    test_id: i64,
    meta: &Value,
) -> ClientResult<Option<(QuestionProbe, Vec<Value>)>> {
    for probe in QuestionProbe::ORDER {
        let questions = match probe.run(client, test_id, meta) {
            Ok(questions) => questions,
            Err(err) if err.is_session_expired() => return Err(err),
            Err(err) => {
                tracing::warn!(test_id, probe = probe.name(), error = %err, "question probe failed");
                Vec::new()
            }
        };
        tracing::debug!(test_id, probe = probe.name(), count = questions.len(), "question probe");
        if !questions.is_empty() {
            if probe != QuestionProbe::Primary {
                tracing::info!(test_id, probe = probe.name(), "questions found by fallback probe");
            }
            return Ok(Some((probe, questions)));
        }
    }
    Ok(None)
}
