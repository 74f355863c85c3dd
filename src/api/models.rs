use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Teachers and admins may create tests and read per-test statistics.
    pub fn can_author(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterProfile {
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.first_name, self.last_name, self.role.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<T>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub time_limit: u32,
    #[serde(default)]
    pub question_count: u32,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Display metadata of a single test. Everything is optional on the wire.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Submission {
    pub id: i64,
    #[serde(default)]
    pub test: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn score_display(&self) -> String {
        format_score(self.score)
    }

    pub fn status_display(&self) -> String {
        status_label(&self.status)
    }
}

/// Result of a submitted attempt as shown on the result screen.
pub type SubmissionResult = Submission;

#[derive(Clone, Debug, Deserialize)]
pub struct StudentStats {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tests_taken: u32,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub avg_score: Option<f64>,
    #[serde(default)]
    pub test_results: Vec<StudentTestResult>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StudentTestResult {
    pub test_id: i64,
    #[serde(default)]
    pub test_title: String,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TestStats {
    pub test_id: i64,
    #[serde(default)]
    pub test_title: String,
    #[serde(default)]
    pub submission_count: u32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub avg_score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub max_score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub question_stats: Vec<QuestionStats>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionStats {
    pub question_id: i64,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,
    #[serde(default)]
    pub correct_percentage: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewTest {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub time_limit: u32,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewQuestion {
    pub text: String,
    pub question_type: String,
    pub points: u32,
    pub order: u32,
    pub choices: Vec<NewChoice>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewChoice {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Created {
    pub id: i64,
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s.fract() == 0.0 => format!("{s:.0}%"),
        Some(s) => format!("{s:.2}%"),
        None => "Pending".to_string(),
    }
}

pub fn status_label(status: &str) -> String {
    match status {
        "completed" => "Completed".to_string(),
        "timed_out" => "Timed Out".to_string(),
        "in_progress" => "In Progress".to_string(),
        other => other.to_string(),
    }
}

/// Decimal fields arrive either as JSON numbers or as decimal strings.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
