pub mod endpoints;
pub mod models;
pub mod transport;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthManager;
use crate::error::{ClientError, ClientResult};
use models::{
    Created, NewQuestion, NewTest, Page, StudentStats, Submission, TestStats, TestSummary,
    UserProfile,
};
use transport::{ApiRequest, ApiResponse};

/// Typed calls against the testing platform. Every call goes through
/// [`AuthManager::send`], so each one gets the refresh-and-retry behaviour.
pub struct Client {
    auth: AuthManager,
}

impl Client {
    pub fn new(auth: AuthManager) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthManager {
        &mut self.auth
    }

    pub fn send(&mut self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.auth.send(request)
    }

    fn get_json<T: DeserializeOwned>(&mut self, url: String, failure: &str) -> ClientResult<T> {
        let response = self.auth.send(ApiRequest::get(url))?;
        if !response.is_success() {
            tracing::warn!(status = response.status, "{failure}");
            return Err(ClientError::LoadFailed(failure.to_string()));
        }
        response.json()
    }

    fn post_json<B: Serialize>(&mut self, url: String, body: &B) -> ClientResult<ApiResponse> {
        let body = serde_json::to_value(body).map_err(|_| ClientError::InvalidServerResponse)?;
        self.auth.send(ApiRequest::post(url, body))
    }

    /// GET `url` and return its JSON body, or `None` when the call did not
    /// produce usable JSON. Only transport failures and session expiry are
    /// errors.
    pub fn probe_json(&mut self, url: String) -> ClientResult<Option<Value>> {
        let response = self.auth.send(ApiRequest::get(url.clone()))?;
        if !response.is_success() {
            tracing::debug!(%url, status = response.status, "probe returned non-success");
            return Ok(None);
        }
        Ok(response.json_value())
    }

    pub fn current_user(&mut self) -> ClientResult<UserProfile> {
        let url = self.auth.endpoints().me();
        self.get_json(url, "Failed to fetch user data")
    }

    pub fn list_tests(&mut self) -> ClientResult<Vec<TestSummary>> {
        let url = self.auth.endpoints().tests();
        let page: Page<TestSummary> = self.get_json(url, "Failed to load tests")?;
        Ok(page.results)
    }

    pub fn test_detail(&mut self, test_id: i64) -> ClientResult<Value> {
        let url = self.auth.endpoints().test(test_id);
        self.get_json(url, "Failed to load test")
    }

    pub fn submit(&mut self, body: &Value) -> ClientResult<ApiResponse> {
        let url = self.auth.endpoints().submissions();
        self.post_json(url, body)
    }

    pub fn list_submissions(&mut self) -> ClientResult<Vec<Submission>> {
        let url = self.auth.endpoints().submissions();
        let page: Page<Submission> = self.get_json(url, "Failed to load submissions")?;
        Ok(page.results)
    }

    pub fn submission(&mut self, submission_id: i64) -> ClientResult<Submission> {
        let url = self.auth.endpoints().submission(submission_id);
        self.get_json(url, "Failed to load submission results")
    }

    pub fn student_stats(&mut self) -> ClientResult<StudentStats> {
        let url = self.auth.endpoints().student_stats();
        self.get_json(url, "Failed to load statistics")
    }

    pub fn test_stats(&mut self, test_id: i64) -> ClientResult<TestStats> {
        let url = self.auth.endpoints().test_stats(test_id);
        self.get_json(url, "Failed to load test statistics")
    }

    pub fn create_test(&mut self, test: &NewTest) -> ClientResult<i64> {
        let url = self.auth.endpoints().tests();
        let response = self.post_json(url, test)?;
        response.error_for_status("Failed to create test")?;
        let created: Created = response.json()?;
        Ok(created.id)
    }

    pub fn create_question(&mut self, test_id: i64, question: &NewQuestion) -> ClientResult<()> {
        let url = self.auth.endpoints().questions(test_id);
        let response = self.post_json(url, question)?;
        response.error_for_status(&format!("Failed to create question {}", question.order))
    }
}
