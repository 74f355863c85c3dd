/// URL builder for every REST path the client touches. Paths keep the
/// backend's trailing slashes; `questions_alt` is the one deliberate
/// exception used as a fallback probe.
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    pub fn login(&self) -> String {
        self.url("auth/login/")
    }

    pub fn register(&self) -> String {
        self.url("auth/register/")
    }

    pub fn refresh(&self) -> String {
        self.url("auth/refresh/")
    }

    pub fn me(&self) -> String {
        self.url("users/me/")
    }

    pub fn tests(&self) -> String {
        self.url("tests/")
    }

    pub fn test(&self, test_id: i64) -> String {
        self.url(&format!("tests/{test_id}/"))
    }

    pub fn questions(&self, test_id: i64) -> String {
        self.url(&format!("tests/{test_id}/questions/"))
    }

    pub fn questions_alt(&self, test_id: i64) -> String {
        self.url(&format!("tests/{test_id}/questions"))
    }

    pub fn submissions(&self) -> String {
        self.url("submissions/")
    }

    pub fn submission(&self, submission_id: i64) -> String {
        self.url(&format!("submissions/{submission_id}/"))
    }

    pub fn student_stats(&self) -> String {
        self.url("stats/student/")
    }

    pub fn test_stats(&self, test_id: i64) -> String {
        self.url(&format!("stats/tests/{test_id}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_keep_trailing_slashes() {
        let ep = Endpoints::new("http://localhost:8000/api/v1/");
        assert_eq!(ep.login(), "http://localhost:8000/api/v1/auth/login/");
        assert_eq!(ep.test(4), "http://localhost:8000/api/v1/tests/4/");
        assert_eq!(ep.questions(4), "http://localhost:8000/api/v1/tests/4/questions/");
        assert_eq!(ep.submission(9), "http://localhost:8000/api/v1/submissions/9/");
    }

    #[test]
    fn alternate_questions_path_has_no_slash() {
        let ep = Endpoints::new("http://h/api");
        assert_eq!(ep.questions_alt(2), "http://h/api/tests/2/questions");
    }
}
