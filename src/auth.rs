use serde_json::{Value, json};

use crate::api::endpoints::Endpoints;
use crate::api::models::{AccessToken, RegisterProfile, TokenPair};
use crate::api::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{ClientError, ClientResult};
use crate::store::json_store::JsonStore;
use crate::store::schema::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub access: String,
    pub refresh: String,
}

/// Owns the bearer tokens and every request that needs them.
///
/// Tokens are mirrored in the [`JsonStore`] so a restart keeps the user
/// logged in. Login stores both tokens, refresh rotates only the access
/// token, and logout or a failed refresh clears both.
pub struct AuthManager {
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
    store: JsonStore,
    access: Option<String>,
    refresh: Option<String>,
}

impl AuthManager {
    pub fn new(transport: Box<dyn Transport>, endpoints: Endpoints, store: JsonStore) -> Self {
        let access = store.get::<String>(ACCESS_TOKEN_KEY);
        let refresh = store.get::<String>(REFRESH_TOKEN_KEY);
        if access.is_some() {
            tracing::debug!("restored stored credentials");
        }
        Self {
            transport,
            endpoints,
            store,
            access,
            refresh,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            access: self.access.clone()?,
            refresh: self.refresh.clone()?,
        })
    }

    pub fn login(&mut self, email: &str, password: &str) -> ClientResult<Credentials> {
        let request = ApiRequest::post(
            self.endpoints.login(),
            json!({ "email": email, "password": password }),
        );
        let response = self.transport.send(&request)?;

        if !response.is_success() {
            let message = response
                .detail()
                .unwrap_or_else(|| "Login failed".to_string());
            tracing::warn!(status = response.status, "login rejected");
            return Err(ClientError::Auth(message));
        }

        let pair: TokenPair = response.json()?;
        let credentials = Credentials {
            access: pair.access,
            refresh: pair.refresh,
        };
        self.store_credentials(&credentials)?;
        tracing::info!("logged in");
        Ok(credentials)
    }

    pub fn register(&self, profile: &RegisterProfile) -> ClientResult<()> {
        if profile.password != profile.password2 {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }

        let body = serde_json::to_value(profile)
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let response = self
            .transport
            .send(&ApiRequest::post(self.endpoints.register(), body))?;

        if response.is_success() {
            tracing::info!(email = %profile.email, "registered");
            return Ok(());
        }

        let message = response
            .json_value()
            .map(|v| validation_messages(&v))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Registration failed".to_string());
        tracing::warn!(status = response.status, "registration rejected");
        Err(ClientError::Validation(message))
    }

    /// Issue `request` with the current access token. A 401 triggers at most
    /// one refresh followed by one retry whose result is returned as-is; a
    /// failed refresh ends the session.
    pub fn send(&mut self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let request = request.with_bearer(self.access.as_deref());
        let response = self.transport.send(&request)?;

        if !response.is_unauthorized() || self.refresh.is_none() {
            return Ok(response);
        }

        tracing::info!(url = %request.url, "access token rejected, refreshing");
        match self.refresh_access_token() {
            Some(token) => {
                let retry = request.with_bearer(Some(&token));
                self.transport.send(&retry)
            }
            None => {
                tracing::warn!("refresh failed, session expired");
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Mint a new access token. Any failure clears both tokens and yields
    /// `None`; this never returns an error.
    pub fn refresh_access_token(&mut self) -> Option<String> {
        let Some(refresh) = self.refresh.clone() else {
            self.clear_tokens();
            return None;
        };

        let request = ApiRequest::post(self.endpoints.refresh(), json!({ "refresh": refresh }));
        let token = match self.transport.send(&request) {
            Ok(response) if response.is_success() => {
                response.json::<AccessToken>().ok().map(|t| t.access)
            }
            Ok(response) => {
                tracing::warn!(status = response.status, "refresh rejected");
                None
            }
            Err(err) => {
                tracing::error!(error = %err, "token refresh failed");
                None
            }
        };

        match token {
            Some(access) => {
                if let Err(err) = self.store.set(ACCESS_TOKEN_KEY, &access) {
                    tracing::warn!(error = %err, "could not persist refreshed token");
                }
                self.access = Some(access.clone());
                Some(access)
            }
            None => {
                self.clear_tokens();
                None
            }
        }
    }

    pub fn logout(&mut self) {
        self.clear_tokens();
        tracing::info!("logged out");
    }

    fn store_credentials(&mut self, credentials: &Credentials) -> ClientResult<()> {
        let stored = self
            .store
            .set(ACCESS_TOKEN_KEY, &credentials.access)
            .and_then(|()| self.store.set(REFRESH_TOKEN_KEY, &credentials.refresh));
        if let Err(err) = stored {
            self.clear_tokens();
            return Err(err);
        }
        self.access = Some(credentials.access.clone());
        self.refresh = Some(credentials.refresh.clone());
        Ok(())
    }

    fn clear_tokens(&mut self) {
        self.access = None;
        self.refresh = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(key, error = %err, "could not remove stored token");
            }
        }
    }
}

/// Flatten a `{field: [messages]}` error body into one line, keeping the
/// server's field order.
pub fn validation_messages(body: &Value) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(map) => map.values().for_each(|v| collect(v, out)),
            Value::Null => {}
            other => out.push(other.to_string()),
        }
    }

    let mut messages = Vec::new();
    collect(body, &mut messages);
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_flatten_in_field_order() {
        let body = serde_json::json!({
            "password": ["This password is too short.", "This password is too common."],
            "email": ["user with this email already exists."]
        });
        assert_eq!(
            validation_messages(&body),
            "This password is too short., This password is too common., user with this email already exists."
        );
    }

    #[test]
    fn validation_messages_accepts_bare_strings() {
        let body = serde_json::json!({ "non_field_errors": "Bad", "role": ["Invalid"] });
        assert_eq!(validation_messages(&body), "Bad, Invalid");
    }

    #[test]
    fn validation_messages_empty_object() {
        assert_eq!(validation_messages(&serde_json::json!({})), "");
    }
}
