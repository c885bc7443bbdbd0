use super::http::{ApiError, Payload, Request, RequestClient};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned responses keyed by request path. Unknown paths answer 404.
#[derive(Default)]
pub struct StubClient {
    responses: HashMap<String, Result<Payload, u16>>,
    calls: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn with(mut self, path: &str, payload: Payload) -> Self {
        self.responses.insert(path.to_string(), Ok(payload));
        self
    }

    pub fn failing(mut self, path: &str, status: u16) -> Self {
        self.responses.insert(path.to_string(), Err(status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestClient for StubClient {
    async fn request(&self, request: &Request) -> Result<Payload, ApiError> {
        self.calls.lock().unwrap().push(request.path.clone());
        match self.responses.get(&request.path) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(code)) => Err(ApiError::HttpStatus {
                status: StatusCode::from_u16(*code).unwrap(),
                body: String::new(),
            }),
            None => Err(ApiError::HttpStatus {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            }),
        }
    }
}
