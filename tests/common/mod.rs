#![allow(dead_code)]
use async_trait::async_trait;
use http_client::{Error, HttpClient, Request, Response};
use http_types::StatusCode;
use lastfm_scrobble::{ClientConfig, LastFmApiClientImpl};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "KEY";
pub const SHARED_SECRET: &str = "SECRET";

/// A request as seen by the stub transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub query: Option<String>,
    pub body: String,
    pub content_type: Option<String>,
}

impl RecordedRequest {
    /// Decoded parameters, from the query string for GET and the body for POST.
    pub fn params(&self) -> BTreeMap<String, String> {
        let raw = if self.method == "GET" {
            self.query.clone().unwrap_or_default()
        } else {
            self.body.clone()
        };
        decode_form(&raw)
    }
}

fn decode_form(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                urlencoding::decode(key).unwrap().into_owned(),
                urlencoding::decode(value).unwrap().into_owned(),
            )
        })
        .collect()
}

/// HTTP transport that replays canned responses and records every request.
///
/// When no response is queued the send fails like a dropped connection.
#[derive(Debug, Clone, Default)]
pub struct StubHttpClient {
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn send(&self, mut req: Request) -> Result<Response, Error> {
        let body = req.body_string().await?;
        let recorded = RecordedRequest {
            method: req.method().to_string(),
            url: req.url().to_string(),
            query: req.url().query().map(str::to_string),
            body,
            content_type: req
                .header("Content-Type")
                .map(|values| values.last().as_str().to_string()),
        };
        self.requests.lock().unwrap().push(recorded);

        let (status, body) = self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            Error::from_str(StatusCode::ServiceUnavailable, "connection refused")
        })?;

        let mut response = Response::new(status);
        response.set_body(body);
        Ok(response)
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new().with_credentials(API_KEY, SHARED_SECRET)
}

/// A client wired to a fresh stub, plus a handle to inspect the stub.
pub fn stub_client() -> (LastFmApiClientImpl, StubHttpClient) {
    let stub = StubHttpClient::new();
    let client = LastFmApiClientImpl::new(Box::new(stub.clone()), test_config());
    (client, stub)
}

pub fn signature_of(params: &BTreeMap<String, String>) -> String {
    let mut base = String::new();
    for (key, value) in params.iter().filter(|(k, _)| k.as_str() != "api_sig") {
        base.push_str(key);
        base.push_str(value);
    }
    base.push_str(SHARED_SECRET);
    format!("{:x}", md5::compute(base.as_bytes()))
}
