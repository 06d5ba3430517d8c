//! Scripted transport and session fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use session_http::{
    ClientConfig, ExecutionContext, HttpClient, HttpRequest, HttpResponse, MemoryNavigator,
    MemoryTokenStore, Session, Transport, TransportError,
};

pub const BACKEND: &str = "http://backend.test";

#[derive(Clone)]
enum Reply {
    Respond { status: u16, body: String, delay: Duration },
    Fail { delay: Duration },
}

/// Answers requests by URL and records everything it was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.respond_after(url, status, body, Duration::ZERO)
    }

    pub fn respond_after(&self, url: &str, status: u16, body: &str, delay: Duration) -> &Self {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            Reply::Respond {
                status,
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    pub fn fail_after(&self, url: &str, delay: Duration) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Fail { delay });
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, url: &str) -> usize {
        self.sent().iter().filter(|request| request.url == url).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = self.replies.lock().unwrap().get(&request.url).cloned();
        self.sent.lock().unwrap().push(request.clone());
        match reply {
            Some(Reply::Respond { status, body, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body,
                })
            }
            Some(Reply::Fail { delay }) => {
                tokio::time::sleep(delay).await;
                Err(TransportError::Network("connection reset".to_string()))
            }
            None => Ok(HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: format!(r#"{{"message":"no route for {}"}}"#, request.url),
            }),
        }
    }
}

pub struct Fixture {
    pub client: HttpClient,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryTokenStore>,
    pub navigator: Arc<MemoryNavigator>,
}

pub fn fixture(context: ExecutionContext) -> Fixture {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MemoryTokenStore::new());
    let navigator = Arc::new(MemoryNavigator::new());
    let session = Session::new(context, store.clone(), navigator.clone());
    let client = HttpClient::new(
        ClientConfig::default().with_api_endpoint(BACKEND),
        transport.clone(),
        Arc::new(session),
    );
    Fixture {
        client,
        transport,
        store,
        navigator,
    }
}
