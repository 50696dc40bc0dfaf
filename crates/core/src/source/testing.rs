//! Scripted [`RecordSource`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{FetchError, PageRequest, RecordSource};

/// Serves a fixed sequence of page responses, one per call, and records
/// every request it sees.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Value, FetchError>>>,
    requests: Mutex<Vec<PageRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cursors_seen(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().iter().map(|r| r.cursor.clone()).collect()
    }

    pub fn last_request(&self) -> Option<PageRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("script exhausted".into())))
    }
}

/// Build a page body holding `count` project-shaped records with ids
/// starting at `start`.
pub fn page(start: usize, count: usize, cursor: Option<&str>) -> Value {
    let data: Vec<Value> = (start..start + count)
        .map(|n| {
            json!({
                "ID": n.to_string(),
                "Project_Name": format!("Project {n}"),
                "Address": format!("{n} Main St"),
                "Latitude": "12.9",
                "Longitude": "77.6",
            })
        })
        .collect();

    match cursor {
        Some(c) => json!({ "data": data, "cursor": c }),
        None => json!({ "data": data }),
    }
}

/// Build a page body from explicit records, without a cursor.
pub fn page_of(records: Vec<Value>) -> Value {
    json!({ "data": records })
}
