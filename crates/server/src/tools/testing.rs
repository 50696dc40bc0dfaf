//! Test helpers shared by tool tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fieldmap_core::{
    CacheDb, FetchError, PageRequest, RecordSource, SyncCoordinator, SyncSettings,
};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Record source returning the same single page on every call, or failing.
pub struct StaticSource {
    body: Result<Value, FetchError>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn ok(records: Value) -> Arc<Self> {
        Arc::new(Self { body: Ok(json!({ "data": records })), calls: AtomicUsize::new(0) })
    }

    pub fn failing(error: FetchError) -> Arc<Self> {
        Arc::new(Self { body: Err(error), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch_page(&self, _request: &PageRequest) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone()
    }
}

/// Projects around Miami and Tampa in a mix of statuses.
pub fn projects() -> Value {
    json!([
        { "ID": "p1", "Project_Name": "Bayfront", "Address": "100 Biscayne Blvd, Miami FL",
          "Latitude": "25.77", "Longitude": "-80.19", "Account_Type": "Commercial" },
        { "ID": "p2", "Project_Name": "Harbor", "Address": "5 Harbor Way, Tampa FL",
          "Latitude": "27.95", "Longitude": "-82.45", "Account_Type": "Residential" },
        { "ID": "p3", "Project_Name": "Pine", "Address": "9 Pine St, Miami FL",
          "Latitude": "0", "Longitude": "0", "Completed": true, "Account_Type": "Commercial" },
    ])
}

pub async fn coordinator(source: Arc<StaticSource>) -> SyncCoordinator {
    let store = CacheDb::open_in_memory().await.unwrap();
    SyncCoordinator::new(source, Some(store), SyncSettings::default())
}

/// Parse the JSON text content of a tool result.
pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
