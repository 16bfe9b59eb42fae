//! In-memory collaborators for controller, worker, and export tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::store::{
    ComponentRecord, ComponentStore, DashboardResolver, ImageFetcher, ImageFile, ImageUploader, NewComponent,
    StoreError,
};

#[derive(Debug, Default)]
struct MockState {
    records: Vec<ComponentRecord>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    user: Option<Uuid>,
    dashboard: Option<Uuid>,
    dashboards_created: usize,
    images: HashMap<String, Vec<u8>>,
}

/// Store, resolver, uploader, and fetcher backed by a mutex-guarded vec.
#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    /// A store with a signed-in user and no dashboard yet.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().user = Some(Uuid::new_v4());
        store
    }

    /// A store with no signed-in user.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Seed an existing dashboard with records.
    #[must_use]
    pub fn with_dashboard(self, dashboard_id: Uuid, records: Vec<ComponentRecord>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.dashboard = Some(dashboard_id);
            state.records = records;
        }
        self
    }

    /// Make every later call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }

    /// Register image bytes served for `url`.
    pub fn serve_image(&self, url: &str, bytes: &[u8]) {
        self.state.lock().unwrap().images.insert(url.to_owned(), bytes.to_vec());
    }

    /// Operation names in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| c.as_str() == op).count()
    }

    #[must_use]
    pub fn records(&self) -> Vec<ComponentRecord> {
        self.state.lock().unwrap().records.clone()
    }

    #[must_use]
    pub fn record(&self, id: Uuid) -> Option<ComponentRecord> {
        self.state.lock().unwrap().records.iter().find(|r| r.id == id).cloned()
    }

    #[must_use]
    pub fn dashboards_created(&self) -> usize {
        self.state.lock().unwrap().dashboards_created
    }

    fn begin(state: &mut MockState, op: &'static str) -> Result<(), StoreError> {
        state.calls.push(op.to_owned());
        if state.failing.contains(op) {
            return Err(StoreError::Backend(format!("{op} failed")));
        }
        Ok(())
    }

    fn update(&self, op: &'static str, id: Uuid, apply: impl FnOnce(&mut ComponentRecord)) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, op)?;
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            apply(record);
        }
        Ok(())
    }
}

/// A stored record with the given kind and raw coordinates.
#[must_use]
pub fn record(dashboard_id: Uuid, kind: &str, x: Value, y: Value) -> ComponentRecord {
    ComponentRecord {
        id: Uuid::new_v4(),
        dashboard_id: Some(dashboard_id),
        kind: json!(kind),
        content: Some(String::new()),
        position_x: x,
        position_y: y,
        width: Value::Null,
        height: Value::Null,
        style: Some(json!({ "zIndex": "1" })),
    }
}

#[async_trait]
impl ComponentStore for MockStore {
    async fn fetch_components(&self, dashboard_id: Uuid) -> Result<Vec<ComponentRecord>, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "fetch_components")?;
        Ok(state.records.iter().filter(|r| r.dashboard_id == Some(dashboard_id)).cloned().collect())
    }

    async fn insert_component(&self, component: NewComponent) -> Result<ComponentRecord, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "insert_component")?;
        let record = ComponentRecord {
            id: Uuid::new_v4(),
            dashboard_id: Some(component.dashboard_id),
            kind: json!(component.kind),
            content: Some(component.content),
            position_x: json!(component.position_x),
            position_y: json!(component.position_y),
            width: json!(component.width),
            height: json!(component.height),
            style: Some(component.style),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_position(&self, id: Uuid, x: f64, y: f64) -> Result<(), StoreError> {
        self.update("update_position", id, |r| {
            r.position_x = json!(x);
            r.position_y = json!(y);
        })
    }

    async fn update_size(&self, id: Uuid, width: f64, height: f64) -> Result<(), StoreError> {
        self.update("update_size", id, |r| {
            r.width = json!(width);
            r.height = json!(height);
        })
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<(), StoreError> {
        self.update("update_content", id, |r| r.content = Some(content.to_owned()))
    }

    async fn update_style(&self, id: Uuid, style: Value) -> Result<(), StoreError> {
        self.update("update_style", id, |r| r.style = Some(style))
    }

    async fn delete_component(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "delete_component")?;
        state.records.retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_all_for_dashboard(&self, dashboard_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "delete_all_for_dashboard")?;
        state.records.retain(|r| r.dashboard_id != Some(dashboard_id));
        Ok(())
    }

    async fn touch_dashboard(&self, _dashboard_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "touch_dashboard")
    }
}

#[async_trait]
impl DashboardResolver for MockStore {
    async fn current_user(&self) -> Result<Uuid, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "current_user")?;
        state.user.ok_or(StoreError::NotAuthenticated)
    }

    async fn get_or_create_dashboard(&self) -> Result<Uuid, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "get_or_create_dashboard")?;
        if state.user.is_none() {
            return Err(StoreError::NotAuthenticated);
        }
        if let Some(id) = state.dashboard {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        state.dashboard = Some(id);
        state.dashboards_created += 1;
        Ok(id)
    }
}

#[async_trait]
impl ImageUploader for MockStore {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "upload_image")?;
        let url = format!("https://storage.test/dashboard-images/{}.{}", Uuid::new_v4(), file.extension());
        state.images.insert(url.clone(), file.bytes.clone());
        Ok(url)
    }
}

#[async_trait]
impl ImageFetcher for MockStore {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let mut state = self.state.lock().unwrap();
        Self::begin(&mut state, "fetch_image")?;
        state
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::Status { status: 404, body: format!("no object at {url}") })
    }
}
