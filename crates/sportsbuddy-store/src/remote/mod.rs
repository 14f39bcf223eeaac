//! Remote backend: Identity Toolkit for auth, Firestore REST for documents.
//!
//! Collections: `profiles/{uid}` `{role, email}`, `cats/{name}` `{createdAt}`,
//! `cities/{name}` `{areas}`, `events/{auto-id}` (queried on `ownerId`).

mod auth;
mod firestore;

use crate::config::RemoteConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::{EventStore, IdentityProvider, TaxonomyStore};
use async_trait::async_trait;
use auth::{error_message, AuthSession};
use chrono::Utc;
use firestore::{encode_fields, Document};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::{json, Map, Value};
use sportsbuddy_model::{
    is_blank, City, Email, Event, EventDraft, EventId, EventPatch, Identity, IdentityId, Role,
    RolePolicy,
};
use std::path::PathBuf;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// File name of the persisted refresh token inside the data directory.
pub const SESSION_FILE: &str = "remote-session.json";

const PROFILES: &str = "profiles";
const CATEGORIES: &str = "cats";
const CITIES: &str = "cities";
const EVENTS: &str = "events";

const PAGE_SIZE: &str = "300";

/// Result of a document call that may legitimately hit a missing or existing document.
enum Outcome {
    Done(Value),
    Missing,
    Conflict,
}

/// Backend over a remote authenticated document database.
///
/// The provider keeps its own session: after sign-in the id token lives in
/// memory and its refresh token in `session_file`, from which the first
/// readiness check restores it.
pub struct RemoteStore {
    http: Client,
    config: RemoteConfig,
    role_policy: RolePolicy,
    auth_base: Url,
    token_base: Url,
    firestore_base: Url,
    session_file: Option<PathBuf>,
    auth: Mutex<Option<AuthSession>>,
    ready: OnceCell<()>,
}

fn parse_base(endpoint: &str) -> StoreResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| StoreError::BackendUnavailable(format!("bad endpoint {}: {}", endpoint, e)))?;
    if url.cannot_be_a_base() {
        return Err(StoreError::BackendUnavailable(format!(
            "endpoint {} cannot be a base URL",
            endpoint
        )));
    }
    Ok(url)
}

impl RemoteStore {
    /// Builds the client. Fails with `BackendUnavailable` if the configuration
    /// is incomplete or the HTTP client cannot be initialized; no network
    /// traffic happens here.
    pub fn connect(
        config: &RemoteConfig,
        role_policy: RolePolicy,
        session_file: Option<PathBuf>,
    ) -> StoreResult<Self> {
        if !config.is_configured() {
            return Err(StoreError::BackendUnavailable(
                "remote configuration incomplete".to_string(),
            ));
        }
        let http = Client::builder()
            .user_agent(concat!("sportsbuddy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            auth_base: parse_base(config.auth_endpoint())?,
            token_base: parse_base(config.token_endpoint())?,
            firestore_base: parse_base(config.firestore_endpoint())?,
            config: config.clone(),
            role_policy,
            session_file,
            auth: Mutex::new(None),
            ready: OnceCell::new(),
        })
    }

    /// Waits for the one-time session restore.
    async fn ensure_ready(&self) -> StoreResult<()> {
        self.ready
            .get_or_try_init(|| self.restore_session())
            .await
            .map(|_| ())
    }

    fn url_with(&self, base: &Url, segments: &[&str]) -> StoreResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::BackendUnavailable(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn database_url(&self, tail: &[&str]) -> StoreResult<Url> {
        let mut segments = vec![
            "v1",
            "projects",
            self.config.project_id.trim(),
            "databases",
            "(default)",
        ];
        segments.extend_from_slice(tail);
        self.url_with(&self.firestore_base, &segments)
    }

    fn document_url(&self, collection: &str, id: &str) -> StoreResult<Url> {
        self.database_url(&["documents", collection, id])
    }

    /// Sends a request with the API key and, when signed in, the id token.
    async fn execute(&self, request: RequestBuilder) -> StoreResult<Outcome> {
        self.ensure_ready().await?;
        let mut request = request.query(&[("key", self.config.api_key.as_str())]);
        if let Some(token) = self.id_token().await? {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => {
                if body.trim().is_empty() {
                    return Ok(Outcome::Done(Value::Null));
                }
                let value = serde_json::from_str(&body)
                    .map_err(|e| StoreError::Decode(format!("response body: {}", e)))?;
                Ok(Outcome::Done(value))
            }
            StatusCode::NOT_FOUND => Ok(Outcome::Missing),
            StatusCode::CONFLICT => Ok(Outcome::Conflict),
            _ => Err(StoreError::BackendOperationFailed(format!(
                "{}: {}",
                status,
                error_message(&body)
            ))),
        }
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = self.document_url(collection, id)?;
        match self.execute(self.http.get(url)).await? {
            Outcome::Done(resource) => Ok(Some(Document::from_resource(&resource)?)),
            Outcome::Missing | Outcome::Conflict => Ok(None),
        }
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let url = self.database_url(&["documents", collection])?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.http.get(url.clone()).query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page = match self.execute(request).await? {
                Outcome::Done(page) => page,
                Outcome::Missing | Outcome::Conflict => break,
            };
            if let Some(items) = page.get("documents").and_then(Value::as_array) {
                for item in items {
                    documents.push(Document::from_resource(item)?);
                }
            }
            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }
        debug!(collection, count = documents.len(), "listed documents");
        Ok(documents)
    }

    /// PATCH a document. `mask` limits the write to those fields (merge);
    /// `exists` adds a precondition on the document's existence.
    async fn write_document(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        mask: Option<&[&str]>,
        exists: Option<bool>,
    ) -> StoreResult<Outcome> {
        let url = self.document_url(collection, id)?;
        let mut request = self.http.patch(url).json(&json!({ "fields": encode_fields(fields) }));
        for path in mask.unwrap_or_default() {
            request = request.query(&[("updateMask.fieldPaths", *path)]);
        }
        if let Some(exists) = exists {
            request = request.query(&[("currentDocument.exists", exists.to_string())]);
        }
        self.execute(request).await
    }

    async fn create_document(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> StoreResult<Document> {
        let url = self.database_url(&["documents", collection])?;
        let request = self.http.post(url).json(&json!({ "fields": encode_fields(fields) }));
        match self.execute(request).await? {
            Outcome::Done(resource) => Document::from_resource(&resource),
            Outcome::Missing | Outcome::Conflict => Err(StoreError::BackendOperationFailed(
                format!("could not create document in {}", collection),
            )),
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let url = self.document_url(collection, id)?;
        self.execute(self.http.delete(url)).await?;
        debug!(collection, id, "deleted document");
        Ok(())
    }

    async fn query_equal(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>> {
        let url = self.database_url(&["documents:runQuery"])?;
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value }
                    }
                }
            }
        });
        let rows = match self.execute(self.http.post(url).json(&body)).await? {
            Outcome::Done(Value::Array(rows)) => rows,
            Outcome::Done(_) | Outcome::Missing | Outcome::Conflict => Vec::new(),
        };
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(Document::from_resource)
            .collect()
    }

    /// Role recorded in `profiles/{uid}`, if any.
    async fn stored_role(&self, uid: &str) -> StoreResult<Option<Role>> {
        let profile = self.get_document(PROFILES, uid).await?;
        Ok(profile
            .as_ref()
            .and_then(|p| p.string("role"))
            .and_then(|r| r.parse::<Role>().ok()))
    }
}

fn object(value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!("expected object, got {}", other))),
    }
}

fn event_from(doc: Document) -> StoreResult<Event> {
    let mut fields = doc.fields;
    fields.insert("id".to_string(), Value::String(doc.id));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| StoreError::Decode(format!("event: {}", e)))
}

fn areas_fields(areas: &[String]) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("areas".to_string(), json!(areas));
    fields
}

#[async_trait]
impl IdentityProvider for RemoteStore {
    async fn register(
        &self,
        email: &str,
        secret: &str,
        requested_role: Role,
    ) -> StoreResult<Identity> {
        self.ensure_ready().await?;
        let email = Email::parse(email)?;
        let role = self.role_policy.resolve_registration(&email, requested_role);

        let session = self.password_auth("signUp", email.as_str(), secret).await?;
        let identity = Identity {
            id: IdentityId::new(session.uid.clone()),
            email: session.email.clone(),
            role,
        };
        self.install_session(session).await;

        let profile = object(json!({ "role": role, "email": identity.email }))?;
        self.write_document(PROFILES, identity.id.as_str(), &profile, None, None)
            .await?;
        Ok(identity)
    }

    async fn login(&self, email: &str, secret: &str) -> StoreResult<Identity> {
        self.ensure_ready().await?;
        let session = self
            .password_auth("signInWithPassword", email.trim(), secret)
            .await?;
        let (uid, email) = (session.uid.clone(), session.email.clone());
        self.install_session(session).await;

        let role = match self.stored_role(&uid).await? {
            Some(role) => role,
            None => self.role_policy.resolve_fallback(&email),
        };
        Ok(Identity {
            id: IdentityId::new(uid),
            email,
            role,
        })
    }

    async fn current_session(&self) -> StoreResult<Option<Identity>> {
        self.ensure_ready().await?;
        let signed_in = self
            .auth
            .lock()
            .await
            .as_ref()
            .map(|s| (s.uid.clone(), s.email.clone()));
        let Some((uid, email)) = signed_in else {
            return Ok(None);
        };
        // a restored session without a profile is an ordinary user
        let role = self.stored_role(&uid).await?.unwrap_or_default();
        Ok(Some(Identity {
            id: IdentityId::new(uid),
            email,
            role,
        }))
    }

    async fn set_session(&self, identity: &Identity) -> StoreResult<()> {
        debug!(id = %identity.id, "remote provider keeps its own session");
        Ok(())
    }

    async fn clear_session(&self) -> StoreResult<()> {
        self.ensure_ready().await?;
        self.drop_session().await;
        Ok(())
    }
}

#[async_trait]
impl TaxonomyStore for RemoteStore {
    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        let docs = self.list_documents(CATEGORIES).await?;
        Ok(docs.into_iter().map(|d| d.id).collect())
    }

    async fn add_category(&self, name: &str) -> StoreResult<()> {
        if is_blank(name) {
            return Ok(());
        }
        let fields = object(json!({ "createdAt": Utc::now().to_rfc3339() }))?;
        // create-only, so an existing category keeps its createdAt
        self.write_document(CATEGORIES, name.trim(), &fields, None, Some(false))
            .await?;
        Ok(())
    }

    async fn remove_category(&self, name: &str) -> StoreResult<()> {
        self.delete_document(CATEGORIES, name.trim()).await
    }

    async fn list_cities(&self) -> StoreResult<Vec<City>> {
        let docs = self.list_documents(CITIES).await?;
        Ok(docs
            .into_iter()
            .map(|d| City {
                areas: d.string_array("areas"),
                name: d.id,
            })
            .collect())
    }

    async fn add_city(&self, name: &str) -> StoreResult<()> {
        if is_blank(name) {
            return Ok(());
        }
        // create-only, so an existing city keeps its areas
        self.write_document(CITIES, name.trim(), &areas_fields(&[]), None, Some(false))
            .await?;
        Ok(())
    }

    async fn remove_city(&self, name: &str) -> StoreResult<()> {
        self.delete_document(CITIES, name.trim()).await
    }

    async fn add_area_to_city(&self, city: &str, area: &str) -> StoreResult<()> {
        if is_blank(area) {
            return Ok(());
        }
        let (city, area) = (city.trim(), area.trim());
        let Some(doc) = self.get_document(CITIES, city).await? else {
            debug!(city, "area added to missing city ignored");
            return Ok(());
        };
        let mut entry = City {
            name: doc.id.clone(),
            areas: doc.string_array("areas"),
        };
        if entry.insert_area(area) {
            let fields = areas_fields(&entry.areas);
            self.write_document(CITIES, city, &fields, Some(&["areas"][..]), Some(true))
                .await?;
        }
        Ok(())
    }

    async fn remove_area_from_city(&self, city: &str, area: &str) -> StoreResult<()> {
        let (city, area) = (city.trim(), area.trim());
        let Some(doc) = self.get_document(CITIES, city).await? else {
            return Ok(());
        };
        let mut entry = City {
            name: doc.id.clone(),
            areas: doc.string_array("areas"),
        };
        if entry.remove_area(area) {
            let fields = areas_fields(&entry.areas);
            self.write_document(CITIES, city, &fields, Some(&["areas"][..]), Some(true))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for RemoteStore {
    async fn create_event(&self, draft: EventDraft) -> StoreResult<EventId> {
        let fields = object(
            serde_json::to_value(&draft).map_err(|e| StoreError::Decode(e.to_string()))?,
        )?;
        let doc = self.create_document(EVENTS, &fields).await?;
        debug!(id = %doc.id, "event created");
        Ok(EventId::new(doc.id))
    }

    async fn update_event(&self, id: &EventId, patch: EventPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let mask = patch.field_paths();
        let fields = object(
            serde_json::to_value(&patch).map_err(|e| StoreError::Decode(e.to_string()))?,
        )?;
        match self
            .write_document(EVENTS, id.as_str(), &fields, Some(mask.as_slice()), Some(true))
            .await?
        {
            Outcome::Missing => debug!(id = %id, "update of missing event ignored"),
            Outcome::Done(_) | Outcome::Conflict => {}
        }
        Ok(())
    }

    async fn delete_event(&self, id: &EventId) -> StoreResult<()> {
        self.delete_document(EVENTS, id.as_str()).await
    }

    async fn list_events_by_owner(&self, owner: &IdentityId) -> StoreResult<Vec<Event>> {
        self.query_equal(EVENTS, "ownerId", owner.as_str())
            .await?
            .into_iter()
            .map(event_from)
            .collect()
    }

    async fn list_all_events(&self) -> StoreResult<Vec<Event>> {
        self.list_documents(EVENTS)
            .await?
            .into_iter()
            .map(event_from)
            .collect()
    }
}
