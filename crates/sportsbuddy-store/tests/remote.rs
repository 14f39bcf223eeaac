//! Contract tests for the remote backend against an in-process fake of the
//! Identity Toolkit, Secure Token, and Firestore REST endpoints.

use chrono::{TimeZone, Utc};
use percent_encoding::percent_decode_str;
use serde_json::{json, Map, Value};
use sportsbuddy_model::{EventDraft, EventPatch, IdentityId, Role, RolePolicy};
use sportsbuddy_store::{
    EventStore, IdentityProvider, RemoteConfig, RemoteStore, StoreError, TaxonomyStore,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const API_KEY: &str = "test-key";
const DOCUMENTS: &str = "/v1/projects/demo/databases/(default)/documents";
/// Small on purpose so listings span several pages.
const FAKE_PAGE_SIZE: usize = 2;

struct Account {
    uid: String,
    email: String,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    /// (collection, id) -> Firestore typed fields.
    docs: BTreeMap<(String, String), Map<String, Value>>,
    counter: u64,
    /// Authorization header of every document request, in order.
    bearers: Vec<Option<String>>,
}

impl State {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

#[derive(Clone, Default)]
struct FakeFirebase {
    state: Arc<Mutex<State>>,
}

fn error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_json(json!({ "error": { "code": status, "message": message } }))
}

fn resource(collection: &str, id: &str, fields: &Map<String, Value>) -> Value {
    json!({
        "name": format!("projects/demo/databases/(default)/documents/{}/{}", collection, id),
        "fields": fields,
        "createTime": "2026-10-18T12:00:00Z",
        "updateTime": "2026-10-18T12:00:00Z"
    })
}

fn query_values(request: &Request, key: &str) -> Vec<String> {
    request
        .url
        .query_pairs()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}

fn body_json(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap_or(Value::Null)
}

fn auth_response(account: &Account, token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "localId": account.uid,
        "email": account.email,
        "idToken": token,
        "refreshToken": format!("refresh-{}", account.uid),
        "expiresIn": "3600"
    }))
}

impl FakeFirebase {
    fn sign_up(&self, request: &Request) -> ResponseTemplate {
        let body = body_json(request);
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        if state
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&email))
        {
            return error(400, "EMAIL_EXISTS");
        }
        if password.len() < 6 {
            return error(400, "WEAK_PASSWORD : Password should be at least 6 characters");
        }
        let n = state.next();
        let account = Account {
            uid: format!("uid{}", n),
            email,
            password,
        };
        let response = auth_response(&account, &format!("id-{}", account.uid));
        state.accounts.push(account);
        response
    }

    fn sign_in(&self, request: &Request) -> ResponseTemplate {
        let body = body_json(request);
        let email = body["email"].as_str().unwrap_or_default();
        let password = body["password"].as_str().unwrap_or_default();
        let state = self.state.lock().unwrap();
        match state
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
        {
            Some(account) => auth_response(account, &format!("id-{}", account.uid)),
            None => error(400, "INVALID_LOGIN_CREDENTIALS"),
        }
    }

    fn refresh(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body).into_owned();
        let token = body
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "refresh_token")
            .map(|(_, v)| percent_decode_str(v).decode_utf8_lossy().into_owned())
            .unwrap_or_default();
        let state = self.state.lock().unwrap();
        match state
            .accounts
            .iter()
            .find(|a| format!("refresh-{}", a.uid) == token)
        {
            Some(account) => ResponseTemplate::new(200).set_body_json(json!({
                "id_token": format!("id-{}-restored", account.uid),
                "refresh_token": token,
                "expires_in": "3600",
                "user_id": account.uid,
                "token_type": "Bearer"
            })),
            None => error(400, "INVALID_REFRESH_TOKEN"),
        }
    }

    fn documents(&self, request: &Request, method: &str, rest: &str) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        let bearer = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.bearers.push(bearer);

        if rest == ":runQuery" {
            let body = body_json(request);
            let query = &body["structuredQuery"];
            let collection = query["from"][0]["collectionId"].as_str().unwrap_or_default();
            let filter = &query["where"]["fieldFilter"];
            let field = filter["field"]["fieldPath"].as_str().unwrap_or_default();
            let value = &filter["value"];
            let mut rows: Vec<Value> = state
                .docs
                .iter()
                .filter(|((c, _), fields)| c == collection && fields.get(field) == Some(value))
                .map(|((c, id), fields)| json!({ "document": resource(c, id, fields) }))
                .collect();
            if rows.is_empty() {
                rows.push(json!({ "readTime": "2026-10-18T12:00:00Z" }));
            }
            return ResponseTemplate::new(200).set_body_json(Value::Array(rows));
        }

        let segments: Vec<String> = rest
            .trim_start_matches('/')
            .split('/')
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        match (method, segments.as_slice()) {
            ("GET", [collection]) => {
                let offset: usize = query_values(request, "pageToken")
                    .first()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(0);
                let all: Vec<Value> = state
                    .docs
                    .iter()
                    .filter(|((c, _), _)| c == collection)
                    .map(|((c, id), fields)| resource(c, id, fields))
                    .collect();
                let page: Vec<Value> = all.iter().skip(offset).take(FAKE_PAGE_SIZE).cloned().collect();
                let mut body = Map::new();
                if !page.is_empty() {
                    body.insert("documents".into(), Value::Array(page));
                }
                if offset + FAKE_PAGE_SIZE < all.len() {
                    body.insert(
                        "nextPageToken".into(),
                        Value::String((offset + FAKE_PAGE_SIZE).to_string()),
                    );
                }
                ResponseTemplate::new(200).set_body_json(Value::Object(body))
            }
            ("POST", [collection]) => {
                let fields = body_json(request)["fields"]
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let id = format!("doc{}", state.next());
                let response = resource(collection, &id, &fields);
                state.docs.insert((collection.clone(), id), fields);
                ResponseTemplate::new(200).set_body_json(response)
            }
            ("GET", [collection, id]) => match state.docs.get(&(collection.clone(), id.clone())) {
                Some(fields) => ResponseTemplate::new(200).set_body_json(resource(collection, id, fields)),
                None => error(404, "NOT_FOUND"),
            },
            ("PATCH", [collection, id]) => {
                let key = (collection.clone(), id.clone());
                let exists = state.docs.contains_key(&key);
                match query_values(request, "currentDocument.exists").first().map(String::as_str) {
                    Some("false") if exists => return error(409, "ALREADY_EXISTS"),
                    Some("true") if !exists => return error(404, "No document to update"),
                    _ => {}
                }
                let incoming = body_json(request)["fields"]
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let mask = query_values(request, "updateMask.fieldPaths");
                let fields = if mask.is_empty() {
                    incoming
                } else {
                    let mut merged = state.docs.get(&key).cloned().unwrap_or_default();
                    for path in &mask {
                        match incoming.get(path) {
                            Some(v) => merged.insert(path.clone(), v.clone()),
                            None => merged.remove(path),
                        };
                    }
                    merged
                };
                let response = resource(collection, id, &fields);
                state.docs.insert(key, fields);
                ResponseTemplate::new(200).set_body_json(response)
            }
            ("DELETE", [collection, id]) => {
                state.docs.remove(&(collection.clone(), id.clone()));
                ResponseTemplate::new(200).set_body_json(json!({}))
            }
            _ => error(400, "unsupported request"),
        }
    }

    fn doc(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.state
            .lock()
            .unwrap()
            .docs
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    fn put_doc(&self, collection: &str, id: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.state
            .lock()
            .unwrap()
            .docs
            .insert((collection.to_string(), id.to_string()), fields);
    }

    fn remove_doc(&self, collection: &str, id: &str) {
        self.state
            .lock()
            .unwrap()
            .docs
            .remove(&(collection.to_string(), id.to_string()));
    }

    fn last_bearer(&self) -> Option<String> {
        self.state.lock().unwrap().bearers.last().cloned().flatten()
    }
}

impl Respond for FakeFirebase {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if query_values(request, "key") != [API_KEY] {
            return error(400, "API key not valid");
        }
        let method = request.method.to_string();
        let path = request.url.path().to_string();
        match (method.as_str(), path.as_str()) {
            ("POST", "/v1/accounts:signUp") => self.sign_up(request),
            ("POST", "/v1/accounts:signInWithPassword") => self.sign_in(request),
            ("POST", "/v1/token") => self.refresh(request),
            (method, path) => match path.strip_prefix(DOCUMENTS) {
                Some(rest) => self.documents(request, method, rest),
                None => error(404, "unknown endpoint"),
            },
        }
    }
}

struct Harness {
    _server: MockServer,
    fake: FakeFirebase,
    config: RemoteConfig,
    dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let fake = FakeFirebase::default();
        Mock::given(any())
            .respond_with(fake.clone())
            .mount(&server)
            .await;
        let config = RemoteConfig {
            api_key: API_KEY.into(),
            auth_domain: "demo.firebaseapp.com".into(),
            project_id: "demo".into(),
            storage_bucket: "demo.appspot.com".into(),
            messaging_sender_id: "1234".into(),
            app_id: "1:1234:web:abcd".into(),
            auth_endpoint: Some(server.uri()),
            token_endpoint: Some(server.uri()),
            firestore_endpoint: Some(server.uri()),
        };
        Self {
            _server: server,
            fake,
            config,
            dir: TempDir::new().unwrap(),
        }
    }

    fn session_file(&self) -> PathBuf {
        self.dir.path().join("remote-session.json")
    }

    fn store(&self) -> RemoteStore {
        self.store_with(RolePolicy::default())
    }

    fn store_with(&self, policy: RolePolicy) -> RemoteStore {
        RemoteStore::connect(&self.config, policy, Some(self.session_file())).unwrap()
    }
}

fn draft(owner: &IdentityId, name: &str) -> EventDraft {
    EventDraft {
        owner_id: owner.clone(),
        author_label: "ravi@example.com".to_string(),
        name: name.to_string(),
        category: "Cricket".to_string(),
        when: Utc.with_ymd_and_hms(2026, 11, 2, 9, 30, 0).unwrap(),
        city: "Ahmedabad".to_string(),
        area: "Gota".to_string(),
        description: "Sunday morning game".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_register_then_login_returns_same_identity() {
    let harness = Harness::start().await;
    let store = harness.store();

    let registered = store
        .register("ravi@example.com", "hunter22", Role::Admin)
        .await
        .unwrap();
    assert_eq!(registered.role, Role::Admin);

    let profile = harness.fake.doc("profiles", registered.id.as_str()).unwrap();
    assert_eq!(profile["role"], json!({ "stringValue": "admin" }));
    assert_eq!(profile["email"], json!({ "stringValue": "ravi@example.com" }));

    let logged_in = store.login("ravi@example.com", "hunter22").await.unwrap();
    assert_eq!(logged_in, registered);
}

#[tokio::test]
async fn test_duplicate_and_rejected_registrations() {
    let harness = Harness::start().await;
    let store = harness.store();

    store
        .register("ravi@example.com", "hunter22", Role::User)
        .await
        .unwrap();
    let err = store
        .register("ravi@example.com", "other-secret", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateIdentity));

    let err = store
        .register("short@example.com", "abc", Role::User)
        .await
        .unwrap_err();
    match err {
        StoreError::BackendOperationFailed(msg) => assert!(msg.contains("WEAK_PASSWORD")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_login_with_wrong_secret_fails() {
    let harness = Harness::start().await;
    let store = harness.store();
    store
        .register("ravi@example.com", "hunter22", Role::User)
        .await
        .unwrap();

    let err = store.login("ravi@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidCredentials));
}

#[tokio::test]
async fn test_add_category_is_create_only_and_idempotent() {
    let harness = Harness::start().await;
    let store = harness.store();

    store.add_category("Kabaddi").await.unwrap();
    let created = harness.fake.doc("cats", "Kabaddi").unwrap();
    store.add_category(" Kabaddi ").await.unwrap();
    store.add_category("   ").await.unwrap();

    assert_eq!(store.list_categories().await.unwrap(), vec!["Kabaddi"]);
    assert_eq!(harness.fake.doc("cats", "Kabaddi").unwrap(), created);

    store.remove_category("Kabaddi").await.unwrap();
    assert!(store.list_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_names_round_trip_verbatim() {
    let harness = Harness::start().await;
    let store = harness.store();

    store.add_category("Table Tennis").await.unwrap();
    store.add_category("Fit 100%25").await.unwrap();

    let mut categories = store.list_categories().await.unwrap();
    categories.sort();
    assert_eq!(categories, vec!["Fit 100%25", "Table Tennis"]);
}

#[tokio::test]
async fn test_listing_follows_page_tokens() {
    let harness = Harness::start().await;
    let store = harness.store();

    for name in ["Boxing", "Cricket", "Football", "Golf", "Tennis"] {
        store.add_category(name).await.unwrap();
    }
    let mut categories = store.list_categories().await.unwrap();
    categories.sort();
    assert_eq!(
        categories,
        vec!["Boxing", "Cricket", "Football", "Golf", "Tennis"]
    );
}

#[tokio::test]
async fn test_add_existing_city_keeps_areas() {
    let harness = Harness::start().await;
    let store = harness.store();
    harness.fake.put_doc(
        "cities",
        "Surat",
        json!({ "areas": { "arrayValue": { "values": [
            { "stringValue": "Adajan" }, { "stringValue": "Vesu" }
        ] } } }),
    );

    store.add_city("Surat").await.unwrap();
    store.add_city("Vadodara").await.unwrap();

    let cities = store.list_cities().await.unwrap();
    let surat = cities.iter().find(|c| c.name == "Surat").unwrap();
    assert_eq!(surat.areas, vec!["Adajan", "Vesu"]);
    let vadodara = cities.iter().find(|c| c.name == "Vadodara").unwrap();
    assert!(vadodara.areas.is_empty());

    store.remove_city("Vadodara").await.unwrap();
    assert_eq!(store.list_cities().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_area_operations() {
    let harness = Harness::start().await;
    let store = harness.store();
    store.add_city("Ahmedabad").await.unwrap();

    store.add_area_to_city("Ahmedabad", "Bopal").await.unwrap();
    store.add_area_to_city("Ahmedabad", "Bopal").await.unwrap();
    store.add_area_to_city("Ahmedabad", "Gota").await.unwrap();
    store.add_area_to_city("Ahmedabad", "  ").await.unwrap();

    let cities = store.list_cities().await.unwrap();
    assert_eq!(cities[0].areas, vec!["Bopal", "Gota"]);

    store
        .remove_area_from_city("Ahmedabad", "Bopal")
        .await
        .unwrap();
    store
        .remove_area_from_city("Ahmedabad", "Bopal")
        .await
        .unwrap();
    let cities = store.list_cities().await.unwrap();
    assert_eq!(cities[0].areas, vec!["Gota"]);

    store.add_area_to_city("Rajkot", "Kalawad").await.unwrap();
    assert!(harness.fake.doc("cities", "Rajkot").is_none());
}

#[tokio::test]
async fn test_create_event_is_listed_by_owner() {
    let harness = Harness::start().await;
    let store = harness.store();
    let owner = IdentityId::new("uid-owner");
    let other = IdentityId::new("uid-other");

    let id = store.create_event(draft(&owner, "Morning nets")).await.unwrap();
    store.create_event(draft(&other, "Evening match")).await.unwrap();
    for n in 0..3 {
        store
            .create_event(draft(&other, &format!("Extra {}", n)))
            .await
            .unwrap();
    }

    let mine = store.list_events_by_owner(&owner).await.unwrap();
    assert_eq!(mine, vec![draft(&owner, "Morning nets").into_event(id)]);
    assert!(store
        .list_events_by_owner(&IdentityId::new("uid-nobody"))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.list_all_events().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_update_event_changes_only_name() {
    let harness = Harness::start().await;
    let store = harness.store();
    let owner = IdentityId::new("uid-owner");

    let id = store.create_event(draft(&owner, "Morning nets")).await.unwrap();
    store
        .update_event(&id, EventPatch::rename("Evening nets"))
        .await
        .unwrap();

    let mut expected = draft(&owner, "Morning nets").into_event(id);
    expected.name = "Evening nets".to_string();
    assert_eq!(store.list_all_events().await.unwrap(), vec![expected]);
}

#[tokio::test]
async fn test_update_missing_event_is_noop() {
    let harness = Harness::start().await;
    let store = harness.store();

    store
        .update_event(&"doc-missing".into(), EventPatch::rename("x"))
        .await
        .unwrap();
    assert!(harness.fake.doc("events", "doc-missing").is_none());
    assert!(store.list_all_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_event() {
    let harness = Harness::start().await;
    let store = harness.store();
    let owner = IdentityId::new("uid-owner");

    let keep = store.create_event(draft(&owner, "Keep")).await.unwrap();
    let gone = store.create_event(draft(&owner, "Gone")).await.unwrap();
    store.delete_event(&gone).await.unwrap();

    let ids: Vec<_> = store
        .list_all_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![keep]);
}

#[tokio::test]
async fn test_session_is_restored_from_refresh_token() {
    let harness = Harness::start().await;
    let identity = {
        let store = harness.store();
        assert_eq!(store.current_session().await.unwrap(), None);
        store
            .register("ravi@example.com", "hunter22", Role::Admin)
            .await
            .unwrap()
    };
    assert!(harness.session_file().exists());

    let store = harness.store();
    assert_eq!(store.current_session().await.unwrap(), Some(identity.clone()));
    store.list_categories().await.unwrap();
    assert_eq!(
        harness.fake.last_bearer(),
        Some(format!("Bearer id-{}-restored", identity.id))
    );

    store.clear_session().await.unwrap();
    assert!(!harness.session_file().exists());
    assert_eq!(store.current_session().await.unwrap(), None);
    assert_eq!(harness.store().current_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_profile_defaults_to_user_on_restore() {
    let harness = Harness::start().await;
    let policy = RolePolicy {
        allow_requested_admin: false,
        admin_email_suffixes: vec!["@sportsbuddy.org".to_string()],
    };
    let identity = harness
        .store_with(policy.clone())
        .register("ops@sportsbuddy.org", "hunter22", Role::User)
        .await
        .unwrap();
    assert_eq!(identity.role, Role::Admin);
    harness.fake.remove_doc("profiles", identity.id.as_str());

    let restored = harness
        .store_with(policy.clone())
        .current_session()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.role, Role::User);

    let logged_in = harness
        .store_with(policy)
        .login("ops@sportsbuddy.org", "hunter22")
        .await
        .unwrap();
    assert_eq!(logged_in.role, Role::Admin);
}
