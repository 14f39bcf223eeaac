//! Local backend: a key/value file in the data directory, wrapped in async calls.

use crate::error::{StoreError, StoreResult};
use crate::filter::{filter_events, OwnerFilter};
use crate::traits::{EventStore, IdentityProvider, TaxonomyStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sportsbuddy_kv::{KvStore, StoreOptions};
use sportsbuddy_model::{
    default_categories, default_cities, is_blank, City, Email, Event, EventDraft, EventId,
    EventPatch, Identity, IdentityId, Role, RolePolicy, SecretDigest, ValidationError,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// File name of the local key/value file inside the data directory.
pub const DATA_FILE: &str = "sportsbuddy.kv";

/// Partition keys.
mod keys {
    pub const CATEGORIES: &str = "categories";
    pub const CITIES: &str = "cities";
    pub const EVENTS: &str = "events";
    pub const USERS: &str = "users";
    pub const SESSION: &str = "session";
}

/// Row of the `users` partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: IdentityId,
    email: String,
    secret: SecretDigest,
    #[serde(default)]
    role: Option<Role>,
}

/// Backend with no external dependencies.
///
/// All partitions live in one [`KvStore`]; a mutex serializes access, so
/// every operation is a synchronous read-modify-write behind an async call.
pub struct LocalStore {
    kv: Mutex<KvStore>,
    role_policy: RolePolicy,
}

impl LocalStore {
    /// Opens `data_dir/sportsbuddy.kv`, creating the directory and seeding
    /// the default taxonomy on first use.
    pub fn open<P: AsRef<Path>>(data_dir: P, role_policy: RolePolicy) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(sportsbuddy_kv::KvError::from)?;
        Self::open_file(data_dir.join(DATA_FILE), role_policy)
    }

    /// Opens a specific key/value file.
    pub fn open_file<P: AsRef<Path>>(path: P, role_policy: RolePolicy) -> StoreResult<Self> {
        let kv = KvStore::open(path.as_ref(), StoreOptions::default())?;
        let store = Self {
            kv: Mutex::new(kv),
            role_policy,
        };
        store.ensure_seeds()?;
        info!(path = %path.as_ref().display(), "local store opened");
        Ok(store)
    }

    fn kv(&self) -> StoreResult<MutexGuard<'_, KvStore>> {
        self.kv
            .lock()
            .map_err(|_| StoreError::BackendOperationFailed("local store lock poisoned".into()))
    }

    fn ensure_seeds(&self) -> StoreResult<()> {
        let mut kv = self.kv()?;
        if !kv.contains(keys::CATEGORIES) {
            kv.put_as(keys::CATEGORIES, &default_categories())?;
        }
        if !kv.contains(keys::CITIES) {
            kv.put_as(keys::CITIES, &default_cities())?;
        }
        if !kv.contains(keys::EVENTS) {
            kv.put_as(keys::EVENTS, &Vec::<Event>::new())?;
        }
        if !kv.contains(keys::USERS) {
            kv.put_as(keys::USERS, &Vec::<UserRecord>::new())?;
        }
        Ok(())
    }

    /// Reads a partition, treating an absent key as empty.
    fn load<T: DeserializeOwned + Default>(kv: &KvStore, key: &str) -> StoreResult<T> {
        Ok(kv.get_as(key)?.unwrap_or_default())
    }

    /// Runs a read-modify-write on one partition; writes only if `f` says so.
    fn update<T, F>(&self, key: &str, f: F) -> StoreResult<()>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let mut kv = self.kv()?;
        let mut value: T = Self::load(&kv, key)?;
        if f(&mut value) {
            kv.put_as(key, &value)?;
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for LocalStore {
    async fn register(
        &self,
        email: &str,
        secret: &str,
        requested_role: Role,
    ) -> StoreResult<Identity> {
        let email = Email::parse(email)?;
        if secret.is_empty() {
            return Err(ValidationError::Blank { field: "secret" }.into());
        }

        let mut kv = self.kv()?;
        let mut users: Vec<UserRecord> = Self::load(&kv, keys::USERS)?;
        if users.iter().any(|u| email.matches(&u.email)) {
            return Err(StoreError::DuplicateIdentity);
        }

        let role = self.role_policy.resolve_registration(&email, requested_role);
        let record = UserRecord {
            id: IdentityId::generate(),
            email: email.as_str().to_string(),
            secret: SecretDigest::new(secret),
            role: Some(role),
        };
        let identity = Identity {
            id: record.id.clone(),
            email: record.email.clone(),
            role,
        };
        users.push(record);
        kv.put_as(keys::USERS, &users)?;

        info!(id = %identity.id, role = %identity.role, "identity registered");
        Ok(identity)
    }

    async fn login(&self, email: &str, secret: &str) -> StoreResult<Identity> {
        let kv = self.kv()?;
        let users: Vec<UserRecord> = Self::load(&kv, keys::USERS)?;
        let user = users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()) && u.secret.verify(secret))
            .ok_or(StoreError::InvalidCredentials)?;

        let role = user
            .role
            .unwrap_or_else(|| self.role_policy.resolve_fallback(&user.email));
        debug!(id = %user.id, "login succeeded");
        Ok(Identity {
            id: user.id,
            email: user.email,
            role,
        })
    }

    async fn current_session(&self) -> StoreResult<Option<Identity>> {
        Ok(self.kv()?.get_as(keys::SESSION)?)
    }

    async fn set_session(&self, identity: &Identity) -> StoreResult<()> {
        self.kv()?.put_as(keys::SESSION, identity)?;
        info!(id = %identity.id, "session started");
        Ok(())
    }

    async fn clear_session(&self) -> StoreResult<()> {
        if self.kv()?.remove(keys::SESSION)? {
            info!("session cleared");
        }
        Ok(())
    }
}

#[async_trait]
impl TaxonomyStore for LocalStore {
    async fn list_categories(&self) -> StoreResult<Vec<String>> {
        Self::load(&*self.kv()?, keys::CATEGORIES)
    }

    async fn add_category(&self, name: &str) -> StoreResult<()> {
        if is_blank(name) {
            return Ok(());
        }
        let name = name.trim();
        self.update(keys::CATEGORIES, |cats: &mut Vec<String>| {
            if cats.iter().any(|c| c == name) {
                return false;
            }
            cats.push(name.to_string());
            true
        })
    }

    async fn remove_category(&self, name: &str) -> StoreResult<()> {
        let name = name.trim();
        self.update(keys::CATEGORIES, |cats: &mut Vec<String>| {
            let before = cats.len();
            cats.retain(|c| c != name);
            cats.len() != before
        })
    }

    async fn list_cities(&self) -> StoreResult<Vec<City>> {
        Self::load(&*self.kv()?, keys::CITIES)
    }

    async fn add_city(&self, name: &str) -> StoreResult<()> {
        if is_blank(name) {
            return Ok(());
        }
        let name = name.trim();
        self.update(keys::CITIES, |cities: &mut Vec<City>| {
            if cities.iter().any(|c| c.name == name) {
                return false;
            }
            cities.push(City::new(name));
            true
        })
    }

    async fn remove_city(&self, name: &str) -> StoreResult<()> {
        let name = name.trim();
        self.update(keys::CITIES, |cities: &mut Vec<City>| {
            let before = cities.len();
            cities.retain(|c| c.name != name);
            cities.len() != before
        })
    }

    async fn add_area_to_city(&self, city: &str, area: &str) -> StoreResult<()> {
        if is_blank(area) {
            return Ok(());
        }
        let (city, area) = (city.trim(), area.trim());
        self.update(keys::CITIES, |cities: &mut Vec<City>| {
            match cities.iter_mut().find(|c| c.name == city) {
                Some(c) => c.insert_area(area),
                None => false,
            }
        })
    }

    async fn remove_area_from_city(&self, city: &str, area: &str) -> StoreResult<()> {
        let (city, area) = (city.trim(), area.trim());
        self.update(keys::CITIES, |cities: &mut Vec<City>| {
            match cities.iter_mut().find(|c| c.name == city) {
                Some(c) => c.remove_area(area),
                None => false,
            }
        })
    }
}

#[async_trait]
impl EventStore for LocalStore {
    async fn create_event(&self, draft: EventDraft) -> StoreResult<EventId> {
        let mut kv = self.kv()?;
        let mut events: Vec<Event> = Self::load(&kv, keys::EVENTS)?;
        let mut id = EventId::generate();
        while events.iter().any(|e| e.id == id) {
            id = EventId::generate();
        }
        events.push(draft.into_event(id.clone()));
        kv.put_as(keys::EVENTS, &events)?;
        debug!(id = %id, "event created");
        Ok(id)
    }

    async fn update_event(&self, id: &EventId, patch: EventPatch) -> StoreResult<()> {
        self.update(keys::EVENTS, |events: &mut Vec<Event>| {
            match events.iter_mut().find(|e| &e.id == id) {
                Some(event) => {
                    patch.apply(event);
                    true
                }
                None => {
                    debug!(id = %id, "update of missing event ignored");
                    false
                }
            }
        })
    }

    async fn delete_event(&self, id: &EventId) -> StoreResult<()> {
        self.update(keys::EVENTS, |events: &mut Vec<Event>| {
            let before = events.len();
            events.retain(|e| &e.id != id);
            events.len() != before
        })
    }

    async fn list_events_by_owner(&self, owner: &IdentityId) -> StoreResult<Vec<Event>> {
        let events: Vec<Event> = Self::load(&*self.kv()?, keys::EVENTS)?;
        Ok(filter_events(
            events,
            &OwnerFilter {
                owner_id: owner.clone(),
            },
        ))
    }

    async fn list_all_events(&self) -> StoreResult<Vec<Event>> {
        Self::load(&*self.kv()?, keys::EVENTS)
    }
}
