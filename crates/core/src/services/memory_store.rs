use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Session, User};
use crate::services::account_store::{AccountStore, Document};

struct Account {
    uid: String,
    password_hash: String,
}

#[derive(Default)]
struct Inner {
    /// Keyed by normalized email.
    accounts: HashMap<String, Account>,
    /// ID token to uid.
    tokens: HashMap<String, String>,
    documents: HashMap<String, Document>,
}

/// In-process account store with the same value semantics as the remote one.
///
/// Every trait call counts as a remote call, so callers can check that an operation
/// stayed local.
#[derive(Default)]
pub struct MemoryAccountStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of trait calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the next call fail without touching any state.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Direct read of a stored document, bypassing auth and the call counter.
    pub fn document(&self, uid: &str) -> Option<Document> {
        self.lock().documents.get(uid).cloned()
    }

    /// Direct overwrite of a stored document, bypassing auth and the call counter.
    pub fn put_document(&self, uid: &str, document: Document) {
        self.lock().documents.insert(uid.to_string(), document);
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::AccountStore("unavailable".to_string()));
        }
        Ok(())
    }

    fn authorize(inner: &Inner, session: &Session) -> Result<()> {
        match inner.tokens.get(session.id_token()) {
            Some(uid) if uid == session.uid() => Ok(()),
            _ => Err(Error::Auth("PERMISSION_DENIED".to_string())),
        }
    }

    fn issue_token(inner: &mut Inner, uid: &str, email: &str) -> User {
        let id_token = format!("memory-{}", Uuid::new_v4());
        inner.tokens.insert(id_token.clone(), uid.to_string());
        User {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token,
            refresh_token: None,
        }
    }

    fn array_mut<'a>(document: &'a mut Document, field: &str) -> &'a mut Vec<Value> {
        let slot = document
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => items,
            _ => unreachable!("slot was just made an array"),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        self.begin_call()?;
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(Error::Auth("INVALID_EMAIL".to_string()));
        }
        if password.len() < 6 {
            return Err(Error::Auth("WEAK_PASSWORD".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(e.to_string()))?
            .to_string();

        let mut inner = self.lock();
        if inner.accounts.contains_key(&email) {
            return Err(Error::Auth("EMAIL_EXISTS".to_string()));
        }

        let uid = Uuid::new_v4().simple().to_string();
        inner.accounts.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password_hash,
            },
        );
        Ok(Self::issue_token(&mut inner, &uid, &email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        self.begin_call()?;
        let email = normalize_email(email);
        let mut inner = self.lock();

        let uid = {
            let account = inner
                .accounts
                .get(&email)
                .ok_or(Error::InvalidCredentials)?;

            let parsed_hash = PasswordHash::new(&account.password_hash)
                .map_err(|e| Error::Internal(e.to_string()))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .map_err(|_| Error::InvalidCredentials)?;

            account.uid.clone()
        };
        Ok(Self::issue_token(&mut inner, &uid, &email))
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        self.begin_call()?;
        self.lock().tokens.remove(session.id_token());
        Ok(())
    }

    async fn get_document(&self, session: &Session) -> Result<Option<Document>> {
        self.begin_call()?;
        let inner = self.lock();
        Self::authorize(&inner, session)?;
        Ok(inner.documents.get(session.uid()).cloned())
    }

    async fn merge_document(&self, session: &Session, fields: Document) -> Result<()> {
        self.begin_call()?;
        let mut inner = self.lock();
        Self::authorize(&inner, session)?;

        let document = inner.documents.entry(session.uid().to_string()).or_default();
        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(())
    }

    async fn array_union(&self, session: &Session, field: &str, values: Vec<Value>) -> Result<()> {
        self.begin_call()?;
        let mut inner = self.lock();
        Self::authorize(&inner, session)?;

        let document = inner
            .documents
            .get_mut(session.uid())
            .ok_or(Error::NotFound)?;
        let items = Self::array_mut(document, field);
        for value in values {
            if !items.contains(&value) {
                items.push(value);
            }
        }
        Ok(())
    }

    async fn array_remove(
        &self,
        session: &Session,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        self.begin_call()?;
        let mut inner = self.lock();
        Self::authorize(&inner, session)?;

        let document = inner
            .documents
            .get_mut(session.uid())
            .ok_or(Error::NotFound)?;
        let items = Self::array_mut(document, field);
        items.retain(|item| !values.contains(item));
        Ok(())
    }
}
