use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{Session, User};

/// A user's document: top-level field name to JSON value.
pub type Document = Map<String, Value>;

/// Credential accounts plus one key-value document per account.
///
/// Array operations follow the document store's value semantics: `array_union`
/// appends only values not already deeply equal to an element, and `array_remove`
/// removes every element deeply equal to one of the given values.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    async fn sign_out(&self, session: &Session) -> Result<()>;

    /// `Ok(None)` when the user has no document yet.
    async fn get_document(&self, session: &Session) -> Result<Option<Document>>;

    /// Creates the document or updates the given fields, leaving other fields untouched.
    async fn merge_document(&self, session: &Session, fields: Document) -> Result<()>;

    /// Fails if the document does not exist.
    async fn array_union(&self, session: &Session, field: &str, values: Vec<Value>) -> Result<()>;

    /// Fails if the document does not exist.
    async fn array_remove(&self, session: &Session, field: &str, values: Vec<Value>)
    -> Result<()>;
}
