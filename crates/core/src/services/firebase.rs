use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::models::{Session, User};
use crate::services::account_store::{AccountStore, Document};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Collection holding one document per account, keyed by uid.
const USERS_COLLECTION: &str = "users";

/// Account store backed by Firebase Authentication and Cloud Firestore over REST.
pub struct FirebaseAccountStore {
    client: reqwest::Client,
    api_key: String,
    project_id: String,
    auth_url: String,
    firestore_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirebaseAccountStore {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_url: IDENTITY_TOOLKIT_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
        }
    }

    /// Points both services at other hosts, e.g. the Firebase emulators.
    pub fn with_endpoints(mut self, auth_url: &str, firestore_url: &str) -> Self {
        self.auth_url = auth_url.trim_end_matches('/').to_string();
        self.firestore_url = firestore_url.trim_end_matches('/').to_string();
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, uid: &str) -> String {
        format!("{}/{}/{}", self.database_path(), USERS_COLLECTION, uid)
    }

    fn document_url(&self, uid: &str) -> String {
        format!("{}/{}", self.firestore_url, self.document_name(uid))
    }

    async fn authenticate(&self, action: &str, email: &str, password: &str) -> Result<User> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.auth_url,
            action,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(&body));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;

        Ok(User {
            uid: auth.local_id,
            email: auth.email,
            id_token: auth.id_token,
            refresh_token: auth.refresh_token,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        match status {
            reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(Error::Auth(message))
            }
            _ => Err(Error::AccountStore(format!("Firestore error {}: {}", status, message))),
        }
    }

    /// PATCH target that overwrites only the given top-level fields.
    fn merge_url(&self, uid: &str, fields: &Document) -> String {
        let mut url = self.document_url(uid);
        let mask: Vec<String> = fields
            .keys()
            .map(|k| format!("updateMask.fieldPaths={}", urlencoding::encode(k)))
            .collect();
        if !mask.is_empty() {
            url.push('?');
            url.push_str(&mask.join("&"));
        }
        url
    }

    fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.firestore_url, self.database_path())
    }

    /// Commit body applying one array transform to `field`. The document must exist.
    fn transform_body(&self, uid: &str, field: &str, transform: &str, values: &[Value]) -> Value {
        let values: Vec<Value> = values.iter().map(to_firestore_value).collect();
        json!({
            "writes": [{
                "transform": {
                    "document": self.document_name(uid),
                    "fieldTransforms": [{
                        "fieldPath": field,
                        transform: { "values": values },
                    }],
                },
                "currentDocument": { "exists": true },
            }],
        })
    }

    async fn commit_transform(
        &self,
        session: &Session,
        field: &str,
        transform: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        let url = self.commit_url();
        let body = self.transform_body(session.uid(), field, transform, &values);

        let response = self
            .client
            .post(&url)
            .bearer_auth(session.id_token())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::AccountStore(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}

/// Maps an Identity Toolkit error body to an error. Unknown bodies keep their text.
fn auth_error(body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    // Messages look like "WEAK_PASSWORD : Password should be at least 6 characters".
    let code = message.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            Error::InvalidCredentials
        }
        _ => Error::Auth(message),
    }
}

/// Encodes a JSON value as a Firestore typed value.
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": to_firestore_fields(fields) } }),
    }
}

pub fn to_firestore_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

/// Decodes a Firestore typed value. Types without a JSON counterpart become strings.
pub fn from_firestore_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(Value::from)
            .unwrap_or(Value::Null),
        "doubleValue" => inner.as_f64().map(Value::from).unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(from_firestore_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(from_firestore_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

pub fn from_firestore_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), from_firestore_value(v)))
        .collect()
}

#[async_trait]
impl AccountStore for FirebaseAccountStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let user = self.authenticate("signUp", email, password).await?;
        tracing::info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .authenticate("signInWithPassword", email, password)
            .await?;
        tracing::info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        // ID tokens are bearer tokens; dropping the session is all signing out takes.
        tracing::info!(uid = %session.uid(), "Signed out");
        Ok(())
    }

    async fn get_document(&self, session: &Session) -> Result<Option<Document>> {
        let response = self
            .client
            .get(self.document_url(session.uid()))
            .bearer_auth(session.id_token())
            .send()
            .await
            .map_err(|e| Error::AccountStore(e.to_string()))?;

        let response = match Self::check(response).await {
            Ok(response) => response,
            Err(Error::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| Error::AccountStore(e.to_string()))?;

        Ok(Some(from_firestore_fields(&document.fields)))
    }

    async fn merge_document(&self, session: &Session, fields: Document) -> Result<()> {
        let url = self.merge_url(session.uid(), &fields);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(session.id_token())
            .json(&json!({ "fields": to_firestore_fields(&fields) }))
            .send()
            .await
            .map_err(|e| Error::AccountStore(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn array_union(&self, session: &Session, field: &str, values: Vec<Value>) -> Result<()> {
        self.commit_transform(session, field, "appendMissingElements", values)
            .await
    }

    async fn array_remove(
        &self,
        session: &Session,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        self.commit_transform(session, field, "removeAllFromArray", values)
            .await
    }
}
