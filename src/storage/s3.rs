//! S3 conversation store
//!
//! Records live at `<bucket>/<session_id>.json` with the same JSON layout as
//! the local files. A save the bucket rejects is written to the local memory
//! directory instead, so a reply is never lost to a storage outage.

use super::{
    decode_record, encode_record, format_utc, record_name, session_id_of, summarize_messages,
    ConversationStore, FileStore, StoredMessage, StoredSession,
};
use crate::config::StorageConfig;
use crate::error::{ChatdeckError, Result};
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectMeta, ObjectStore, PutOptions, PutPayload};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Store backed by an S3 bucket
pub struct S3Store {
    client: AmazonS3,
    bucket: String,
    fallback: FileStore,
}

impl S3Store {
    /// Create a store from the configuration and the `AWS_*` environment
    ///
    /// # Errors
    ///
    /// Returns error if the S3 client cannot be built from the settings
    pub fn new(config: &StorageConfig) -> Result<Self> {
        Self::from_builder(AmazonS3Builder::from_env(), config)
    }

    /// Create a store from a prepared builder
    ///
    /// Bucket, region and endpoint from `config` are applied on top of
    /// `builder`; a plain `http://` endpoint is allowed.
    ///
    /// # Errors
    ///
    /// Returns error if the S3 client cannot be built
    pub fn from_builder(builder: AmazonS3Builder, config: &StorageConfig) -> Result<Self> {
        let settings = &config.s3;
        let mut builder = builder.with_bucket_name(&settings.bucket);
        if let Some(region) = &settings.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let client = builder.build().map_err(|e| {
            ChatdeckError::Storage(format!(
                "Failed to configure S3 bucket {}: {}",
                settings.bucket, e
            ))
        })?;

        tracing::info!("Using S3 bucket {} for conversations", settings.bucket);
        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
            fallback: FileStore::new(config.memory_dir.clone()),
        })
    }

    fn object_path(session_id: &str) -> Result<ObjectPath> {
        Ok(ObjectPath::from(record_name(session_id)?))
    }

    fn describe(&self, path: &ObjectPath) -> String {
        format!("s3://{}/{}", self.bucket, path)
    }

    async fn read_object(&self, path: &ObjectPath) -> Result<Vec<StoredMessage>> {
        let result = match self.client.get(path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => {
                return Err(ChatdeckError::Storage(format!(
                    "Failed to read {}: {}",
                    self.describe(path),
                    e
                ))
                .into())
            }
        };
        let bytes = result.bytes().await.map_err(|e| {
            ChatdeckError::Storage(format!("Failed to read {}: {}", self.describe(path), e))
        })?;
        decode_record(&bytes, &self.describe(path))
    }

    async fn summarize(&self, meta: &ObjectMeta, session_id: String) -> Result<StoredSession> {
        let messages = self.read_object(&meta.location).await?;
        let mut session = summarize_messages(session_id, &messages);

        let modified = format_utc(meta.last_modified);
        if session.created_at.is_none() {
            session.created_at = Some(modified.clone());
        }
        if session.last_message_timestamp.is_none() {
            session.last_message_timestamp = Some(modified);
        }
        Ok(session)
    }
}

#[async_trait]
impl ConversationStore for S3Store {
    fn kind(&self) -> &'static str {
        "S3"
    }

    async fn load(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let path = Self::object_path(session_id)?;
        let messages = self.read_object(&path).await?;
        tracing::debug!("Loaded {} messages for session {}", messages.len(), session_id);
        Ok(messages)
    }

    async fn save(&self, session_id: &str, messages: &[StoredMessage]) -> Result<()> {
        let path = Self::object_path(session_id)?;
        let json = encode_record(messages)?;
        let options = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, JSON_CONTENT_TYPE)]),
            ..Default::default()
        };

        match self
            .client
            .put_opts(&path, PutPayload::from(json.into_bytes()), options)
            .await
        {
            Ok(_) => {
                tracing::debug!("Saved {} messages to {}", messages.len(), self.describe(&path));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to write {}: {}; saving to {}",
                    self.describe(&path),
                    e,
                    self.fallback.memory_dir().display()
                );
                self.fallback.save(session_id, messages).await
            }
        }
    }

    async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let listing = match self.client.list_with_delimiter(None).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Failed to list s3://{}: {}", self.bucket, e);
                return Ok(Vec::new());
            }
        };

        let mut sessions = Vec::new();
        for meta in &listing.objects {
            let Some(session_id) = meta
                .location
                .filename()
                .and_then(session_id_of)
                .map(str::to_string)
            else {
                continue;
            };

            match self.summarize(meta, session_id).await {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!("Skipping unreadable record {}: {}", meta.location, e),
            }
        }

        sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::S3Config;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET: &str = "chatdeck-test";

    fn store_for(server: &MockServer, memory_dir: &Path) -> S3Store {
        let config = StorageConfig {
            memory_dir: memory_dir.to_path_buf(),
            use_s3: true,
            s3: S3Config {
                bucket: BUCKET.to_string(),
                region: Some("us-east-1".to_string()),
                endpoint: Some(server.uri()),
            },
        };
        let builder = AmazonS3Builder::new()
            .with_access_key_id("test-key")
            .with_secret_access_key("test-secret");
        S3Store::from_builder(builder, &config).unwrap()
    }

    fn object(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("ETag", "\"0123abcd\"")
            .insert_header("Last-Modified", "Mon, 01 Jan 2024 00:00:00 GMT")
            .insert_header("Content-Type", JSON_CONTENT_TYPE)
            .set_body_string(body)
    }

    fn listing(keys: &[&str]) -> ResponseTemplate {
        let contents: String = keys
            .iter()
            .map(|key| {
                format!(
                    "<Contents><Key>{}</Key><LastModified>2024-02-03T04:05:06.000Z</LastModified>\
                     <ETag>\"0123abcd\"</ETag><Size>2</Size><StorageClass>STANDARD</StorageClass></Contents>",
                    key
                )
            })
            .collect();
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Name>{}</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys>\
             <Delimiter>/</Delimiter><IsTruncated>false</IsTruncated>{}</ListBucketResult>",
            BUCKET,
            keys.len(),
            contents
        );
        ResponseTemplate::new(200)
            .insert_header("Content-Type", "application/xml")
            .set_body_string(body)
    }

    #[tokio::test]
    async fn test_kind_is_s3() {
        let server = MockServer::start().await;
        let tmp = TempDir::new().unwrap();
        assert_eq!(store_for(&server, tmp.path()).kind(), "S3");
    }

    #[tokio::test]
    async fn test_load_reads_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/s1.json", BUCKET)))
            .respond_with(object(
                r#"[{"role": "user", "content": "hi", "timestamp": "2024-01-01T00:00:00Z"}]"#,
            ))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        let messages = store.load("s1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hi");
    }

    #[tokio::test]
    async fn test_load_missing_object_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/nobody.json", BUCKET)))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
            ))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        assert!(store.load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_denied_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        let err = store.load("s1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatdeckError>(),
            Some(ChatdeckError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_traversal_without_request() {
        let server = MockServer::start().await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        let err = store.load("../secrets").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatdeckError>(),
            Some(ChatdeckError::InvalidSessionId(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_puts_pretty_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("/{}/s1.json", BUCKET)))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"0123abcd\""))
            .expect(1)
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        store
            .save("s1", &[StoredMessage::now("user", "hello")])
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert!(body.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[0]["content"], "hello");
        assert!(!tmp.path().join("s1.json").exists());
    }

    #[tokio::test]
    async fn test_rejected_save_falls_back_to_memory_dir() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        store
            .save("s1", &[StoredMessage::now("user", "kept locally")])
            .await
            .unwrap();

        let local = FileStore::new(tmp.path()).load("s1").await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].content, "kept locally");
    }

    #[tokio::test]
    async fn test_list_sessions_summarizes_json_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(format!("^/{}/?$", BUCKET)))
            .and(query_param("list-type", "2"))
            .respond_with(listing(&["b.json", "notes.txt", "a.json"]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/a.json", BUCKET)))
            .respond_with(object(
                r#"[{"role": "user", "content": "q", "timestamp": "2024-01-01T00:00:00Z"},
                    {"role": "assistant", "content": "a", "timestamp": "2024-01-01T00:00:05Z"}]"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/b.json", BUCKET)))
            .respond_with(object(r#"[{"role": "user", "content": "undated"}]"#))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        let sessions = store.list_sessions().await.unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[0].last_message.as_deref(), Some("a"));
        assert_eq!(sessions[0].created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(
            sessions[0].last_message_timestamp.as_deref(),
            Some("2024-01-01T00:00:05Z")
        );

        assert_eq!(
            sessions[1].created_at.as_deref(),
            Some("2024-02-03T04:05:06.000000Z")
        );
    }

    #[tokio::test]
    async fn test_list_sessions_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let store = store_for(&server, tmp.path());

        assert!(store.list_sessions().await.unwrap().is_empty());
    }
}
