use crate::error::{MigrationError, Result};
use crate::storage::models::ObjectMeta;
use crate::storage::s3::ObjectStore;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-Memory Object Store für Tests
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    puts: Mutex<Vec<String>>,
    copies: Mutex<Vec<String>>,
    delete_calls: Mutex<Vec<usize>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: &[u8], last_modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                last_modified,
            },
        );
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
    }

    /// `bucket/key` jedes put_object Aufrufs in Reihenfolge
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    /// `bucket/key` jedes copy_object Ziels in Reihenfolge
    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().unwrap().clone()
    }

    /// Anzahl Keys pro delete_objects Aufruf
    pub fn delete_calls(&self) -> Vec<usize> {
        self.delete_calls.lock().unwrap().clone()
    }
}

fn not_found(operation: String) -> MigrationError {
    MigrationError::remote(operation, io::Error::new(io::ErrorKind::NotFound, "NoSuchKey"))
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), o)| ObjectMeta {
                key: k.clone(),
                size: o.body.len() as i64,
                last_modified: Some(o.last_modified),
            })
            .collect())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        self.delete_calls.lock().unwrap().push(keys.len());
        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(&(bucket.to_string(), key));
        }
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        self.body(bucket, key)
            .map(ByteStream::from)
            .ok_or_else(|| not_found(format!("get s3://{}/{}", bucket, key)))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream, size: i64) -> Result<()> {
        let operation = format!("put s3://{}/{}", bucket, key);
        let body = body
            .collect()
            .await
            .map_err(|e| MigrationError::remote(operation.clone(), e))?
            .into_bytes()
            .to_vec();
        if body.len() as i64 != size {
            return Err(MigrationError::remote(
                operation,
                io::Error::new(io::ErrorKind::InvalidData, "content length mismatch"),
            ));
        }

        self.puts.lock().unwrap().push(format!("{}/{}", bucket, key));
        self.insert(bucket, key, &body, Utc::now());
        Ok(())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        destination_bucket: &str,
        key: &str,
        _size: i64,
    ) -> Result<()> {
        let body = self.body(source_bucket, key).ok_or_else(|| {
            not_found(format!(
                "copy s3://{}/{} to s3://{}",
                source_bucket, key, destination_bucket
            ))
        })?;

        self.copies
            .lock()
            .unwrap()
            .push(format!("{}/{}", destination_bucket, key));
        self.insert(destination_bucket, key, &body, Utc::now());
        Ok(())
    }
}
