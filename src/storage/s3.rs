use crate::error::{MigrationError, Result};
use crate::storage::models::ObjectMeta;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

const MIB: i64 = 1024 * 1024;

/// Größtes Objekt, das S3 in einem PutObject bzw. CopyObject annimmt
pub const MAX_SINGLE_REQUEST_SIZE: i64 = 5 * 1024 * MIB;

/// Partgröße für Multipart Uploads, begrenzt auch den Puffer beim Streamen
pub const PART_SIZE: i64 = 64 * MIB;

const MAX_PARTS: i64 = 10_000;

/// Zugriff auf einen Object Store (S3 oder S3 kompatibel)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Alle Objekte unter `prefix`, über alle Listing Seiten hinweg
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Ein DeleteObjects Aufruf, höchstens 1000 Keys
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()>;

    /// Body als Stream, ohne ihn zu puffern
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream>;

    /// `size` ist die Länge von `body`. Oberhalb von `PART_SIZE` als Multipart Upload.
    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream, size: i64) -> Result<()>;

    /// Serverseitige Kopie, beide Buckets hinter demselben Endpoint.
    /// Oberhalb von `MAX_SINGLE_REQUEST_SIZE` per UploadPartCopy.
    async fn copy_object(
        &self,
        source_bucket: &str,
        destination_bucket: &str,
        key: &str,
        size: i64,
    ) -> Result<()>;
}

/// Partgröße für ein Objekt: mindestens `PART_SIZE`, höchstens 10000 Parts
pub fn part_size_for(size: i64) -> i64 {
    PART_SIZE.max((size + MAX_PARTS - 1) / MAX_PARTS)
}

/// Inklusive Byte Ranges der Parts eines Objekts
pub fn part_ranges(size: i64) -> Vec<(i64, i64)> {
    let part_size = part_size_for(size);
    (0..size)
        .step_by(part_size as usize)
        .map(|start| (start, (start + part_size).min(size) - 1))
        .collect()
}

/// `bucket/key` für CopySource, Segmente URL encoded
fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", bucket, key)
}

/// Path style nur für eigene Endpoints (MinIO, LocalStack)
fn path_style(sdk_config: &aws_config::SdkConfig) -> bool {
    sdk_config.endpoint_url().is_some()
}

/// S3 Storage Layer
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(path_style(sdk_config))
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }

    async fn create_upload(&self, bucket: &str, key: &str) -> Result<String> {
        let operation = format!("multipart upload to s3://{}/{}", bucket, key);
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MigrationError::remote(operation.clone(), e))?;

        output.upload_id.ok_or(MigrationError::MissingField {
            operation,
            field: "UploadId",
        })
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<CompletedPart> {
        let output = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(body.len() as i64)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                MigrationError::remote(
                    format!("upload of part {} to s3://{}/{}", part_number, bucket, key),
                    e,
                )
            })?;

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .set_e_tag(output.e_tag)
            .build())
    }

    /// Liest den Stream in Parts von `part_size_for(size)` und lädt sie nacheinander hoch
    async fn upload_streamed_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        mut body: ByteStream,
        size: i64,
    ) -> Result<Vec<CompletedPart>> {
        let part_size = part_size_for(size) as usize;
        let mut parts = Vec::new();
        let mut buffer = Vec::with_capacity(part_size);

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                MigrationError::remote(format!("reading body for s3://{}/{}", bucket, key), e)
            })?;
            buffer.extend_from_slice(&chunk);

            while buffer.len() >= part_size {
                let rest = buffer.split_off(part_size);
                let part = std::mem::replace(&mut buffer, rest);
                let number = parts.len() as i32 + 1;
                parts.push(self.upload_part(bucket, key, upload_id, number, part).await?);
            }
        }

        if !buffer.is_empty() || parts.is_empty() {
            let number = parts.len() as i32 + 1;
            parts.push(self.upload_part(bucket, key, upload_id, number, buffer).await?);
        }

        Ok(parts)
    }

    async fn copy_parts(
        &self,
        source: &str,
        bucket: &str,
        key: &str,
        upload_id: &str,
        size: i64,
    ) -> Result<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        for (index, (start, end)) in part_ranges(size).into_iter().enumerate() {
            let part_number = index as i32 + 1;
            let output = self
                .client
                .upload_part_copy()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .copy_source(source)
                .copy_source_range(format!("bytes={}-{}", start, end))
                .send()
                .await
                .map_err(|e| {
                    MigrationError::remote(
                        format!("copy of part {} to s3://{}/{}", part_number, bucket, key),
                        e,
                    )
                })?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(output.copy_part_result.and_then(|result| result.e_tag))
                    .build(),
            );
        }
        Ok(parts)
    }

    /// Schließt den Upload ab, bei einem Fehler in den Parts wird er abgebrochen
    async fn finish_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Result<Vec<CompletedPart>>,
    ) -> Result<()> {
        let parts = match parts {
            Ok(parts) => parts,
            Err(e) => {
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(bucket, key, error = %abort, "Failed to abort multipart upload");
                }
                return Err(e);
            }
        };

        tracing::debug!(bucket, key, parts = parts.len(), "Completing multipart upload");
        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                MigrationError::remote(format!("completing upload to s3://{}/{}", bucket, key), e)
            })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| {
                    MigrationError::remote(format!("listing s3://{}/{}", bucket, prefix), e)
                })?;

            for object in page.contents.unwrap_or_default() {
                let Some(key) = object.key else {
                    continue;
                };
                objects.push(ObjectMeta {
                    key,
                    size: object.size.unwrap_or_default(),
                    last_modified: object
                        .last_modified
                        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
                });
            }

            continuation_token = match page.is_truncated {
                Some(true) => page.next_continuation_token,
                _ => None,
            };
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        let identifiers = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MigrationError::remote("building object identifier", e))?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(|e| MigrationError::remote("building delete request", e))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| MigrationError::remote(format!("delete in s3://{}", bucket), e))?;

        let rejected = output.errors.unwrap_or_default();
        if let Some(first) = rejected.first() {
            return Err(MigrationError::DeleteRejected {
                bucket: bucket.to_string(),
                key: first.key.clone().unwrap_or_default(),
                message: first.message.clone().unwrap_or_default(),
                count: rejected.len(),
            });
        }

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MigrationError::remote(format!("get s3://{}/{}", bucket, key), e))?;

        Ok(output.body)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: ByteStream, size: i64) -> Result<()> {
        if size <= PART_SIZE {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_length(size)
                .body(body)
                .send()
                .await
                .map_err(|e| MigrationError::remote(format!("put s3://{}/{}", bucket, key), e))?;
            return Ok(());
        }

        let upload_id = self.create_upload(bucket, key).await?;
        let parts = self
            .upload_streamed_parts(bucket, key, &upload_id, body, size)
            .await;
        self.finish_upload(bucket, key, &upload_id, parts).await
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        destination_bucket: &str,
        key: &str,
        size: i64,
    ) -> Result<()> {
        let source = copy_source(source_bucket, key);

        if size <= MAX_SINGLE_REQUEST_SIZE {
            self.client
                .copy_object()
                .copy_source(&source)
                .bucket(destination_bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    MigrationError::remote(
                        format!("copy s3://{} to s3://{}/{}", source, destination_bucket, key),
                        e,
                    )
                })?;
            return Ok(());
        }

        let upload_id = self.create_upload(destination_bucket, key).await?;
        let parts = self
            .copy_parts(&source, destination_bucket, key, &upload_id, size)
            .await;
        self.finish_upload(destination_bucket, key, &upload_id, parts)
            .await
    }
}
