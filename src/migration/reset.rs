use crate::error::Result;
use crate::storage::ObjectStore;

/// Maximale Keys pro DeleteObjects Aufruf
pub const DELETE_LIMIT: usize = 1000;

/// Lösche jedes Objekt im Bucket. Nicht umkehrbar.
pub async fn reset_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<usize> {
    let keys = store
        .list_objects(bucket, "")
        .await?
        .into_iter()
        .map(|object| object.key)
        .collect::<Vec<_>>();

    tracing::info!(bucket, objects = keys.len(), "Emptying bucket");

    for chunk in keys.chunks(DELETE_LIMIT) {
        store.delete_objects(bucket, chunk.to_vec()).await?;
        tracing::debug!(bucket, deleted = chunk.len(), "Delete batch done");
    }

    Ok(keys.len())
}
