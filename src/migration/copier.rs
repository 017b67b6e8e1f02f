use crate::error::Result;
use crate::migration::filter::InclusionFilter;
use crate::storage::{ObjectMeta, ObjectStore};
use crate::utils::config::BucketPair;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub copied: usize,
    pub up_to_date: usize,
}

/// Wie ein Objekt ins Ziel kommt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// CopyObject bzw. UploadPartCopy über den Ziel Client, die Daten bleiben im Store
    ServerSide,
    /// Body wird von der Quelle gelesen und ins Ziel gestreamt
    Streamed,
}

/// Ein Objekt wird kopiert, wenn es im Ziel fehlt, die Größe abweicht
/// oder die Quelle neuer ist.
fn needs_copy(source: &ObjectMeta, destination: Option<&ObjectMeta>) -> bool {
    let Some(destination) = destination else {
        return true;
    };
    if source.size != destination.size {
        return true;
    }
    match (source.last_modified, destination.last_modified) {
        (Some(src), Some(dst)) => src > dst,
        _ => true,
    }
}

async fn list_matching(
    store: &dyn ObjectStore,
    bucket: &str,
    filter: &InclusionFilter,
) -> Result<BTreeMap<String, ObjectMeta>> {
    let mut objects = BTreeMap::new();
    for (prefix, exhaustive) in filter.list_prefixes() {
        for object in store.list_objects(bucket, prefix).await? {
            if exhaustive || filter.matches(&object.key) {
                objects.insert(object.key.clone(), object);
            }
        }
    }
    Ok(objects)
}

/// Einseitiger Sync aller Objekte, die der Filter einschließt.
///
/// Objekte im Ziel werden nie gelöscht. Ein leerer Filter macht den Sync zum No-Op.
pub async fn sync_selected(
    source: &dyn ObjectStore,
    destination: &dyn ObjectStore,
    pair: &BucketPair,
    filter: &InclusionFilter,
    strategy: CopyStrategy,
) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    if filter.is_empty() {
        tracing::info!(kind = %pair.kind, "Inclusion filter is empty, nothing to sync");
        return Ok(summary);
    }

    tracing::info!(
        kind = %pair.kind,
        source = %pair.source,
        destination = %pair.destination,
        patterns = filter.len(),
        ?strategy,
        "Syncing selected objects"
    );

    let source_objects = list_matching(source, &pair.source, filter).await?;
    let destination_objects = list_matching(destination, &pair.destination, filter).await?;

    for (key, object) in &source_objects {
        if !needs_copy(object, destination_objects.get(key)) {
            summary.up_to_date += 1;
            continue;
        }

        match strategy {
            CopyStrategy::ServerSide => {
                destination
                    .copy_object(&pair.source, &pair.destination, key, object.size)
                    .await?
            }
            CopyStrategy::Streamed => {
                let body = source.get_object(&pair.source, key).await?;
                destination
                    .put_object(&pair.destination, key, body, object.size)
                    .await?
            }
        }
        summary.copied += 1;
        tracing::debug!(key = %key, size = object.size, "Object copied");
    }

    tracing::info!(
        kind = %pair.kind,
        copied = summary.copied,
        up_to_date = summary.up_to_date,
        "Sync finished"
    );

    Ok(summary)
}
