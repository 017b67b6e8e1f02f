use prometheus::{Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::path::Path;

/// Prometheus Zähler für einen Migrationslauf
pub struct Metrics {
    pub registry: Registry,
    pub records_exported: IntCounter,
    pub batches_written: IntCounter,
    pub objects_deleted: IntCounter,
    pub objects_copied: IntCounter,
    pub objects_up_to_date: IntCounter,
    pub stages_skipped: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let records_exported = IntCounter::new(
            "migration_records_exported_total",
            "Records exported from the source table",
        )
        .expect("Failed to create records_exported metric");

        let batches_written = IntCounter::new(
            "migration_batches_written_total",
            "Batch writes submitted to the destination table",
        )
        .expect("Failed to create batches_written metric");

        let objects_deleted = IntCounter::new(
            "migration_objects_deleted_total",
            "Objects deleted from destination buckets",
        )
        .expect("Failed to create objects_deleted metric");

        let objects_copied = IntCounter::new(
            "migration_objects_copied_total",
            "Objects copied into destination buckets",
        )
        .expect("Failed to create objects_copied metric");

        let objects_up_to_date = IntCounter::new(
            "migration_objects_up_to_date_total",
            "Matching objects already present in the destination",
        )
        .expect("Failed to create objects_up_to_date metric");

        let stages_skipped = IntCounterVec::new(
            prometheus::Opts::new(
                "migration_stages_skipped_total",
                "Stages declined by the operator",
            ),
            &["stage"],
        )
        .expect("Failed to create stages_skipped metric");

        registry.register(Box::new(records_exported.clone())).ok();
        registry.register(Box::new(batches_written.clone())).ok();
        registry.register(Box::new(objects_deleted.clone())).ok();
        registry.register(Box::new(objects_copied.clone())).ok();
        registry.register(Box::new(objects_up_to_date.clone())).ok();
        registry.register(Box::new(stages_skipped.clone())).ok();

        Self {
            registry,
            records_exported,
            batches_written,
            objects_deleted,
            objects_copied,
            objects_up_to_date,
            stages_skipped,
        }
    }

    /// Text Exposition Format, z.B. für den node_exporter textfile collector
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .ok();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn write_textfile(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
