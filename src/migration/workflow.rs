use crate::error::Result;
use crate::migration::confirm::Confirm;
use crate::migration::copier::{sync_selected, CopyStrategy};
use crate::migration::export::{cutoff_timestamp, export_records};
use crate::migration::filter::InclusionFilter;
use crate::migration::loader::load_batches;
use crate::migration::reset::reset_bucket;
use crate::storage::{ExportArtifact, ObjectStore, TableStore};
use crate::utils::config::{BucketKind, BucketPair, Config};
use crate::utils::Metrics;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Export,
    Load,
    Reset(BucketKind),
    Copy(BucketKind),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Export => write!(f, "export"),
            Stage::Load => write!(f, "load"),
            Stage::Reset(kind) => write!(f, "reset {}", kind),
            Stage::Copy(kind) => write!(f, "copy {}", kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// Vom Operator abgelehnt oder wegen eines abgelehnten Vorgängers ausgelassen
    Skipped,
}

/// Ergebnis eines Laufs
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub stages: Vec<(Stage, StageOutcome)>,
    pub records_exported: usize,
    pub batches_written: usize,
    pub objects_deleted: usize,
    pub objects_copied: usize,
    pub objects_up_to_date: usize,
}

impl WorkflowReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            stages: Vec::new(),
            records_exported: 0,
            batches_written: 0,
            objects_deleted: 0,
            objects_copied: 0,
            objects_up_to_date: 0,
        }
    }

    #[cfg(test)]
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| *outcome)
    }
}

/// Migration Produktion → Staging.
///
/// `Start → Exported → Loaded → {SubmissionReset → SubmissionCopied} →
/// {ProjectReset → ProjectCopied} → Done`, jeder Übergang hinter einer
/// Bestätigung. Ein Nein überspringt nur die davon abhängigen Schritte.
pub struct Migration {
    config: Config,
    source_table: Arc<dyn TableStore>,
    destination_table: Arc<dyn TableStore>,
    source_objects: Arc<dyn ObjectStore>,
    destination_objects: Arc<dyn ObjectStore>,
    metrics: Metrics,
}

impl Migration {
    pub fn new(
        config: Config,
        source_table: Arc<dyn TableStore>,
        destination_table: Arc<dyn TableStore>,
        source_objects: Arc<dyn ObjectStore>,
        destination_objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            source_table,
            destination_table,
            source_objects,
            destination_objects,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn run(&self, confirm: &mut dyn Confirm) -> Result<WorkflowReport> {
        self.run_at(chrono::Utc::now().timestamp(), confirm).await
    }

    /// Wie `run`, mit fester Uhrzeit für den Cutoff
    pub async fn run_at(&self, now: i64, confirm: &mut dyn Confirm) -> Result<WorkflowReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("migration", %run_id);
        self.execute(run_id, now, confirm).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        now: i64,
        confirm: &mut dyn Confirm,
    ) -> Result<WorkflowReport> {
        let mut report = WorkflowReport::new(run_id);
        let artifact = ExportArtifact::new(&self.config.artifact_path);
        let cutoff = cutoff_timestamp(now, self.config.window_days);
        let [submission, project] = self.config.bucket_pairs();

        let prompt = format!(
            "Export records updated in the last {} days from table {}?",
            self.config.window_days, self.config.source.table
        );
        if !self.gate(confirm, &mut report, Stage::Export, &prompt) {
            // Ohne Export gibt es nichts zu laden oder zu kopieren
            for stage in [
                Stage::Load,
                Stage::Reset(submission.kind),
                Stage::Copy(submission.kind),
                Stage::Reset(project.kind),
                Stage::Copy(project.kind),
            ] {
                self.skip(&mut report, stage);
            }
            tracing::info!("Migration finished without export");
            return Ok(report);
        }
        let exported = export_records(
            self.source_table.as_ref(),
            &self.config.source.table,
            cutoff,
            &artifact,
        )
        .await?;
        report.records_exported = exported;
        self.metrics.records_exported.inc_by(exported as u64);
        report.stages.push((Stage::Export, StageOutcome::Completed));

        let requests = artifact.read()?;

        let prompt = format!(
            "Write {} records to table {}?",
            requests.len(),
            self.config.destination.table
        );
        if self.gate(confirm, &mut report, Stage::Load, &prompt) {
            let batches = load_batches(
                self.destination_table.as_ref(),
                &self.config.destination.table,
                &requests,
            )
            .await?;
            report.batches_written = batches;
            self.metrics.batches_written.inc_by(batches as u64);
            report.stages.push((Stage::Load, StageOutcome::Completed));
        }

        for pair in [submission, project] {
            self.migrate_bucket(confirm, &mut report, &pair, &requests)
                .await?;
        }

        if self.config.keep_artifact {
            tracing::info!(artifact = %artifact.path().display(), "Keeping export artifact");
        } else if let Err(e) = artifact.remove() {
            tracing::warn!(error = %e, "Failed to remove export artifact");
        }

        tracing::info!(
            records = report.records_exported,
            batches = report.batches_written,
            deleted = report.objects_deleted,
            copied = report.objects_copied,
            up_to_date = report.objects_up_to_date,
            "Migration finished"
        );

        Ok(report)
    }

    async fn migrate_bucket(
        &self,
        confirm: &mut dyn Confirm,
        report: &mut WorkflowReport,
        pair: &BucketPair,
        requests: &[crate::storage::WriteRequest],
    ) -> Result<()> {
        let prompt = format!(
            "Delete EVERY object in {} bucket {}?",
            pair.kind, pair.destination
        );
        if !self.gate(confirm, report, Stage::Reset(pair.kind), &prompt) {
            self.skip(report, Stage::Copy(pair.kind));
            return Ok(());
        }
        let deleted = reset_bucket(self.destination_objects.as_ref(), &pair.destination).await?;
        report.objects_deleted += deleted;
        self.metrics.objects_deleted.inc_by(deleted as u64);
        report
            .stages
            .push((Stage::Reset(pair.kind), StageOutcome::Completed));

        // Für jedes Paar neu aus denselben Requests abgeleitet
        let filter = InclusionFilter::from_requests(requests)?;
        let prompt = format!(
            "Sync {} object prefixes from {} to {}?",
            filter.len(),
            pair.source,
            pair.destination
        );
        if !self.gate(confirm, report, Stage::Copy(pair.kind), &prompt) {
            return Ok(());
        }
        let summary = sync_selected(
            self.source_objects.as_ref(),
            self.destination_objects.as_ref(),
            pair,
            &filter,
            self.copy_strategy(),
        )
        .await?;
        report.objects_copied += summary.copied;
        report.objects_up_to_date += summary.up_to_date;
        self.metrics.objects_copied.inc_by(summary.copied as u64);
        self.metrics
            .objects_up_to_date
            .inc_by(summary.up_to_date as u64);
        report
            .stages
            .push((Stage::Copy(pair.kind), StageOutcome::Completed));

        Ok(())
    }

    fn copy_strategy(&self) -> CopyStrategy {
        if self.config.server_side_copy() {
            CopyStrategy::ServerSide
        } else {
            CopyStrategy::Streamed
        }
    }

    /// Fragt nach; bei Nein wird die Stage als übersprungen vermerkt
    fn gate(
        &self,
        confirm: &mut dyn Confirm,
        report: &mut WorkflowReport,
        stage: Stage,
        prompt: &str,
    ) -> bool {
        if confirm.confirm(prompt) {
            return true;
        }
        tracing::info!(%stage, "Declined by operator");
        self.skip(report, stage);
        false
    }

    fn skip(&self, report: &mut WorkflowReport, stage: Stage) {
        let label = stage.to_string();
        self.metrics
            .stages_skipped
            .with_label_values(&[label.as_str()])
            .inc();
        report.stages.push((stage, StageOutcome::Skipped));
    }
}
