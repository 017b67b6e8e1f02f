use crate::error::{MigrationError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "stage-migrate";
pub const DEFAULT_WINDOW_DAYS: u32 = 10;
pub const DEFAULT_ARTIFACT_PATH: &str = "migration-export.json";

/// Tabelle, Buckets und Zugangsdaten einer Umgebung (Produktion oder Staging)
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub table: String,
    pub submission_bucket: String,
    pub project_bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint Override, z.B. MinIO oder LocalStack
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl EnvironmentConfig {
    fn same_location(&self, other: &EnvironmentConfig) -> bool {
        self.endpoint_url == other.endpoint_url && self.region == other.region
    }

    /// Gleicher Endpoint und dieselben Zugangsdaten, der Ziel Client kann die Quelle lesen
    fn same_access(&self, other: &EnvironmentConfig) -> bool {
        self.same_location(other)
            && self.access_key_id == other.access_key_id
            && self.secret_access_key == other.secret_access_key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Submission,
    Project,
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKind::Submission => write!(f, "submission"),
            BucketKind::Project => write!(f, "project"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPair {
    pub kind: BucketKind,
    pub source: String,
    pub destination: String,
}

/// Hauptkonfiguration der Migration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: EnvironmentConfig,
    pub destination: EnvironmentConfig,
    pub window_days: u32,
    pub artifact_path: PathBuf,
    pub keep_artifact: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Verzeichnis für das Audit Log, ohne Angabe nur stderr
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Lade Config aus `.env`, TOML Datei und `MIGRATE__*` Environment Variablen.
    ///
    /// Eine explizit angegebene Datei muss existieren, die Default Datei
    /// `stage-migrate.toml` ist optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = ::config::Config::builder()
            .set_default("window_days", i64::from(DEFAULT_WINDOW_DAYS))?
            .set_default("artifact_path", DEFAULT_ARTIFACT_PATH)?
            .set_default("keep_artifact", false)?
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("MIGRATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Prüfe die Config einmal beim Start
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("source.table", &self.source.table),
            ("source.submission_bucket", &self.source.submission_bucket),
            ("source.project_bucket", &self.source.project_bucket),
            ("destination.table", &self.destination.table),
            ("destination.submission_bucket", &self.destination.submission_bucket),
            ("destination.project_bucket", &self.destination.project_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(MigrationError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.window_days == 0 {
            return Err(MigrationError::Config(
                "window_days must be at least 1".to_string(),
            ));
        }

        if self.artifact_path.as_os_str().is_empty() {
            return Err(MigrationError::Config(
                "artifact_path must not be empty".to_string(),
            ));
        }

        // Ziel wird geleert bzw. überschrieben, darf also nie die Quelle sein
        if self.source.same_location(&self.destination) {
            if self.source.table == self.destination.table {
                return Err(MigrationError::Config(format!(
                    "source and destination table are both {}",
                    self.source.table
                )));
            }
            for pair in self.bucket_pairs() {
                if pair.source == pair.destination {
                    return Err(MigrationError::Config(format!(
                        "source and destination {} bucket are both {}",
                        pair.kind, pair.source
                    )));
                }
            }
        }

        if self.source.access_key_id.is_some() != self.source.secret_access_key.is_some()
            || self.destination.access_key_id.is_some()
                != self.destination.secret_access_key.is_some()
        {
            return Err(MigrationError::Config(
                "access_key_id and secret_access_key must be set together".to_string(),
            ));
        }

        Ok(())
    }

    /// Objekte können serverseitig kopiert werden, statt sie durch den Prozess zu streamen
    pub fn server_side_copy(&self) -> bool {
        self.source.same_access(&self.destination)
    }

    /// Submission Paar zuerst, dann Project
    pub fn bucket_pairs(&self) -> [BucketPair; 2] {
        [
            BucketPair {
                kind: BucketKind::Submission,
                source: self.source.submission_bucket.clone(),
                destination: self.destination.submission_bucket.clone(),
            },
            BucketPair {
                kind: BucketKind::Project,
                source: self.source.project_bucket.clone(),
                destination: self.destination.project_bucket.clone(),
            },
        ]
    }
}

#[cfg(test)]
pub(crate) fn test_config(artifact_path: PathBuf) -> Config {
    Config {
        source: EnvironmentConfig {
            table: "prod-objects".to_string(),
            submission_bucket: "prod-submissions".to_string(),
            project_bucket: "prod-projects".to_string(),
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
        },
        destination: EnvironmentConfig {
            table: "staging-objects".to_string(),
            submission_bucket: "staging-submissions".to_string(),
            project_bucket: "staging-projects".to_string(),
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
        },
        window_days: DEFAULT_WINDOW_DAYS,
        artifact_path,
        keep_artifact: false,
        timeout_ms: None,
        log_dir: None,
    }
}
