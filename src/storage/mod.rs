pub mod artifact;
pub mod aws;
pub mod dynamodb;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod s3;

pub use artifact::ExportArtifact;
pub use aws::load_sdk_config;
pub use dynamodb::{DynamoDBStore, TableStore};
pub use models::{Item, ObjectMeta, WriteRequest};
pub use s3::{ObjectStore, S3Store};
