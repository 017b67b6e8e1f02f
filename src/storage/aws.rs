use crate::utils::config::EnvironmentConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use std::time::Duration;

/// Lade die SDK Config für eine Umgebung.
///
/// Region, Endpoint und statische Credentials überschreiben nur dann die
/// Default Provider Chain, wenn sie konfiguriert sind.
pub async fn load_sdk_config(env: &EnvironmentConfig, timeout_ms: Option<u64>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &env.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &env.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&env.access_key_id, &env.secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "stage-migrate",
        ));
    }

    if let Some(timeout_ms) = timeout_ms {
        loader = loader.timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build(),
        );
    }

    loader.load().await
}
