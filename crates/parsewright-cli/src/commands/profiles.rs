//! Profiles command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::{Formatter, ProfileStatus};
use parsewright_store::{ArtifactStore, GroundTruthStore, StoreError};
use tracing::warn;

/// Execute the profiles command.
pub fn execute_profiles(config: &Config, formatter: &Formatter) -> Result<()> {
    let ground_truth = GroundTruthStore::new(&config.paths.data_dir);
    let artifacts = ArtifactStore::new(&config.paths.artifacts_dir);

    let mut statuses = Vec::new();
    for id in ground_truth.list()? {
        let artifact = match artifacts.load(&id) {
            Ok(persisted) => persisted.manifest.artifact_origin().map(|o| o.to_string()),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => {
                warn!(profile = %id, error = %e, "unreadable artifact");
                Some("unreadable".to_string())
            }
        };
        statuses.push(ProfileStatus { id, artifact });
    }

    println!("{}", formatter.profiles(&statuses)?);
    Ok(())
}
