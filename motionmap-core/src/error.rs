//! Error types for motionmap-core.

use thiserror::Error;

pub use crate::clustering::ClusteringError;

/// Result type alias for motionmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for motionmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Clustering error.
    #[error("clustering error: {0}")]
    Clustering(#[from] ClusteringError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusteringConfig;

    fn validated(config: &ClusteringConfig) -> Result<()> {
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_config_failure_maps_to_clustering_error() {
        let err = validated(&ClusteringConfig::new().with_cluster_max_dist(0.0)).unwrap_err();
        assert!(matches!(
            err,
            Error::Clustering(ClusteringError::InvalidConfig(_))
        ));
        assert!(err.to_string().starts_with("clustering error: "));
    }
}
