#![deny(missing_docs)]

//! Parameter groups, closed enumerations and YAML loading for the `hgp`
//! partitioner.

pub mod builder;
pub mod context;
pub mod enums;

use std::fs;
use std::path::Path;

use hgp_core::{ErrorInfo, HgpError};

pub use builder::ContextBuilder;
pub use context::{
    CoarseningParams, CommunityDetectionParams, Context, FlowParams, FmParams,
    InitialPartitioningParams, LocalSearchParams, MinHashSparsifierParams, PartitionParams,
    PreprocessingParams, RatingParams,
};
pub use enums::{
    AcceptancePolicy, CoarseningAlgorithm, CommunityPolicy, EdgeWeightKind, FlowAlgorithm,
    FlowNetworkKind, HeavyNodePenalty, InitialPartitioningAlgorithm, Mode, Objective,
    RatingFunction, RefinementAlgorithm, StoppingRule,
};

fn yaml_error(code: &str, err: impl ToString) -> HgpError {
    HgpError::Configuration(ErrorInfo::new(code, err.to_string()))
}

impl Context {
    /// Parses and validates a YAML document. Missing fields take defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, HgpError> {
        let context: Context =
            serde_yaml::from_str(yaml).map_err(|err| yaml_error("yaml-decode", err))?;
        context.validate()?;
        Ok(context)
    }

    /// Serializes the context into YAML.
    pub fn to_yaml_string(&self) -> Result<String, HgpError> {
        serde_yaml::to_string(self).map_err(|err| yaml_error("yaml-encode", err))
    }

    /// Reads and validates a YAML configuration file.
    pub fn from_yaml_path(path: &Path) -> Result<Self, HgpError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| yaml_error("config-io", err).with_context("path", path.display()))?;
        Self::from_yaml_str(&contents).map_err(|err| err.with_context("path", path.display()))
    }

    /// Writes the context as YAML, creating parent directories.
    pub fn store_yaml(&self, path: &Path) -> Result<(), HgpError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                yaml_error("config-io", err).with_context("path", parent.display())
            })?;
        }
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml)
            .map_err(|err| yaml_error("config-io", err).with_context("path", path.display()))
    }
}
