//! Configuration for type inference

use serde::{Deserialize, Serialize};

/// Root type name used when neither the caller nor the catalogue declares one
pub const DEFAULT_ROOT_TYPE: &str = "Base";

/// Configuration for type inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Root type name for documents without a declared one
    pub root_type_name: String,

    /// Maximum nesting depth for objects
    pub max_depth: usize,

    /// Instance count above which the pairwise similarity search logs a warning
    pub pairwise_warning_threshold: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            root_type_name: DEFAULT_ROOT_TYPE.to_string(),
            max_depth: 64,
            pairwise_warning_threshold: 1000,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the default root type name
    pub fn root_type_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_type_name = name.into();
        self
    }

    /// Set the maximum nesting depth (at least 1)
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth.max(1);
        self
    }

    /// Set the instance count that triggers the large-input warning
    pub fn pairwise_warning_threshold(mut self, count: usize) -> Self {
        self.config.pairwise_warning_threshold = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}
