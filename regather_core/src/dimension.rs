// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregation dimensions and their derived-resource hooks.
//!
//! A [`Dimension`] names one expensive derived computation and declares what
//! it reads: configuration keys ([`props`](Dimension::props)) and per-element
//! accessor functions ([`accessors`](Dimension::accessors)). The tracker only
//! decides *whether* a dimension must be recomputed; the computation itself
//! belongs to the framework.
//!
//! The set of aggregation kinds is closed, so the shader-update hook is a
//! method on the [`AggregationKind`] enum rather than a trait object.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Shader define that switches aggregation models to non-instanced drawing.
pub const NON_INSTANCED_MODEL: &str = "NON_INSTANCED_MODEL";

/// The shader description the framework produces for an aggregation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderConfig {
    /// Shader modules, in injection order.
    pub modules: Vec<String>,
    /// Preprocessor defines.
    pub defines: BTreeMap<String, i32>,
}

impl ShaderConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: appends a shader module.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Builder-style: sets a define.
    #[must_use]
    pub fn with_define(mut self, name: impl Into<String>, value: i32) -> Self {
        self.defines.insert(name.into(), value);
        self
    }

    /// Returns the value of a define, if set.
    #[must_use]
    pub fn define(&self, name: &str) -> Option<i32> {
        self.defines.get(name).copied()
    }
}

/// A request to rebuild one GPU model with new shaders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelUpdate {
    /// The dimension that owns the model.
    pub dimension: String,
    /// The model to rebuild.
    pub model: String,
    /// Shaders to rebuild it with.
    pub shaders: ShaderConfig,
}

/// How a dimension's aggregation is computed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AggregationKind {
    /// Aggregated on the CPU; owns no GPU models.
    #[default]
    Cpu,
    /// Aggregated on the GPU through the named model.
    Gpu {
        /// Name of the aggregation model.
        model: String,
    },
}

impl AggregationKind {
    /// Reacts to a change in the shader configuration.
    ///
    /// CPU aggregation has nothing to rebuild. GPU aggregation returns the
    /// model that must be rebuilt with `shaders`.
    #[must_use]
    pub fn update_derived_resources(
        &self,
        dimension: &str,
        shaders: &ShaderConfig,
    ) -> Option<ModelUpdate> {
        match self {
            Self::Cpu => None,
            Self::Gpu { model } => Some(ModelUpdate {
                dimension: dimension.into(),
                model: model.clone(),
                shaders: shaders.clone(),
            }),
        }
    }
}

/// A named derived computation with declared data dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    name: String,
    props: Vec<String>,
    accessors: Vec<String>,
    detect_structural_change: bool,
    kind: AggregationKind,
}

impl Dimension {
    /// Creates a CPU dimension with no dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            accessors: Vec::new(),
            detect_structural_change: false,
            kind: AggregationKind::Cpu,
        }
    }

    /// Builder-style: declares the configuration keys this dimension reads.
    #[must_use]
    pub fn props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props.extend(props.into_iter().map(Into::into));
        self
    }

    /// Builder-style: declares the accessors this dimension depends on.
    #[must_use]
    pub fn accessors<I, S>(mut self, accessors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accessors.extend(accessors.into_iter().map(Into::into));
        self
    }

    /// Builder-style: compare every non-ignored key instead of only the
    /// declared props, and treat structural changes as dirty.
    #[must_use]
    pub fn detect_structural_change(mut self, detect: bool) -> Self {
        self.detect_structural_change = detect;
        self
    }

    /// Builder-style: sets the aggregation kind.
    #[must_use]
    pub fn kind(mut self, kind: AggregationKind) -> Self {
        self.kind = kind;
        self
    }

    /// The dimension's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared configuration keys.
    #[must_use]
    pub fn prop_keys(&self) -> &[String] {
        &self.props
    }

    /// Declared accessor names.
    #[must_use]
    pub fn accessor_names(&self) -> &[String] {
        &self.accessors
    }

    /// Whether structural change detection is enabled.
    #[must_use]
    pub fn detects_structural_change(&self) -> bool {
        self.detect_structural_change
    }

    /// The aggregation kind.
    #[must_use]
    pub fn aggregation_kind(&self) -> &AggregationKind {
        &self.kind
    }
}
