// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Context;
use bvtheory_blast::{AdderMapping, GateBuilderOptions};
use serde::{Deserialize, Serialize};

use crate::error::BvError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BvConfig {
    /// Terms with an operand or result wider than this are not blasted; the
    /// theory then reports incompleteness at final check. `None` is
    /// unlimited.
    pub blast_max_size: Option<usize>,

    /// Defer the axioms tying an order atom to its definition until the atom
    /// becomes relevant. Only takes effect when the core tracks relevancy.
    pub lazy_order_atoms: bool,

    pub adder_mapping: AdderMapping,

    /// Constant folding in the gate builder.
    pub fold: bool,

    /// Structural hashing in the gate builder.
    pub hash: bool,
}

impl Default for BvConfig {
    fn default() -> Self {
        BvConfig {
            blast_max_size: None,
            lazy_order_atoms: false,
            adder_mapping: AdderMapping::default(),
            fold: true,
            hash: true,
        }
    }
}

impl BvConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, BvError> {
        toml::from_str(text).map_err(|e| BvError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading bv config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("parsing bv config {}", path.display()))?;
        log::debug!("loaded bv config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn gate_builder_options(&self) -> GateBuilderOptions {
        GateBuilderOptions {
            fold: self.fold,
            hash: self.hash,
        }
    }

    /// Whether a sort of `width` bits is within the blasting limit.
    pub fn within_blast_limit(&self, width: usize) -> bool {
        self.blast_max_size.is_none_or(|max| width <= max)
    }
}
