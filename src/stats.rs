// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BvStats {
    pub conflicts: u64,
    /// Disequalities witnessed by a statically complementary bit pair.
    pub diseq_static: u64,
    /// Disequalities expanded into a bit-difference clause.
    pub diseq_dynamic: u64,
    pub bit2core: u64,
    pub th2core_eq: u64,
}

impl fmt::Display for BvStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bv conflicts: {}", self.conflicts)?;
        writeln!(f, "bv diseqs: {}", self.diseq_static)?;
        writeln!(f, "bv dynamic diseqs: {}", self.diseq_dynamic)?;
        writeln!(f, "bv bit2core: {}", self.bit2core)?;
        writeln!(f, "bv->core eq: {}", self.th2core_eq)
    }
}
