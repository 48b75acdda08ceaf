//! Composite score to allocation tier.

use crate::domain::config::SizingConfig;
use crate::domain::gates::RejectReason;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationTier {
    High,
    Medium,
}

impl fmt::Display for AllocationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationTier::High => f.write_str("HIGH"),
            AllocationTier::Medium => f.write_str("MEDIUM"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub tier: AllocationTier,
    /// Fraction of capital.
    pub fraction: f64,
}

pub fn size(score: i32, config: &SizingConfig) -> Result<Allocation, RejectReason> {
    if score >= config.high_threshold {
        Ok(Allocation {
            tier: AllocationTier::High,
            fraction: config.high_allocation,
        })
    } else if score > 0 {
        Ok(Allocation {
            tier: AllocationTier::Medium,
            fraction: config.medium_allocation,
        })
    } else {
        Err(RejectReason::NonPositiveScore { score })
    }
}
