// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aggregated engagement statistics for a creator's Lens handle.

use serde::Serialize;

use crate::format::format_number;
use crate::models::EngagementCounts;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    pub upvotes: u64,
    pub reposts: u64,
    pub comments: u64,
    pub quotes: u64,
    pub total_engagements: u64,
    /// Percentage. The rate is taken against the engagement total itself, so
    /// it is 100 whenever there is any engagement and 0 otherwise.
    pub engagement_rate: f64,
}

impl From<EngagementCounts> for EngagementStats {
    fn from(counts: EngagementCounts) -> Self {
        let total_engagements = counts
            .upvotes
            .saturating_add(counts.reposts)
            .saturating_add(counts.comments)
            .saturating_add(counts.quotes);

        // TODO: switch the denominator to follower or view counts once the
        // engagement endpoint reports them.
        let engagement_rate = if total_engagements > 0 {
            (total_engagements as f64 / total_engagements as f64) * 100.0
        } else {
            0.0
        };

        Self {
            upvotes: counts.upvotes,
            reposts: counts.reposts,
            comments: counts.comments,
            quotes: counts.quotes,
            total_engagements,
            engagement_rate,
        }
    }
}

impl EngagementStats {
    /// Abbreviated total for display, e.g. `1.5K`.
    pub fn total_display(&self) -> String {
        format_number(self.total_engagements)
    }
}
