use serde::Serialize;
use std::fmt;

/// Remote call families counted in the completeness summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFamily {
    GroupSearch,
    GroupDetail,
    Pricing,
    AddOns,
}

impl FetchFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupSearch => "group_search",
            Self::GroupDetail => "group_detail",
            Self::Pricing => "pricing",
            Self::AddOns => "add_ons",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchTally {
    pub attempted: usize,
    pub succeeded: usize,
}

impl FetchTally {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

impl fmt::Display for FetchTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.attempted)
    }
}

/// A work item that was skipped, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub family: FetchFamily,
    pub item: String,
    pub reason: String,
}

/// Attempted vs succeeded fetch counts for one aggregation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletenessSummary {
    pub group_searches: FetchTally,
    pub group_details: FetchTally,
    pub pricing: FetchTally,
    pub add_ons: FetchTally,
    pub skipped: Vec<SkippedItem>,
}

impl CompletenessSummary {
    pub fn tally(&self, family: FetchFamily) -> FetchTally {
        match family {
            FetchFamily::GroupSearch => self.group_searches,
            FetchFamily::GroupDetail => self.group_details,
            FetchFamily::Pricing => self.pricing,
            FetchFamily::AddOns => self.add_ons,
        }
    }

    fn tally_mut(&mut self, family: FetchFamily) -> &mut FetchTally {
        match family {
            FetchFamily::GroupSearch => &mut self.group_searches,
            FetchFamily::GroupDetail => &mut self.group_details,
            FetchFamily::Pricing => &mut self.pricing,
            FetchFamily::AddOns => &mut self.add_ons,
        }
    }

    pub fn record_success(&mut self, family: FetchFamily) {
        let tally = self.tally_mut(family);
        tally.attempted += 1;
        tally.succeeded += 1;
    }

    pub fn record_skip(&mut self, family: FetchFamily, item: impl Into<String>, reason: impl Into<String>) {
        self.tally_mut(family).attempted += 1;
        self.skipped.push(SkippedItem {
            family,
            item: item.into(),
            reason: reason.into(),
        });
    }

    /// True when every attempted fetch succeeded
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl fmt::Display for CompletenessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group searches {}, group details {}, pricing {}, add-ons {}",
            self.group_searches, self.group_details, self.pricing, self.add_ons
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_attempts_and_skips() {
        let mut summary = CompletenessSummary::default();
        for _ in 0..9 {
            summary.record_success(FetchFamily::Pricing);
        }
        summary.record_skip(FetchFamily::Pricing, "d1/g1", "Transient fetch error: timeout");

        let pricing = summary.tally(FetchFamily::Pricing);
        assert_eq!(pricing, FetchTally { attempted: 10, succeeded: 9 });
        assert_eq!(pricing.failed(), 1);
        assert!(!summary.is_complete());
        assert_eq!(summary.skipped[0].item, "d1/g1");
    }

    #[test]
    fn test_display() {
        let mut summary = CompletenessSummary::default();
        summary.record_success(FetchFamily::GroupSearch);
        summary.record_success(FetchFamily::Pricing);
        summary.record_skip(FetchFamily::Pricing, "x", "y");
        assert_eq!(
            summary.to_string(),
            "group searches 1/1, group details 0/0, pricing 1/2, add-ons 0/0"
        );
    }
}
