use serde::{Deserialize, Serialize};
use std::fmt;

// ===== Experiment Arms =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Control,
    Test,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Control, Group::Test];

    pub fn label(&self) -> &'static str {
        match self {
            Group::Control => "Control",
            Group::Test => "Test",
        }
    }

    /// Bidding method applied to this arm during the experiment.
    pub fn bidding_method(&self) -> BiddingMethod {
        match self {
            Group::Control => BiddingMethod::MaximumBidding,
            Group::Test => BiddingMethod::AverageBidding,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BiddingMethod {
    MaximumBidding,
    AverageBidding,
}

impl fmt::Display for BiddingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiddingMethod::MaximumBidding => write!(f, "maximum bidding"),
            BiddingMethod::AverageBidding => write!(f, "average bidding"),
        }
    }
}
