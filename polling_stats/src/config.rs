// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The parties tracked by the dashboard.
///
/// Every per-party output of the pipeline is reported in the order of
/// [`Party::ALL`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Party {
    Apc,
    Lp,
    Pdp,
    Nnpp,
}

impl Party {
    /// All the tracked parties, in display order.
    pub const ALL: [Party; 4] = [Party::Apc, Party::Lp, Party::Pdp, Party::Nnpp];

    pub fn name(&self) -> &'static str {
        match self {
            Party::Apc => "APC",
            Party::Lp => "LP",
            Party::Pdp => "PDP",
            Party::Nnpp => "NNPP",
        }
    }
}

/// The label assigned upstream by the anomaly detection pass.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AnomalyLabel {
    Anomaly,
    Normal,
}

impl AnomalyLabel {
    pub fn parse(s: &str) -> Result<AnomalyLabel, PipelineErrors> {
        match s {
            "Anomaly" => Ok(AnomalyLabel::Anomaly),
            "Normal" => Ok(AnomalyLabel::Normal),
            _ => Err(PipelineErrors::UnknownAnomalyLabel(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnomalyLabel::Anomaly => "Anomaly",
            AnomalyLabel::Normal => "Normal",
        }
    }
}

/// A precomputed per-party flag indicating statistically anomalous vote
/// counts for a polling unit.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum OutlierFlag {
    Outlier,
    Normal,
}

impl OutlierFlag {
    pub fn parse(s: &str) -> Result<OutlierFlag, PipelineErrors> {
        match s {
            "Outlier" => Ok(OutlierFlag::Outlier),
            "Normal" => Ok(OutlierFlag::Normal),
            _ => Err(PipelineErrors::UnknownOutlierFlag(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutlierFlag::Outlier => "Outlier",
            OutlierFlag::Normal => "Normal",
        }
    }
}

/// One polling unit: one row of the precomputed results file.
///
/// The vote and voter counts are plain column values; the anomaly fields
/// arrive precomputed from the upstream detection step and are only ever
/// displayed or compared, never recomputed here.
#[derive(PartialEq, Debug, Clone)]
pub struct PollingUnit {
    pub state: String,
    pub lga: String,
    pub ward: String,
    pub pu_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_votes: u64,
    pub apc: u64,
    pub lp: u64,
    pub pdp: u64,
    pub nnpp: u64,
    // Convention: accredited <= registered. Not enforced.
    pub accredited_voters: u64,
    pub registered_voters: u64,
    pub anomaly_label: AnomalyLabel,
    /// Isolation forest indicator, 0 or 1.
    pub if_indicator: u8,
    pub composite_outlier_score: f64,
    pub apc_outlier: OutlierFlag,
    pub lp_outlier: OutlierFlag,
    pub pdp_outlier: OutlierFlag,
    pub nnpp_outlier: OutlierFlag,
}

impl PollingUnit {
    pub fn party_votes(&self, party: Party) -> u64 {
        match party {
            Party::Apc => self.apc,
            Party::Lp => self.lp,
            Party::Pdp => self.pdp,
            Party::Nnpp => self.nnpp,
        }
    }

    pub fn party_outlier(&self, party: Party) -> OutlierFlag {
        match party {
            Party::Apc => self.apc_outlier,
            Party::Lp => self.lp_outlier,
            Party::Pdp => self.pdp_outlier,
            Party::Nnpp => self.nnpp_outlier,
        }
    }

    /// True when at least one party flags this unit as an outlier.
    pub fn has_outlier_flag(&self) -> bool {
        Party::ALL
            .iter()
            .any(|p| self.party_outlier(*p) == OutlierFlag::Outlier)
    }
}

// ******** Output data structures *********

/// The column sums displayed as the KPI cards.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KpiTotals {
    pub total_votes: u64,
    pub apc: u64,
    pub lp: u64,
    pub pdp: u64,
    pub nnpp: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyTally {
    pub party: Party,
    pub votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WardTally {
    pub ward: String,
    pub total_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoterComparison {
    pub accredited_voters: u64,
    pub registered_voters: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LgaOutlierCount {
    pub lga: String,
    pub count: u64,
}

/// The units flagged anomalous by all three precomputed criteria at once.
#[derive(PartialEq, Debug, Clone)]
pub struct ConsistentOutliers {
    /// The 0.75 quantile of the composite scores of the filtered dataset.
    /// Absent when the filtered dataset is empty.
    pub score_threshold: Option<f64>,
    /// The qualifying units, in dataset order.
    pub units: Vec<PollingUnit>,
    pub counts_by_lga: Vec<LgaOutlierCount>,
}

/// Everything the rendering layer needs for one ward selection.
#[derive(PartialEq, Debug, Clone)]
pub struct DashboardSummary {
    /// The ward-filtered view, in dataset order. This is also the row set
    /// behind the map display.
    pub units: Vec<PollingUnit>,
    pub kpis: KpiTotals,
    pub party_votes: Vec<PartyTally>,
    pub votes_by_ward: Vec<WardTally>,
    pub voter_comparison: VoterComparison,
    pub consistent_outliers: ConsistentOutliers,
}

/// Errors that prevent the pipeline from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PipelineErrors {
    /// The ward selection contains a name that does not occur in the dataset.
    UnknownWard(String),
    UnknownAnomalyLabel(String),
    UnknownOutlierFlag(String),
    /// The isolation forest indicator may only be 0 or 1.
    InvalidIndicator(u8),
}

impl Error for PipelineErrors {}

impl Display for PipelineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineErrors::UnknownWard(w) => write!(f, "unknown ward in selection: {}", w),
            PipelineErrors::UnknownAnomalyLabel(s) => write!(f, "unknown anomaly label: {}", s),
            PipelineErrors::UnknownOutlierFlag(s) => write!(f, "unknown outlier flag: {}", s),
            PipelineErrors::InvalidIndicator(x) => {
                write!(f, "isolation forest indicator must be 0 or 1, got {}", x)
            }
        }
    }
}
