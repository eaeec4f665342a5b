pub use crate::config::*;

/// A builder for assembling a dataset of polling units in memory.
///
/// The file readers use it to validate units as they are decoded; it is
/// also the quickest way to put a dataset together in tests.
///
/// ```
/// use polling_stats::builder::Builder;
/// # use polling_stats::PipelineErrors;
///
/// let mut builder = Builder::new();
/// builder.add_unit_simple("Ife Central", "Moore", "Moore PU 001", [120, 80, 50, 10])?;
///
/// let dataset = builder.build();
/// assert_eq!(dataset.len(), 1);
/// # Ok::<(), PipelineErrors>(())
/// ```
pub struct Builder {
    pub(crate) _units: Vec<PollingUnit>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { _units: Vec::new() }
    }

    /// Adds a fully described polling unit.
    pub fn add_unit(&mut self, unit: PollingUnit) -> Result<(), PipelineErrors> {
        if unit.if_indicator > 1 {
            return Err(PipelineErrors::InvalidIndicator(unit.if_indicator));
        }
        self._units.push(unit);
        Ok(())
    }

    /// Adds a unit from its administrative identity and party votes alone.
    ///
    /// The total is the sum of the party votes and the anomaly statistics
    /// are neutral. It is the simplest use case for most tests.
    pub fn add_unit_simple(
        &mut self,
        lga: &str,
        ward: &str,
        pu_name: &str,
        votes: [u64; 4],
    ) -> Result<(), PipelineErrors> {
        let [apc, lp, pdp, nnpp] = votes;
        self.add_unit(PollingUnit {
            state: "".to_string(),
            lga: lga.to_string(),
            ward: ward.to_string(),
            pu_name: pu_name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            total_votes: apc + lp + pdp + nnpp,
            apc,
            lp,
            pdp,
            nnpp,
            accredited_voters: 0,
            registered_voters: 0,
            anomaly_label: AnomalyLabel::Normal,
            if_indicator: 0,
            composite_outlier_score: 0.0,
            apc_outlier: OutlierFlag::Normal,
            lp_outlier: OutlierFlag::Normal,
            pdp_outlier: OutlierFlag::Normal,
            nnpp_outlier: OutlierFlag::Normal,
        })
    }

    pub fn build(self) -> Vec<PollingUnit> {
        self._units
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}
