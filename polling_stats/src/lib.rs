mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

/// Returns the distinct wards of the dataset, in first-appearance order.
///
/// This is the selectable universe of the ward filter: the dashboard
/// defaults its initial multi-selection to all of it.
pub fn ward_universe(dataset: &[PollingUnit]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for unit in dataset.iter() {
        if seen.insert(unit.ward.as_str()) {
            res.push(unit.ward.clone());
        }
    }
    res
}

/// Returns the distinct LGAs of the dataset, in first-appearance order.
pub fn lga_universe(dataset: &[PollingUnit]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for unit in dataset.iter() {
        if seen.insert(unit.lga.as_str()) {
            res.push(unit.lga.clone());
        }
    }
    res
}

/// Returns the subset of units whose ward is a member of the selection.
///
/// Row order and row contents are preserved. An empty selection returns an
/// empty dataset, not the full one: defaulting the selection to the whole
/// ward universe is the caller's decision.
pub fn filter_by_ward(
    dataset: &[PollingUnit],
    selected_wards: &HashSet<String>,
) -> Vec<PollingUnit> {
    dataset
        .iter()
        .filter(|u| selected_wards.contains(&u.ward))
        .cloned()
        .collect()
}

/// Sums the vote columns over the dataset. An empty dataset sums to zero.
pub fn compute_kpis(dataset: &[PollingUnit]) -> KpiTotals {
    let mut kpis = KpiTotals {
        total_votes: 0,
        apc: 0,
        lp: 0,
        pdp: 0,
        nnpp: 0,
    };
    for u in dataset.iter() {
        kpis.total_votes += u.total_votes;
        kpis.apc += u.apc;
        kpis.lp += u.lp;
        kpis.pdp += u.pdp;
        kpis.nnpp += u.nnpp;
    }
    kpis
}

/// Formats a count the way the KPI cards display it.
///
/// Values of 1000 and above render in thousands with a `K` suffix,
/// everything below as the plain integer. Digit groups are separated by
/// commas. Ties at half a thousand round to the even thousand.
pub fn format_count(value: u64) -> String {
    if value >= 1000 {
        format!("{}K", group_thousands(div_round_half_even(value, 1000)))
    } else {
        group_thousands(value)
    }
}

fn div_round_half_even(value: u64, divisor: u64) -> u64 {
    let q = value / divisor;
    let r = value % divisor;
    match (r * 2).cmp(&divisor) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q % 2),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut res = String::new();
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

/// Sums the votes of each party over the dataset.
///
/// Always returns exactly one entry per tracked party, in display order.
pub fn aggregate_party_votes(dataset: &[PollingUnit]) -> Vec<PartyTally> {
    Party::ALL
        .iter()
        .map(|&party| PartyTally {
            party,
            votes: dataset.iter().map(|u| u.party_votes(party)).sum(),
        })
        .collect()
}

/// Groups the dataset by ward and sums the total votes of each group.
///
/// Groups are returned sorted by ward name.
pub fn aggregate_votes_by_ward(dataset: &[PollingUnit]) -> Vec<WardTally> {
    let mut tally: HashMap<String, u64> = HashMap::new();
    for u in dataset.iter() {
        *tally.entry(u.ward.clone()).or_insert(0) += u.total_votes;
    }
    let mut res: Vec<WardTally> = tally
        .into_iter()
        .map(|(ward, total_votes)| WardTally { ward, total_votes })
        .collect();
    res.sort_by_key(|wt| wt.ward.clone());
    res
}

/// Sums the accredited and registered voter columns over the dataset.
pub fn voter_comparison(dataset: &[PollingUnit]) -> VoterComparison {
    VoterComparison {
        accredited_voters: dataset.iter().map(|u| u.accredited_voters).sum(),
        registered_voters: dataset.iter().map(|u| u.registered_voters).sum(),
    }
}

/// The units of the given LGA carrying at least one party outlier flag.
///
/// The input is expected to be the ward-filtered view. An LGA with no
/// flagged unit produces an empty result, which the rendering layer turns
/// into a "no outliers found" message rather than an empty table.
pub fn outliers_for_lga(dataset: &[PollingUnit], lga: &str) -> Vec<PollingUnit> {
    dataset
        .iter()
        .filter(|u| u.lga == lga && u.has_outlier_flag())
        .cloned()
        .collect()
}

/// Classifies the consistent outliers of the (filtered) dataset.
///
/// A unit is a consistent outlier when it is labeled as an anomaly, the
/// isolation forest indicator is set, and its composite score reaches the
/// 0.75 quantile of the scores of the input dataset. The threshold is a
/// property of the current filter selection and is recomputed for every
/// input; an empty input has no threshold and no outliers.
pub fn consistent_outliers(dataset: &[PollingUnit]) -> ConsistentOutliers {
    let scores: Vec<f64> = dataset.iter().map(|u| u.composite_outlier_score).collect();
    let score_threshold = quantile_linear(&scores, 0.75);
    debug!("consistent_outliers: score_threshold: {:?}", score_threshold);
    let units: Vec<PollingUnit> = match score_threshold {
        None => Vec::new(),
        Some(threshold) => dataset
            .iter()
            .filter(|u| {
                u.anomaly_label == AnomalyLabel::Anomaly
                    && u.if_indicator == 1
                    && u.composite_outlier_score >= threshold
            })
            .cloned()
            .collect(),
    };
    let counts = counts_by_lga(&units);
    ConsistentOutliers {
        score_threshold,
        units,
        counts_by_lga: counts,
    }
}

/// Groups units by LGA and counts the members of each group.
///
/// Groups are returned sorted by LGA name.
pub fn counts_by_lga(units: &[PollingUnit]) -> Vec<LgaOutlierCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for u in units.iter() {
        *counts.entry(u.lga.clone()).or_insert(0) += 1;
    }
    let mut res: Vec<LgaOutlierCount> = counts
        .into_iter()
        .map(|(lga, count)| LgaOutlierCount { lga, count })
        .collect();
    res.sort_by_key(|c| c.lga.clone());
    res
}

// The quantile of the values under linear interpolation between ranks:
// the q quantile of n ascending values sits at index q * (n - 1).
// Undefined (None) on an empty input.
fn quantile_linear(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = q * ((sorted.len() - 1) as f64);
    let lo = index.floor() as usize;
    let hi = index.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        Some(sorted[lo] + (index - lo as f64) * (sorted[hi] - sorted[lo]))
    }
}

/// Runs the full dashboard pipeline for the given ward selection.
///
/// Arguments:
/// * `dataset` the full loaded dataset
/// * `selected_wards` the ward multi-selection. Every name must be a ward
/// present in the dataset; callers default the selection to
/// [`ward_universe`] when the user has not restricted it.
pub fn run_dashboard_stats(
    dataset: &[PollingUnit],
    selected_wards: &[String],
) -> Result<DashboardSummary, PipelineErrors> {
    info!(
        "run_dashboard_stats: processing {:?} units, {:?} wards selected",
        dataset.len(),
        selected_wards.len()
    );

    let universe: HashSet<String> = ward_universe(dataset).into_iter().collect();
    for ward in selected_wards.iter() {
        if !universe.contains(ward) {
            return Err(PipelineErrors::UnknownWard(ward.clone()));
        }
    }

    let selection: HashSet<String> = selected_wards.iter().cloned().collect();
    let units = filter_by_ward(dataset, &selection);
    debug!(
        "run_dashboard_stats: {:?} units after ward filter",
        units.len()
    );

    let kpis = compute_kpis(&units);
    let party_votes = aggregate_party_votes(&units);
    let votes_by_ward = aggregate_votes_by_ward(&units);
    let comparison = voter_comparison(&units);
    let consistent = consistent_outliers(&units);

    Ok(DashboardSummary {
        units,
        kpis,
        party_votes,
        votes_by_ward,
        voter_comparison: comparison,
        consistent_outliers: consistent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn unit(
        lga: &str,
        ward: &str,
        pu_name: &str,
        votes: [u64; 4],
        label: &str,
        if_indicator: u8,
        score: f64,
        flags: [&str; 4],
    ) -> PollingUnit {
        let [apc, lp, pdp, nnpp] = votes;
        PollingUnit {
            state: "Osun".to_string(),
            lga: lga.to_string(),
            ward: ward.to_string(),
            pu_name: pu_name.to_string(),
            latitude: 7.5,
            longitude: 4.5,
            total_votes: apc + lp + pdp + nnpp,
            apc,
            lp,
            pdp,
            nnpp,
            accredited_voters: 10 * (apc + lp + pdp + nnpp) / 9,
            registered_voters: 2 * (apc + lp + pdp + nnpp),
            anomaly_label: AnomalyLabel::parse(label).unwrap(),
            if_indicator,
            composite_outlier_score: score,
            apc_outlier: OutlierFlag::parse(flags[0]).unwrap(),
            lp_outlier: OutlierFlag::parse(flags[1]).unwrap(),
            pdp_outlier: OutlierFlag::parse(flags[2]).unwrap(),
            nnpp_outlier: OutlierFlag::parse(flags[3]).unwrap(),
        }
    }

    const N4: [&str; 4] = ["Normal", "Normal", "Normal", "Normal"];

    fn demo_dataset() -> Vec<PollingUnit> {
        vec![
            unit("Ede North", "Abogunde", "Abogunde PU 001", [120, 80, 50, 10], "Normal", 0, 1.5, N4),
            unit("Ede North", "Abogunde", "Abogunde PU 002", [90, 140, 60, 10], "Normal", 0, 2.25, N4),
            unit(
                "Ede North",
                "Sagba",
                "Sagba PU 001",
                [300, 20, 15, 5],
                "Anomaly",
                1,
                8.5,
                ["Outlier", "Normal", "Normal", "Normal"],
            ),
            unit("Iwo", "Gidigbo", "Gidigbo PU 001", [70, 95, 45, 20], "Normal", 0, 3.5, N4),
            unit(
                "Iwo",
                "Gidigbo",
                "Gidigbo PU 002",
                [60, 210, 25, 5],
                "Anomaly",
                1,
                7.1,
                ["Normal", "Outlier", "Normal", "Normal"],
            ),
        ]
    }

    fn selection(wards: &[&str]) -> HashSet<String> {
        wards.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn kpis_sum_all_columns() {
        let data = demo_dataset();
        let kpis = compute_kpis(&data);
        assert_eq!(kpis.apc, 120 + 90 + 300 + 70 + 60);
        assert_eq!(kpis.lp, 80 + 140 + 20 + 95 + 210);
        assert_eq!(kpis.pdp, 50 + 60 + 15 + 45 + 25);
        assert_eq!(kpis.nnpp, 10 + 10 + 5 + 20 + 5);
        assert_eq!(
            kpis.total_votes,
            data.iter().map(|u| u.total_votes).sum::<u64>()
        );
    }

    #[test]
    fn kpis_of_empty_dataset_are_zero() {
        let kpis = compute_kpis(&[]);
        assert_eq!(
            kpis,
            KpiTotals {
                total_votes: 0,
                apc: 0,
                lp: 0,
                pdp: 0,
                nnpp: 0
            }
        );
    }

    #[test]
    fn filter_is_order_preserving_and_lossless() {
        let data = demo_dataset();
        let filtered = filter_by_ward(&data, &selection(&["Abogunde", "Gidigbo"]));
        let expected: Vec<PollingUnit> = vec![
            data[0].clone(),
            data[1].clone(),
            data[3].clone(),
            data[4].clone(),
        ];
        assert_eq!(filtered, expected);
    }

    #[test]
    fn empty_selection_filters_everything_out() {
        let data = demo_dataset();
        assert!(filter_by_ward(&data, &HashSet::new()).is_empty());
    }

    #[test]
    fn format_count_boundaries() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1K");
        // Ties round to the even thousand.
        assert_eq!(format_count(1500), "2K");
        assert_eq!(format_count(2500), "2K");
        assert_eq!(format_count(12345), "12K");
        assert_eq!(format_count(1_234_567), "1,235K");
    }

    #[test]
    fn party_votes_in_fixed_order() {
        let data = demo_dataset();
        let tallies = aggregate_party_votes(&data);
        let parties: Vec<&str> = tallies.iter().map(|t| t.party.name()).collect();
        assert_eq!(parties, vec!["APC", "LP", "PDP", "NNPP"]);
        assert_eq!(tallies[0].votes, compute_kpis(&data).apc);
        assert_eq!(tallies[3].votes, compute_kpis(&data).nnpp);
    }

    #[test]
    fn party_votes_of_empty_dataset() {
        let tallies = aggregate_party_votes(&[]);
        assert_eq!(tallies.len(), 4);
        assert!(tallies.iter().all(|t| t.votes == 0));
    }

    #[test]
    fn votes_by_ward_grouped_and_sorted() {
        let data = demo_dataset();
        let tallies = aggregate_votes_by_ward(&data);
        assert_eq!(
            tallies,
            vec![
                WardTally {
                    ward: "Abogunde".to_string(),
                    total_votes: 260 + 300
                },
                WardTally {
                    ward: "Gidigbo".to_string(),
                    total_votes: 230 + 300
                },
                WardTally {
                    ward: "Sagba".to_string(),
                    total_votes: 340
                },
            ]
        );
    }

    #[test]
    fn voter_comparison_sums() {
        let data = demo_dataset();
        let cmp = voter_comparison(&data);
        assert_eq!(
            cmp.accredited_voters,
            data.iter().map(|u| u.accredited_voters).sum::<u64>()
        );
        assert_eq!(
            cmp.registered_voters,
            data.iter().map(|u| u.registered_voters).sum::<u64>()
        );
    }

    #[test]
    fn lga_outliers_require_flag_and_lga() {
        let data = demo_dataset();
        let res = outliers_for_lga(&data, "Ede North");
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].pu_name, "Sagba PU 001");
        // Iwo has one flagged unit as well.
        let res = outliers_for_lga(&data, "Iwo");
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].pu_name, "Gidigbo PU 002");
    }

    #[test]
    fn lga_without_outliers_yields_empty() {
        let mut data = demo_dataset();
        data.truncate(2);
        assert!(outliers_for_lga(&data, "Ede North").is_empty());
        assert!(outliers_for_lga(&data, "Nowhere").is_empty());
    }

    #[test]
    fn consistent_outliers_quantile_threshold() {
        // Five scores whose 0.75 quantile falls exactly on the rank-3 value.
        let data = vec![
            unit("A", "w1", "p1", [10, 0, 0, 0], "Normal", 0, 3.24, N4),
            unit("A", "w1", "p2", [10, 0, 0, 0], "Anomaly", 1, 3.28, N4),
            unit("A", "w1", "p3", [10, 0, 0, 0], "Anomaly", 1, 6.95, N4),
            unit("A", "w1", "p4", [10, 0, 0, 0], "Anomaly", 1, 7.23, N4),
            unit("B", "w2", "p5", [10, 0, 0, 0], "Normal", 1, 7.93, N4),
        ];
        let res = consistent_outliers(&data);
        assert_eq!(res.score_threshold, Some(7.23));
        // p4 meets all three criteria; p5 is above threshold but not labeled
        // as an anomaly; p2 and p3 sit below the threshold.
        let names: Vec<&str> = res.units.iter().map(|u| u.pu_name.as_str()).collect();
        assert_eq!(names, vec!["p4"]);
        assert_eq!(
            res.counts_by_lga,
            vec![LgaOutlierCount {
                lga: "A".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn consistent_outliers_interpolated_threshold() {
        let data = vec![
            unit("A", "w1", "p1", [10, 0, 0, 0], "Anomaly", 1, 1.0, N4),
            unit("A", "w1", "p2", [10, 0, 0, 0], "Anomaly", 1, 2.0, N4),
            unit("A", "w1", "p3", [10, 0, 0, 0], "Anomaly", 1, 3.0, N4),
            unit("B", "w2", "p4", [10, 0, 0, 0], "Anomaly", 1, 4.0, N4),
        ];
        // 0.75 * 3 = 2.25: interpolate between 3.0 and 4.0.
        let res = consistent_outliers(&data);
        assert_eq!(res.score_threshold, Some(3.25));
        let names: Vec<&str> = res.units.iter().map(|u| u.pu_name.as_str()).collect();
        assert_eq!(names, vec!["p4"]);
    }

    #[test]
    fn consistent_outliers_of_empty_dataset() {
        let res = consistent_outliers(&[]);
        assert_eq!(res.score_threshold, None);
        assert!(res.units.is_empty());
        assert!(res.counts_by_lga.is_empty());
    }

    #[test]
    fn counts_by_lga_sorted_by_name() {
        let data = demo_dataset();
        let counts = counts_by_lga(&data);
        assert_eq!(
            counts,
            vec![
                LgaOutlierCount {
                    lga: "Ede North".to_string(),
                    count: 3
                },
                LgaOutlierCount {
                    lga: "Iwo".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn ward_universe_first_appearance_order() {
        let data = demo_dataset();
        assert_eq!(ward_universe(&data), vec!["Abogunde", "Sagba", "Gidigbo"]);
        assert_eq!(lga_universe(&data), vec!["Ede North", "Iwo"]);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let data = demo_dataset();
        let wards = ward_universe(&data);
        let first = run_dashboard_stats(&data, &wards).unwrap();
        let second = run_dashboard_stats(&data, &wards).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_ward_is_rejected() {
        let data = demo_dataset();
        let res = run_dashboard_stats(&data, &["Atlantis".to_string()]);
        assert_eq!(res, Err(PipelineErrors::UnknownWard("Atlantis".to_string())));
    }

    #[test]
    fn builder_units_flow_through_pipeline() {
        let mut builder = Builder::new();
        builder
            .add_unit_simple("Ede North", "Abogunde", "Abogunde PU 001", [120, 80, 50, 10])
            .unwrap();
        builder
            .add_unit_simple("Iwo", "Gidigbo", "Gidigbo PU 001", [70, 95, 45, 20])
            .unwrap();
        let data = builder.build();
        let summary = run_dashboard_stats(&data, &ward_universe(&data)).unwrap();
        assert_eq!(summary.kpis.total_votes, 260 + 230);
        assert!(summary.consistent_outliers.units.is_empty());
    }
}
