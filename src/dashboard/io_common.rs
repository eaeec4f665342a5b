// Helpers shared by the file providers.

use std::collections::HashMap;

use snafu::prelude::*;

use crate::dashboard::*;

/// The columns every input file must carry, in the canonical order of the
/// upstream results file. The names are matched exactly, including case and
/// punctuation.
pub const REQUIRED_COLUMNS: [&str; 20] = [
    "State",
    "LGA",
    "Ward",
    "PU-Name",
    "Latitude",
    "Longitude",
    "Total_Votes",
    "APC",
    "LP",
    "PDP",
    "NNPP",
    "Accredited_Voters",
    "Registered_Voters",
    "Anomaly_Label",
    "IF_indicator",
    "composite_outlier_score",
    "APC_outlier",
    "LP_outlier",
    "PDP_outlier",
    "NNPP_outlier",
];

pub fn parse_count(s: &str, column: &'static str, lineno: usize) -> DashResult<u64> {
    s.trim().parse::<u64>().ok().context(FieldParseSnafu {
        lineno,
        column,
        content: s,
    })
}

pub fn parse_float(s: &str, column: &'static str, lineno: usize) -> DashResult<f64> {
    s.trim().parse::<f64>().ok().context(FieldParseSnafu {
        lineno,
        column,
        content: s,
    })
}

pub fn parse_indicator(s: &str, lineno: usize) -> DashResult<u8> {
    s.trim().parse::<u8>().ok().context(FieldParseSnafu {
        lineno,
        column: "IF_indicator",
        content: s,
    })
}

/// Assembles a raw unit from a column name -> content mapping.
/// All the required columns are expected to be present.
pub fn unit_from_fields(fields: &HashMap<&str, String>) -> ParsedUnit {
    let get = |column: &str| fields.get(column).cloned().unwrap_or_default();
    ParsedUnit {
        state: get("State"),
        lga: get("LGA"),
        ward: get("Ward"),
        pu_name: get("PU-Name"),
        latitude: get("Latitude"),
        longitude: get("Longitude"),
        total_votes: get("Total_Votes"),
        apc: get("APC"),
        lp: get("LP"),
        pdp: get("PDP"),
        nnpp: get("NNPP"),
        accredited_voters: get("Accredited_Voters"),
        registered_voters: get("Registered_Voters"),
        anomaly_label: get("Anomaly_Label"),
        if_indicator: get("IF_indicator"),
        composite_outlier_score: get("composite_outlier_score"),
        apc_outlier: get("APC_outlier"),
        lp_outlier: get("LP_outlier"),
        pdp_outlier: get("PDP_outlier"),
        nnpp_outlier: get("NNPP_outlier"),
    }
}
