use log::{debug, info, warn};

use polling_stats::builder::Builder;
use polling_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::Deserialize;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod io_common;
pub mod io_csv;
pub mod io_excel;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV record at line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Missing required column {column} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: cannot read column {column} from {content:?}"))]
    FieldParse {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Line {lineno}: {source}"))]
    UnitValidation {
        source: PipelineErrors,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display(""))]
    EmptyExcel {},
    #[snafu(display("Line {lineno}: unexpected cell content {content:?}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

/// A polling unit row, as parsed by the readers.
/// The fields are still raw text at this point; numbers and labels are
/// validated in a second pass, common to all the providers.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct ParsedUnit {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "LGA")]
    pub lga: String,
    #[serde(rename = "Ward")]
    pub ward: String,
    #[serde(rename = "PU-Name")]
    pub pu_name: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "Total_Votes")]
    pub total_votes: String,
    #[serde(rename = "APC")]
    pub apc: String,
    #[serde(rename = "LP")]
    pub lp: String,
    #[serde(rename = "PDP")]
    pub pdp: String,
    #[serde(rename = "NNPP")]
    pub nnpp: String,
    #[serde(rename = "Accredited_Voters")]
    pub accredited_voters: String,
    #[serde(rename = "Registered_Voters")]
    pub registered_voters: String,
    #[serde(rename = "Anomaly_Label")]
    pub anomaly_label: String,
    #[serde(rename = "IF_indicator")]
    pub if_indicator: String,
    #[serde(rename = "composite_outlier_score")]
    pub composite_outlier_score: String,
    #[serde(rename = "APC_outlier")]
    pub apc_outlier: String,
    #[serde(rename = "LP_outlier")]
    pub lp_outlier: String,
    #[serde(rename = "PDP_outlier")]
    pub pdp_outlier: String,
    #[serde(rename = "NNPP_outlier")]
    pub nnpp_outlier: String,
}

fn to_polling_unit(pu: &ParsedUnit, lineno: usize) -> DashResult<PollingUnit> {
    Ok(PollingUnit {
        state: pu.state.clone(),
        lga: pu.lga.clone(),
        ward: pu.ward.clone(),
        pu_name: pu.pu_name.clone(),
        latitude: io_common::parse_float(&pu.latitude, "Latitude", lineno)?,
        longitude: io_common::parse_float(&pu.longitude, "Longitude", lineno)?,
        total_votes: io_common::parse_count(&pu.total_votes, "Total_Votes", lineno)?,
        apc: io_common::parse_count(&pu.apc, "APC", lineno)?,
        lp: io_common::parse_count(&pu.lp, "LP", lineno)?,
        pdp: io_common::parse_count(&pu.pdp, "PDP", lineno)?,
        nnpp: io_common::parse_count(&pu.nnpp, "NNPP", lineno)?,
        accredited_voters: io_common::parse_count(
            &pu.accredited_voters,
            "Accredited_Voters",
            lineno,
        )?,
        registered_voters: io_common::parse_count(
            &pu.registered_voters,
            "Registered_Voters",
            lineno,
        )?,
        anomaly_label: AnomalyLabel::parse(pu.anomaly_label.trim())
            .context(UnitValidationSnafu { lineno })?,
        if_indicator: io_common::parse_indicator(&pu.if_indicator, lineno)?,
        composite_outlier_score: io_common::parse_float(
            &pu.composite_outlier_score,
            "composite_outlier_score",
            lineno,
        )?,
        apc_outlier: OutlierFlag::parse(pu.apc_outlier.trim())
            .context(UnitValidationSnafu { lineno })?,
        lp_outlier: OutlierFlag::parse(pu.lp_outlier.trim())
            .context(UnitValidationSnafu { lineno })?,
        pdp_outlier: OutlierFlag::parse(pu.pdp_outlier.trim())
            .context(UnitValidationSnafu { lineno })?,
        nnpp_outlier: OutlierFlag::parse(pu.nnpp_outlier.trim())
            .context(UnitValidationSnafu { lineno })?,
    })
}

fn validate_units(parsed: &[ParsedUnit]) -> DashResult<Vec<PollingUnit>> {
    let mut builder = Builder::new();
    for (idx, pu) in parsed.iter().enumerate() {
        // The header occupies the first line of the file.
        let lineno = idx + 2;
        let unit = to_polling_unit(pu, lineno)?;
        builder
            .add_unit(unit)
            .context(UnitValidationSnafu { lineno })?;
    }
    Ok(builder.build())
}

fn load_dataset(args: &Args) -> DashResult<Vec<PollingUnit>> {
    let input_type = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
    let parsed = match input_type.as_str() {
        "csv" => io_csv::read_csv_results(args.input.clone()),
        "excel" | "xlsx" => {
            io_excel::read_excel_results(args.input.clone(), args.excel_worksheet_name.clone())
        }
        x => whatever!("Input type not implemented {:?}", x),
    }?;
    validate_units(&parsed)
}

fn kpi_to_json(value: u64) -> JSValue {
    json!({ "value": value, "display": format_count(value) })
}

fn map_points_to_json(units: &[PollingUnit]) -> Vec<JSValue> {
    units
        .iter()
        .map(|u| {
            json!({
                "puName": u.pu_name,
                "latitude": u.latitude,
                "longitude": u.longitude,
                "totalVotes": u.total_votes,
                "anomalyLabel": u.anomaly_label.name(),
            })
        })
        .collect()
}

fn build_summary_js(
    selected_wards: &[String],
    summary: &DashboardSummary,
    lga_view: &Option<(String, Vec<PollingUnit>)>,
) -> JSValue {
    let votes_by_party: Vec<JSValue> = summary
        .party_votes
        .iter()
        .map(|pt| json!({"party": pt.party.name(), "votes": pt.votes}))
        .collect();

    let votes_by_ward: Vec<JSValue> = summary
        .votes_by_ward
        .iter()
        .map(|wt| json!({"ward": wt.ward, "totalVotes": wt.total_votes}))
        .collect();

    let consistent_units: Vec<JSValue> = summary
        .consistent_outliers
        .units
        .iter()
        .map(|u| {
            json!({
                "puName": u.pu_name,
                "lga": u.lga,
                "ward": u.ward,
                "totalVotes": u.total_votes,
                "compositeOutlierScore": u.composite_outlier_score,
            })
        })
        .collect();

    let counts: Vec<JSValue> = summary
        .consistent_outliers
        .counts_by_lga
        .iter()
        .map(|c| json!({"lga": c.lga, "count": c.count}))
        .collect();

    let mut js = json!({
        "config": {
            "selectedWards": selected_wards,
            "numUnits": summary.units.len(),
        },
        "kpis": {
            "totalVotes": kpi_to_json(summary.kpis.total_votes),
            "apcVotes": kpi_to_json(summary.kpis.apc),
            "lpVotes": kpi_to_json(summary.kpis.lp),
            "pdpVotes": kpi_to_json(summary.kpis.pdp),
            "nnppVotes": kpi_to_json(summary.kpis.nnpp),
        },
        "votesByParty": votes_by_party,
        "votesByWard": votes_by_ward,
        "voterComparison": {
            "accreditedVoters": summary.voter_comparison.accredited_voters,
            "registeredVoters": summary.voter_comparison.registered_voters,
        },
        "mapPoints": map_points_to_json(&summary.units),
        "consistentOutliers": {
            "scoreThreshold": summary.consistent_outliers.score_threshold,
            "units": consistent_units,
            "countsByLga": counts,
        },
    });

    if let Some((lga, units)) = lga_view {
        let outlier_rows: Vec<JSValue> = units
            .iter()
            .map(|u| {
                json!({
                    "puName": u.pu_name,
                    "apcOutlier": u.apc_outlier.name(),
                    "lpOutlier": u.lp_outlier.name(),
                    "pdpOutlier": u.pdp_outlier.name(),
                    "nnppOutlier": u.nnpp_outlier.name(),
                })
            })
            .collect();
        js["lgaOutliers"] = json!({ "lga": lga, "units": outlier_rows });
    }
    js
}

pub fn read_summary(path: String) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let dataset = load_dataset(args)?;
    info!(
        "run_dashboard: loaded {:?} polling units from {:?}",
        dataset.len(),
        args.input
    );

    // The ward multi-select defaults to every ward present in the input.
    let selected_wards: Vec<String> = match &args.wards {
        Some(ws) => ws.clone(),
        None => ward_universe(&dataset),
    };
    debug!("run_dashboard: ward selection: {:?}", selected_wards);

    let summary = match run_dashboard_stats(&dataset, &selected_wards) {
        Ok(x) => x,
        Err(x) => {
            whatever!("Pipeline error: {:?}", x)
        }
    };

    let lga_view = match &args.lga {
        Some(lga) => {
            if !lga_universe(&dataset).contains(lga) {
                whatever!("Unknown LGA in selection: {:?}", lga);
            }
            Some((lga.clone(), outliers_for_lga(&summary.units, lga)))
        }
        None => None,
    };

    // Assemble the final json
    let result_js = build_summary_js(&selected_wards, &summary, &lga_view);

    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match &args.out {
        Some(path) if path != "stdout" => {
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu {
                path: path.clone(),
            })?;
        }
        _ => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p.clone())?;
        debug!("run_dashboard: reference summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_dashboard_test(
        test_name: &str,
        summary_lpath: &str,
        wards: Option<Vec<String>>,
        lga: Option<String>,
    ) {
        let test_dir = option_env!("VOTEDASH_TEST_DIR").unwrap_or("test_data");
        info!("Running test {}", test_name);
        let args = Args {
            input: format!("{}/{}/{}.csv", test_dir, test_name, test_name),
            input_type: None,
            wards,
            lga,
            out: None,
            reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
            excel_worksheet_name: None,
            verbose: false,
        };
        let res = run_dashboard(&args);
        if let Err(e) = res {
            warn!("Error occured {:?}", e);
            panic!("test {} failed: {}", test_name, e);
        }
    }

    #[test]
    fn osun_demo() {
        run_dashboard_test(
            "osun_demo",
            "osun_demo_expected_summary.json",
            None,
            Some("Osogbo".to_string()),
        );
    }

    #[test]
    fn osun_demo_ward_subset() {
        run_dashboard_test(
            "osun_demo",
            "osun_demo_subset_expected_summary.json",
            Some(vec!["Moore".to_string(), "Oke-Baale".to_string()]),
            Some("Ife Central".to_string()),
        );
    }

    #[test]
    fn osun_demo_unknown_ward_is_rejected() {
        let test_dir = option_env!("VOTEDASH_TEST_DIR").unwrap_or("test_data");
        let args = Args {
            input: format!("{}/osun_demo/osun_demo.csv", test_dir),
            input_type: None,
            wards: Some(vec!["Atlantis".to_string()]),
            lga: None,
            out: None,
            reference: None,
            excel_worksheet_name: None,
            verbose: false,
        };
        assert!(run_dashboard(&args).is_err());
    }

    #[test]
    fn osun_demo_missing_column_is_rejected() {
        let test_dir = option_env!("VOTEDASH_TEST_DIR").unwrap_or("test_data");
        let args = Args {
            input: format!("{}/osun_demo/osun_demo_truncated.csv", test_dir),
            input_type: None,
            wards: None,
            lga: None,
            out: None,
            reference: None,
            excel_worksheet_name: None,
            verbose: false,
        };
        let res = run_dashboard(&args);
        match res {
            Err(DashError::MissingColumn { column, .. }) => {
                assert_eq!(column, "composite_outlier_score")
            }
            x => panic!("expected a missing column error, got {:?}", x),
        }
    }

    #[test]
    #[ignore = "requires the xlsx export of the full dataset"]
    fn osun_demo_excel() {
        let test_dir = option_env!("VOTEDASH_TEST_DIR").unwrap_or("test_data");
        let args = Args {
            input: format!("{}/osun_demo/osun_demo.xlsx", test_dir),
            input_type: Some("excel".to_string()),
            wards: None,
            lga: None,
            out: None,
            reference: Some(format!(
                "{}/osun_demo/osun_demo_expected_summary.json",
                test_dir
            )),
            excel_worksheet_name: None,
            verbose: false,
        };
        run_dashboard(&args).unwrap();
    }
}
