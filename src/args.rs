use clap::Parser;

/// This is the data pipeline for an election results dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the polling unit results with the
    /// precomputed anomaly statistics. See the documentation for the list of
    /// expected columns.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default csv) The type of the input. 'csv' or 'excel'.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (ward name, repeatable, or not specified) If specified, restricts the
    /// dashboard to the given wards. The default is all the wards present in
    /// the input, which is also the initial state of the ward multi-select.
    #[clap(short, long, value_parser)]
    pub wards: Option<Vec<String>>,

    /// (LGA name or empty) If specified, the summary will include the
    /// outlier table for this LGA.
    #[clap(short, long, value_parser)]
    pub lga: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the
    /// dashboard will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a dashboard summary in JSON
    /// format. If provided, votedash will check that the computed output
    /// matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default first worksheet) When using an Excel file, indicates the
    /// name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
