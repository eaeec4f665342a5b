// Primitives for reading the CSV results file.

use std::collections::HashSet;

use log::debug;
use snafu::prelude::*;

use crate::dashboard::*;

pub fn read_csv_results(path: String) -> DashResult<Vec<ParsedUnit>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path.clone())
        .context(CsvOpenSnafu { path: path.clone() })?;

    let headers = rdr
        .headers()
        .context(CsvOpenSnafu { path: path.clone() })?
        .clone();
    let names: HashSet<&str> = headers.iter().collect();
    for column in io_common::REQUIRED_COLUMNS.iter() {
        ensure!(
            names.contains(column),
            MissingColumnSnafu {
                column: *column,
                path: path.clone()
            }
        );
    }

    let mut res: Vec<ParsedUnit> = Vec::new();
    for (idx, record) in rdr.deserialize::<ParsedUnit>().enumerate() {
        // The header occupies the first line.
        let lineno = idx + 2;
        let unit = record.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_results: {:?} {:?}", lineno, unit);
        res.push(unit);
    }
    Ok(res)
}
