// Primitives for reading the results dataset exported as an Excel workbook.

use std::collections::HashMap;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::dashboard::*;

pub fn read_excel_results(
    path: String,
    worksheet_name: Option<String>,
) -> DashResult<Vec<ParsedUnit>> {
    let wrange = get_range(&path, &worksheet_name)?;

    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_results: header: {:?}", header);
    let col_indexes = get_col_index_mapping(&path, header)?;

    let mut iter = wrange.rows();
    iter.next();
    let mut res: Vec<ParsedUnit> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The header occupies the first line.
        let lineno = (idx + 2) as u64;
        let mut fields: HashMap<&str, String> = HashMap::new();
        for (column, col_idx) in col_indexes.iter().copied() {
            let cell = row.get(col_idx).cloned().unwrap_or(DataType::Empty);
            fields.insert(column, cell_to_string(&cell, lineno)?);
        }
        let unit = io_common::unit_from_fields(&fields);
        debug!("read_excel_results: {:?} {:?}", lineno, unit);
        res.push(unit);
    }
    Ok(res)
}

/// Finds the column index of every required column in the header row.
fn get_col_index_mapping(
    path: &str,
    header: &[DataType],
) -> DashResult<Vec<(&'static str, usize)>> {
    let col_names: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| match x {
            DataType::String(s) => Some((s.clone(), idx)),
            _ => None,
        })
        .collect();
    debug!("get_col_index_mapping: col_names: {:?}", col_names);

    let mut col_indexes: Vec<(&'static str, usize)> = Vec::new();
    for column in io_common::REQUIRED_COLUMNS.iter() {
        let idx = col_names.get(*column).context(MissingColumnSnafu {
            column: *column,
            path,
        })?;
        col_indexes.push((*column, *idx));
    }
    Ok(col_indexes)
}

fn cell_to_string(cell: &DataType, lineno: u64) -> DashResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => Err(DashError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        }),
    }
}

fn get_range(
    path: &String,
    worksheet_name_o: &Option<String>,
) -> DashResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_results: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let p = path.clone();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path: path.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path: path.clone() })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => whatever!("Empty workbook {:?}", path),
            [(worksheet_name, wrange)] => {
                debug!("read_excel_results: using worksheet {:?}", worksheet_name);
                Ok(wrange.clone())
            }
            _ => {
                whatever!(
                    "read_excel_results: several worksheets in {:?}, the worksheet name must be provided",
                    path
                )
            }
        }
    }
}
