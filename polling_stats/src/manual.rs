/*!

This is the long-form manual for `polling_stats` and `votedash`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values, the format the upstream anomaly detection
  step writes its results in
* `excel` The same dataset exported as an Excel (.xlsx) workbook

Both providers expect one header row and one row per polling unit. The
column names are matched exactly, including case and punctuation
(`PU-Name`, not `PU_Name`):

| Column | Content |
|--------|---------|
| `State`, `LGA`, `Ward`, `PU-Name` | administrative identity of the unit |
| `Latitude`, `Longitude` | geographic position for the map display |
| `Total_Votes`, `APC`, `LP`, `PDP`, `NNPP` | vote counts |
| `Accredited_Voters`, `Registered_Voters` | voter counts |
| `Anomaly_Label` | `Anomaly` or `Normal`, assigned upstream |
| `IF_indicator` | isolation forest indicator, `0` or `1` |
| `composite_outlier_score` | blended anomaly metric, floating point |
| `APC_outlier`, `LP_outlier`, `PDP_outlier`, `NNPP_outlier` | per-party flags, `Outlier` or `Normal` |

A file missing any of these columns is rejected before any row is read.

## Running

The most common invocation reads a results file and writes the full
dashboard summary to the standard output:

```bash
votedash -i osun_results.csv
```

Restricting the view to a ward selection recomputes every aggregate,
including the consistent-outlier score threshold, over the filtered rows:

```bash
votedash -i osun_results.csv -w "Moore" -w "Ilare" -l "Ife Central"
```

The `-l` flag adds the per-LGA outlier table to the summary. With verbose
logging enabled you should see the pipeline at work:

```text
[2024-06-11T08:12:41Z INFO  votedash::dashboard] run_dashboard: loaded 1893 polling units from "osun_results.csv"
[2024-06-11T08:12:41Z INFO  polling_stats] run_dashboard_stats: processing 1893 units, 2 wards selected
[2024-06-11T08:12:41Z DEBUG polling_stats] run_dashboard_stats: 14 units after ward filter
[2024-06-11T08:12:41Z DEBUG polling_stats] consistent_outliers: score_threshold: Some(4.8126)
```

## Checking against a reference

The `--reference` flag compares the computed summary against a previously
recorded one and fails with a printed diff when they differ. This is how
the repository's own end-to-end tests are written, and it is also useful
to confirm that a rerun over a refreshed dataset did not silently change
the displayed numbers:

```bash
votedash -i osun_results.csv -r yesterday_summary.json
```

## The summary document

The output is a single JSON document with the tables and scalars the
rendering layer displays verbatim: the KPI cards (`kpis`, each with the
raw value and its display form), the per-party and per-ward tallies
(`votesByParty`, `votesByWard`), the voter comparison, the map rows
(`mapPoints`), the consistent-outlier classification with its score
threshold and per-LGA counts, and optionally the outlier table of one
LGA (`lgaOutliers`). Row ordering is deterministic: grouped tables are
sorted by their group name, everything else keeps dataset order.

*/
