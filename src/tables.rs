//! Collision tables for silicon on the logarithmic energy grid.
//!
//! Three whitespace-delimited text tables are combined:
//!
//! * `HEPS`: header `n2t numt`, rows `j E eps1 eps2 Im(-1/eps)`
//! * `MACOM`: header `n2t numt`, rows `j E A(E)`
//! * `EMERC`: four header lines, rows `j E A(E) xkmn` for the lowest bins,
//!   overriding the MACOM integral
//!
//! Row `j` is one-based and refers to the bin of the same number on
//! [`ENERGY_GRID`]; the tabulated energy column is only checked for consistency.

use crate::config::DataPaths;
use crate::data::{BINS_PER_OCTAVE, EMERC_ROWS, ENERGY_BINS, ENERGY_GRID, OSCILLATOR_FACTOR};
use crate::error::{DepositionError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Values of a single energy bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableEntry {
    /// Bin energy [eV]
    pub energy: f64,
    /// Bin width [eV]
    pub width: f64,
    pub eps_real: f64,
    pub eps_imag: f64,
    /// Dipole oscillator strength df/dE [1/eV]
    pub dfde: f64,
    /// Integral A(E) of the generalized oscillator strength
    pub oscillator_integral: f64,
    /// Low-energy momentum transfer parameter
    pub xkmn: f64,
}

/// Immutable collision tables shared by all events
#[derive(Debug, Clone)]
pub struct CrossSectionTables {
    eps_real: Vec<f64>,
    eps_imag: Vec<f64>,
    dfde: Vec<f64>,
    oscillator_integral: Vec<f64>,
    xkmn: Vec<f64>,
    bins: usize,
}

struct Header {
    bins_per_octave: usize,
    rows: usize,
}

impl CrossSectionTables {
    /// Locate `HEPS`, `MACOM` and `EMERC` through `paths` and load them
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let heps = paths.locate("HEPS")?;
        let macom = paths.locate("MACOM")?;
        let emerc = paths.locate("EMERC")?;
        info!(
            heps = %heps.display(),
            macom = %macom.display(),
            emerc = %emerc.display(),
            "loading collision tables"
        );
        Self::from_readers(open(&heps)?, open(&macom)?, open(&emerc)?)
    }

    pub fn from_readers<H, M, E>(heps: H, macom: M, emerc: E) -> Result<Self>
    where
        H: BufRead,
        M: BufRead,
        E: BufRead,
    {
        let grid = &*ENERGY_GRID;
        let mut tables = CrossSectionTables {
            eps_real: vec![0.0; ENERGY_BINS],
            eps_imag: vec![0.0; ENERGY_BINS],
            dfde: vec![0.0; ENERGY_BINS],
            oscillator_integral: vec![0.0; ENERGY_BINS],
            xkmn: vec![0.0; ENERGY_BINS],
            bins: ENERGY_BINS,
        };

        let heps_bins = read_counted_table("HEPS", heps, 5, |bin, row| {
            tables.eps_real[bin] = row[2];
            tables.eps_imag[bin] = row[3];
            tables.dfde[bin] = row[4] * OSCILLATOR_FACTOR * grid.energies[bin];
        })?;
        let macom_bins = read_counted_table("MACOM", macom, 3, |bin, row| {
            tables.oscillator_integral[bin] = row[2];
        })?;
        read_emerc(emerc, |bin, row| {
            tables.oscillator_integral[bin] = row[2];
            tables.xkmn[bin] = row[3];
        })?;

        if heps_bins != macom_bins {
            warn!(
                heps_bins,
                macom_bins, "HEPS and MACOM cover different numbers of bins, using the smaller"
            );
        }
        tables.bins = heps_bins.min(macom_bins);
        info!(
            bins = tables.bins,
            max_energy_ev = grid.energies[tables.bins.saturating_sub(1)],
            "collision tables loaded"
        );
        Ok(tables)
    }

    /// Number of usable energy bins
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Values of bin `bin`, `None` beyond the loaded range
    pub fn lookup(&self, bin: usize) -> Option<TableEntry> {
        if bin >= self.bins {
            return None;
        }
        Some(TableEntry {
            energy: ENERGY_GRID.energies[bin],
            width: ENERGY_GRID.widths[bin],
            eps_real: self.eps_real[bin],
            eps_imag: self.eps_imag[bin],
            dfde: self.dfde[bin],
            oscillator_integral: self.oscillator_integral[bin],
            xkmn: self.xkmn[bin],
        })
    }

    /// Bin energies [eV] of the loaded range
    pub fn energies(&self) -> &[f64] {
        &ENERGY_GRID.energies[..self.bins]
    }

    /// Number of electrons per atom from the f-sum rule, `∫ df/dE dE`
    pub fn sum_rule(&self) -> f64 {
        self.dfde[..self.bins]
            .iter()
            .zip(ENERGY_GRID.widths.iter())
            .map(|(f, w)| f * w)
            .sum()
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| DepositionError::io(path, e))
}

fn format_error(table: &str, line: usize, reason: impl Into<String>) -> DepositionError {
    DepositionError::TableFormat {
        table: table.to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_numbers(table: &str, line_no: usize, line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|e| format_error(table, line_no, format!("'{}': {}", field, e)))
        })
        .collect()
}

/// Parse a data row and map its one-based index to a bin
fn parse_row(table: &str, line_no: usize, line: &str, columns: usize) -> Result<(usize, Vec<f64>)> {
    let row = parse_numbers(table, line_no, line)?;
    if row.len() < columns {
        return Err(format_error(
            table,
            line_no,
            format!("expected {} columns, found {}", columns, row.len()),
        ));
    }
    let index = row[0];
    if index.fract() != 0.0 || index < 1.0 || index > ENERGY_BINS as f64 {
        return Err(format_error(
            table,
            line_no,
            format!("bin index {} outside 1..={}", index, ENERGY_BINS),
        ));
    }
    Ok((index as usize - 1, row))
}

fn check_energy(table: &str, bin: usize, tabulated: f64, mismatches: &mut usize) {
    let expected = ENERGY_GRID.energies[bin];
    if ((tabulated - expected) / expected).abs() > 1e-3 {
        *mismatches += 1;
        debug!(table, bin, tabulated, expected, "tabulated energy off the grid");
    }
}

/// Read a table with an `n2t numt` header, returning the usable bin count
fn read_counted_table<R, F>(table: &str, reader: R, columns: usize, mut store: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(usize, &[f64]),
{
    let mut lines = reader.lines().enumerate();
    let mut header = None;
    for (i, line) in lines.by_ref() {
        let line = line.map_err(|e| format_error(table, i + 1, e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_numbers(table, i + 1, &line)?;
        if fields.len() < 2 {
            return Err(format_error(table, i + 1, "header must contain 'n2t numt'"));
        }
        header = Some(Header {
            bins_per_octave: fields[0] as usize,
            rows: fields[1] as usize,
        });
        break;
    }
    let header = header.ok_or_else(|| format_error(table, 0, "missing header"))?;

    if header.bins_per_octave != BINS_PER_OCTAVE {
        warn!(
            table,
            found = header.bins_per_octave,
            expected = BINS_PER_OCTAVE,
            "table has a different number of bins per octave"
        );
    }
    let mut declared = header.rows;
    if declared > ENERGY_BINS {
        warn!(table, declared, limit = ENERGY_BINS, "table declares more rows than the energy grid");
        declared = ENERGY_BINS;
    }

    let mut rows = 0usize;
    let mut mismatches = 0usize;
    for (i, line) in lines {
        if rows == declared {
            break;
        }
        let line = line.map_err(|e| format_error(table, i + 1, e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let (bin, row) = parse_row(table, i + 1, &line, columns)?;
        check_energy(table, bin, row[1], &mut mismatches);
        store(bin, &row);
        rows += 1;
    }

    if rows != header.rows {
        warn!(
            table,
            declared = header.rows,
            read = rows,
            "row count differs from the header, using the smaller"
        );
    }
    if mismatches > 0 {
        warn!(table, rows = mismatches, "tabulated energies disagree with the energy grid");
    }
    Ok(rows.min(declared))
}

fn read_emerc<R, F>(reader: R, mut store: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[f64]),
{
    const TABLE: &str = "EMERC";
    const HEADER_LINES: usize = 4;
    let mut rows = 0usize;
    let mut mismatches = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format_error(TABLE, i + 1, e.to_string()))?;
        if i < HEADER_LINES || line.trim().is_empty() {
            continue;
        }
        let (bin, row) = parse_row(TABLE, i + 1, &line, 4)?;
        check_energy(TABLE, bin, row[1], &mut mismatches);
        store(bin, &row);
        rows += 1;
        if bin + 1 >= EMERC_ROWS {
            break;
        }
    }
    if rows < EMERC_ROWS {
        warn!(table = TABLE, read = rows, expected = EMERC_ROWS, "EMERC table is short");
    }
    if mismatches > 0 {
        warn!(table = TABLE, rows = mismatches, "tabulated energies disagree with the energy grid");
    }
    Ok(())
}
