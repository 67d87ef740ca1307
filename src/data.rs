use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::Parameters;
use crate::policy::MarketObservation;

/// One parameter vector per row, header `a0,a1,rho,c_eps,c,d,e,g,h,beta`.
pub fn read_parameters<R: Read>(reader: R) -> Result<Vec<Parameters>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_parameters_from_path(path: impl AsRef<Path>) -> Result<Vec<Parameters>> {
    read_parameters(std::fs::File::open(path)?)
}

pub fn write_market_path<W: Write>(writer: W, path: &[MarketObservation]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for observation in path {
        writer.serialize(observation)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_market_path_to_file(
    filename: impl AsRef<Path>,
    path: &[MarketObservation],
) -> Result<()> {
    write_market_path(std::fs::File::create(filename)?, path)
}
