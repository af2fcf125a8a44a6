use crate::types::{Epoch, Ifg, OrbitalError, OrbitalResult, PhaseImage};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

/// Parse a YYMMDD or YYYYMMDD date token
///
/// Two-digit years follow the ROI_PAC convention: 00-49 are 20xx,
/// 50-99 are 19xx.
fn parse_epoch(token: &str) -> Option<Epoch> {
    let (year, rest) = match token.len() {
        8 => (token[0..4].parse::<i32>().ok()?, &token[4..]),
        6 => {
            let yy: i32 = token[0..2].parse().ok()?;
            (if yy < 50 { 2000 + yy } else { 1900 + yy }, &token[2..])
        }
        _ => return None,
    };
    let month: u32 = rest[0..2].parse().ok()?;
    let day: u32 = rest[2..4].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Extract the (master, slave) epochs encoded in an interferogram name
///
/// Accepts names such as `geo_060619-061002.unw` or
/// `20060619-20061002_ifg.tif`. Only the file name component is examined.
pub fn parse_epoch_pair(name: &str) -> OrbitalResult<(Epoch, Epoch)> {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(name);

    let pair_pattern = Regex::new(r"(?:^|[^0-9])(\d{8}|\d{6})-(\d{8}|\d{6})(?:[^0-9]|$)")
        .map_err(|e| OrbitalError::InvalidParameter(format!("Epoch pair regex error: {}", e)))?;

    let caps = pair_pattern
        .captures(file_name)
        .ok_or_else(|| OrbitalError::EpochParse(name.to_string()))?;

    let master = parse_epoch(&caps[1]).ok_or_else(|| OrbitalError::EpochParse(name.to_string()))?;
    let slave = parse_epoch(&caps[2]).ok_or_else(|| OrbitalError::EpochParse(name.to_string()))?;

    log::debug!("Parsed epochs {} / {} from {}", master, slave, name);
    Ok((master, slave))
}

impl Ifg {
    /// Build an interferogram whose epochs come from its name
    pub fn from_name(name: &str, phase_data: PhaseImage, x_size: f64, y_size: f64) -> OrbitalResult<Self> {
        let (master, slave) = parse_epoch_pair(name)?;
        let mut ifg = Ifg::new(phase_data, x_size, y_size, master, slave);
        ifg.name = Some(name.to_string());
        Ok(ifg)
    }
}
