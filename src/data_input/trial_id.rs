// src/data_input/trial_id.rs

use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Parsed trial identifier of the form `L<location>T<transect>F<flag>`.
///
/// Location and transect are single digits; the flag number is the whole
/// remaining suffix and may have any number of digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrialId {
    raw: String,
    pub location: u32,
    pub transect: u32,
    pub flag_number: u64,
}

impl TrialId {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Builds the canonical identifier string from its components.
    pub fn compose(location: &str, transect: &str, flag: &str) -> String {
        format!("L{}T{}F{}", location.trim(), transect.trim(), flag.trim())
    }
}

impl FromStr for TrialId {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AnalysisError::MalformedIdentifier(s.to_string());
        let bytes = s.as_bytes();

        if bytes.len() < 6 || bytes[0] != b'L' || bytes[2] != b'T' || bytes[4] != b'F' {
            return Err(malformed());
        }
        let digit = |b: u8| -> Option<u32> { (b as char).to_digit(10) };
        let location = digit(bytes[1]).ok_or_else(malformed)?;
        let transect = digit(bytes[3]).ok_or_else(malformed)?;

        let flag_str = &s[5..];
        if !flag_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let flag_number = flag_str.parse::<u64>().map_err(|_| malformed())?;

        Ok(TrialId {
            raw: s.to_string(),
            location,
            transect,
            flag_number,
        })
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
