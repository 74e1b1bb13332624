use crate::output::FindResult;
use std::io::{self, Write};
use std::str::FromStr;

/// How results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One URL per line
    #[default]
    Urls,

    /// Base name and URL per line, separated by a tab
    Long,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urls" => Ok(Self::Urls),
            "long" => Ok(Self::Long),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Writes every match in discovery order
pub fn write_result<W: Write>(result: &FindResult, format: OutputFormat, out: &mut W) -> io::Result<()> {
    for (name, url) in result.iter() {
        match format {
            OutputFormat::Urls => writeln!(out, "{}", url)?,
            OutputFormat::Long => writeln!(out, "{}\t{}", name, url)?,
        }
    }
    out.flush()
}
