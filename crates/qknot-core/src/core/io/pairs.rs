use super::Format;
use super::error::IoError;
use super::traits::StructureFile;
use crate::core::models::pair::{BasePair, PairSet};
use std::io::{BufRead, Write};

/// Plain pair lists: one whitespace-separated `i j` pair of 1-based positions
/// per line. Blank lines and `#` comments are ignored.
pub struct PairListFile;

impl StructureFile for PairListFile {
    type Record = PairSet;
    type Error = IoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let mut pairs = PairSet::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = idx + 1;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let fields: Vec<&str> = content
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty())
                .collect();
            let [a, b] = fields.as_slice() else {
                return Err(IoError::parse(
                    Format::PairList,
                    line_num,
                    format!("expected two positions, found '{}'", content),
                ));
            };
            let parse = |value: &str| -> Result<usize, IoError> {
                value.parse().map_err(|_| {
                    IoError::parse(
                        Format::PairList,
                        line_num,
                        format!("invalid position '{}'", value),
                    )
                })
            };
            pairs.insert(BasePair::new(parse(a)?, parse(b)?)?);
        }
        Ok(pairs)
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        for pair in record {
            writeln!(writer, "{} {}", pair.i(), pair.j())?;
        }
        Ok(())
    }
}
