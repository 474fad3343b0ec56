use super::Format;
use super::error::IoError;
use super::traits::StructureFile;
use crate::core::models::pair::{BasePair, PairSet};
use crate::core::models::sequence::{Nucleotide, Sequence};
use std::io::{BufRead, Write};
use tracing::warn;

const MIN_COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct CtRecord {
    pub label: String,
    pub energy: Option<f64>,
    pub sequence: Sequence,
    pub pairs: PairSet,
}

fn parse_header(line: &str) -> (String, Option<f64>) {
    let mut rest = line.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
    let mut energy = None;
    if let Some(pos) = rest.find("ENERGY") {
        let after = rest[pos + "ENERGY".len()..].trim_start();
        let after = after.strip_prefix('=').unwrap_or(after).trim_start();
        let value = after.split_whitespace().next().unwrap_or("");
        energy = value.parse().ok();
        let consumed = rest.len() - after.len() + value.len();
        rest = format!("{}{}", &rest[..pos], &rest[consumed..]);
    }
    (rest.trim().to_string(), energy)
}

fn parse_column(line_num: usize, column: usize, value: &str) -> Result<usize, IoError> {
    value.parse().map_err(|_| {
        IoError::parse(
            Format::Ct,
            line_num,
            format!("invalid integer in column {} (value: '{}')", column, value),
        )
    })
}

/// Connectivity-table files.
///
/// The first line holds the sequence length and a label; each following line
/// describes one position as `index base prev next partner index`. Pairs are
/// taken from columns 1 and 5, keeping only rows where the partner is non-zero
/// and greater than the row index so each pair is counted once. Rows with
/// fewer than six columns are skipped. A partner beyond the last listed row is
/// kept with a warning, so such a record can be compared but not written back.
pub struct CtFile;

impl StructureFile for CtFile {
    type Record = CtRecord;
    type Error = IoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let mut lines = reader.lines().enumerate();

        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => {
                    return Err(IoError::MissingRecord {
                        format: Format::Ct,
                        what: "header line",
                    });
                }
            }
        };
        let (label, energy) = parse_header(&header);

        let mut bases = Vec::new();
        let mut pairs = PairSet::new();
        let mut max_index = 0;
        for (idx, line) in lines {
            let line = line?;
            let line_num = idx + 1;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < MIN_COLUMNS {
                continue;
            }

            let index = parse_column(line_num, 1, parts[0])?;
            let partner = parse_column(line_num, 5, parts[4])?;
            let base = parts[1]
                .chars()
                .next()
                .map(Nucleotide::try_from)
                .transpose()?
                .unwrap_or(Nucleotide::N);
            bases.push(base);
            max_index = max_index.max(index);

            if partner > 0 && index < partner {
                pairs.insert(BasePair::new(index, partner)?);
            }
        }

        if bases.is_empty() {
            return Err(IoError::MissingRecord {
                format: Format::Ct,
                what: "position rows",
            });
        }
        if let Some(max) = pairs.max_position() {
            if max > max_index {
                warn!(
                    "CT partner index {} exceeds the last listed position {}; keeping the pair.",
                    max, max_index
                );
            }
        }
        let sequence = Sequence::new(bases)?;

        Ok(CtRecord {
            label,
            energy,
            sequence,
            pairs,
        })
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        if let Some((&position, _)) = record.pairs.conflicts().iter().next() {
            return Err(IoError::inconsistency(
                Format::Ct,
                format!("position {} is paired more than once", position),
            ));
        }
        let length = record.sequence.len();
        let table = record.pairs.pair_table(length)?;

        write!(
            writer,
            "{}\tENERGY = {}",
            length,
            record.energy.map_or("0".to_string(), |e| format!("{:.2}", e))
        )?;
        if !record.label.is_empty() {
            write!(writer, "\t{}", record.label)?;
        }
        writeln!(writer)?;

        for (offset, base) in record.sequence.bases().iter().enumerate() {
            let i = offset + 1;
            let prev = i - 1;
            let next = if i < length { i + 1 } else { 0 };
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                i, base, prev, next, table[offset], i
            )?;
        }
        Ok(())
    }
}
