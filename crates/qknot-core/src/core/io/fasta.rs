use super::Format;
use super::error::IoError;
use super::traits::StructureFile;
use crate::core::models::sequence::Sequence;
use std::io::{BufRead, Write};

const LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    pub header: Option<String>,
    pub sequence: Sequence,
}

/// FASTA-like sequence files. Lines starting with `>` are headers (the first
/// one is kept as the record name); all other non-empty lines are concatenated.
pub struct FastaFile;

impl StructureFile for FastaFile {
    type Record = FastaRecord;
    type Error = IoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let mut header = None;
        let mut raw = String::new();

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if let Some(name) = trimmed.strip_prefix('>') {
                if header.is_none() {
                    header = Some(name.trim().to_string());
                }
                continue;
            }
            raw.push_str(trimmed);
        }

        if raw.is_empty() {
            return Err(IoError::MissingRecord {
                format: Format::Fasta,
                what: "sequence",
            });
        }
        Ok(FastaRecord {
            header,
            sequence: raw.parse()?,
        })
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, ">{}", record.header.as_deref().unwrap_or("sequence"))?;
        let text = record.sequence.to_string();
        for chunk in text.as_bytes().chunks(LINE_WIDTH) {
            writer.write_all(chunk)?;
            writeln!(writer)?;
        }
        Ok(())
    }
}
