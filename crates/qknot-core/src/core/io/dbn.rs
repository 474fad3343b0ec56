use super::Format;
use super::error::IoError;
use super::traits::StructureFile;
use crate::core::models::sequence::Sequence;
use crate::core::models::structure::{DotBracket, StructureError};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct DbnRecord {
    pub name: Option<String>,
    pub sequence: Sequence,
    pub structure: DotBracket,
    /// Free energy in kcal/mol, when the structure line carries one.
    pub energy: Option<f64>,
}

impl DbnRecord {
    pub fn new(sequence: Sequence, structure: DotBracket) -> Result<Self, StructureError> {
        check_lengths(&sequence, &structure)?;
        Ok(Self {
            name: None,
            sequence,
            structure,
            energy: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }
}

fn check_lengths(sequence: &Sequence, structure: &DotBracket) -> Result<(), StructureError> {
    if sequence.len() != structure.len() {
        return Err(StructureError::LengthMismatch {
            structure: structure.len(),
            sequence: sequence.len(),
        });
    }
    Ok(())
}

/// Parses an annotation such as `(-12.30)`, `( -1.20)` or `(-3.40 kcal/mol)`.
fn parse_energy(annotation: &str) -> Option<f64> {
    let inner = annotation
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    inner.split_whitespace().next()?.parse().ok()
}

/// Dot-bracket files: an optional `>` header, a sequence line and a structure
/// line of the same length, optionally followed by an energy annotation.
pub struct DbnFile;

impl StructureFile for DbnFile {
    type Record = DbnRecord;
    type Error = IoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let mut name = None;
        let mut content: Vec<String> = Vec::with_capacity(2);

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(header) = trimmed.strip_prefix('>') {
                if name.is_none() {
                    name = Some(header.trim().to_string());
                }
                continue;
            }
            content.push(trimmed.to_string());
            if content.len() == 2 {
                break;
            }
        }

        let [sequence_line, structure_line] = content.as_slice() else {
            return Err(IoError::MissingRecord {
                format: Format::DotBracket,
                what: "sequence and structure lines",
            });
        };

        let sequence: Sequence = sequence_line.parse()?;
        let structure = DotBracket::parse_line(structure_line);
        let energy = structure_line
            .split_once(char::is_whitespace)
            .and_then(|(_, annotation)| parse_energy(annotation));
        check_lengths(&sequence, &structure)?;

        Ok(DbnRecord {
            name,
            sequence,
            structure,
            energy,
        })
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        check_lengths(&record.sequence, &record.structure)?;
        if let Some(name) = &record.name {
            writeln!(writer, ">{}", name)?;
        }
        writeln!(writer, "{}", record.sequence)?;
        match record.energy {
            Some(energy) => writeln!(writer, "{} ({:.2} kcal/mol)", record.structure, energy)?,
            None => writeln!(writer, "{}", record.structure)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::BracketPolicy;
    use std::io::Cursor;

    #[test]
    fn read_parses_header_sequence_and_structure() {
        let input = ">strand_A\nGGGAAACCC\n(((...)))\n";
        let record = DbnFile::read_from(&mut Cursor::new(input)).unwrap();
        assert_eq!(record.name.as_deref(), Some("strand_A"));
        assert_eq!(record.sequence.to_string(), "GGGAAACCC");
        assert_eq!(record.structure.to_string(), "(((...)))");
        assert_eq!(record.energy, None);
    }

    #[test]
    fn read_tolerates_trailing_energy_annotation() {
        let input = "GGGAAACCC\n(((...))) ( -1.20)\n";
        let record = DbnFile::read_from(&mut Cursor::new(input)).unwrap();
        assert_eq!(record.structure.to_string(), "(((...)))");
        assert_eq!(record.energy, Some(-1.20));
    }

    #[test]
    fn read_fails_with_fewer_than_two_content_lines() {
        let result = DbnFile::read_from(&mut Cursor::new(">hdr\nGGGAAACCC\n\n"));
        assert!(matches!(
            result,
            Err(IoError::MissingRecord {
                format: Format::DotBracket,
                ..
            })
        ));
    }

    #[test]
    fn read_rejects_length_mismatch() {
        let result = DbnFile::read_from(&mut Cursor::new("GGGAAACCC\n(((..)))\n"));
        assert!(matches!(
            result,
            Err(IoError::Structure(StructureError::LengthMismatch {
                structure: 8,
                sequence: 9
            }))
        ));
    }

    #[test]
    fn read_accepts_pseudoknotted_structures() {
        let input = "GGGGAAAACCCCAAGG\n((((..[[))))..]]\n";
        let record = DbnFile::read_from(&mut Cursor::new(input)).unwrap();
        let pairs = record.structure.pairs(BracketPolicy::Strict).unwrap();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.has_crossing());
    }

    #[test]
    fn write_then_read_preserves_record_with_energy() {
        let record = DbnRecord::new(
            "GGGAAACCC".parse().unwrap(),
            DotBracket::new("(((...)))"),
        )
        .unwrap()
        .with_name("hairpin")
        .with_energy(-1.2);

        let mut out = Vec::new();
        DbnFile::write_to(&record, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">hairpin\nGGGAAACCC\n(((...))) (-1.20 kcal/mol)\n");

        let back = DbnFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let result = DbnRecord::new("GGG".parse().unwrap(), DotBracket::new("(.)."));
        assert!(result.is_err());
    }
}
