//! Reading and writing of sequence and secondary-structure files.
//!
//! Every format implements [`traits::StructureFile`]. [`load_structure`] reads
//! any of the structure formats into the common [`PairSet`] representation used
//! by the comparator.

pub mod ct;
pub mod dbn;
pub mod error;
pub mod fasta;
pub mod pairs;
pub mod traits;

use crate::core::models::pair::PairSet;
use crate::core::models::sequence::Sequence;
use crate::core::models::structure::BracketPolicy;
use error::IoError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use traits::StructureFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Fasta,
    DotBracket,
    Ct,
    PairList,
}

impl Format {
    /// Infers the format from a file extension.
    ///
    /// `.ct` is a connectivity table, `.pairs`/`.bp` a pair list,
    /// `.fa`/`.fasta`/`.fna` FASTA; everything else is read as dot-bracket,
    /// which covers `.dbn`, `.db`, `.vienna` and plain-text exports.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "ct" => Format::Ct,
            "pairs" | "bp" => Format::PairList,
            "fa" | "fasta" | "fna" => Format::Fasta,
            _ => Format::DotBracket,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Fasta => "FASTA",
            Format::DotBracket => "dot-bracket",
            Format::Ct => "connectivity-table",
            Format::PairList => "pair-list",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fasta" | "fa" => Ok(Format::Fasta),
            "dbn" | "dot-bracket" | "vienna" => Ok(Format::DotBracket),
            "ct" => Ok(Format::Ct),
            "pairs" | "pair-list" => Ok(Format::PairList),
            other => Err(format!(
                "unknown format '{}'; expected one of: fasta, dbn, ct, pairs",
                other
            )),
        }
    }
}

/// A structure read from disk, normalized to its base-pair set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedStructure {
    pub sequence: Option<Sequence>,
    pub pairs: PairSet,
}

/// Reads a reference or predicted structure in any structure format.
///
/// Dot-bracket files are parsed with `policy`; FASTA files hold no structure
/// and are rejected.
pub fn load_structure(
    path: &Path,
    format: Format,
    policy: BracketPolicy,
) -> Result<LoadedStructure, IoError> {
    match format {
        Format::DotBracket => {
            let record = dbn::DbnFile::read_from_path(path)?;
            Ok(LoadedStructure {
                pairs: record.structure.pairs(policy)?,
                sequence: Some(record.sequence),
            })
        }
        Format::Ct => {
            let record = ct::CtFile::read_from_path(path)?;
            Ok(LoadedStructure {
                sequence: Some(record.sequence),
                pairs: record.pairs,
            })
        }
        Format::PairList => Ok(LoadedStructure {
            sequence: None,
            pairs: pairs::PairListFile::read_from_path(path)?,
        }),
        Format::Fasta => Err(IoError::MissingRecord {
            format,
            what: "structure",
        }),
    }
}

/// Reads a sequence from a FASTA or dot-bracket file.
pub fn load_sequence(path: &Path, format: Format) -> Result<Sequence, IoError> {
    match format {
        Format::Fasta => Ok(fasta::FastaFile::read_from_path(path)?.sequence),
        Format::DotBracket => Ok(dbn::DbnFile::read_from_path(path)?.sequence),
        Format::Ct => Ok(ct::CtFile::read_from_path(path)?.sequence),
        Format::PairList => Err(IoError::MissingRecord {
            format,
            what: "sequence",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pair::BasePair;
    use tempfile::tempdir;

    #[test]
    fn from_path_infers_format_by_extension() {
        assert_eq!(Format::from_path(Path::new("a.ct")), Format::Ct);
        assert_eq!(Format::from_path(Path::new("a.CT")), Format::Ct);
        assert_eq!(Format::from_path(Path::new("a.pairs")), Format::PairList);
        assert_eq!(Format::from_path(Path::new("a.fasta")), Format::Fasta);
        assert_eq!(Format::from_path(Path::new("a.dbn")), Format::DotBracket);
        assert_eq!(
            Format::from_path(Path::new("1ehz-2D-dotbracket.txt")),
            Format::DotBracket
        );
        assert_eq!(Format::from_path(Path::new("noext")), Format::DotBracket);
    }

    #[test]
    fn format_parses_from_cli_names() {
        assert_eq!("ct".parse::<Format>().unwrap(), Format::Ct);
        assert_eq!("DBN".parse::<Format>().unwrap(), Format::DotBracket);
        assert!("pdb".parse::<Format>().is_err());
    }

    #[test]
    fn load_structure_normalizes_every_format_to_the_same_pairs() {
        let dir = tempdir().unwrap();
        let dbn_path = dir.path().join("s.dbn");
        let ct_path = dir.path().join("s.ct");
        let pairs_path = dir.path().join("s.pairs");
        std::fs::write(&dbn_path, "GGGAAACCC\n(((...)))\n").unwrap();
        std::fs::write(
            &ct_path,
            "9\tENERGY = 0\n\
             1 G 0 2 9 1\n2 G 1 3 8 2\n3 G 2 4 7 3\n4 A 3 5 0 4\n5 A 4 6 0 5\n\
             6 A 5 7 0 6\n7 C 6 8 3 7\n8 C 7 9 2 8\n9 C 8 0 1 9\n",
        )
        .unwrap();
        std::fs::write(&pairs_path, "1 9\n2 8\n3 7\n").unwrap();

        let expected: PairSet = [(1, 9), (2, 8), (3, 7)]
            .into_iter()
            .map(|(i, j)| BasePair::new(i, j).unwrap())
            .collect();

        for (path, format) in [
            (&dbn_path, Format::DotBracket),
            (&ct_path, Format::Ct),
            (&pairs_path, Format::PairList),
        ] {
            let loaded = load_structure(path, format, BracketPolicy::Tolerant).unwrap();
            assert_eq!(loaded.pairs, expected, "format {}", format);
        }
    }

    #[test]
    fn load_structure_rejects_fasta() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.fa");
        std::fs::write(&path, ">x\nGGG\n").unwrap();
        assert!(matches!(
            load_structure(&path, Format::Fasta, BracketPolicy::Tolerant),
            Err(IoError::MissingRecord { .. })
        ));
    }

    #[test]
    fn load_sequence_reads_fasta_and_dot_bracket() {
        let dir = tempdir().unwrap();
        let fa = dir.path().join("s.fa");
        let db = dir.path().join("s.dbn");
        std::fs::write(&fa, ">seq\nGGGA\nAACCC\n").unwrap();
        std::fs::write(&db, "GGGAAACCC\n(((...)))\n").unwrap();
        assert_eq!(
            load_sequence(&fa, Format::Fasta).unwrap().to_string(),
            "GGGAAACCC"
        );
        assert_eq!(
            load_sequence(&db, Format::DotBracket).unwrap().to_string(),
            "GGGAAACCC"
        );
    }
}
