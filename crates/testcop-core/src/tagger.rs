//! Part-of-speech tagging seam used by the model-assisted tense rule.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Penn Treebank part-of-speech tags.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    CC,
    CD,
    DT,
    EX,
    FW,
    IN,
    JJ,
    JJR,
    JJS,
    LS,
    MD,
    NN,
    NNS,
    NNP,
    NNPS,
    PDT,
    POS,
    PRP,
    PRPS,
    RB,
    RBR,
    RBS,
    RP,
    SYM,
    TO,
    UH,
    VB,
    VBD,
    VBG,
    VBN,
    VBP,
    VBZ,
    WDT,
    WP,
    WPS,
    WRB,
}

impl PosTag {
    pub fn is_verb(&self) -> bool {
        matches!(
            self,
            PosTag::VB | PosTag::VBD | PosTag::VBG | PosTag::VBN | PosTag::VBP | PosTag::VBZ
        )
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PosTag::PRPS => write!(f, "PRP$"),
            PosTag::WPS => write!(f, "WP$"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl FromStr for PosTag {
    type Err = LexiconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s {
            "CC" => PosTag::CC,
            "CD" => PosTag::CD,
            "DT" => PosTag::DT,
            "EX" => PosTag::EX,
            "FW" => PosTag::FW,
            "IN" => PosTag::IN,
            "JJ" => PosTag::JJ,
            "JJR" => PosTag::JJR,
            "JJS" => PosTag::JJS,
            "LS" => PosTag::LS,
            "MD" => PosTag::MD,
            "NN" => PosTag::NN,
            "NNS" => PosTag::NNS,
            "NNP" => PosTag::NNP,
            "NNPS" => PosTag::NNPS,
            "PDT" => PosTag::PDT,
            "POS" => PosTag::POS,
            "PRP" => PosTag::PRP,
            "PRP$" => PosTag::PRPS,
            "RB" => PosTag::RB,
            "RBR" => PosTag::RBR,
            "RBS" => PosTag::RBS,
            "RP" => PosTag::RP,
            "SYM" => PosTag::SYM,
            "TO" => PosTag::TO,
            "UH" => PosTag::UH,
            "VB" => PosTag::VB,
            "VBD" => PosTag::VBD,
            "VBG" => PosTag::VBG,
            "VBN" => PosTag::VBN,
            "VBP" => PosTag::VBP,
            "VBZ" => PosTag::VBZ,
            "WDT" => PosTag::WDT,
            "WP" => PosTag::WP,
            "WP$" => PosTag::WPS,
            "WRB" => PosTag::WRB,
            other => return Err(LexiconError::UnknownTag(other.to_string())),
        };
        Ok(tag)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LexiconError {
    #[error("unknown part-of-speech tag '{0}'")]
    UnknownTag(String),

    #[error("line {line}: expected '<word> <TAG>'")]
    Malformed { line: usize },

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<LexiconError>,
    },
}

/// Assigns one tag per word.
pub trait Tagger: Send + Sync {
    fn tag(&self, words: &[String]) -> Vec<PosTag>;
}

/// Dictionary-backed tagger; unknown words are tagged as nouns.
#[derive(Debug, Clone, Default)]
pub struct LexiconTagger {
    lexicon: HashMap<String, PosTag>,
}

impl LexiconTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, word: &str, tag: PosTag) -> Self {
        self.lexicon.insert(word.to_lowercase(), tag);
        self
    }

    /// Parse a lexicon with one `word TAG` pair per line. Blank lines and
    /// lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Self, LexiconError> {
        let mut tagger = Self::new();
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(word), Some(tag), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(LexiconError::Malformed { line: line_no });
            };
            let tag = tag.parse().map_err(|e| LexiconError::Line {
                line: line_no,
                source: Box::new(e),
            })?;
            tagger = tagger.with(word, tag);
        }
        Ok(tagger)
    }

    /// Load a lexicon file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read lexicon '{}'", path.display()))?;
        let tagger = Self::parse(&text)
            .with_context(|| format!("invalid lexicon '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), words = tagger.len(), "loaded lexicon");
        Ok(tagger)
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }
}

impl Tagger for LexiconTagger {
    fn tag(&self, words: &[String]) -> Vec<PosTag> {
        words
            .iter()
            .map(|w| {
                self.lexicon
                    .get(&w.to_lowercase())
                    .copied()
                    .unwrap_or(PosTag::NN)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_subset() {
        assert!(PosTag::VBZ.is_verb());
        assert!(PosTag::VB.is_verb());
        assert!(!PosTag::NN.is_verb());
        assert!(!PosTag::PRP.is_verb());
    }

    #[test]
    fn test_lexicon_tagger_defaults_to_noun() {
        let tagger = LexiconTagger::new().with("creates", PosTag::VBZ);
        let tags = tagger.tag(&["he".to_string(), "Creates".to_string(), "cheese".to_string()]);
        assert_eq!(tags, vec![PosTag::NN, PosTag::VBZ, PosTag::NN]);
    }

    #[test]
    fn test_parse_lexicon() {
        let tagger = LexiconTagger::parse("# verbs\ncreates VBZ\n\nhis PRP$\n").unwrap();
        assert_eq!(tagger.len(), 2);
        let tags = tagger.tag(&["creates".to_string(), "his".to_string()]);
        assert_eq!(tags, vec![PosTag::VBZ, PosTag::PRPS]);
    }

    #[test]
    fn test_parse_lexicon_errors() {
        assert_eq!(
            LexiconTagger::parse("creates").unwrap_err(),
            LexiconError::Malformed { line: 1 }
        );
        let err = LexiconTagger::parse("creates VBZ\nmelts VERB").unwrap_err();
        assert_eq!(err.to_string(), "line 2: unknown part-of-speech tag 'VERB'");
    }

    #[test]
    fn test_tag_round_trips_through_display() {
        for tag in [PosTag::PRPS, PosTag::WPS, PosTag::VBZ, PosTag::NNPS] {
            assert_eq!(tag.to_string().parse::<PosTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_display_uses_treebank_spelling() {
        assert_eq!(PosTag::PRPS.to_string(), "PRP$");
        assert_eq!(PosTag::VBZ.to_string(), "VBZ");
    }
}
