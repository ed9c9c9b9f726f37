use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Court surface categories. Serialized with the Portuguese names the
/// frontend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    #[serde(rename = "saibro")]
    Saibro,
    #[serde(rename = "grama")]
    Grama,
    #[serde(rename = "rapida")]
    Rapida,
}

impl Default for Surface {
    fn default() -> Self {
        Surface::Rapida
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Surface::Saibro => "saibro",
            Surface::Grama => "grama",
            Surface::Rapida => "rapida",
        };
        write!(f, "{}", name)
    }
}

/// A (name, confidence) pair as returned by the recognition provider.
/// Confidence is a percentage in [0, 100].
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub confidence: f64,
}

impl Label {
    pub fn new(name: &str, confidence: f64) -> Self {
        Label {
            name: name.to_owned(),
            confidence,
        }
    }

    /// Presentation form used in the response payload, e.g. `Grass(93.4%)`.
    pub fn formatted(&self) -> String {
        format!("{}({:.1}%)", self.name, self.confidence)
    }
}

/// Pure classifier output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub surface: Surface,
    pub confidence: f64,
}

/// Full response record, serialized by the handlers.
#[derive(Debug, Default, Serialize)]
pub struct Classification {
    /// Winning surface category
    pub surface: Surface,

    /// Heuristic confidence in [50, 95]
    pub confidence: f64,

    /// Labels the provider reported, formatted, capped at 10
    #[serde(rename = "labels_detectados")]
    pub labels: Vec<String>,

    /// Time spent fetching the image from a URL
    pub time_image_fetch: i64,

    /// Time spent on the provider label-detection call
    pub time_label_detect: i64,
}

/// Weighted-keyword tables driving the surface decision. An explicit
/// configuration value rather than module constants, so variants can be
/// swapped in tests and deployments.
///
/// Tables are evaluated in registration order and the winner is selected
/// with strict `>`, so on an exact tie the earlier table wins. The default
/// table registers saibro, grama, rapida in that order.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    tables: Vec<(Surface, HashMap<String, f64>)>,
    evidence_threshold: f64,
}

/// Verdict handed out when no table gathers enough evidence.
const DEFAULT_VERDICT: Verdict = Verdict {
    surface: Surface::Rapida,
    confidence: 50.0,
};

const CONFIDENCE_CAP: f64 = 95.0;
const CONFIDENCE_FLOOR: f64 = 50.0;

impl ScoreTable {
    /// Empty table with the given evidence threshold. Scores below the
    /// threshold fall back to the default verdict (rapida, 50).
    pub fn new(evidence_threshold: f64) -> Self {
        ScoreTable {
            tables: Vec::new(),
            evidence_threshold,
        }
    }

    /// Register keywords for a surface. Weights are per-keyword evidence
    /// scaled by the label confidence. Registering the same surface again
    /// extends its table.
    pub fn with_weights(mut self, surface: Surface, weights: &[(&str, u32)]) -> Self {
        let idx = match self.tables.iter().position(|(s, _)| *s == surface) {
            Some(idx) => idx,
            None => {
                self.tables.push((surface, HashMap::new()));
                self.tables.len() - 1
            }
        };

        for (keyword, weight) in weights {
            self.tables[idx]
                .1
                .insert(keyword.to_lowercase(), f64::from(*weight));
        }

        self
    }

    /// Classify a set of labels. Total over its input; an empty set or one
    /// without enough matching evidence yields the default verdict.
    pub fn classify(&self, labels: &[Label]) -> Verdict {
        // Reduce to name -> confidence. Duplicates: last one wins.
        let mut by_name: HashMap<String, f64> = HashMap::new();
        for label in labels {
            by_name.insert(label.name.to_lowercase(), label.confidence);
        }

        let mut best: Option<(Surface, f64)> = None;

        for (surface, table) in &self.tables {
            let score: f64 = by_name
                .iter()
                .filter_map(|(name, confidence)| {
                    table.get(name).map(|weight| weight * confidence / 100.0)
                })
                .sum();

            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((*surface, score)),
            }
        }

        match best {
            Some((surface, score)) if score >= self.evidence_threshold => Verdict {
                surface,
                confidence: CONFIDENCE_CAP.min(CONFIDENCE_FLOOR + score * 5.0),
            },
            _ => DEFAULT_VERDICT,
        }
    }
}

impl Default for ScoreTable {
    /// Unified table: the English keywords from the deployed classifier
    /// plus the Portuguese ones the custom model emits.
    fn default() -> Self {
        ScoreTable::new(3.0)
            .with_weights(
                Surface::Saibro,
                &[
                    ("clay", 20),
                    ("saibro", 20),
                    ("red", 15),
                    ("dirt", 15),
                    ("terra", 15),
                    ("vermelho", 15),
                    ("orange", 12),
                    ("brown", 10),
                ],
            )
            .with_weights(
                Surface::Grama,
                &[
                    ("grass", 20),
                    ("grama", 20),
                    ("lawn", 18),
                    ("vegetation", 12),
                    ("green", 10),
                    ("verde", 10),
                ],
            )
            .with_weights(
                Surface::Rapida,
                &[
                    ("concrete", 18),
                    ("blue", 15),
                    ("azul", 15),
                    ("rapida", 15),
                    ("rápida", 15),
                    ("court", 12),
                    ("hard", 10),
                ],
            )
    }
}
