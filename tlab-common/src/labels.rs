//! Label taxonomy
//!
//! Each labeling dimension is a closed enumeration. Every member carries its
//! wire value (the string stored in the backing store), the explanation shown
//! next to it on the forms, and whether picking it makes the free-text detail
//! mandatory.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A closed set of labels for one aspect of a trip
pub trait LabelDimension: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Machine key of the dimension ("tandem", "fall", ...)
    const KEY: &'static str;

    /// Human-readable dimension title
    const TITLE: &'static str;

    /// All members, in form display order
    fn all() -> &'static [Self];

    /// Wire value stored in the backing store
    fn as_str(self) -> &'static str;

    /// Explanation shown next to the selected label
    fn explanation(self) -> &'static str;

    /// Catch-all members require the free-text detail field
    fn requires_detail(self) -> bool {
        false
    }

    /// Alternative spellings accepted when parsing
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Parse a wire value or alias (surrounding whitespace ignored)
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|label| label.as_str() == value || label.aliases().contains(&value))
    }
}

/// Tandem riding status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TandemLabel {
    Solo,
    Tandem,
    PartialTandem,
    Unknown,
    Other,
}

impl LabelDimension for TandemLabel {
    const KEY: &'static str = "tandem";
    const TITLE: &'static str = "Tandem";

    fn all() -> &'static [Self] {
        &[
            TandemLabel::Solo,
            TandemLabel::Tandem,
            TandemLabel::PartialTandem,
            TandemLabel::Unknown,
            TandemLabel::Other,
        ]
    }

    fn as_str(self) -> &'static str {
        match self {
            TandemLabel::Solo => "Solo",
            TandemLabel::Tandem => "Tandem",
            TandemLabel::PartialTandem => "Tandem partiel",
            TandemLabel::Unknown => "Ne sait pas",
            TandemLabel::Other => "Autre",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            TandemLabel::Solo => "la quasi totalité de ce trajet a été réalisée seul(e).",
            TandemLabel::Tandem => {
                "la quasi totalité de ce trajet a été réalisée à deux personnes."
            }
            TandemLabel::PartialTandem => {
                "une partie non négligeable de ce trajet a été réalisée à deux personnes."
            }
            TandemLabel::Unknown => "vous ne vous souvenez pas.",
            TandemLabel::Other => {
                "aucun des labels ne correspond (précisez dans la rubrique détails)."
            }
        }
    }

    fn requires_detail(self) -> bool {
        matches!(self, TandemLabel::Other)
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            TandemLabel::Unknown => &["Unknown"],
            TandemLabel::Other => &["Other"],
            _ => &[],
        }
    }
}

/// Fall type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallLabel {
    NoFall,
    Fall,
    BikeFall,
    Handling,
    Unknown,
    Other,
}

impl LabelDimension for FallLabel {
    const KEY: &'static str = "fall";
    const TITLE: &'static str = "Chute";

    fn all() -> &'static [Self] {
        &[
            FallLabel::NoFall,
            FallLabel::Fall,
            FallLabel::BikeFall,
            FallLabel::Handling,
            FallLabel::Unknown,
            FallLabel::Other,
        ]
    }

    fn as_str(self) -> &'static str {
        match self {
            FallLabel::NoFall => "Pas de chute",
            FallLabel::Fall => "Chute",
            FallLabel::BikeFall => "Chute vélo",
            FallLabel::Handling => "Manipulation",
            FallLabel::Unknown => "Ne sait pas",
            FallLabel::Other => "Autre",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            FallLabel::NoFall => "le vélo n'a jamais chuté (position horizontale).",
            FallLabel::Fall => "vous étiez sur le vélo lors de la chute.",
            FallLabel::BikeFall => "le vélo est tombé alors que vous n'étiez pas dessus.",
            FallLabel::Handling => {
                "vous avez manipulé le vélo, et celui ci peut avoir été mis à l'horizontal."
            }
            FallLabel::Unknown => "vous ne vous souvenez pas de ce trajet.",
            FallLabel::Other => {
                "aucun des labels ne correspond (précisez dans la rubrique détails)."
            }
        }
    }

    fn requires_detail(self) -> bool {
        matches!(self, FallLabel::Other)
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            FallLabel::Unknown => &["Unknown"],
            FallLabel::Other => &["Other"],
            _ => &[],
        }
    }
}

/// Quality of the electric assistance during the trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssistanceQuality {
    Nominal,
    Excellent,
    Good,
    Bad,
    Poor,
    NoAssistance,
    Unknown,
}

impl LabelDimension for AssistanceQuality {
    const KEY: &'static str = "assistance";
    const TITLE: &'static str = "Qualité de l'assistance";

    fn all() -> &'static [Self] {
        &[
            AssistanceQuality::Nominal,
            AssistanceQuality::Excellent,
            AssistanceQuality::Good,
            AssistanceQuality::Bad,
            AssistanceQuality::Poor,
            AssistanceQuality::NoAssistance,
            AssistanceQuality::Unknown,
        ]
    }

    fn as_str(self) -> &'static str {
        match self {
            AssistanceQuality::Nominal => "RAS",
            AssistanceQuality::Excellent => "Excellent",
            AssistanceQuality::Good => "Bonne",
            AssistanceQuality::Bad => "Mauvaise",
            AssistanceQuality::Poor => "Médiocre",
            AssistanceQuality::NoAssistance => "Pas d'assistance",
            AssistanceQuality::Unknown => "Ne sait pas",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            AssistanceQuality::Nominal => "l'assistance a fonctionné correctement.",
            AssistanceQuality::Excellent => "l'assistance a été excellente.",
            AssistanceQuality::Good => "l'assistance a été bonne.",
            AssistanceQuality::Bad => "l'assistance a été mauvaise.",
            AssistanceQuality::Poor => "l'assistance a été médiocre.",
            AssistanceQuality::NoAssistance => "vous n'avez pas eu d'assistance.",
            AssistanceQuality::Unknown => "vous ne vous souvenez pas.",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            AssistanceQuality::Unknown => &["Unknown"],
            _ => &[],
        }
    }
}

macro_rules! label_serde {
    ($($label:ty),+) => {
        $(
            impl Serialize for $label {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl<'de> Deserialize<'de> for $label {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let value = String::deserialize(deserializer)?;
                    <$label>::parse(&value).ok_or_else(|| unknown_label::<$label, D::Error>(&value))
                }
            }

            impl fmt::Display for $label {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

label_serde!(TandemLabel, FallLabel, AssistanceQuality);

fn unknown_label<L: LabelDimension, E: serde::de::Error>(value: &str) -> E {
    let allowed: Vec<&str> = L::all().iter().map(|label| label.as_str()).collect();
    E::custom(format!(
        "unknown {} label '{}', expected one of: {}",
        L::KEY,
        value,
        allowed.join(", ")
    ))
}

/// Deserialize an optional label where an empty string means "not filled in"
///
/// Select boxes on the forms submit `""` for the blank entry.
pub fn deserialize_optional<'de, D, L>(deserializer: D) -> Result<Option<L>, D::Error>
where
    D: Deserializer<'de>,
    L: LabelDimension,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => L::parse(raw)
            .map(Some)
            .ok_or_else(|| unknown_label::<L, D::Error>(raw)),
    }
}

/// One member of a dimension as shown in the label catalog
#[derive(Debug, Clone, Serialize)]
pub struct LabelDescription {
    pub value: &'static str,
    pub explanation: &'static str,
    pub requires_detail: bool,
}

/// A whole dimension as shown in the label catalog
#[derive(Debug, Clone, Serialize)]
pub struct DimensionCatalog {
    pub key: &'static str,
    pub title: &'static str,
    pub labels: Vec<LabelDescription>,
}

/// Describe every member of a dimension
pub fn describe<L: LabelDimension>() -> DimensionCatalog {
    DimensionCatalog {
        key: L::KEY,
        title: L::TITLE,
        labels: L::all()
            .iter()
            .map(|label| LabelDescription {
                value: label.as_str(),
                explanation: label.explanation(),
                requires_detail: label.requires_detail(),
            })
            .collect(),
    }
}

/// Catalog of all labeling dimensions
pub fn catalog() -> Vec<DimensionCatalog> {
    vec![
        describe::<TandemLabel>(),
        describe::<FallLabel>(),
        describe::<AssistanceQuality>(),
    ]
}
