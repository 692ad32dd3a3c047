use serde::{Deserialize, Serialize};

pub mod date;

pub use date::GenDate;

/// Rendering mode for note bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteFormat {
    #[default]
    Flowed,
    Preformatted,
}

impl NoteFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteFormat::Flowed => "flowed",
            NoteFormat::Preformatted => "preformatted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flowed" => Some(NoteFormat::Flowed),
            "preformatted" => Some(NoteFormat::Preformatted),
            _ => None,
        }
    }
}

/// Free-form key/value pair attached to media objects and references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Citation of a source record, carried by media objects and references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_handle: String,
    #[serde(default)]
    pub page: Option<String>,
}

/// Reference from an owning record (person, family, source, place) to a
/// media object. Carries its own privacy flag, note and attributes,
/// distinct from the referenced object's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_handle: String,
    #[serde(default)]
    pub privacy: bool,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub note_format: NoteFormat,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub source_refs: Vec<SourceRef>,
}

impl MediaRef {
    pub fn new(media_handle: impl Into<String>) -> Self {
        Self {
            media_handle: media_handle.into(),
            privacy: false,
            note: String::new(),
            note_format: NoteFormat::Flowed,
            attributes: Vec::new(),
            source_refs: Vec::new(),
        }
    }
}

/// Structured personal name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub given: String,
    pub surname: String,
}

impl Name {
    pub fn new(given: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            surname: surname.into(),
        }
    }

    /// Surname-first display form.
    pub fn display(&self) -> String {
        match (self.surname.is_empty(), self.given.is_empty()) {
            (true, true) => String::new(),
            (true, false) => self.given.clone(),
            (false, true) => self.surname.clone(),
            (false, false) => format!("{}, {}", self.surname, self.given),
        }
    }

    /// Case-folded key suitable for lexicographic ordering of names.
    pub fn sort_string(&self) -> String {
        format!(
            "{}\u{1}{}",
            self.surname.to_lowercase(),
            self.given.to_lowercase()
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Married,
    Unmarried,
    CivilUnion,
    #[default]
    Unknown,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Married => "married",
            RelationshipType::Unmarried => "unmarried",
            RelationshipType::CivilUnion => "civilunion",
            RelationshipType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "married" => Some(RelationshipType::Married),
            "unmarried" => Some(RelationshipType::Unmarried),
            "civilunion" => Some(RelationshipType::CivilUnion),
            "unknown" => Some(RelationshipType::Unknown),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationshipType::Married => "Married",
            RelationshipType::Unmarried => "Unmarried",
            RelationshipType::CivilUnion => "Civil Union",
            RelationshipType::Unknown => "Unknown",
        }
    }
}

/// Kind of a recorded life event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Marriage,
    Engagement,
    MarriageBanns,
    MarriageContract,
    Divorce,
    Annulment,
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Marriage => "marriage",
            EventKind::Engagement => "engagement",
            EventKind::MarriageBanns => "marriage_banns",
            EventKind::MarriageContract => "marriage_contract",
            EventKind::Divorce => "divorce",
            EventKind::Annulment => "annulment",
            EventKind::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "marriage" => Some(EventKind::Marriage),
            "engagement" => Some(EventKind::Engagement),
            "marriage_banns" => Some(EventKind::MarriageBanns),
            "marriage_contract" => Some(EventKind::MarriageContract),
            "divorce" => Some(EventKind::Divorce),
            "annulment" => Some(EventKind::Annulment),
            "other" => Some(EventKind::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Marriage => "Marriage",
            EventKind::Engagement => "Engagement",
            EventKind::MarriageBanns => "Marriage Banns",
            EventKind::MarriageContract => "Marriage Contract",
            EventKind::Divorce => "Divorce",
            EventKind::Annulment => "Annulment",
            EventKind::Other => "Other",
        }
    }

    /// Whether this event may stand in for a missing marriage event when a
    /// family's wedding date is projected.
    pub fn is_marriage_fallback(&self) -> bool {
        matches!(
            self,
            EventKind::Engagement | EventKind::MarriageBanns | EventKind::MarriageContract
        )
    }
}

/// Role a referencing record plays with respect to an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    #[default]
    Family,
    Witness,
    Unknown,
}

/// Ordered reference from a family record to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub event_handle: String,
    #[serde(default)]
    pub role: EventRole,
}

impl EventRef {
    pub fn new(event_handle: impl Into<String>) -> Self {
        Self {
            event_handle: event_handle.into(),
            role: EventRole::Family,
        }
    }
}

/// Decoded preview pixels handed to a render layer.
/// RGBA8, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_display_is_surname_first() {
        let name = Name::new("Ada", "Lovelace");
        assert_eq!(name.display(), "Lovelace, Ada");
        assert_eq!(Name::new("Ada", "").display(), "Ada");
        assert_eq!(Name::default().display(), "");
    }

    #[test]
    fn sort_string_folds_case() {
        let upper = Name::new("ADA", "LOVELACE");
        let lower = Name::new("ada", "lovelace");
        assert_eq!(upper.sort_string(), lower.sort_string());
    }

    #[test]
    fn fallback_kinds() {
        assert!(EventKind::Engagement.is_marriage_fallback());
        assert!(!EventKind::Marriage.is_marriage_fallback());
        assert!(!EventKind::Divorce.is_marriage_fallback());
    }
}
