use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Fallback shown wherever a note has no title
pub static UNTITLED: &str = "Untitled";

/// A stored note. Every field except `id` is optional so that a save can
/// carry only the fields it wants to overwrite.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
    /// fields written by other versions, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ids written as numbers by other versions read as their decimal text.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Epoch millis stored as an integer, a float or a numeric string.
fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}

impl Note {
    pub fn new(title: &str, content: &str) -> Note {
        Note {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Note {
        self.id = id.to_string();
        self
    }

    pub fn with_color(mut self, color: NoteColor) -> Note {
        self.color = Some(color);
        self
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED,
        }
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// true when neither title nor content carries anything but whitespace
    pub fn is_blank(&self) -> bool {
        let empty = |f: &Option<String>| f.as_deref().map_or(true, |s| s.trim().is_empty());
        empty(&self.title) && empty(&self.content)
    }

    /// Overwrite the fields `newer` sets, leaving the rest alone. A stored
    /// `createdAt` is never replaced.
    pub fn merge_from(&mut self, newer: Note) {
        if !newer.id.is_empty() {
            self.id = newer.id;
        }
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.content.is_some() {
            self.content = newer.content;
        }
        if newer.color.is_some() {
            self.color = newer.color;
        }
        if self.created_at.is_none() {
            self.created_at = newer.created_at;
        }
        if newer.modified_at.is_some() {
            self.modified_at = newer.modified_at;
        }
        if newer.timestamp.is_some() {
            self.timestamp = newer.timestamp;
        }
        self.extra.extend(newer.extra);
    }

    pub fn normalize_color(&mut self) {
        if let Some(c) = self.color.take() {
            self.color = Some(c.normalize());
        }
    }
}

/// A resolved color tag, the only shape the editor and the list ever see.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Swatch {
    pub bg_color: String,
    #[serde(default = "no_shadow")]
    pub shadow: String,
    #[serde(default)]
    pub name: String,
}

fn no_shadow() -> String {
    "none".to_string()
}

impl Swatch {
    fn new(bg_color: &str, shadow: &str, name: &str) -> Swatch {
        Swatch {
            bg_color: bg_color.to_string(),
            shadow: shadow.to_string(),
            name: name.to_string(),
        }
    }

    /// the plain default swatch, used for unknown legacy classes
    pub fn plain() -> Swatch {
        Swatch::new("#ffffff", "none", "")
    }

    /// the box shadow to apply, if any
    pub fn box_shadow(&self) -> Option<&str> {
        match self.shadow.as_str() {
            "" | "none" => None,
            s => Some(s),
        }
    }

    /// look up one of the palette entries by its symbolic name
    pub fn named(name: &str) -> Option<Swatch> {
        match name {
            "pink" => Some(Swatch::new("#5c2739", "0 4px 12px rgba(244, 67, 54, 0.3)", "pink")),
            "blue" => Some(Swatch::new("#1a365d", "0 4px 12px rgba(33, 150, 243, 0.3)", "blue")),
            "green" => Some(Swatch::new("#1e4620", "0 4px 12px rgba(76, 175, 80, 0.3)", "green")),
            "yellow" => Some(Swatch::new("#553c00", "0 4px 12px rgba(255, 235, 59, 0.3)", "yellow")),
            "white" | "none" | "plain" => Some(Swatch::plain()),
            _ => None,
        }
    }

    fn from_legacy_class(class: &str) -> Swatch {
        class.strip_prefix("note-")
             .filter(|n| *n != "white" && *n != "none" && *n != "plain")
             .and_then(Swatch::named)
             .unwrap_or_else(Swatch::plain)
    }
}

/// Color tag as found in storage. Records written before swatches existed
/// carry a bare class name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteColor {
    None,
    Legacy(String),
    Structured(Swatch),
}

impl NoteColor {
    /// Map every legacy shape onto a swatch.
    pub fn normalize(self) -> NoteColor {
        match self {
            NoteColor::Legacy(ref class) if class.is_empty() => NoteColor::None,
            NoteColor::Legacy(class) => NoteColor::Structured(Swatch::from_legacy_class(&class)),
            other => other,
        }
    }

    pub fn swatch(&self) -> Option<&Swatch> {
        match *self {
            NoteColor::Structured(ref s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            NoteColor::None => write!(f, ""),
            NoteColor::Legacy(ref c) => write!(f, "{}", c),
            NoteColor::Structured(ref s) => write!(f, "{}", s.name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredColor {
    Swatch(Swatch),
    Class(String),
    Other(IgnoredAny),
}

impl Serialize for NoteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            NoteColor::None => serializer.serialize_str(""),
            NoteColor::Legacy(ref c) => serializer.serialize_str(c),
            NoteColor::Structured(ref s) => s.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredColor::deserialize(deserializer)? {
            StoredColor::Swatch(s) => NoteColor::Structured(s),
            StoredColor::Class(c) if c.is_empty() => NoteColor::None,
            StoredColor::Class(c) => NoteColor::Legacy(c),
            StoredColor::Other(_) => NoteColor::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_class_maps_to_palette() {
        let c = NoteColor::Legacy("note-blue".to_string()).normalize();
        let s = c.swatch().unwrap();
        assert_eq!(s.bg_color, "#1a365d");
        assert_eq!(s.box_shadow(), Some("0 4px 12px rgba(33, 150, 243, 0.3)"));
        assert_eq!(s.name, "blue");
    }

    #[test]
    fn unknown_legacy_class_is_plain() {
        let c = NoteColor::Legacy("note-purple".to_string()).normalize();
        assert_eq!(c, NoteColor::Structured(Swatch::plain()));
        assert_eq!(c.swatch().unwrap().box_shadow(), None);
    }

    #[test]
    fn both_shapes_deserialize() {
        let legacy: Note = serde_json::from_str(r#"{"id":"a","color":"note-pink"}"#).unwrap();
        assert_eq!(legacy.color, Some(NoteColor::Legacy("note-pink".to_string())));

        let structured: Note = serde_json::from_str(
            r##"{"id":"b","color":{"bgColor":"#5c2739","shadow":"0 4px 12px rgba(244, 67, 54, 0.3)","name":"pink"}}"##,
        ).unwrap();
        assert_eq!(structured.color, Some(NoteColor::Structured(Swatch::named("pink").unwrap())));

        let empty: Note = serde_json::from_str(r#"{"id":"c","color":""}"#).unwrap();
        assert_eq!(empty.color, Some(NoteColor::None));
    }

    #[test]
    fn unknown_fields_survive() {
        let note: Note = serde_json::from_str(r#"{"id":"a","pinned":true}"#).unwrap();
        let out = serde_json::to_value(&note).unwrap();
        assert_eq!(out["pinned"], Value::Bool(true));
    }

    #[test]
    fn loose_id_and_timestamp_shapes() {
        let note: Note = serde_json::from_str(r#"{"id":42,"timestamp":1704099600000.5}"#).unwrap();
        assert_eq!(note.id, "42");
        assert_eq!(note.timestamp, Some(1_704_099_600_000));

        let note: Note = serde_json::from_str(r#"{"id":null,"timestamp":"1704099600000"}"#).unwrap();
        assert_eq!(note.id, "");
        assert_eq!(note.timestamp, Some(1_704_099_600_000));

        let note: Note = serde_json::from_str(r#"{"id":"x","timestamp":"soon"}"#).unwrap();
        assert_eq!(note.timestamp, None);
    }

    #[test]
    fn merge_keeps_unset_fields_and_creation_date() {
        let mut stored = Note::new("old", "body").with_id("n");
        stored.created_at = Some("2024-01-01T00:00:00.000Z".to_string());

        let mut incoming = Note::default().with_id("n");
        incoming.title = Some("new".to_string());
        incoming.created_at = Some("2025-01-01T00:00:00.000Z".to_string());
        stored.merge_from(incoming);

        assert_eq!(stored.title.as_deref(), Some("new"));
        assert_eq!(stored.content.as_deref(), Some("body"));
        assert_eq!(stored.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn whitespace_only_is_blank() {
        assert!(Note::new("  ", "\n").is_blank());
        assert!(Note::default().is_blank());
        assert!(!Note::new("", "x").is_blank());
    }
}
