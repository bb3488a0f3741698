// SeaTable MCP Gateway - Column Types
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Closed set of SeaTable column types. Names from tool callers are
// normalized (case, '-', '_', ' ') before lookup. Unknown names are an
// error, never a silent fallback to text.

use crate::error::{SeaTableError, SeaTableResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    LongText,
    Number,
    Collaborator,
    Date,
    Duration,
    SingleSelect,
    MultipleSelect,
    Image,
    File,
    Email,
    Url,
    Checkbox,
    Rate,
    Formula,
    LinkFormula,
    Link,
    Creator,
    Ctime,
    LastModifier,
    Mtime,
    Geolocation,
    AutoNumber,
    Button,
    DigitalSign,
}

/// Normalized name -> type. Keys are lowercase with separators removed.
const LOOKUP: &[(&str, ColumnType)] = &[
    ("text", ColumnType::Text),
    ("longtext", ColumnType::LongText),
    ("number", ColumnType::Number),
    ("collaborator", ColumnType::Collaborator),
    ("date", ColumnType::Date),
    ("duration", ColumnType::Duration),
    ("singleselect", ColumnType::SingleSelect),
    ("multipleselect", ColumnType::MultipleSelect),
    ("image", ColumnType::Image),
    ("file", ColumnType::File),
    ("email", ColumnType::Email),
    ("url", ColumnType::Url),
    ("checkbox", ColumnType::Checkbox),
    ("rate", ColumnType::Rate),
    ("formula", ColumnType::Formula),
    ("linkformula", ColumnType::LinkFormula),
    ("link", ColumnType::Link),
    ("creator", ColumnType::Creator),
    ("ctime", ColumnType::Ctime),
    ("lastmodifier", ColumnType::LastModifier),
    ("mtime", ColumnType::Mtime),
    ("geolocation", ColumnType::Geolocation),
    ("autonumber", ColumnType::AutoNumber),
    ("button", ColumnType::Button),
    ("digitalsign", ColumnType::DigitalSign),
];

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl ColumnType {
    pub fn parse(name: &str) -> SeaTableResult<Self> {
        let key = normalize(name);
        LOOKUP
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| *t)
            .ok_or_else(|| SeaTableError::UnsupportedColumnType(name.to_string()))
    }

    /// Type code the SeaTable API expects in `column_type`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "long-text",
            Self::Number => "number",
            Self::Collaborator => "collaborator",
            Self::Date => "date",
            Self::Duration => "duration",
            Self::SingleSelect => "single-select",
            Self::MultipleSelect => "multiple-select",
            Self::Image => "image",
            Self::File => "file",
            Self::Email => "email",
            Self::Url => "url",
            Self::Checkbox => "checkbox",
            Self::Rate => "rate",
            Self::Formula => "formula",
            Self::LinkFormula => "link-formula",
            Self::Link => "link",
            Self::Creator => "creator",
            Self::Ctime => "ctime",
            Self::LastModifier => "last-modifier",
            Self::Mtime => "mtime",
            Self::Geolocation => "geolocation",
            Self::AutoNumber => "auto-number",
            Self::Button => "button",
            Self::DigitalSign => "digital-sign",
        }
    }

    pub fn all() -> impl Iterator<Item = ColumnType> {
        LOOKUP.iter().map(|(_, t)| *t)
    }
}
