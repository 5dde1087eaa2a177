//! EMMA to Internet Archive metadata translation.
//!
//! The translation is table-driven. Most fields are renamed verbatim; a few
//! remap or transform their value. Standard identifier values
//! (`scheme:value`) from `dc_identifier` seed the result under per-scheme
//! archive fields. Fields whose translated value is blank are dropped, as are
//! source fields the tables do not recognise.

use thiserror::Error;

use crate::metadata::{MetadataMap, MetadataValue};

/// EMMA field carrying the standard identifier values.
pub const IDENTIFIER_FIELD: &str = "dc_identifier";

/// Archive field holding the target item identifier.
pub const TARGET_IDENTIFIER_FIELD: &str = "identifier";

/// How one EMMA field translates into the archive schema.
enum FieldRule {
    /// Rename the field, keep the value.
    Direct(&'static str),
    /// Rename the field, remap the value through [`MEDIA_TYPE_MAP`].
    MediaType(&'static str),
    /// Rename the field, inverting a completion flag into a portion flag.
    Portion(&'static str),
}

/// EMMA field to archive field, in the order the archive documents them.
/// The second group are the CSV column names IA defined for EMMA bulk
/// upload; they are retained with the uploaded file's metadata.
static FIELD_MAP: &[(&str, FieldRule)] = &[
    ("emma_collection", FieldRule::Direct("collection")),
    ("rem_source", FieldRule::Direct("contributor")),
    ("dc_creator", FieldRule::Direct("creator")),
    ("dcterms_dateCopyright", FieldRule::Direct("date")),
    ("dc_description", FieldRule::Direct("description")),
    ("emma_repositoryRecordId", FieldRule::Direct(TARGET_IDENTIFIER_FIELD)),
    ("dc_language", FieldRule::Direct("language")),
    ("dc_publisher", FieldRule::Direct("publisher")),
    ("dc_subject", FieldRule::Direct("subject")),
    ("dc_title", FieldRule::Direct("title")),
    ("dc_type", FieldRule::MediaType("mediatype")),
    ("rem_metadataSource", FieldRule::Direct("metadata_source")),
    ("rem_coverage", FieldRule::Direct("portion_description")),
    ("rem_remediation", FieldRule::Direct("remediated_aspects")),
    ("rem_remediatedBy", FieldRule::Direct("remediated_by")),
    ("emma_lastRemediationNote", FieldRule::Direct("remediation_comments")),
    ("rem_status", FieldRule::Direct("remediation_status")),
    ("bib_seriesType", FieldRule::Direct("series_type")),
    ("rem_quality", FieldRule::Direct("text_quality")),
    ("bib_version", FieldRule::Direct("version")),
    ("bib_volume", FieldRule::Direct("volume")),
    ("rem_complete", FieldRule::Portion("portion")),
];

/// EMMA `dc_type` values to archive `mediatype` values.
static MEDIA_TYPE_MAP: &[(&str, &str)] = &[
    ("text", "texts"),
    ("sound", "audio"),
    ("dataset", "data"),
];

/// Identifier scheme synonyms; schemes outside this table pass through.
static IDENTIFIER_SCHEMES: &[(&str, &str)] = &[
    ("oclc", "ocld-id"),
    ("isbn", "isbn"),
    ("issn", "issn"),
    ("lccn", "lccn"),
];

/// Archive fields that describe the uploaded file rather than the title
/// entry, for the optional title/file metadata split.
static FILE_LEVEL_FIELDS: &[&str] = &[
    "metadata_source",
    "portion",
    "portion_description",
    "remediated_aspects",
    "remediated_by",
    "remediation_comments",
    "remediation_status",
    "series_type",
    "text_quality",
    "version",
    "volume",
];

#[derive(Debug, Error)]
pub enum TranslateError {
    /// A value outside the fixed value table for a remapped field. Valid
    /// input never produces this; it signals an upstream contract violation.
    #[error("\"{value}\": no {field} translation defined")]
    UnknownValue { field: &'static str, value: String },
}

/// Translate EMMA metadata into archive metadata.
pub fn translate(source: &MetadataMap) -> Result<MetadataMap, TranslateError> {
    let mut result = identifier_fields(source.get(IDENTIFIER_FIELD));
    for (field, rule) in FIELD_MAP {
        let Some(value) = source.get(*field) else {
            continue;
        };
        let (target, translated) = match rule {
            FieldRule::Direct(target) => (*target, value.clone()),
            FieldRule::MediaType(target) => (*target, media_type(value)?),
            FieldRule::Portion(target) => {
                (*target, MetadataValue::Flag(!value_is_true(value)))
            }
        };
        if translated.is_present() {
            result.insert(target.to_string(), translated);
        }
    }
    Ok(result)
}

/// Translate one or more `scheme:value` identifiers into per-scheme archive
/// fields, accumulating values per scheme in encounter order.
pub fn identifier_fields(identifiers: Option<&MetadataValue>) -> MetadataMap {
    let mut result = MetadataMap::new();
    let identifiers = identifiers.map(MetadataValue::to_list).unwrap_or_default();
    for identifier in identifiers {
        let (scheme, value) = identifier
            .split_once(':')
            .unwrap_or((identifier.as_str(), ""));
        let scheme = IDENTIFIER_SCHEMES
            .iter()
            .find(|(known, _)| *known == scheme)
            .map(|(_, renamed)| *renamed)
            .unwrap_or(scheme);
        match result.get_mut(scheme) {
            Some(MetadataValue::List(values)) => values.push(value.to_string()),
            _ => {
                result.insert(
                    scheme.to_string(),
                    MetadataValue::List(vec![value.to_string()]),
                );
            }
        }
    }
    result
}

/// Split translated metadata into its title-level and file-level halves.
/// Only used when the archive interface wants file metadata separated from
/// the title entry.
pub fn split_file_level(metadata: &MetadataMap) -> (MetadataMap, MetadataMap) {
    let mut title = MetadataMap::new();
    let mut file = MetadataMap::new();
    for (field, value) in metadata {
        if FILE_LEVEL_FIELDS.contains(&field.as_str()) {
            file.insert(field.clone(), value.clone());
        } else {
            title.insert(field.clone(), value.clone());
        }
    }
    (title, file)
}

fn media_type(value: &MetadataValue) -> Result<MetadataValue, TranslateError> {
    let text = value.as_text().ok_or_else(|| TranslateError::UnknownValue {
        field: "dc_type",
        value: format!("{value:?}"),
    })?;
    MEDIA_TYPE_MAP
        .iter()
        .find(|(from, _)| *from == text)
        .map(|(_, to)| MetadataValue::Text(to.to_string()))
        .ok_or_else(|| TranslateError::UnknownValue {
            field: "dc_type",
            value: text.to_string(),
        })
}

/// Whether a value reads as an affirmed completion flag.
fn value_is_true(value: &MetadataValue) -> bool {
    match value {
        MetadataValue::Flag(flag) => *flag,
        MetadataValue::Text(text) => text.to_lowercase() == "true",
        MetadataValue::List(_) => false,
    }
}
