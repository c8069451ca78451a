//! Catalog domain constants: cast member types, ratings, upload rules and
//! the model identity used for change events.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Model identity
// ---------------------------------------------------------------------------

/// A persisted catalog record whose changes are announced downstream.
///
/// `MODEL_NAME` is the snake_case model name used in routing keys
/// (`model.<MODEL_NAME>.<action>`).
pub trait CatalogModel {
    const MODEL_NAME: &'static str;

    fn model_id(&self) -> DbId;
}

// ---------------------------------------------------------------------------
// Cast members
// ---------------------------------------------------------------------------

/// Role of a cast member, stored as a SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum CastMemberType {
    Director = 1,
    Actor = 2,
}

impl CastMemberType {
    /// Accepted wire values.
    pub const ALLOWED: &'static [&'static str] = &["1", "2"];

    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

impl From<CastMemberType> for i16 {
    fn from(value: CastMemberType) -> Self {
        value.as_i16()
    }
}

impl TryFrom<i16> for CastMemberType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Director),
            2 => Ok(Self::Actor),
            other => Err(format!("unknown cast member type {other}")),
        }
    }
}

impl std::str::FromStr for CastMemberType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: i16 = s
            .trim()
            .parse()
            .map_err(|_| format!("unknown cast member type {s}"))?;
        Self::try_from(n)
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// Age ratings a video may carry.
pub const RATINGS: &[&str] = &["L", "10", "12", "14", "16", "18"];

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// MIME types accepted for image uploads (`thumb`, `banner`).
pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/svg+xml",
    "image/webp",
];

/// MIME types accepted for video uploads (`video`, `trailer`).
pub const VIDEO_MIME_TYPES: &[&str] = &["video/mp4"];

/// The four file slots of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFileField {
    Video,
    Trailer,
    Thumb,
    Banner,
}

impl VideoFileField {
    pub const ALL: [VideoFileField; 4] = [Self::Video, Self::Trailer, Self::Thumb, Self::Banner];

    /// Multipart field name and database column.
    pub fn column(self) -> &'static str {
        match self {
            Self::Video => "video_file",
            Self::Trailer => "trailer_file",
            Self::Thumb => "thumb_file",
            Self::Banner => "banner_file",
        }
    }

    /// Key of the `{name, url}` object in the serialized video.
    pub fn resource_key(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Trailer => "trailer",
            Self::Thumb => "thumb",
            Self::Banner => "banner",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }

    pub fn max_bytes(self) -> u64 {
        match self {
            Self::Video => 50 * GIB,
            Self::Trailer => GIB,
            Self::Thumb => 5 * MIB,
            Self::Banner => 10 * MIB,
        }
    }

    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            Self::Video | Self::Trailer => VIDEO_MIME_TYPES,
            Self::Thumb | Self::Banner => IMAGE_MIME_TYPES,
        }
    }

    pub fn accepts(self, mime: &str) -> bool {
        let mime = mime.split(';').next().unwrap_or("").trim();
        self.mime_types()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn cast_member_type_parses_wire_values() {
        assert_matches!("1".parse::<CastMemberType>(), Ok(CastMemberType::Director));
        assert_matches!(" 2".parse::<CastMemberType>(), Ok(CastMemberType::Actor));
        assert!("3".parse::<CastMemberType>().is_err());
        assert!("a".parse::<CastMemberType>().is_err());
    }

    #[test]
    fn cast_member_type_serializes_as_number() {
        let json = serde_json::to_value(CastMemberType::Actor).unwrap();
        assert_eq!(json, serde_json::json!(2));
        let back: CastMemberType = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(back, CastMemberType::Director);
    }

    #[test]
    fn file_fields_round_trip_by_column() {
        for field in VideoFileField::ALL {
            assert_eq!(VideoFileField::from_column(field.column()), Some(field));
        }
        assert_eq!(VideoFileField::from_column("poster_file"), None);
    }

    #[test]
    fn mime_checks_ignore_parameters_and_case() {
        assert!(VideoFileField::Video.accepts("video/mp4"));
        assert!(VideoFileField::Trailer.accepts("VIDEO/MP4"));
        assert!(!VideoFileField::Video.accepts("image/png"));
        assert!(VideoFileField::Thumb.accepts("image/png; charset=binary"));
        assert!(!VideoFileField::Banner.accepts("video/mp4"));
    }

    #[test]
    fn size_limits_grow_with_media_kind() {
        assert!(VideoFileField::Thumb.max_bytes() < VideoFileField::Banner.max_bytes());
        assert!(VideoFileField::Banner.max_bytes() < VideoFileField::Trailer.max_bytes());
        assert!(VideoFileField::Trailer.max_bytes() < VideoFileField::Video.max_bytes());
    }
}
