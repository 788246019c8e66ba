use lessons_core::model::{LessonId, LessonKind, MediaKind, MediaRef, MediaUri, ModuleId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn module_id_from_i64(v: i64) -> Result<ModuleId, StorageError> {
    Ok(ModuleId::new(i64_to_u64("module_id", v)?))
}

pub(crate) fn lesson_id_to_i64(id: LessonId) -> Result<i64, StorageError> {
    id_i64("lesson_id", id.value())
}

pub(crate) fn module_id_to_i64(id: ModuleId) -> Result<i64, StorageError> {
    id_i64("module_id", id.value())
}

pub(crate) fn parse_lesson_kind(s: &str) -> Result<LessonKind, StorageError> {
    LessonKind::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid lesson kind: {s}")))
}

/// Splits a media reference into its `(media_uri, media_kind)` columns.
pub(crate) fn media_to_columns(media: Option<&MediaRef>) -> (Option<String>, Option<String>) {
    match media {
        Some(m) => (Some(m.uri().to_string()), Some(m.kind().as_str().to_owned())),
        None => (None, None),
    }
}

/// Rebuilds a media reference. Both columns must be set or both empty.
pub(crate) fn media_from_columns(
    uri: Option<String>,
    kind: Option<String>,
) -> Result<Option<MediaRef>, StorageError> {
    match (uri, kind) {
        (None, None) => Ok(None),
        (Some(uri), Some(kind)) => {
            let uri = MediaUri::parse(uri).map_err(ser)?;
            let kind = MediaKind::parse(&kind).map_err(ser)?;
            Ok(Some(MediaRef::new(uri, kind)))
        }
        _ => Err(StorageError::Serialization(
            "media_uri and media_kind must be set together".into(),
        )),
    }
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}
