use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Optional capability returning the original capture time of an image.
pub trait CaptureDateReader: Send + Sync {
    /// `None` when the image carries no usable capture time.
    fn capture_date(&self, image: &Path) -> Option<NaiveDateTime>;
}

/// Reads `DateTimeOriginal`, falling back to `DateTime`, from EXIF metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifCaptureDateReader;

impl CaptureDateReader for ExifCaptureDateReader {
    fn capture_date(&self, image: &Path) -> Option<NaiveDateTime> {
        let file = File::open(image).ok()?;
        let mut buf_reader = BufReader::new(file);
        let exif = match Reader::new().read_from_container(&mut buf_reader) {
            Ok(exif) => exif,
            Err(e) => {
                trace!("No EXIF data in {}: {}", image.display(), e);
                return None;
            }
        };

        [Tag::DateTimeOriginal, Tag::DateTime]
            .into_iter()
            .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
            .find_map(|field| ascii_value(&field.value).and_then(|s| parse_exif_datetime(&s)))
    }
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string()),
        _ => None,
    }
}

pub(crate) fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim_end_matches('\0'), EXIF_DATETIME_FORMAT).ok()
}
