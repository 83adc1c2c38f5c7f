//! Extension and MIME based file categorisation.
//!
//! Assignment never looks at file content: an exact lowercase extension
//! lookup wins, then the MIME type guessed from the file name is matched
//! against an ordered prefix list, and anything else lands in `Others`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Photos,
    Videos,
    Audio,
    Documents,
    #[serde(rename = "PDFs")]
    Pdfs,
    Presentations,
    Spreadsheets,
    Archives,
    Code,
    Others,
}

impl Category {
    /// Every category, in scaffold order.
    pub const ALL: [Category; 10] = [
        Category::Photos,
        Category::Videos,
        Category::Audio,
        Category::Documents,
        Category::Pdfs,
        Category::Presentations,
        Category::Spreadsheets,
        Category::Archives,
        Category::Code,
        Category::Others,
    ];

    /// Output folder name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Photos => "Photos",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Documents => "Documents",
            Category::Pdfs => "PDFs",
            Category::Presentations => "Presentations",
            Category::Spreadsheets => "Spreadsheets",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Ordered MIME prefix rules, first match wins.
const MIME_RULES: [(&str, Category); 5] = [
    ("image", Category::Photos),
    ("video", Category::Videos),
    ("audio", Category::Audio),
    ("application/pdf", Category::Pdfs),
    ("text", Category::Documents),
];

fn category_for_extension(ext: &str) -> Option<Category> {
    let category = match ext {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "webp" | "heic" => Category::Photos,
        "mp4" | "mkv" | "mov" | "avi" | "wmv" | "flv" | "webm" => Category::Videos,
        "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" => Category::Audio,
        "doc" | "docx" | "odt" | "rtf" | "txt" => Category::Documents,
        "pdf" => Category::Pdfs,
        "ppt" | "pptx" | "key" => Category::Presentations,
        "xls" | "xlsx" | "csv" | "ods" => Category::Spreadsheets,
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" => Category::Archives,
        "py" | "java" | "c" | "cpp" | "js" | "ts" | "html" | "css" | "tsx" | "jsx" => {
            Category::Code
        }
        _ => return None,
    };
    Some(category)
}

fn category_for_mime(mime: &str) -> Option<Category> {
    MIME_RULES
        .iter()
        .find(|(prefix, _)| mime.starts_with(prefix))
        .map(|(_, category)| *category)
}

/// Map a file path to its category.
///
/// Pure function of the file name: the filesystem is never touched, so
/// directories must be filtered out by the caller before classifying.
pub fn classify(path: &Path) -> Category {
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        if let Some(category) = category_for_extension(&ext.to_lowercase()) {
            return category;
        }
    }

    mime_guess::from_path(path)
        .first_raw()
        .and_then(category_for_mime)
        .unwrap_or(Category::Others)
}
