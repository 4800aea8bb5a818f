use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::models::CatalogEntry;

pub const NOTE_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Language of the audit note written next to each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteLanguage {
    #[default]
    Vietnamese,
    English,
}

impl NoteLanguage {
    pub fn no_valid_product(&self) -> &'static str {
        match self {
            NoteLanguage::Vietnamese => "Không tìm thấy product hợp lệ",
            NoteLanguage::English => "No valid product found",
        }
    }

    pub fn updated(&self) -> &'static str {
        match self {
            NoteLanguage::Vietnamese => "Cập nhật thành công",
            NoteLanguage::English => "Updated successfully",
        }
    }

    pub fn other_results(&self) -> &'static str {
        match self {
            NoteLanguage::Vietnamese => "Kết quả khác",
            NoteLanguage::English => "Other results",
        }
    }
}

impl FromStr for NoteLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "vn" | "vietnamese" => Ok(NoteLanguage::Vietnamese),
            "en" | "english" => Ok(NoteLanguage::English),
            other => Err(anyhow::anyhow!("unsupported note language {other:?}")),
        }
    }
}

pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format(NOTE_TIMESTAMP_FORMAT).to_string()
}

/// One numbered line per entry, numbering from 1.
pub fn format_entry_list(entries: &[&CatalogEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}/ {}, {}, {}, {}, {}, {}, {}. {} ",
            i + 1,
            entry.code,
            entry.category_code,
            entry.name,
            entry.provider_code,
            entry.price,
            entry.process_time_minutes,
            entry.country_code,
            entry.status,
        );
    }
    out
}

/// Render the audit note for one row.
pub fn compose_note(
    now: NaiveDateTime,
    winner: Option<&CatalogEntry>,
    runners_up: &[&CatalogEntry],
    language: NoteLanguage,
) -> String {
    let mut message = format!("{} ", format_timestamp(now));

    match winner {
        None => {
            let _ = writeln!(message, "{}", language.no_valid_product());
        }
        Some(entry) => {
            let _ = writeln!(
                message,
                "{}: code: {}, {}, {}",
                language.updated(),
                entry.code,
                entry.country_code,
                entry.process_time_minutes,
            );
        }
    }

    if !runners_up.is_empty() {
        let _ = writeln!(message, "{}:", language.other_results());
        message.push_str(&format_entry_list(runners_up));
    }

    message
}
