//! Localized mutation messages
//!
//! Only the short success messages of creates, updates and deletes are
//! translated. The language comes from the `Accept-Language` header.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Ar => "ar",
        }
    }

    /// Parse a language tag such as `fr-FR`; unsupported languages give `None`
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            "ar" => Some(Locale::Ar),
            _ => None,
        }
    }

    /// Best supported language of an `Accept-Language` header value
    ///
    /// Tags are ranked by their `q` weight; ties keep header order.
    pub fn from_accept_language(header: &str) -> Self {
        let mut ranked: Vec<(f32, usize, Locale)> = header
            .split(',')
            .enumerate()
            .filter_map(|(position, part)| {
                let mut pieces = part.split(';');
                let locale = Locale::parse(pieces.next()?)?;
                let weight = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (weight > 0.0).then_some((weight, position, locale))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.first().map(|(_, _, locale)| *locale).unwrap_or_default()
    }

    pub fn created(&self, resource: &str) -> String {
        match self {
            Locale::En => format!("{} created successfully", resource),
            Locale::Fr => format!("{} créé avec succès", resource),
            Locale::Ar => format!("تم إنشاء {} بنجاح", resource),
        }
    }

    pub fn updated(&self, resource: &str) -> String {
        match self {
            Locale::En => format!("{} updated successfully", resource),
            Locale::Fr => format!("{} mis à jour avec succès", resource),
            Locale::Ar => format!("تم تحديث {} بنجاح", resource),
        }
    }

    pub fn deleted(&self, resource: &str) -> String {
        match self {
            Locale::En => format!("{} deleted successfully", resource),
            Locale::Fr => format!("{} supprimé avec succès", resource),
            Locale::Ar => format!("تم حذف {} بنجاح", resource),
        }
    }
}
