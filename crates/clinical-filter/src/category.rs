//! Clinical data categories a selection can constrain.

use std::fmt;

/// A named clinical-data topic with its own document collection.
///
/// The declaration order is the canonical order used for registration and
/// for [`FilterSelection::to_map`](crate::FilterSelection::to_map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Liver biopsy scores (HAI, fibrosis, portal area).
    Biopsy,
    /// Hepatitis B serology markers over follow-up years.
    HepatitBSerology,
    /// Non-invasive fibrosis tests (Fibroscan, APRI, FIB-4).
    NonInvasiveTests,
    /// Laboratory findings. Reserved: no compiled-in filter yet.
    LaboratoryFindings,
    /// Vaccination history.
    VaccineHistory,
    /// Coinfection serology (HCV, HIV, HDV, ...).
    CoinfectionInformation,
    /// Treatment history. Reserved: no compiled-in filter yet.
    Treatment,
    /// Source of infection and family history.
    SourceInformation,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Category; 8] = [
        Category::Biopsy,
        Category::HepatitBSerology,
        Category::NonInvasiveTests,
        Category::LaboratoryFindings,
        Category::VaccineHistory,
        Category::CoinfectionInformation,
        Category::Treatment,
        Category::SourceInformation,
    ];

    /// Returns the canonical wire key of the category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Biopsy => "Biopsy",
            Category::HepatitBSerology => "HepatitBSerology",
            Category::NonInvasiveTests => "NonInvasiveTests",
            Category::LaboratoryFindings => "LaboratoryFindings",
            Category::VaccineHistory => "VaccineHistory",
            Category::CoinfectionInformation => "CoinfectionInformation",
            Category::Treatment => "Treatment",
            Category::SourceInformation => "SourceInformation",
        }
    }

    /// Maps a wire key to a category, ignoring ASCII case.
    ///
    /// The historical spelling `biopcy` is accepted for [`Category::Biopsy`].
    /// Unknown keys return `None`.
    pub fn from_key(key: &str) -> Option<Category> {
        let key = key.trim();
        if key.eq_ignore_ascii_case("biopcy") {
            return Some(Category::Biopsy);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.name().eq_ignore_ascii_case(key))
    }

    /// Returns true for categories accepted in selections that have no
    /// compiled-in filter.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Category::LaboratoryFindings | Category::Treatment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
