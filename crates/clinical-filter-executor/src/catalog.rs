//! Compiled-in field maps for the supported categories.
//!
//! Every map reads the examination identifier from
//! [`EXAMINATION_ID_FIELD`](clinical_filter::EXAMINATION_ID_FIELD). Biopsy and
//! serology tokens are case-insensitive; the other categories compare tokens
//! exactly.

use clinical_filter::{Category, CategoryFieldMap, FilterResult, TokenCase};

use crate::category::CategoryFilter;

/// Collection names, as created by the ETL load.
pub mod collections {
    /// Biopsy scores.
    pub const BIOPSY: &str = "biopcy";
    /// Hepatitis B serology.
    pub const HEPATIT_B_SEROLOGY: &str = "hepatitbserology";
    /// Non-invasive tests.
    pub const NON_INVASIVE_TESTS: &str = "noninvasivetests";
    /// Vaccination history.
    pub const VACCINE_HISTORY: &str = "vaccinehistory";
    /// Coinfection serology.
    pub const COINFECTION_INFORMATION: &str = "coinfectioninformation";
    /// Source and family history.
    pub const SOURCE_INFORMATION: &str = "sourceinformation";
    /// Examinations (`Id`, `PatientId`).
    pub const EXAMINATIONS: &str = "examinations";
    /// Patients (`Id` plus demographics).
    pub const PATIENTS: &str = "patients";
}

/// Sentinel values stored by the source system.
pub mod sentinels {
    /// "Vaccinated" marker in the vaccination history.
    pub const VACCINATED: &str = "Var";
    /// "Positive" marker in coinfection serology.
    pub const POSITIVE: &str = "Pozitif";
    /// "Yes" marker in source information.
    pub const YES: &str = "Evet";
    /// Positive serology result code.
    pub const SEROLOGY_POSITIVE: &str = "1";
}

/// Number of numbered follow-up columns per serology marker.
const FOLLOW_UP_YEARS: usize = 10;

/// `<marker>FirstYear` followed by `<marker>1` ..= `<marker>10`.
fn follow_up_fields(marker: &str) -> Vec<String> {
    std::iter::once(format!("{}FirstYear", marker))
        .chain((1..=FOLLOW_UP_YEARS).map(|year| format!("{}{}", marker, year)))
        .collect()
}

/// Biopsy: a score recorded in any of the three biopsies.
pub fn biopsy() -> FilterResult<CategoryFieldMap> {
    CategoryFieldMap::builder(Category::Biopsy, collections::BIOPSY)
        .token_case(TokenCase::Insensitive)
        .exists("hai", ["HAI1", "HAI2", "HAI3"])
        .exists("fibrosis", ["Fibrosis1", "Fibrosis2", "Fibrosis3"])
        .exists("portalArea", ["PortalArea1", "PortalArea2", "PortalArea3"])
        .build()
}

/// Hepatitis B serology: marker positive in any follow-up year.
pub fn hepatit_b_serology() -> FilterResult<CategoryFieldMap> {
    let markers = [
        ("hbsag", "HbsAG"),
        ("hbeag", "HbeAG"),
        ("antiHbe", "AntiHbe"),
        ("antiHbcIgm", "AntiHbcIgM"),
        ("antiHbcIgg", "AntiHbcIgG"),
        ("antiHbs", "AntiHbs"),
        ("hbvDna", "HBVDNA"),
        ("hdvRna", "HDVRNA"),
    ];

    markers
        .iter()
        .fold(
            CategoryFieldMap::builder(Category::HepatitBSerology, collections::HEPATIT_B_SEROLOGY)
                .token_case(TokenCase::Insensitive),
            |builder, (token, marker)| {
                builder.exists_and_equals(
                    *token,
                    follow_up_fields(marker),
                    sentinels::SEROLOGY_POSITIVE,
                )
            },
        )
        .build()
}

/// Non-invasive tests: a measured value above zero.
pub fn non_invasive_tests() -> FilterResult<CategoryFieldMap> {
    CategoryFieldMap::builder(Category::NonInvasiveTests, collections::NON_INVASIVE_TESTS)
        .token_case(TokenCase::Sensitive)
        .greater_than("fibroscan", "HaveFibroscan", 0.0)
        .greater_than("pot", "Pot", 0.0)
        .greater_than("fibrosis", "Fibrosis", 0.0)
        .greater_than("apri", "APRI", 0.0)
        .greater_than("fib4", "FIB4", 0.0)
        .build()
}

/// Vaccination history: vaccine recorded as given.
pub fn vaccine_history() -> FilterResult<CategoryFieldMap> {
    let vaccines = [
        ("hepatitB", "HepatitB"),
        ("hepatitA", "HepatitA"),
        ("hpv", "HPV"),
        ("zoster", "Zooster"),
        ("influenza", "Influenza"),
        ("rsv", "RSV"),
        ("pneumococcal", "Pneumococcus"),
        ("covid", "COVID"),
    ];

    vaccines
        .iter()
        .fold(
            CategoryFieldMap::builder(Category::VaccineHistory, collections::VACCINE_HISTORY)
                .token_case(TokenCase::Sensitive),
            |builder, (token, field)| builder.equals(*token, *field, sentinels::VACCINATED),
        )
        .build()
}

/// Coinfection: test recorded as positive.
pub fn coinfection_information() -> FilterResult<CategoryFieldMap> {
    let tests = [
        ("antiHcv", "AntiHCV"),
        ("hcvRna", "HCVRNA"),
        ("antiHiv", "AntiHiv"),
        ("antiHdvIgm", "AntiHDVLgm"),
        ("antiHdvIgg", "AntiHDVLgg"),
        ("hdvRna", "HDVRNA"),
        ("antiHavIgm", "AntiHAVLgM"),
        ("vdrl", "VDRL"),
        ("tpha", "TPHA"),
        ("cmvIgm", "CMVLgM"),
        ("cmvIgg", "CMVLgG"),
    ];

    tests
        .iter()
        .fold(
            CategoryFieldMap::builder(
                Category::CoinfectionInformation,
                collections::COINFECTION_INFORMATION,
            )
            .token_case(TokenCase::Sensitive),
            |builder, (token, field)| builder.equals(*token, *field, sentinels::POSITIVE),
        )
        .build()
}

/// Source information: family history flag answered "yes".
pub fn source_information() -> FilterResult<CategoryFieldMap> {
    let flags = [
        "HaveFamilyHepatitB",
        "HaveFamilyCirrhosis",
        "HaveFamilyLiverCancer",
        "HaveFamilySurgeryBlood",
    ];

    flags
        .iter()
        .fold(
            CategoryFieldMap::builder(Category::SourceInformation, collections::SOURCE_INFORMATION)
                .token_case(TokenCase::Sensitive),
            |builder, flag| builder.equals(*flag, *flag, sentinels::YES),
        )
        .build()
}

/// The six supported category filters, in registration order.
pub fn standard_filters() -> FilterResult<Vec<CategoryFilter>> {
    Ok(vec![
        CategoryFilter::new(biopsy()?),
        CategoryFilter::new(hepatit_b_serology()?),
        CategoryFilter::new(non_invasive_tests()?),
        CategoryFilter::new(vaccine_history()?),
        CategoryFilter::new(coinfection_information()?),
        CategoryFilter::new(source_information()?),
    ])
}
