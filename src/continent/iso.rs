// src/continent/iso.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::schema::Continent;

/// A country from the ISO 3166-1 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoCountry {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
}

/// ISO 3166-1 register as (alpha-2, alpha-3, continent code).
/// A `None` continent code means the classification has no entry for the
/// country (Antarctic territories, Timor-Leste, Sint Maarten, US minor islands).
static REGISTER: &[(&str, &str, Option<&str>)] = &[
    ("AF", "AFG", Some("AS")),
    ("AX", "ALA", Some("EU")),
    ("AL", "ALB", Some("EU")),
    ("DZ", "DZA", Some("AF")),
    ("AS", "ASM", Some("OC")),
    ("AD", "AND", Some("EU")),
    ("AO", "AGO", Some("AF")),
    ("AI", "AIA", Some("NA")),
    ("AQ", "ATA", None),
    ("AG", "ATG", Some("NA")),
    ("AR", "ARG", Some("SA")),
    ("AM", "ARM", Some("AS")),
    ("AW", "ABW", Some("NA")),
    ("AU", "AUS", Some("OC")),
    ("AT", "AUT", Some("EU")),
    ("AZ", "AZE", Some("AS")),
    ("BS", "BHS", Some("NA")),
    ("BH", "BHR", Some("AS")),
    ("BD", "BGD", Some("AS")),
    ("BB", "BRB", Some("NA")),
    ("BY", "BLR", Some("EU")),
    ("BE", "BEL", Some("EU")),
    ("BZ", "BLZ", Some("NA")),
    ("BJ", "BEN", Some("AF")),
    ("BM", "BMU", Some("NA")),
    ("BT", "BTN", Some("AS")),
    ("BO", "BOL", Some("SA")),
    ("BQ", "BES", Some("NA")),
    ("BA", "BIH", Some("EU")),
    ("BW", "BWA", Some("AF")),
    ("BV", "BVT", None),
    ("BR", "BRA", Some("SA")),
    ("IO", "IOT", Some("AS")),
    ("BN", "BRN", Some("AS")),
    ("BG", "BGR", Some("EU")),
    ("BF", "BFA", Some("AF")),
    ("BI", "BDI", Some("AF")),
    ("CV", "CPV", Some("AF")),
    ("KH", "KHM", Some("AS")),
    ("CM", "CMR", Some("AF")),
    ("CA", "CAN", Some("NA")),
    ("KY", "CYM", Some("NA")),
    ("CF", "CAF", Some("AF")),
    ("TD", "TCD", Some("AF")),
    ("CL", "CHL", Some("SA")),
    ("CN", "CHN", Some("AS")),
    ("CX", "CXR", Some("AS")),
    ("CC", "CCK", Some("AS")),
    ("CO", "COL", Some("SA")),
    ("KM", "COM", Some("AF")),
    ("CG", "COG", Some("AF")),
    ("CD", "COD", Some("AF")),
    ("CK", "COK", Some("OC")),
    ("CR", "CRI", Some("NA")),
    ("CI", "CIV", Some("AF")),
    ("HR", "HRV", Some("EU")),
    ("CU", "CUB", Some("NA")),
    ("CW", "CUW", Some("NA")),
    ("CY", "CYP", Some("AS")),
    ("CZ", "CZE", Some("EU")),
    ("DK", "DNK", Some("EU")),
    ("DJ", "DJI", Some("AF")),
    ("DM", "DMA", Some("NA")),
    ("DO", "DOM", Some("NA")),
    ("EC", "ECU", Some("SA")),
    ("EG", "EGY", Some("AF")),
    ("SV", "SLV", Some("NA")),
    ("GQ", "GNQ", Some("AF")),
    ("ER", "ERI", Some("AF")),
    ("EE", "EST", Some("EU")),
    ("SZ", "SWZ", Some("AF")),
    ("ET", "ETH", Some("AF")),
    ("FK", "FLK", Some("SA")),
    ("FO", "FRO", Some("EU")),
    ("FJ", "FJI", Some("OC")),
    ("FI", "FIN", Some("EU")),
    ("FR", "FRA", Some("EU")),
    ("GF", "GUF", Some("SA")),
    ("PF", "PYF", Some("OC")),
    ("TF", "ATF", None),
    ("GA", "GAB", Some("AF")),
    ("GM", "GMB", Some("AF")),
    ("GE", "GEO", Some("AS")),
    ("DE", "DEU", Some("EU")),
    ("GH", "GHA", Some("AF")),
    ("GI", "GIB", Some("EU")),
    ("GR", "GRC", Some("EU")),
    ("GL", "GRL", Some("NA")),
    ("GD", "GRD", Some("NA")),
    ("GP", "GLP", Some("NA")),
    ("GU", "GUM", Some("OC")),
    ("GT", "GTM", Some("NA")),
    ("GG", "GGY", Some("EU")),
    ("GN", "GIN", Some("AF")),
    ("GW", "GNB", Some("AF")),
    ("GY", "GUY", Some("SA")),
    ("HT", "HTI", Some("NA")),
    ("HM", "HMD", None),
    ("VA", "VAT", Some("EU")),
    ("HN", "HND", Some("NA")),
    ("HK", "HKG", Some("AS")),
    ("HU", "HUN", Some("EU")),
    ("IS", "ISL", Some("EU")),
    ("IN", "IND", Some("AS")),
    ("ID", "IDN", Some("AS")),
    ("IR", "IRN", Some("AS")),
    ("IQ", "IRQ", Some("AS")),
    ("IE", "IRL", Some("EU")),
    ("IM", "IMN", Some("EU")),
    ("IL", "ISR", Some("AS")),
    ("IT", "ITA", Some("EU")),
    ("JM", "JAM", Some("NA")),
    ("JP", "JPN", Some("AS")),
    ("JE", "JEY", Some("EU")),
    ("JO", "JOR", Some("AS")),
    ("KZ", "KAZ", Some("AS")),
    ("KE", "KEN", Some("AF")),
    ("KI", "KIR", Some("OC")),
    ("KP", "PRK", Some("AS")),
    ("KR", "KOR", Some("AS")),
    ("KW", "KWT", Some("AS")),
    ("KG", "KGZ", Some("AS")),
    ("LA", "LAO", Some("AS")),
    ("LV", "LVA", Some("EU")),
    ("LB", "LBN", Some("AS")),
    ("LS", "LSO", Some("AF")),
    ("LR", "LBR", Some("AF")),
    ("LY", "LBY", Some("AF")),
    ("LI", "LIE", Some("EU")),
    ("LT", "LTU", Some("EU")),
    ("LU", "LUX", Some("EU")),
    ("MO", "MAC", Some("AS")),
    ("MG", "MDG", Some("AF")),
    ("MW", "MWI", Some("AF")),
    ("MY", "MYS", Some("AS")),
    ("MV", "MDV", Some("AS")),
    ("ML", "MLI", Some("AF")),
    ("MT", "MLT", Some("EU")),
    ("MH", "MHL", Some("OC")),
    ("MQ", "MTQ", Some("NA")),
    ("MR", "MRT", Some("AF")),
    ("MU", "MUS", Some("AF")),
    ("YT", "MYT", Some("AF")),
    ("MX", "MEX", Some("NA")),
    ("FM", "FSM", Some("OC")),
    ("MD", "MDA", Some("EU")),
    ("MC", "MCO", Some("EU")),
    ("MN", "MNG", Some("AS")),
    ("ME", "MNE", Some("EU")),
    ("MS", "MSR", Some("NA")),
    ("MA", "MAR", Some("AF")),
    ("MZ", "MOZ", Some("AF")),
    ("MM", "MMR", Some("AS")),
    ("NA", "NAM", Some("AF")),
    ("NR", "NRU", Some("OC")),
    ("NP", "NPL", Some("AS")),
    ("NL", "NLD", Some("EU")),
    ("NC", "NCL", Some("OC")),
    ("NZ", "NZL", Some("OC")),
    ("NI", "NIC", Some("NA")),
    ("NE", "NER", Some("AF")),
    ("NG", "NGA", Some("AF")),
    ("NU", "NIU", Some("OC")),
    ("NF", "NFK", Some("OC")),
    ("MK", "MKD", Some("EU")),
    ("MP", "MNP", Some("OC")),
    ("NO", "NOR", Some("EU")),
    ("OM", "OMN", Some("AS")),
    ("PK", "PAK", Some("AS")),
    ("PW", "PLW", Some("OC")),
    ("PS", "PSE", Some("AS")),
    ("PA", "PAN", Some("NA")),
    ("PG", "PNG", Some("OC")),
    ("PY", "PRY", Some("SA")),
    ("PE", "PER", Some("SA")),
    ("PH", "PHL", Some("AS")),
    ("PN", "PCN", Some("OC")),
    ("PL", "POL", Some("EU")),
    ("PT", "PRT", Some("EU")),
    ("PR", "PRI", Some("NA")),
    ("QA", "QAT", Some("AS")),
    ("RE", "REU", Some("AF")),
    ("RO", "ROU", Some("EU")),
    ("RU", "RUS", Some("EU")),
    ("RW", "RWA", Some("AF")),
    ("BL", "BLM", Some("NA")),
    ("SH", "SHN", Some("AF")),
    ("KN", "KNA", Some("NA")),
    ("LC", "LCA", Some("NA")),
    ("MF", "MAF", Some("NA")),
    ("PM", "SPM", Some("NA")),
    ("VC", "VCT", Some("NA")),
    ("WS", "WSM", Some("OC")),
    ("SM", "SMR", Some("EU")),
    ("ST", "STP", Some("AF")),
    ("SA", "SAU", Some("AS")),
    ("SN", "SEN", Some("AF")),
    ("RS", "SRB", Some("EU")),
    ("SC", "SYC", Some("AF")),
    ("SL", "SLE", Some("AF")),
    ("SG", "SGP", Some("AS")),
    ("SX", "SXM", None),
    ("SK", "SVK", Some("EU")),
    ("SI", "SVN", Some("EU")),
    ("SB", "SLB", Some("OC")),
    ("SO", "SOM", Some("AF")),
    ("ZA", "ZAF", Some("AF")),
    ("GS", "SGS", None),
    ("SS", "SSD", Some("AF")),
    ("ES", "ESP", Some("EU")),
    ("LK", "LKA", Some("AS")),
    ("SD", "SDN", Some("AF")),
    ("SR", "SUR", Some("SA")),
    ("SJ", "SJM", Some("EU")),
    ("SE", "SWE", Some("EU")),
    ("CH", "CHE", Some("EU")),
    ("SY", "SYR", Some("AS")),
    ("TW", "TWN", Some("AS")),
    ("TJ", "TJK", Some("AS")),
    ("TZ", "TZA", Some("AF")),
    ("TH", "THA", Some("AS")),
    ("TL", "TLS", None),
    ("TG", "TGO", Some("AF")),
    ("TK", "TKL", Some("OC")),
    ("TO", "TON", Some("OC")),
    ("TT", "TTO", Some("NA")),
    ("TN", "TUN", Some("AF")),
    ("TR", "TUR", Some("AS")),
    ("TM", "TKM", Some("AS")),
    ("TC", "TCA", Some("NA")),
    ("TV", "TUV", Some("OC")),
    ("UG", "UGA", Some("AF")),
    ("UA", "UKR", Some("EU")),
    ("AE", "ARE", Some("AS")),
    ("GB", "GBR", Some("EU")),
    ("US", "USA", Some("NA")),
    ("UM", "UMI", None),
    ("UY", "URY", Some("SA")),
    ("UZ", "UZB", Some("AS")),
    ("VU", "VUT", Some("OC")),
    ("VE", "VEN", Some("SA")),
    ("VN", "VNM", Some("AS")),
    ("VG", "VGB", Some("NA")),
    ("VI", "VIR", Some("NA")),
    ("WF", "WLF", Some("OC")),
    ("EH", "ESH", Some("AF")),
    ("YE", "YEM", Some("AS")),
    ("ZM", "ZMB", Some("AF")),
    ("ZW", "ZWE", Some("AF")),
];

static CONTINENT_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    REGISTER
        .iter()
        .filter_map(|&(a2, _, code)| code.map(|c| (a2, c)))
        .collect()
});

/// Every country in the register, in register order.
pub fn countries() -> impl Iterator<Item = IsoCountry> {
    REGISTER
        .iter()
        .map(|&(alpha2, alpha3, _)| IsoCountry { alpha2, alpha3 })
}

/// Two-letter continent code for an alpha-2 country code.
pub fn alpha2_to_continent_code(alpha2: &str) -> Option<&'static str> {
    CONTINENT_CODES.get(alpha2).copied()
}

/// Continent for a two-letter continent code. `AN` (Antarctica) and unknown
/// codes have no continent.
pub fn continent_code_to_continent(code: &str) -> Option<Continent> {
    match code {
        "AF" => Some(Continent::Africa),
        "AS" => Some(Continent::Asia),
        "EU" => Some(Continent::Europe),
        "NA" => Some(Continent::NorthAmerica),
        "OC" => Some(Continent::Oceania),
        "SA" => Some(Continent::SouthAmerica),
        _ => None,
    }
}
