use super::damage::{DamageType, Severity, Zone};

/// One curated trade bucket: the codes it contributes once damage reaches `min_severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuratedTrade {
    pub damage_type: DamageType,
    pub zone: Zone,
    pub trade_code: &'static str,
    pub min_severity: Severity,
    pub codes: &'static [&'static str],
}

const fn curated(
    damage_type: DamageType,
    zone: Zone,
    trade_code: &'static str,
    min_severity: Severity,
    codes: &'static [&'static str],
) -> CuratedTrade {
    CuratedTrade {
        damage_type,
        zone,
        trade_code,
        min_severity,
        codes,
    }
}

use DamageType::*;
use Severity::*;
use Zone::*;

static CURATED_TRADES: &[CuratedTrade] = &[
    // Water
    curated(Water, Interior, "WTR", Minor, &["WTR EXT", "WTR DEHU"]),
    curated(Water, Interior, "DRY", Moderate, &["DRY 1/2"]),
    curated(Water, Interior, "PNT", Moderate, &["PNT SP"]),
    curated(Water, Interior, "FLR", Moderate, &["FCC AV"]),
    curated(Water, Interior, "INS", Severe, &["INS BATT"]),
    // Fire
    curated(Fire, Interior, "CLN", Minor, &["CLN SOOT"]),
    curated(Fire, Interior, "PNT", Minor, &["PNT SEAL"]),
    curated(Fire, Interior, "DRY", Moderate, &["DRY 1/2"]),
    curated(Fire, Interior, "INS", Severe, &["INS BATT"]),
    // Smoke
    curated(Smoke, Interior, "CLN", Minor, &["CLN SMOKE"]),
    curated(Smoke, Interior, "PNT", Moderate, &["PNT SEAL", "PNT SP"]),
    // Mold
    curated(Mold, Interior, "MIT", Minor, &["MLD REM"]),
    curated(Mold, Interior, "DRY", Moderate, &["DRY 1/2"]),
    // Wind / hail
    curated(Wind, Exterior, "RFG", Minor, &["RFG 240"]),
    curated(Wind, Exterior, "RFG", Moderate, &["RFG FELT"]),
    curated(Wind, Exterior, "EXT", Moderate, &["SDG VINYL"]),
    curated(Hail, Exterior, "RFG", Minor, &["RFG 240", "RFG FELT"]),
    curated(Hail, Exterior, "EXT", Moderate, &["GTR ALUM", "SDG VINYL"]),
    // Impact
    curated(Impact, Interior, "DRY", Minor, &["DRY 1/2"]),
    curated(Impact, Interior, "FRM", Severe, &["FRM STUD"]),
    curated(Impact, Exterior, "EXT", Minor, &["SDG VINYL"]),
    curated(Impact, Exterior, "FRM", Severe, &["FRM STUD"]),
];

/// Curated codes for a damage observation, deduplicated, in table order.
pub fn curated_codes(damage_type: DamageType, severity: Severity, zone: Zone) -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = Vec::new();
    for trade in CURATED_TRADES.iter().filter(|trade| {
        trade.damage_type == damage_type && trade.zone == zone && severity >= trade.min_severity
    }) {
        for code in trade.codes {
            if !codes.contains(code) {
                codes.push(code);
            }
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_gates_curated_trades() {
        assert_eq!(
            curated_codes(Water, Minor, Interior),
            vec!["WTR EXT", "WTR DEHU"]
        );

        let moderate = curated_codes(Water, Moderate, Interior);
        assert!(moderate.contains(&"DRY 1/2"));
        assert!(moderate.contains(&"FCC AV"));
        assert!(!moderate.contains(&"INS BATT"));

        assert!(curated_codes(Water, Severe, Interior).contains(&"INS BATT"));
    }

    #[test]
    fn zone_separates_interior_and_exterior() {
        assert!(curated_codes(Water, Severe, Exterior).is_empty());
        assert_eq!(
            curated_codes(Hail, Moderate, Exterior),
            vec!["RFG 240", "RFG FELT", "GTR ALUM", "SDG VINYL"]
        );
    }

    #[test]
    fn codes_are_deduplicated() {
        let smoke = curated_codes(Smoke, Severe, Interior);
        assert_eq!(smoke, vec!["CLN SMOKE", "PNT SEAL", "PNT SP"]);
        assert_eq!(curated_codes(Mold, Minor, Interior), vec!["MLD REM"]);
    }
}
