//! Read-only drug reference data: brand names and known pair interactions.

use serde::Serialize;

use super::Severity;

/// A reference drug entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugReference {
    pub name: &'static str,
    pub generic_name: &'static str,
    pub brand_names: &'static [&'static str],
    pub category: &'static str,
    pub mechanism: &'static str,
    pub common_use: &'static [&'static str],
}

impl DrugReference {
    fn matches_exactly(&self, normalized: &str) -> bool {
        self.name.to_lowercase() == normalized
            || self.generic_name.to_lowercase() == normalized
            || self
                .brand_names
                .iter()
                .any(|brand| brand.to_lowercase() == normalized)
    }

    fn matches_partially(&self, normalized: &str) -> bool {
        self.name.to_lowercase().contains(normalized)
            || self.generic_name.to_lowercase().contains(normalized)
            || self
                .brand_names
                .iter()
                .any(|brand| brand.to_lowercase().contains(normalized))
            || self.category.to_lowercase().contains(normalized)
    }
}

/// A known interaction between two drugs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownInteraction {
    pub drug1: &'static str,
    pub drug2: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub mechanism: &'static str,
    pub management: &'static str,
    pub confidence: f64,
}

/// A known interaction matched for a queried pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairInteraction {
    pub id: String,
    #[serde(flatten)]
    pub interaction: KnownInteraction,
}

pub const DRUG_REFERENCES: &[DrugReference] = &[
    DrugReference {
        name: "warfarin",
        generic_name: "warfarin",
        brand_names: &["Coumadin", "Jantoven"],
        category: "anticoagulant",
        mechanism: "Vitamin K antagonist",
        common_use: &["atrial fibrillation", "deep vein thrombosis", "pulmonary embolism"],
    },
    DrugReference {
        name: "aspirin",
        generic_name: "aspirin",
        brand_names: &["Bayer", "Bufferin", "Ecotrin"],
        category: "NSAID",
        mechanism: "COX inhibitor",
        common_use: &["pain relief", "inflammation", "cardioprotection"],
    },
    DrugReference {
        name: "metformin",
        generic_name: "metformin",
        brand_names: &["Glucophage", "Fortamet", "Glumetza"],
        category: "antidiabetic",
        mechanism: "Biguanide - reduces glucose production",
        common_use: &["type 2 diabetes", "prediabetes"],
    },
    DrugReference {
        name: "ibuprofen",
        generic_name: "ibuprofen",
        brand_names: &["Advil", "Motrin", "Nuprin"],
        category: "NSAID",
        mechanism: "COX inhibitor",
        common_use: &["pain relief", "inflammation", "fever reduction"],
    },
    DrugReference {
        name: "lisinopril",
        generic_name: "lisinopril",
        brand_names: &["Prinivil", "Zestril"],
        category: "ACE inhibitor",
        mechanism: "Angiotensin-converting enzyme inhibitor",
        common_use: &["hypertension", "heart failure", "post-MI cardioprotection"],
    },
];

pub const KNOWN_INTERACTIONS: &[KnownInteraction] = &[
    KnownInteraction {
        drug1: "warfarin",
        drug2: "aspirin",
        severity: Severity::High,
        description: "Increased risk of bleeding when used together",
        mechanism: "Both drugs affect platelet aggregation and coagulation cascade",
        management: "Monitor INR closely, consider dose adjustment or alternative therapy",
        confidence: 0.92,
    },
    KnownInteraction {
        drug1: "metformin",
        drug2: "alcohol",
        severity: Severity::Medium,
        description: "Risk of lactic acidosis and hypoglycemia",
        mechanism: "Alcohol enhances metformin effects and impairs glucose metabolism",
        management: "Advise patient to limit alcohol consumption",
        confidence: 0.78,
    },
    KnownInteraction {
        drug1: "ibuprofen",
        drug2: "lisinopril",
        severity: Severity::Medium,
        description: "Reduced antihypertensive effect and potential kidney damage",
        mechanism: "NSAIDs can reduce ACE inhibitor efficacy and cause nephrotoxicity",
        management: "Monitor blood pressure and kidney function",
        confidence: 0.85,
    },
    KnownInteraction {
        drug1: "warfarin",
        drug2: "ibuprofen",
        severity: Severity::High,
        description: "Significantly increased bleeding risk",
        mechanism: "NSAID effects on platelet function combined with anticoagulation",
        management: "Avoid combination if possible, use alternative analgesic",
        confidence: 0.89,
    },
];

/// Exact lookup by name, generic name, or brand name.
pub fn find_drug(term: &str) -> Option<&'static DrugReference> {
    let normalized = term.trim().to_lowercase();
    DRUG_REFERENCES.iter().find(|d| d.matches_exactly(&normalized))
}

/// Substring search over names, brands and category.
pub fn search_drugs(query: &str) -> Vec<&'static DrugReference> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }
    DRUG_REFERENCES
        .iter()
        .filter(|d| d.matches_partially(&normalized))
        .collect()
}

/// Known interactions for an unordered pair of drug names.
pub fn find_known_interactions(drug1: &str, drug2: &str) -> Vec<PairInteraction> {
    let a = drug1.trim().to_lowercase();
    let b = drug2.trim().to_lowercase();

    KNOWN_INTERACTIONS
        .iter()
        .filter(|k| {
            let x = k.drug1.to_lowercase();
            let y = k.drug2.to_lowercase();
            (x == a && y == b) || (x == b && y == a)
        })
        .enumerate()
        .map(|(index, k)| PairInteraction {
            id: format!("known-{index}"),
            interaction: k.clone(),
        })
        .collect()
}

/// Identifier for a prediction over a pair, stable under argument order.
pub fn interaction_id(drug1: &str, drug2: &str) -> String {
    let mut pair = [drug1, drug2];
    pair.sort_unstable();
    format!(
        "{}-{}-{}",
        pair[0],
        pair[1],
        chrono::Utc::now().timestamp_millis()
    )
}
