//! Built-in interaction table.

use std::collections::HashMap;

use super::{InteractionLookup, InteractionRecord, LookupResult, Severity};

/// In-memory interaction lookup keyed by lower-cased drug name.
pub struct InteractionTable {
    entries: HashMap<String, Vec<InteractionRecord>>,
}

impl Default for InteractionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionTable {
    /// Create a table with the default entries.
    pub fn new() -> Self {
        Self {
            entries: Self::default_entries(),
        }
    }

    /// Create a table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Records for `drug_name`, or the single informational record when unknown.
    pub fn lookup(&self, drug_name: &str) -> Vec<InteractionRecord> {
        let key = normalize_name(drug_name);
        match self.entries.get(&key) {
            Some(records) if !records.is_empty() => records.clone(),
            _ => vec![InteractionRecord::not_found()],
        }
    }

    pub fn knows(&self, drug_name: &str) -> bool {
        self.entries.contains_key(&normalize_name(drug_name))
    }

    /// Add or replace the records for a drug.
    pub fn insert(&mut self, drug_name: &str, records: Vec<InteractionRecord>) {
        self.entries.insert(normalize_name(drug_name), records);
    }

    fn default_entries() -> HashMap<String, Vec<InteractionRecord>> {
        use Severity::{High, Medium};

        let mut map = HashMap::new();

        map.insert(
            "ibuprofen".into(),
            vec![
                InteractionRecord::drug(
                    "Anticoagulants / Antiplatelets (e.g., Warfarin, Apixaban, Clopidogrel)",
                    High,
                    "Increased risk of bleeding",
                ),
                InteractionRecord::drug(
                    "Other NSAIDs / Aspirin",
                    High,
                    "Increased risk of GI bleeding, ulcers, and kidney damage. Special Note: \
                     Ibuprofen can interfere with the cardioprotective effect of low-dose aspirin \
                     if taken together.",
                ),
                InteractionRecord::drug(
                    "ACE Inhibitors / ARBs (e.g., Lisinopril, Losartan)",
                    Medium,
                    "Reduced antihypertensive effect, increased risk of kidney injury",
                ),
                InteractionRecord::drug(
                    "Diuretics (e.g., Furosemide, Hydrochlorothiazide)",
                    Medium,
                    "Decreased diuretic efficacy, risk of nephrotoxicity",
                ),
                InteractionRecord::drug("Lithium", High, "Increased lithium levels and toxicity"),
            ],
        );

        map.insert(
            "warfarin".into(),
            vec![
                InteractionRecord::drug(
                    "NSAIDs (e.g., Ibuprofen, Naproxen)",
                    High,
                    "Increased risk of bleeding",
                ),
                InteractionRecord::drug("Aspirin", High, "Significantly increased bleeding risk"),
                InteractionRecord::drug(
                    "Antibiotics (e.g., Ciprofloxacin, Metronidazole)",
                    Medium,
                    "May increase warfarin effect and bleeding risk",
                ),
            ],
        );

        map.insert(
            "aspirin".into(),
            vec![
                InteractionRecord::drug(
                    "Warfarin and other Anticoagulants",
                    High,
                    "Significantly increased bleeding risk",
                ),
                InteractionRecord::drug(
                    "Other NSAIDs (e.g., Ibuprofen)",
                    High,
                    "Increased risk of GI bleeding and reduced cardioprotective effect",
                ),
                InteractionRecord::drug("ACE Inhibitors", Medium, "May reduce antihypertensive effect"),
            ],
        );

        map.insert(
            "lisinopril".into(),
            vec![
                InteractionRecord::drug(
                    "NSAIDs (e.g., Ibuprofen, Naproxen)",
                    Medium,
                    "Reduced antihypertensive effect, increased risk of kidney injury",
                ),
                InteractionRecord::drug(
                    "Diuretics",
                    Medium,
                    "Risk of hypotension and kidney dysfunction",
                ),
                InteractionRecord::drug("Potassium Supplements", Medium, "Risk of hyperkalemia"),
            ],
        );

        map.insert(
            "metformin".into(),
            vec![
                InteractionRecord::drug("Contrast Agents", High, "Risk of lactic acidosis"),
                InteractionRecord::drug(
                    "Alcohol",
                    Medium,
                    "Increased risk of lactic acidosis and hypoglycemia",
                ),
            ],
        );

        map
    }
}

impl InteractionLookup for InteractionTable {
    async fn interactions(&self, drug_name: &str) -> LookupResult<Vec<InteractionRecord>> {
        Ok(self.lookup(drug_name))
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
