use serde::{Deserialize, Serialize};

use super::enums::ConditionCategory;

/// A chronic condition from the PMB reference tables. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub icd_code: String,
    pub description: String,
    pub category: ConditionCategory,
}

/// Selection-time projection of a condition, derived 1:1 at load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcdCode {
    pub code: String,
    pub description: String,
    pub condition: String,
}

impl From<&Condition> for IcdCode {
    fn from(condition: &Condition) -> Self {
        Self {
            code: condition.icd_code.clone(),
            description: condition.description.clone(),
            condition: condition.name.clone(),
        }
    }
}
