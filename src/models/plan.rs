use serde::{Deserialize, Serialize};

use super::enums::PlanCategory;

/// A medical-scheme plan tier. Fixed enumeration, not loaded from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanType {
    pub id: String,
    pub name: String,
    pub category: PlanCategory,
}

impl PlanType {
    fn new(id: &str, name: &str, category: PlanCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
        }
    }
}

/// The five scheme plan tiers offered to members.
pub fn plan_types() -> Vec<PlanType> {
    vec![
        PlanType::new("core", "Core Plans", PlanCategory::Core),
        PlanType::new("priority", "Priority Plans", PlanCategory::Priority),
        PlanType::new("saver", "Saver Plans", PlanCategory::Saver),
        PlanType::new("executive", "Executive Plans", PlanCategory::Executive),
        PlanType::new(
            "comprehensive",
            "Comprehensive Plans",
            PlanCategory::Comprehensive,
        ),
    ]
}
