use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ConditionCategory {
    Cardiovascular => "cardiovascular",
    Endocrine => "endocrine",
});

str_enum!(BasketType {
    Diagnostic => "diagnostic",
    OngoingManagement => "ongoing_management",
});

// Plan categories are a closed set. The `KeyCare` exclusion marker found in
// medicine names is NOT a member; exclusion lists are free-form strings and
// are compared verbatim (see authorization::is_excluded).
str_enum!(PlanCategory {
    Core => "core",
    Priority => "priority",
    Saver => "saver",
    Executive => "executive",
    Comprehensive => "comprehensive",
});

str_enum!(EvidenceKind {
    Note => "note",
    File => "file",
});

str_enum!(ComplianceStatus {
    Compliant => "compliant",
    NonCompliant => "non_compliant",
    RequiresReview => "requires_review",
});

// Wizard step identifiers exposed to the UI collaborator.
str_enum!(WorkflowStep {
    Input => "input",
    Analysis => "analysis",
    IcdSelection => "icd-selection",
    Treatment => "treatment",
    Medicine => "medicine",
    Export => "export",
});

str_enum!(CaseMode {
    NewCase => "new-case",
    ViewCases => "view-cases",
});
