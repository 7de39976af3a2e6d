//! Typed view over a rule's externally authored condition document.
//!
//! Rule conditions arrive as an open JSON object. Recognized keys are parsed into
//! [`Condition`] variants in a fixed canonical order so evaluation (and the reasons
//! it produces) never depends on how the document author ordered the keys. Keys the
//! engine does not know about become [`Condition::Unrecognized`] and are ignored,
//! which lets profiles and rules gain new fields independently.

use serde_json::{Map, Value};

/// Side-channel keys consumed at assembly time, never as match predicates.
const DIRECTIVE_KEYS: [&str; 5] = ["action", "owner", "effort", "dueFrom", "dueInDays"];

const INDUSTRY_KEY: &str = "industry";
const CITIES_KEY: &str = "cities";

/// Inclusive headcount bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Min,
    Max,
}

impl Bound {
    pub const fn ordered() -> [Self; 2] {
        [Self::Min, Self::Max]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Min => "employeesMin",
            Self::Max => "employeesMax",
        }
    }
}

/// Operational flags derived by OR-ing several raw profile answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedGate {
    RequiresFood,
    RequiresAlcohol,
}

impl DerivedGate {
    pub const fn ordered() -> [Self; 2] {
        [Self::RequiresFood, Self::RequiresAlcohol]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::RequiresFood => "requiresFood",
            Self::RequiresAlcohol => "requiresAlcohol",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RequiresFood => "Handles, prepares, or serves food",
            Self::RequiresAlcohol => "Sells or serves alcohol",
        }
    }
}

/// Profile fields matched against a rule-supplied allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AllowListField {
    AlcoholType,
    AlcoholSalesContext,
    MinorsAges,
    TippedPercentBand,
    DataVolumeBand,
    CollectsFromOtherStates,
    RevenueBand,
    LegalStructure,
    PayrollFrequency,
    NumLocations,
}

impl AllowListField {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::AlcoholType,
            Self::AlcoholSalesContext,
            Self::MinorsAges,
            Self::TippedPercentBand,
            Self::DataVolumeBand,
            Self::CollectsFromOtherStates,
            Self::RevenueBand,
            Self::LegalStructure,
            Self::PayrollFrequency,
            Self::NumLocations,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::AlcoholType => "alcoholType",
            Self::AlcoholSalesContext => "alcoholSalesContext",
            Self::MinorsAges => "minorsAges",
            Self::TippedPercentBand => "tippedPercentBand",
            Self::DataVolumeBand => "dataVolumeBand",
            Self::CollectsFromOtherStates => "collectsFromOtherStates",
            Self::RevenueBand => "revenueBand",
            Self::LegalStructure => "legalStructure",
            Self::PayrollFrequency => "payrollFrequency",
            Self::NumLocations => "numLocations",
        }
    }

    /// State codes compare uppercased, like the profile's footprint.
    fn normalize(self, allowed: Vec<String>) -> Vec<String> {
        match self {
            Self::CollectsFromOtherStates => allowed
                .into_iter()
                .map(|code| code.to_ascii_uppercase())
                .collect(),
            _ => allowed,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AlcoholType => "Alcohol type",
            Self::AlcoholSalesContext => "Alcohol sales context",
            Self::MinorsAges => "Minor employee ages",
            Self::TippedPercentBand => "Tipped workforce share",
            Self::DataVolumeBand => "Customer data volume",
            Self::CollectsFromOtherStates => "Collects data from residents of",
            Self::RevenueBand => "Revenue band",
            Self::LegalStructure => "Legal structure",
            Self::PayrollFrequency => "Payroll frequency",
            Self::NumLocations => "Number of locations",
        }
    }
}

/// Raw profile flags that a rule may pin to an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BooleanFlag {
    EmploysMinors,
    TippedWorkers,
    CommercialVehicles,
    HasCdlDrivers,
    TrucksOver10kInterstate,
    UsesForklifts,
    HazardousMaterials,
    CollectsCustomerData,
    HandlesPhi,
    ChildrenUnder13,
    CollectsFromCa,
    SellsOrSharesData,
    UsesBiometrics,
    OnSitePrep,
    SeatingOnPrem,
    MeatDairy,
    PublicFacingSite,
    HasWebsiteOrApp,
    AcceptsCardPayments,
}

impl BooleanFlag {
    pub const fn ordered() -> [Self; 19] {
        [
            Self::EmploysMinors,
            Self::TippedWorkers,
            Self::CommercialVehicles,
            Self::HasCdlDrivers,
            Self::TrucksOver10kInterstate,
            Self::UsesForklifts,
            Self::HazardousMaterials,
            Self::CollectsCustomerData,
            Self::HandlesPhi,
            Self::ChildrenUnder13,
            Self::CollectsFromCa,
            Self::SellsOrSharesData,
            Self::UsesBiometrics,
            Self::OnSitePrep,
            Self::SeatingOnPrem,
            Self::MeatDairy,
            Self::PublicFacingSite,
            Self::HasWebsiteOrApp,
            Self::AcceptsCardPayments,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::EmploysMinors => "employsMinors",
            Self::TippedWorkers => "tippedWorkers",
            Self::CommercialVehicles => "commercialVehicles",
            Self::HasCdlDrivers => "hasCDLDrivers",
            Self::TrucksOver10kInterstate => "trucksOver10kInterstate",
            Self::UsesForklifts => "usesForklifts",
            Self::HazardousMaterials => "hazardousMaterials",
            Self::CollectsCustomerData => "collectsCustomerData",
            Self::HandlesPhi => "handlesPHI",
            Self::ChildrenUnder13 => "childrenUnder13",
            Self::CollectsFromCa => "collectsFromCA",
            Self::SellsOrSharesData => "sellsOrSharesData",
            Self::UsesBiometrics => "usesBiometrics",
            Self::OnSitePrep => "onSitePrep",
            Self::SeatingOnPrem => "seatingOnPrem",
            Self::MeatDairy => "meatDairy",
            Self::PublicFacingSite => "publicFacingSite",
            Self::HasWebsiteOrApp => "hasWebsiteOrApp",
            Self::AcceptsCardPayments => "acceptsCardPayments",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::EmploysMinors => "Employs minors",
            Self::TippedWorkers => "Employs tipped workers",
            Self::CommercialVehicles => "Operates commercial vehicles",
            Self::HasCdlDrivers => "Employs CDL drivers",
            Self::TrucksOver10kInterstate => "Runs trucks over 10,000 lbs interstate",
            Self::UsesForklifts => "Uses forklifts",
            Self::HazardousMaterials => "Handles hazardous materials",
            Self::CollectsCustomerData => "Collects customer data",
            Self::HandlesPhi => "Handles protected health information",
            Self::ChildrenUnder13 => "Collects data from children under 13",
            Self::CollectsFromCa => "Collects data from California residents",
            Self::SellsOrSharesData => "Sells or shares personal data",
            Self::UsesBiometrics => "Uses biometric identifiers",
            Self::OnSitePrep => "Prepares food on site",
            Self::SeatingOnPrem => "Offers on-premises seating",
            Self::MeatDairy => "Handles meat or dairy",
            Self::PublicFacingSite => "Runs a public-facing website",
            Self::HasWebsiteOrApp => "Has a website or app",
            Self::AcceptsCardPayments => "Accepts card payments",
        }
    }
}

/// A single recognized predicate parsed from a condition document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    NumericBound { bound: Bound, value: u64 },
    SetMembership { allowed: Vec<String> },
    BooleanGate(DerivedGate),
    AllowList { field: AllowListField, allowed: Vec<String> },
    Location { cities: Vec<String> },
    ExactBoolean { flag: BooleanFlag, expected: bool },
    Malformed { key: String, detail: String },
    Unrecognized(String),
}

/// Offset applied to a due-date source field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DueOffset {
    #[default]
    Omitted,
    Days(i64),
    Malformed(String),
}

/// Non-predicate keys carried through to the match result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleDirectives {
    pub action: Option<Value>,
    pub owner: Option<Value>,
    pub effort: Option<Value>,
    pub due_from: Option<String>,
    pub due_in_days: DueOffset,
}

impl RuleDirectives {
    fn from_document(document: &Map<String, Value>) -> Self {
        let passthrough = |key: &str| document.get(key).filter(|value| !value.is_null()).cloned();

        let due_from = document
            .get("dueFrom")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string);

        let due_in_days = match document.get("dueInDays") {
            None | Some(Value::Null) => DueOffset::Omitted,
            Some(value) => match integral(value) {
                Some(days) => DueOffset::Days(days),
                None => DueOffset::Malformed(format!("expected whole days, found {value}")),
            },
        };

        Self {
            action: passthrough("action"),
            owner: passthrough("owner"),
            effort: passthrough("effort"),
            due_from,
            due_in_days,
        }
    }
}

/// Parsed condition document: ordered predicates plus directives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
    directives: RuleDirectives,
}

impl ConditionSet {
    /// Parse a raw `conditions` value. `null` means "no conditions"; any other
    /// non-object value poisons the whole rule as malformed.
    pub fn parse(document: &Value) -> Self {
        match document {
            Value::Null => Self::default(),
            Value::Object(map) => Self::from_map(map),
            other => Self {
                conditions: vec![Condition::Malformed {
                    key: "conditions".to_string(),
                    detail: format!("expected an object, found {}", kind(other)),
                }],
                directives: RuleDirectives::default(),
            },
        }
    }

    pub fn from_map(document: &Map<String, Value>) -> Self {
        let mut conditions = Vec::new();

        for bound in Bound::ordered() {
            if let Some(value) = present(document, bound.key()) {
                conditions.push(match integral(value).and_then(|n| u64::try_from(n).ok()) {
                    Some(value) => Condition::NumericBound { bound, value },
                    None => malformed(bound.key(), "a non-negative whole number", value),
                });
            }
        }

        if let Some(value) = present(document, INDUSTRY_KEY) {
            conditions.push(match string_list(value) {
                Some(allowed) => Condition::SetMembership { allowed },
                None => malformed(INDUSTRY_KEY, "an array of strings", value),
            });
        }

        for gate in DerivedGate::ordered() {
            match present(document, gate.key()) {
                Some(Value::Bool(true)) => conditions.push(Condition::BooleanGate(gate)),
                Some(Value::Bool(false)) | None => {}
                Some(value) => conditions.push(malformed(gate.key(), "a boolean", value)),
            }
        }

        for field in AllowListField::ordered() {
            if let Some(value) = present(document, field.key()) {
                conditions.push(match string_list(value) {
                    Some(allowed) => Condition::AllowList {
                        field,
                        allowed: field.normalize(allowed),
                    },
                    None => malformed(field.key(), "an array of strings", value),
                });
            }
        }

        if let Some(value) = present(document, CITIES_KEY) {
            conditions.push(match string_list(value) {
                Some(cities) => Condition::Location { cities },
                None => malformed(CITIES_KEY, "an array of city names", value),
            });
        }

        for flag in BooleanFlag::ordered() {
            if let Some(value) = present(document, flag.key()) {
                conditions.push(match value {
                    Value::Bool(expected) => Condition::ExactBoolean {
                        flag,
                        expected: *expected,
                    },
                    other => malformed(flag.key(), "a boolean", other),
                });
            }
        }

        conditions.extend(
            document
                .keys()
                .filter(|key| !is_known_key(key))
                .map(|key| Condition::Unrecognized(key.clone())),
        );

        Self {
            conditions,
            directives: RuleDirectives::from_document(document),
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn directives(&self) -> &RuleDirectives {
        &self.directives
    }

    pub fn into_directives(self) -> RuleDirectives {
        self.directives
    }

    /// True when no key in the document constrains the match.
    pub fn is_unconditional(&self) -> bool {
        self.conditions
            .iter()
            .all(|condition| matches!(condition, Condition::Unrecognized(_)))
    }
}

fn present<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    document.get(key).filter(|value| !value.is_null())
}

fn is_known_key(key: &str) -> bool {
    key == INDUSTRY_KEY
        || key == CITIES_KEY
        || DIRECTIVE_KEYS.contains(&key)
        || Bound::ordered().iter().any(|bound| bound.key() == key)
        || DerivedGate::ordered().iter().any(|gate| gate.key() == key)
        || AllowListField::ordered()
            .iter()
            .any(|field| field.key() == key)
        || BooleanFlag::ordered().iter().any(|flag| flag.key() == key)
}

fn malformed(key: &str, expected: &str, found: &Value) -> Condition {
    Condition::Malformed {
        key: key.to_string(),
        detail: format!("expected {expected}, found {}", kind(found)),
    }
}

/// Whole number from an integer or an integral float.
fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|n| n.fract() == 0.0 && n.abs() <= i64::MAX as f64)
        .map(|n| n as i64)
}

/// Array of strings or numbers; numbers compare by their decimal rendering.
fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
