use std::collections::{BTreeMap, BTreeSet};

use super::conditions::{AllowListField, BooleanFlag};
use super::profile::BusinessProfile;

const CALIFORNIA: &str = "CA";

/// Normalized, per-request view of a business profile used for rule evaluation.
///
/// Built from scratch for every match request; nothing here is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    pub industry: String,
    /// Primary state code, uppercased.
    pub state: String,
    /// Primary city, lowercased for comparison.
    pub city: String,
    /// Normalized city set used for city-level retrieval and `cities` conditions.
    pub cities: Vec<String>,
    /// Jurisdiction footprint: sorted, deduplicated state codes.
    pub states: Vec<String>,
    pub employees_total: u32,
    pub requires_food: bool,
    pub requires_alcohol: bool,
    flags: BTreeMap<BooleanFlag, bool>,
    allow_lists: BTreeMap<AllowListField, Vec<String>>,
}

impl EvaluationContext {
    pub fn from_profile(profile: &BusinessProfile) -> Self {
        let state = normalize_state(&profile.state);
        let city = profile.city.trim().to_lowercase();

        let mut footprint: BTreeSet<String> = BTreeSet::new();
        footprint.extend(
            std::iter::once(&profile.state)
                .chain(&profile.other_states)
                .chain(&profile.remote_employee_states)
                .chain(&profile.sales_states)
                .chain(&profile.collects_from_other_states)
                .map(|code| normalize_state(code))
                .filter(|code| !code.is_empty()),
        );
        if profile.collects_from_ca {
            footprint.insert(CALIFORNIA.to_string());
        }

        let cities = if city.is_empty() {
            Vec::new()
        } else {
            vec![city.clone()]
        };

        let requires_food = profile.handles_food || profile.on_site_prep || profile.meat_dairy;
        let requires_alcohol = profile.sells_alcohol || has_text(&profile.alcohol_type);

        let flags = BooleanFlag::ordered()
            .into_iter()
            .map(|flag| (flag, profile_flag(profile, flag)))
            .collect();

        let allow_lists = AllowListField::ordered()
            .into_iter()
            .map(|field| (field, profile_values(profile, field)))
            .collect();

        Self {
            industry: profile.industry.trim().to_string(),
            state,
            city,
            cities,
            states: footprint.into_iter().collect(),
            employees_total: profile.employees_total,
            requires_food,
            requires_alcohol,
            flags,
            allow_lists,
        }
    }

    pub fn flag(&self, flag: BooleanFlag) -> bool {
        self.flags.get(&flag).copied().unwrap_or(false)
    }

    /// Profile values for an allow-list field. Scalar fields yield at most one value.
    pub fn allow_list_values(&self, field: AllowListField) -> &[String] {
        self.allow_lists
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical cache key for the jurisdiction footprint, e.g. `CA,NY|los angeles`.
    pub fn footprint_key(&self) -> String {
        footprint_key(&self.states, &self.cities)
    }
}

/// Build the canonical `states|cities` key from already-normalized inputs.
pub fn footprint_key(states: &[String], cities: &[String]) -> String {
    let states: BTreeSet<&str> = states.iter().map(String::as_str).collect();
    let cities: BTreeSet<&str> = cities.iter().map(String::as_str).collect();
    format!(
        "{}|{}",
        states.into_iter().collect::<Vec<_>>().join(","),
        cities.into_iter().collect::<Vec<_>>().join(",")
    )
}

fn normalize_state(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn has_text(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn scalar(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| vec![text.to_string()])
        .unwrap_or_default()
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn profile_values(profile: &BusinessProfile, field: AllowListField) -> Vec<String> {
    match field {
        AllowListField::AlcoholType => scalar(&profile.alcohol_type),
        AllowListField::AlcoholSalesContext => scalar(&profile.alcohol_sales_context),
        AllowListField::MinorsAges => trimmed(&profile.minors_ages),
        AllowListField::TippedPercentBand => scalar(&profile.tipped_percent_band),
        AllowListField::DataVolumeBand => scalar(&profile.data_volume_band),
        AllowListField::CollectsFromOtherStates => profile
            .collects_from_other_states
            .iter()
            .map(|code| normalize_state(code))
            .filter(|code| !code.is_empty())
            .collect(),
        AllowListField::RevenueBand => scalar(&profile.revenue_band),
        AllowListField::LegalStructure => scalar(&profile.legal_structure),
        AllowListField::PayrollFrequency => scalar(&profile.payroll_frequency),
        AllowListField::NumLocations => scalar(&profile.num_locations),
    }
}

fn profile_flag(profile: &BusinessProfile, flag: BooleanFlag) -> bool {
    match flag {
        BooleanFlag::EmploysMinors => profile.employs_minors,
        BooleanFlag::TippedWorkers => profile.tipped_workers,
        BooleanFlag::CommercialVehicles => profile.commercial_vehicles,
        BooleanFlag::HasCdlDrivers => profile.has_cdl_drivers,
        BooleanFlag::TrucksOver10kInterstate => profile.trucks_over_10k_interstate,
        BooleanFlag::UsesForklifts => profile.uses_forklifts,
        BooleanFlag::HazardousMaterials => profile.hazardous_materials,
        BooleanFlag::CollectsCustomerData => profile.collects_customer_data,
        BooleanFlag::HandlesPhi => profile.handles_phi,
        BooleanFlag::ChildrenUnder13 => profile.children_under_13,
        BooleanFlag::CollectsFromCa => profile.collects_from_ca,
        BooleanFlag::SellsOrSharesData => profile.sells_or_shares_data,
        BooleanFlag::UsesBiometrics => profile.uses_biometrics,
        BooleanFlag::OnSitePrep => profile.on_site_prep,
        BooleanFlag::SeatingOnPrem => profile.seating_on_prem,
        BooleanFlag::MeatDairy => profile.meat_dairy,
        BooleanFlag::PublicFacingSite => profile.public_facing_site,
        BooleanFlag::HasWebsiteOrApp => profile.has_website_or_app,
        BooleanFlag::AcceptsCardPayments => profile.accepts_card_payments,
    }
}
