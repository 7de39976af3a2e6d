use serde::{Deserialize, Serialize};

/// Business profile submitted for rule matching.
///
/// The record arrives already validated; every field is optional on the wire and
/// falls back to its default (false, empty, or absent) when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessProfile {
    // Identity
    pub business_name: String,
    pub industry: String,
    pub state: String,
    pub city: String,
    pub legal_structure: Option<String>,
    pub revenue_band: Option<String>,
    pub num_locations: Option<String>,
    pub employees_total: u32,
    pub payroll_frequency: Option<String>,

    // Jurisdiction footprint
    pub other_states: Vec<String>,
    pub remote_employee_states: Vec<String>,
    pub sales_states: Vec<String>,
    pub collects_from_other_states: Vec<String>,
    #[serde(rename = "collectsFromCA")]
    pub collects_from_ca: bool,

    // Workforce
    pub employs_minors: bool,
    pub minors_ages: Vec<String>,
    pub tipped_workers: bool,
    pub tipped_percent_band: Option<String>,
    pub uses_contractors: bool,
    pub has_remote_employees: bool,
    pub unionized_workforce: bool,
    pub seasonal_workers: bool,

    // Licensing
    pub needs_professional_license: bool,
    pub license_types: Vec<String>,
    pub operates_from_home: bool,

    // Food and alcohol
    pub handles_food: bool,
    pub on_site_prep: bool,
    pub meat_dairy: bool,
    pub seating_on_prem: bool,
    pub sells_alcohol: bool,
    pub alcohol_type: Option<String>,
    pub alcohol_sales_context: Option<String>,

    // Privacy and data handling
    pub collects_customer_data: bool,
    #[serde(rename = "handlesPHI")]
    pub handles_phi: bool,
    #[serde(rename = "childrenUnder13")]
    pub children_under_13: bool,
    pub sells_or_shares_data: bool,
    pub uses_biometrics: bool,
    pub data_volume_band: Option<String>,

    // Safety and transport
    pub commercial_vehicles: bool,
    #[serde(rename = "hasCDLDrivers")]
    pub has_cdl_drivers: bool,
    #[serde(rename = "trucksOver10kInterstate")]
    pub trucks_over_10k_interstate: bool,
    pub uses_forklifts: bool,
    pub hazardous_materials: bool,

    // Digital presence and payments
    pub public_facing_site: bool,
    pub has_website_or_app: bool,
    pub accepts_card_payments: bool,

    // HR and benefits
    pub offers_health_insurance: bool,
    pub offers_retirement_plan: bool,
    pub has_employee_handbook: bool,
    pub provides_paid_leave: bool,

    // Trigger dates (ISO 8601)
    pub formation_date: Option<String>,
    pub first_hire_date: Option<String>,
    pub first_payroll_date: Option<String>,
    pub opening_date: Option<String>,
    pub lease_start_date: Option<String>,
    pub license_expiration_date: Option<String>,
    pub fiscal_year_end: Option<String>,
}

impl BusinessProfile {
    /// Resolve a camelCase date-field name to its raw, non-empty value.
    pub fn date_field(&self, name: &str) -> Option<&str> {
        let value = match name.trim() {
            "formationDate" => &self.formation_date,
            "firstHireDate" => &self.first_hire_date,
            "firstPayrollDate" => &self.first_payroll_date,
            "openingDate" => &self.opening_date,
            "leaseStartDate" => &self.lease_start_date,
            "licenseExpirationDate" => &self.license_expiration_date,
            "fiscalYearEnd" => &self.fiscal_year_end,
            _ => return None,
        };

        value
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }
}
