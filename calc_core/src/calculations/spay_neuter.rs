//! # Spay/Neuter Cost Estimator
//!
//! Estimates the out-of-pocket cost of spaying or neutering a pet.
//!
//! ## Pricing
//!
//! - Base cost by species, gender (female = spay, male = neuter) and weight tier
//! - Multipliers, in order: procedure method, clinic tier, region, area
//! - Conditional fees: pregnancy, in heat, obesity, cryptorchid, senior pre-op exam
//! - Add-ons: bloodwork, pain medication, e-collar, microchip, vaccines
//! - Multi-pet discount: 5% per pet beyond the first, capped at 20%
//! - Voucher credit, never taking the total below zero
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::spay_neuter::{self, SpayNeuterInput};
//! use calc_core::rules;
//!
//! let tables = rules::builtin().unwrap();
//! let mut input = SpayNeuterInput::new("dog", "female", "10-25");
//! input.include_pain_medication = true;
//! input.include_e_collar = true;
//! input.number_of_pets = 3;
//!
//! let estimate = spay_neuter::estimate(&input, &tables.spay_neuter).unwrap();
//! assert_eq!(estimate.total.0, 433.8);
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{
    self, Advice, Charge, ComparisonTable, Dimension, Estimate, Estimator, PercentDiscount, PricingPlan,
    ReferenceFigure,
};
use crate::errors::{CalcError, CalcResult};
use crate::rules::{self, DimensionRow, DiscountRule, RuleTable};
use crate::units::Dollars;

/// Pets younger than this are usually too small for surgery
pub const MINIMUM_AGE_MONTHS: u32 = 2;

/// Age at which a senior pre-op exam is required
pub const SENIOR_AGE_MONTHS: u32 = 84;

/// Oldest age accepted (30 years)
pub const MAX_AGE_MONTHS: u32 = 360;

/// Most pets in one booking
pub const MAX_PETS: u32 = 20;

/// Largest voucher credit accepted
pub const MAX_VOUCHER_CREDIT: f64 = 10_000.0;

/// Region used for the national benchmark
pub const NATIONAL_REGION: &str = "National Average";

/// Area treated as neutral for benchmark figures
pub const BENCHMARK_AREA: &str = "suburban";

const TABLE_NAME: &str = "spay_neuter";

// ============================================================================
// Rule Tables
// ============================================================================

/// Base costs for one species, by gender then weight tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRow {
    pub name: String,
    pub female: RuleTable<f64>,
    pub male: RuleTable<f64>,
}

/// Flat fees triggered by the pet's condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub pregnancy: f64,
    pub in_heat: f64,
    pub obesity: f64,
    pub cryptorchid: f64,
    pub senior_exam: f64,
}

/// An optional flat-price service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnRow {
    pub name: String,
    pub price: f64,
}

/// Reference data for the spay/neuter estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpayNeuterTables {
    pub species: RuleTable<SpeciesRow>,
    pub procedure_methods: RuleTable<DimensionRow>,
    pub clinic_tiers: RuleTable<DimensionRow>,
    pub regions: RuleTable<DimensionRow>,
    pub areas: RuleTable<DimensionRow>,
    pub fees: FeeSchedule,
    pub add_ons: RuleTable<AddOnRow>,
    pub multi_pet_discount: DiscountRule,
}

impl SpayNeuterTables {
    /// Parse and validate from TOML.
    pub fn from_toml(text: &str) -> CalcResult<Self> {
        let tables: SpayNeuterTables = rules::parse_asset(TABLE_NAME, text)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> CalcResult<()> {
        if self.species.is_empty() {
            return Err(CalcError::rule_table(TABLE_NAME, "no species defined"));
        }
        for (key, species) in self.species.iter() {
            for (gender, tiers) in [("female", &species.female), ("male", &species.male)] {
                if tiers.is_empty() {
                    return Err(CalcError::rule_table(
                        TABLE_NAME,
                        format!("species '{}' has no {} weight tiers", key, gender),
                    ));
                }
                for (tier, cost) in tiers.iter() {
                    rules::validate_non_negative(TABLE_NAME, &format!("{}.{}.{}", key, gender, tier), *cost)?;
                }
            }
        }

        rules::validate_dimension("spay_neuter.procedure_methods", &self.procedure_methods)?;
        rules::validate_dimension("spay_neuter.clinic_tiers", &self.clinic_tiers)?;
        rules::validate_dimension("spay_neuter.regions", &self.regions)?;
        rules::validate_dimension("spay_neuter.areas", &self.areas)?;

        if !self.regions.contains(NATIONAL_REGION) {
            return Err(CalcError::rule_table(TABLE_NAME, format!("missing region '{}'", NATIONAL_REGION)));
        }
        if !self.areas.contains(BENCHMARK_AREA) {
            return Err(CalcError::rule_table(TABLE_NAME, format!("missing area '{}'", BENCHMARK_AREA)));
        }

        let fees = &self.fees;
        for (what, value) in [
            ("pregnancy fee", fees.pregnancy),
            ("in-heat fee", fees.in_heat),
            ("obesity fee", fees.obesity),
            ("cryptorchid fee", fees.cryptorchid),
            ("senior exam fee", fees.senior_exam),
        ] {
            rules::validate_non_negative(TABLE_NAME, what, value)?;
        }

        for key in ADD_ON_KEYS {
            let add_on = self
                .add_ons
                .resolve("add_on", key)
                .map_err(|_| CalcError::rule_table(TABLE_NAME, format!("missing add-on '{}'", key)))?;
            rules::validate_non_negative(TABLE_NAME, key, add_on.price)?;
        }

        self.multi_pet_discount.validate(TABLE_NAME)
    }
}

const ADD_ON_KEYS: [&str; 5] = ["bloodwork", "pain_medication", "e_collar", "microchip", "vaccines"];

// ============================================================================
// Input
// ============================================================================

/// Input for a spay/neuter estimate.
///
/// ## JSON Example
///
/// ```json
/// {
///   "species": "dog",
///   "gender": "female",
///   "weight_tier": "10-25",
///   "clinic_tier": "private-practice",
///   "region": "National Average",
///   "area": "suburban",
///   "include_pain_medication": true,
///   "include_e_collar": true
/// }
/// ```
///
/// Omitted fields take the defaults of [`SpayNeuterInput::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpayNeuterInput {
    /// Pet name for display (sanitized text)
    #[serde(default)]
    pub pet_name: String,

    /// Species key ("dog", "cat", "rabbit")
    pub species: String,

    /// "female" (spay) or "male" (neuter)
    pub gender: String,

    /// Weight tier key within the species (e.g. "10-25")
    pub weight_tier: String,

    #[serde(default = "default_procedure_method")]
    pub procedure_method: String,

    #[serde(default = "default_clinic_tier")]
    pub clinic_tier: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_area")]
    pub area: String,

    /// Age in months
    #[serde(default = "default_age_months")]
    pub age_months: u32,

    #[serde(default)]
    pub is_pregnant: bool,
    #[serde(default)]
    pub is_in_heat: bool,
    #[serde(default)]
    pub is_obese: bool,
    /// Retained testicle(s); males only
    #[serde(default)]
    pub is_cryptorchid: bool,

    #[serde(default)]
    pub include_bloodwork: bool,
    #[serde(default)]
    pub include_pain_medication: bool,
    #[serde(default)]
    pub include_e_collar: bool,
    #[serde(default)]
    pub include_microchip: bool,
    #[serde(default)]
    pub include_vaccines: bool,

    /// Pets booked together (at least 1)
    #[serde(default = "default_number_of_pets")]
    pub number_of_pets: u32,

    /// Voucher or assistance-program credit in dollars
    #[serde(default)]
    pub voucher_credit: f64,
}

fn default_procedure_method() -> String {
    "traditional".to_string()
}

fn default_clinic_tier() -> String {
    "private-practice".to_string()
}

fn default_region() -> String {
    NATIONAL_REGION.to_string()
}

fn default_area() -> String {
    BENCHMARK_AREA.to_string()
}

fn default_age_months() -> u32 {
    12
}

fn default_number_of_pets() -> u32 {
    1
}

impl SpayNeuterInput {
    /// A one-year-old pet at a suburban private practice, national pricing,
    /// traditional procedure, no conditions or add-ons.
    pub fn new(species: impl Into<String>, gender: impl Into<String>, weight_tier: impl Into<String>) -> Self {
        SpayNeuterInput {
            pet_name: String::new(),
            species: species.into(),
            gender: gender.into(),
            weight_tier: weight_tier.into(),
            procedure_method: default_procedure_method(),
            clinic_tier: default_clinic_tier(),
            region: default_region(),
            area: default_area(),
            age_months: default_age_months(),
            is_pregnant: false,
            is_in_heat: false,
            is_obese: false,
            is_cryptorchid: false,
            include_bloodwork: false,
            include_pain_medication: false,
            include_e_collar: false,
            include_microchip: false,
            include_vaccines: false,
            number_of_pets: default_number_of_pets(),
            voucher_credit: 0.0,
        }
    }

    /// Validate numeric fields.
    pub fn validate(&self) -> CalcResult<()> {
        if self.number_of_pets == 0 {
            return Err(CalcError::domain(
                "number_of_pets",
                self.number_of_pets.to_string(),
                "At least one pet is required",
            ));
        }
        if self.number_of_pets > MAX_PETS {
            return Err(CalcError::domain(
                "number_of_pets",
                self.number_of_pets.to_string(),
                format!("At most {} pets per booking", MAX_PETS),
            ));
        }
        if self.age_months > MAX_AGE_MONTHS {
            return Err(CalcError::domain(
                "age_months",
                self.age_months.to_string(),
                "Age exceeds 30 years",
            ));
        }
        if !self.voucher_credit.is_finite() || self.voucher_credit < 0.0 {
            return Err(CalcError::domain(
                "voucher_credit",
                self.voucher_credit.to_string(),
                "Credit cannot be negative",
            ));
        }
        if self.voucher_credit > MAX_VOUCHER_CREDIT {
            return Err(CalcError::domain(
                "voucher_credit",
                self.voucher_credit.to_string(),
                format!("Credit exceeds ${}", MAX_VOUCHER_CREDIT),
            ));
        }
        Ok(())
    }

    fn is_female(&self) -> bool {
        self.gender == "female"
    }

    fn is_male(&self) -> bool {
        self.gender == "male"
    }

    fn selected_add_ons(&self) -> impl Iterator<Item = &'static str> {
        let flags = [
            self.include_bloodwork,
            self.include_pain_medication,
            self.include_e_collar,
            self.include_microchip,
            self.include_vaccines,
        ];
        ADD_ON_KEYS
            .into_iter()
            .zip(flags)
            .filter_map(|(key, selected)| selected.then_some(key))
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// The spay/neuter estimator.
pub struct SpayNeuter;

impl Estimator for SpayNeuter {
    type Input = SpayNeuterInput;
    type Tables = SpayNeuterTables;

    const NAME: &'static str = "spay_neuter";
    const DEFAULT_COMPARISONS: &'static [&'static str] = &["clinic_tier", "procedure_method"];

    fn validate(input: &SpayNeuterInput) -> CalcResult<()> {
        input.validate()
    }

    fn plan(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> CalcResult<PricingPlan<SpayNeuterInput>> {
        let species = tables.species.resolve("species", &input.species)?;
        let (procedure, by_weight) = match input.gender.as_str() {
            "female" => ("Spay", &species.female),
            "male" => ("Neuter", &species.male),
            other => return Err(CalcError::unknown_category("gender", other)),
        };
        let base_cost = *by_weight.resolve("weight_tier", &input.weight_tier)?;

        let method = tables.procedure_methods.resolve("procedure_method", &input.procedure_method)?;
        let tier = tables.clinic_tiers.resolve("clinic_tier", &input.clinic_tier)?;
        let region = tables.regions.resolve("region", &input.region)?;
        let area = tables.areas.resolve("area", &input.area)?;

        let fees = &tables.fees;
        let base = Charge::new(
            format!("{} - {} ({} lbs)", procedure, species.name, input.weight_tier),
            Dollars(base_cost),
            format!("{}, {}", method.name, tier.name),
        );

        let mut plan = PricingPlan::new(base)
            .with_multiplier("procedure_method", method.name.clone(), method.multiplier)
            .with_multiplier("clinic_tier", tier.name.clone(), tier.multiplier)
            .with_multiplier("region", region.name.clone(), region.multiplier)
            .with_multiplier("area", area.name.clone(), area.multiplier)
            .with_fee(
                "Pregnancy surcharge",
                Dollars(fees.pregnancy),
                "Longer surgery and anesthesia",
                |i: &SpayNeuterInput| i.is_pregnant && i.is_female(),
            )
            .with_fee(
                "In-heat surcharge",
                Dollars(fees.in_heat),
                "Enlarged, more vascular tissue",
                |i: &SpayNeuterInput| i.is_in_heat && i.is_female(),
            )
            .with_fee(
                "Obesity surcharge",
                Dollars(fees.obesity),
                "Extra anesthesia monitoring and surgical time",
                |i: &SpayNeuterInput| i.is_obese,
            )
            .with_fee(
                "Cryptorchid surgery",
                Dollars(fees.cryptorchid),
                "Abdominal exploration for retained testicle",
                |i: &SpayNeuterInput| i.is_cryptorchid && i.is_male(),
            )
            .with_fee(
                "Senior pre-op exam",
                Dollars(fees.senior_exam),
                "Required at 7 years and older",
                |i: &SpayNeuterInput| i.age_months >= SENIOR_AGE_MONTHS,
            );

        for key in input.selected_add_ons() {
            let add_on = tables.add_ons.resolve("add_on", key)?;
            plan = plan.with_add_on(Charge::new(add_on.name.clone(), Dollars(add_on.price), ""));
        }

        let discount = tables.multi_pet_discount;
        plan = plan
            .with_discount(PercentDiscount::new(
                "Multi-pet discount",
                discount.per_unit,
                input.number_of_pets.saturating_sub(1),
                discount.cap,
            ))
            .with_credit(Charge::new(
                "Voucher credit",
                Dollars(input.voucher_credit),
                "Applied after discounts",
            ));

        Ok(plan)
    }

    fn advise(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> Vec<Advice> {
        let mut advice = Vec::new();

        // Physiological conditions
        if input.is_pregnant && input.is_female() {
            advice.push(Advice::warning(
                "Spaying a pregnant animal ends the pregnancy and carries higher surgical risk; discuss timing with your veterinarian.",
            ));
        }
        if input.is_in_heat && input.is_female() {
            advice.push(Advice::warning(
                "Surgery during heat increases bleeding risk; many vets recommend waiting 2-3 months after the cycle ends.",
            ));
        }
        if input.is_obese {
            advice.push(Advice::warning(
                "Excess weight raises anesthesia risk; your vet may suggest a weight-loss plan before surgery.",
            ));
        }
        if input.is_cryptorchid && input.is_male() {
            advice.push(Advice::warning(
                "Retained testicles need abdominal surgery and carry a higher cancer risk if left in place.",
            ));
        }
        if input.age_months < MINIMUM_AGE_MONTHS {
            advice.push(Advice::warning(format!(
                "Most clinics require pets to be at least {} months old and 2 lbs before surgery.",
                MINIMUM_AGE_MONTHS
            )));
        }
        if input.age_months >= SENIOR_AGE_MONTHS && !input.include_bloodwork {
            advice.push(Advice::warning(
                "Senior pets should have pre-anesthetic bloodwork to check kidney and liver function.",
            ));
        }
        if input.species == "rabbit" {
            advice.push(Advice::warning(
                "Rabbits need a vet experienced with exotic-animal anesthesia.",
            ));
        }

        // Cost savings
        if let Some(savings) = cheaper_tier_savings(input, tables) {
            advice.push(Advice::saving_tip(format!(
                "Switching to the {} option could save about {} on the procedure.",
                savings.0.to_lowercase(),
                savings.1
            )));
        }
        if input.number_of_pets > 1 {
            let rate = PercentDiscount::new(
                "",
                tables.multi_pet_discount.per_unit,
                input.number_of_pets - 1,
                tables.multi_pet_discount.cap,
            )
            .rate();
            advice.push(Advice::saving_tip(format!(
                "Book all {} pets together to keep the {:.0}% multi-pet discount.",
                input.number_of_pets,
                rate * 100.0
            )));
        }
        if input.voucher_credit == 0.0 {
            advice.push(Advice::saving_tip(
                "Local humane societies and spay/neuter voucher programs often cover part of the cost.",
            ));
        }
        if (input.include_microchip || input.include_vaccines) && input.clinic_tier != "animal-shelter" {
            advice.push(Advice::saving_tip(
                "Shelter programs often bundle microchips and vaccines at little or no extra cost.",
            ));
        }

        // Next steps
        advice.push(Advice::next_step(
            "Schedule a pre-surgical consultation to confirm eligibility and final pricing.",
        ));
        if input.species == "rabbit" {
            advice.push(Advice::next_step(
                "Do not fast your rabbit before surgery; rabbits should keep eating.",
            ));
        } else {
            advice.push(Advice::next_step(
                "Withhold food after midnight before surgery unless your vet says otherwise.",
            ));
        }
        let recovery = if input.procedure_method == "laparoscopic" { "3-5" } else { "10-14" };
        advice.push(Advice::next_step(format!(
            "Plan for {} days of restricted activity while the incision heals.",
            recovery
        )));
        if !input.include_e_collar {
            advice.push(Advice::next_step(
                "Get an e-collar to stop licking at the incision.",
            ));
        }

        advice
    }

    fn dimension<'t>(tables: &'t SpayNeuterTables, key: &str) -> CalcResult<Dimension<'t, SpayNeuterInput>> {
        match key {
            "procedure_method" => Ok(Dimension {
                key: "procedure_method",
                rows: &tables.procedure_methods,
                get: |i| i.procedure_method.as_str(),
                set: |i, v| i.procedure_method = v.to_string(),
            }),
            "clinic_tier" => Ok(Dimension {
                key: "clinic_tier",
                rows: &tables.clinic_tiers,
                get: |i| i.clinic_tier.as_str(),
                set: |i, v| i.clinic_tier = v.to_string(),
            }),
            "region" => Ok(Dimension {
                key: "region",
                rows: &tables.regions,
                get: |i| i.region.as_str(),
                set: |i, v| i.region = v.to_string(),
            }),
            "area" => Ok(Dimension {
                key: "area",
                rows: &tables.areas,
                get: |i| i.area.as_str(),
                set: |i, v| i.area = v.to_string(),
            }),
            other => Err(CalcError::unknown_category("dimension", other)),
        }
    }

    fn references(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> CalcResult<Vec<ReferenceFigure>> {
        let mut national = input.clone();
        national.region = NATIONAL_REGION.to_string();
        national.area = BENCHMARK_AREA.to_string();

        let mut regional = input.clone();
        regional.area = BENCHMARK_AREA.to_string();

        Ok(vec![
            ReferenceFigure {
                label: "National average".to_string(),
                amount: procedure_cost(&national, tables)?,
                note: "Same procedure, clinic tier and method at national pricing".to_string(),
            },
            ReferenceFigure {
                label: format!("{} average", input.region),
                amount: procedure_cost(&regional, tables)?,
                note: "Same procedure, clinic tier and method in your region".to_string(),
            },
        ])
    }
}

/// Procedure cost with every multiplier applied, before fees and add-ons.
pub fn procedure_cost(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> CalcResult<Dollars> {
    let plan = SpayNeuter::plan(input, tables)?;
    Ok(plan.base.amount * plan.combined_factor())
}

/// Cheapest clinic tier's name and how much it would save, if cheaper than
/// the selected one.
fn cheaper_tier_savings(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> Option<(String, Dollars)> {
    let current = tables.clinic_tiers.resolve("clinic_tier", &input.clinic_tier).ok()?;
    let (_, cheapest) = tables
        .clinic_tiers
        .iter()
        .min_by(|a, b| a.1.multiplier.total_cmp(&b.1.multiplier))?;
    if cheapest.multiplier >= current.multiplier {
        return None;
    }
    let cost = procedure_cost(input, tables).ok()?;
    let savings = cost * (1.0 - cheapest.multiplier / current.multiplier);
    Some((cheapest.name.clone(), savings.rounded()))
}

/// Estimate one pet booking.
pub fn estimate(input: &SpayNeuterInput, tables: &SpayNeuterTables) -> CalcResult<Estimate> {
    engine::estimate::<SpayNeuter>(input, tables)
}

/// Compare totals across values of one dimension
/// ("procedure_method", "clinic_tier", "region" or "area").
pub fn compare<S: AsRef<str>>(
    dimension: &str,
    candidates: &[S],
    input: &SpayNeuterInput,
    tables: &SpayNeuterTables,
) -> CalcResult<ComparisonTable> {
    engine::compare_across::<SpayNeuter, S>(dimension, candidates, input, tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AdviceKind, LineItemKind};

    fn tables() -> &'static SpayNeuterTables {
        &rules::builtin().unwrap().spay_neuter
    }

    fn scenario() -> SpayNeuterInput {
        let mut input = SpayNeuterInput::new("dog", "female", "10-25");
        input.include_pain_medication = true;
        input.include_e_collar = true;
        input
    }

    #[test]
    fn test_base_scenario_total() {
        let est = estimate(&scenario(), tables()).unwrap();
        assert_eq!(est.total, Dollars(482.0));
        assert_eq!(est.line_items.len(), 3);
        assert_eq!(est.line_items[0].amount, Dollars(455.0));
        assert_eq!(est.line_items[0].label, "Spay - Dog (10-25 lbs)");
        assert_eq!(est.line_items[1].label, "Pain medication");
        assert_eq!(est.line_items[2].label, "E-collar (cone)");
    }

    #[test]
    fn test_multi_pet_discount() {
        let mut input = scenario();
        input.number_of_pets = 3;
        let est = estimate(&input, tables()).unwrap();

        let discount = est.items_of(LineItemKind::Discount).next().unwrap();
        assert_eq!(discount.display_amount(), Dollars(-48.2));
        assert_eq!(est.total, Dollars(433.8));
    }

    #[test]
    fn test_discount_capped_at_twenty_percent() {
        let mut input = scenario();
        input.number_of_pets = 10;
        let est = estimate(&input, tables()).unwrap();
        let discount = est.items_of(LineItemKind::Discount).next().unwrap();
        assert_eq!(discount.display_amount(), Dollars(-96.4));
        assert_eq!(est.total, Dollars(385.6));
    }

    #[test]
    fn test_multipliers_apply_in_order() {
        let mut input = SpayNeuterInput::new("cat", "male", "under-10");
        input.clinic_tier = "low-cost-clinic".to_string();
        input.region = "West Coast".to_string();
        input.area = "urban".to_string();
        let est = estimate(&input, tables()).unwrap();
        let expected = 175.0 * 1.0 * 0.45 * 1.25 * 1.15;
        assert!((est.line_items[0].amount.0 - expected).abs() < 1e-9);
        assert_eq!(est.line_items[0].label, "Neuter - Cat (under-10 lbs)");
    }

    #[test]
    fn test_gender_gated_fees() {
        let mut input = SpayNeuterInput::new("dog", "male", "25-50");
        input.is_pregnant = true;
        input.is_in_heat = true;
        input.is_cryptorchid = true;
        let est = estimate(&input, tables()).unwrap();
        let fees: Vec<&str> = est
            .items_of(LineItemKind::ConditionalFee)
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(fees, vec!["Cryptorchid surgery"]);
    }

    #[test]
    fn test_fees_in_declaration_order() {
        let mut input = scenario();
        input.is_obese = true;
        input.is_pregnant = true;
        input.age_months = 96;
        let est = estimate(&input, tables()).unwrap();
        let fees: Vec<&str> = est
            .items_of(LineItemKind::ConditionalFee)
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(fees, vec!["Pregnancy surcharge", "Obesity surcharge", "Senior pre-op exam"]);
        assert_eq!(est.total, Dollars(482.0 + 150.0 + 50.0 + 95.0));
    }

    #[test]
    fn test_voucher_floors_at_zero() {
        let mut input = scenario();
        input.voucher_credit = 5_000.0;
        let est = estimate(&input, tables()).unwrap();
        assert_eq!(est.total.0, 0.0);
        let credit = est.items_of(LineItemKind::Credit).next().unwrap();
        assert_eq!(credit.amount, Dollars(-482.0));
    }

    #[test]
    fn test_unknown_categories() {
        let mut input = scenario();
        input.species = "dragon".to_string();
        assert_eq!(
            estimate(&input, tables()).unwrap_err(),
            CalcError::unknown_category("species", "dragon")
        );

        let mut input = scenario();
        input.gender = "unknown".to_string();
        assert_eq!(
            estimate(&input, tables()).unwrap_err(),
            CalcError::unknown_category("gender", "unknown")
        );

        // Cats have no 50-100 tier
        let input = SpayNeuterInput::new("cat", "female", "50-100");
        assert_eq!(
            estimate(&input, tables()).unwrap_err(),
            CalcError::unknown_category("weight_tier", "50-100")
        );

        let mut input = scenario();
        input.region = "Atlantis".to_string();
        assert_eq!(
            estimate(&input, tables()).unwrap_err(),
            CalcError::unknown_category("region", "Atlantis")
        );
    }

    #[test]
    fn test_domain_errors() {
        let mut input = scenario();
        input.number_of_pets = 0;
        assert_eq!(estimate(&input, tables()).unwrap_err().field(), Some("number_of_pets"));

        let mut input = scenario();
        input.voucher_credit = -10.0;
        assert_eq!(estimate(&input, tables()).unwrap_err().field(), Some("voucher_credit"));

        let mut input = scenario();
        input.age_months = 400;
        assert_eq!(estimate(&input, tables()).unwrap_err().field(), Some("age_months"));
    }

    #[test]
    fn test_default_comparisons() {
        let est = estimate(&scenario(), tables()).unwrap();
        let tiers = est.comparison("clinic_tier").unwrap();
        assert_eq!(tiers.rows.len(), 5);
        assert_eq!(tiers.selected().unwrap().value, "private-practice");
        assert_eq!(tiers.selected().unwrap().total, est.total);
        assert_eq!(tiers.cheapest().unwrap().value, "animal-shelter");

        let methods = est.comparison("procedure_method").unwrap();
        assert_eq!(methods.rows.len(), 3);
        assert!(!methods.row("laparoscopic").unwrap().pros.is_empty());
    }

    #[test]
    fn test_compare_regions() {
        let table = compare("region", &["Northeast", "Midwest"], &scenario(), tables()).unwrap();
        assert_eq!(table.rows[0].total, Dollars(573.0));
        assert_eq!(table.rows[1].total, Dollars(427.4));
        assert!(table.selected().is_none());
    }

    #[test]
    fn test_references_use_modified_procedure() {
        let mut input = scenario();
        input.clinic_tier = "specialty-hospital".to_string();
        input.region = "Northeast".to_string();
        input.area = "urban".to_string();
        let est = estimate(&input, tables()).unwrap();

        assert_eq!(est.references.len(), 2);
        assert!((est.references[0].amount.0 - 455.0 * 1.6).abs() < 1e-9);
        assert_eq!(est.references[1].label, "Northeast average");
        assert!((est.references[1].amount.0 - 455.0 * 1.6 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_procedure_cost_matches_base_line_item() {
        let mut input = SpayNeuterInput::new("cat", "male", "under-10");
        input.procedure_method = "laser".to_string();
        input.clinic_tier = "mobile-clinic".to_string();
        input.region = "Southeast".to_string();
        input.area = "rural".to_string();
        input.is_obese = true;
        let cost = procedure_cost(&input, tables()).unwrap();
        assert!((cost.0 - 175.0 * 1.2 * 0.6 * 0.9 * 0.85).abs() < 1e-9);

        let est = estimate(&input, tables()).unwrap();
        assert!((est.line_items[0].amount.0 - cost.0).abs() < 1e-9);
    }

    #[test]
    fn test_advice_ordering_and_content() {
        let mut input = scenario();
        input.is_pregnant = true;
        input.number_of_pets = 2;
        let est = estimate(&input, tables()).unwrap();

        let first = &est.advice[0];
        assert_eq!(first.kind, AdviceKind::Warning);
        assert!(first.message.contains("pregnant"));

        let tips: Vec<&str> = est.advice_of(AdviceKind::SavingTip).collect();
        assert!(tips.iter().any(|t| t.contains("animal shelter program")));
        assert!(tips.iter().any(|t| t.contains("5% multi-pet")));

        assert_eq!(est.advice.last().unwrap().kind, AdviceKind::NextStep);
    }

    #[test]
    fn test_advice_does_not_change_total() {
        let mut quiet = scenario();
        quiet.voucher_credit = 0.0;
        let mut noisy = quiet.clone();
        noisy.age_months = 1;
        assert_eq!(
            estimate(&quiet, tables()).unwrap().total,
            estimate(&noisy, tables()).unwrap().total
        );
    }

    #[test]
    fn test_input_json_defaults() {
        let json = r#"{ "species": "dog", "gender": "female", "weight_tier": "10-25" }"#;
        let input: SpayNeuterInput = serde_json::from_str(json).unwrap();
        assert_eq!(input, SpayNeuterInput::new("dog", "female", "10-25"));
    }
}
