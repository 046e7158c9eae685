//! # Crop Rotation Planner
//!
//! Season budget and multi-year bed rotation for a vegetable garden.
//!
//! ## Season Budget
//!
//! - Base: the primary crop's plant/seed cost per 100 sq ft, scaled by area
//! - Multiplier: soil type
//! - Conditional fees: pH correction (outside 5.5-7.5), fertilizer for heavy feeders
//! - Add-ons: each soil amendment (`area/100 * rate * price`), cover crop seed
//! - Bulk discount: 2% per bed beyond the first, capped at 10%
//! - Garden grant credit, never taking the total below zero
//!
//! ## Rotation
//!
//! Families are grouped (legumes, leaf & heavy feeders, fruiting, roots).
//! Each bed advances one group per year so no family returns to a bed
//! before its rest period is over.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::crop_rotation;
//! use calc_core::rules;
//! use calc_core::units::SquareFeet;
//!
//! let tables = rules::builtin().unwrap();
//! let compost = crop_rotation::soil_amendment("compost", SquareFeet(250.0), &tables.crop_rotation).unwrap();
//! assert_eq!(compost.amount, 5.0);
//! assert_eq!(compost.unit, "inches");
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{
    self, Advice, Charge, ComparisonTable, Dimension, Estimate, Estimator, PercentDiscount, PricingPlan,
};
use crate::errors::{CalcError, CalcResult};
use crate::rules::{self, DimensionRow, DiscountRule, RuleTable};
use crate::units::{Dollars, SquareFeet};

/// Below this pH most vegetables struggle
pub const PH_LOW: f64 = 5.5;

/// Above this pH most vegetables struggle
pub const PH_HIGH: f64 = 7.5;

pub const MAX_AREA_SQ_FT: f64 = 1_000_000.0;
pub const MAX_BEDS: u32 = 50;
pub const MAX_ROTATION_YEARS: u32 = 10;
pub const MAX_GARDEN_GRANT: f64 = 1_000_000.0;

const TABLE_NAME: &str = "crop_rotation";

// ============================================================================
// Rule Tables
// ============================================================================

/// How much a family draws on soil nitrogen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feeder {
    NitrogenFixer,
    Light,
    Medium,
    Heavy,
}

impl Feeder {
    pub fn display_name(&self) -> &'static str {
        match self {
            Feeder::NitrogenFixer => "Nitrogen fixer",
            Feeder::Light => "Light feeder",
            Feeder::Medium => "Medium feeder",
            Feeder::Heavy => "Heavy feeder",
        }
    }
}

/// A plant family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRow {
    pub name: String,
    /// Index into `rotation_groups`
    pub group: usize,
    pub feeder: Feeder,
    /// Minimum years before the family returns to the same bed
    pub years_between: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRow {
    pub name: String,
    /// Key into the families table
    pub family: String,
    pub cost_per_100_sq_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmendmentRow {
    pub name: String,
    /// Application rate, in `unit`, per 100 sq ft
    pub rate_per_100_sq_ft: f64,
    pub unit: String,
    /// Cost of one `unit` spread over 100 sq ft
    pub price_per_unit: f64,
    pub purpose: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFees {
    pub ph_correction: f64,
    pub heavy_feeder_fertilizer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverCropRow {
    pub name: String,
    pub cost_per_100_sq_ft: f64,
}

/// Reference data for the crop rotation planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRotationTables {
    /// Group names in rotation order
    pub rotation_groups: Vec<String>,
    pub families: RuleTable<FamilyRow>,
    pub crops: RuleTable<CropRow>,
    pub soil_types: RuleTable<DimensionRow>,
    pub amendments: RuleTable<AmendmentRow>,
    pub fees: CropFees,
    pub cover_crop: CoverCropRow,
    pub bulk_discount: DiscountRule,
}

impl CropRotationTables {
    /// Parse and validate from TOML.
    pub fn from_toml(text: &str) -> CalcResult<Self> {
        let tables: CropRotationTables = rules::parse_asset(TABLE_NAME, text)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> CalcResult<()> {
        if self.rotation_groups.is_empty() {
            return Err(CalcError::rule_table(TABLE_NAME, "no rotation groups defined"));
        }
        for (key, family) in self.families.iter() {
            if family.group >= self.rotation_groups.len() {
                return Err(CalcError::rule_table(
                    TABLE_NAME,
                    format!("family '{}' has group {} but only {} groups exist", key, family.group, self.rotation_groups.len()),
                ));
            }
        }
        for (key, crop) in self.crops.iter() {
            if !self.families.contains(&crop.family) {
                return Err(CalcError::rule_table(
                    TABLE_NAME,
                    format!("crop '{}' refers to unknown family '{}'", key, crop.family),
                ));
            }
            rules::validate_non_negative(TABLE_NAME, key, crop.cost_per_100_sq_ft)?;
        }
        rules::validate_dimension("crop_rotation.soil_types", &self.soil_types)?;
        for (key, amendment) in self.amendments.iter() {
            if !amendment.rate_per_100_sq_ft.is_finite() || amendment.rate_per_100_sq_ft <= 0.0 {
                return Err(CalcError::rule_table(
                    TABLE_NAME,
                    format!("amendment '{}' must have a positive rate", key),
                ));
            }
            rules::validate_non_negative(TABLE_NAME, key, amendment.price_per_unit)?;
        }
        rules::validate_non_negative(TABLE_NAME, "pH correction fee", self.fees.ph_correction)?;
        rules::validate_non_negative(TABLE_NAME, "fertilizer fee", self.fees.heavy_feeder_fertilizer)?;
        rules::validate_non_negative(TABLE_NAME, "cover crop cost", self.cover_crop.cost_per_100_sq_ft)?;
        self.bulk_discount.validate(TABLE_NAME)
    }

    /// Crop row together with its family row
    fn crop_with_family(&self, field: &str, key: &str) -> CalcResult<(&CropRow, &FamilyRow)> {
        let crop = self.crops.resolve(field, key)?;
        let family = self.families.resolve("family", &crop.family)?;
        Ok((crop, family))
    }

    /// Resolve every key in `crops` and `previous_crops`
    fn resolve_crop_lists(&self, input: &CropRotationInput) -> CalcResult<()> {
        for key in &input.crops {
            self.crop_with_family("crops", key)?;
        }
        for key in &input.previous_crops {
            self.crop_with_family("previous_crops", key)?;
        }
        Ok(())
    }
}

// ============================================================================
// Input
// ============================================================================

/// Input for the crop rotation planner.
///
/// ## JSON Example
///
/// ```json
/// {
///   "garden_area_sq_ft": 250.0,
///   "number_of_beds": 4,
///   "primary_crop": "tomato",
///   "crops": ["bean", "kale", "carrot"],
///   "soil_type": "clay",
///   "amendments": ["compost", "gypsum"],
///   "soil_ph": 6.4
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRotationInput {
    /// Total planted area
    pub garden_area_sq_ft: f64,

    #[serde(default = "default_number_of_beds")]
    pub number_of_beds: u32,

    /// Crop key the season budget is priced on
    pub primary_crop: String,

    /// Other crop keys to place in the rotation
    #[serde(default)]
    pub crops: Vec<String>,

    /// What each bed grew last season, by bed (crop keys)
    #[serde(default)]
    pub previous_crops: Vec<String>,

    #[serde(default = "default_soil_type")]
    pub soil_type: String,

    /// Amendment keys to apply over the whole area
    #[serde(default)]
    pub amendments: Vec<String>,

    #[serde(default)]
    pub include_cover_crop: bool,

    #[serde(default = "default_soil_ph")]
    pub soil_ph: f64,

    #[serde(default = "default_rotation_years")]
    pub rotation_years: u32,

    /// Community garden grant or voucher, in dollars
    #[serde(default)]
    pub garden_grant: f64,
}

fn default_number_of_beds() -> u32 {
    1
}

fn default_soil_type() -> String {
    "loam".to_string()
}

fn default_soil_ph() -> f64 {
    6.5
}

fn default_rotation_years() -> u32 {
    4
}

impl CropRotationInput {
    /// One loam bed at pH 6.5, four-year rotation, no amendments.
    pub fn new(garden_area_sq_ft: f64, primary_crop: impl Into<String>) -> Self {
        CropRotationInput {
            garden_area_sq_ft,
            number_of_beds: default_number_of_beds(),
            primary_crop: primary_crop.into(),
            crops: Vec::new(),
            previous_crops: Vec::new(),
            soil_type: default_soil_type(),
            amendments: Vec::new(),
            include_cover_crop: false,
            soil_ph: default_soil_ph(),
            rotation_years: default_rotation_years(),
            garden_grant: 0.0,
        }
    }

    /// Validate numeric fields.
    pub fn validate(&self) -> CalcResult<()> {
        validate_area(self.garden_area_sq_ft)?;
        if self.number_of_beds == 0 || self.number_of_beds > MAX_BEDS {
            return Err(CalcError::domain(
                "number_of_beds",
                self.number_of_beds.to_string(),
                format!("Must be between 1 and {}", MAX_BEDS),
            ));
        }
        if !self.soil_ph.is_finite() || !(3.0..=10.0).contains(&self.soil_ph) {
            return Err(CalcError::domain(
                "soil_ph",
                self.soil_ph.to_string(),
                "Soil pH must be between 3.0 and 10.0",
            ));
        }
        if self.rotation_years == 0 || self.rotation_years > MAX_ROTATION_YEARS {
            return Err(CalcError::domain(
                "rotation_years",
                self.rotation_years.to_string(),
                format!("Must be between 1 and {}", MAX_ROTATION_YEARS),
            ));
        }
        if !self.garden_grant.is_finite() || self.garden_grant < 0.0 || self.garden_grant > MAX_GARDEN_GRANT {
            return Err(CalcError::domain(
                "garden_grant",
                self.garden_grant.to_string(),
                "Grant must be between 0 and 1,000,000",
            ));
        }
        if self.previous_crops.len() > self.number_of_beds as usize {
            return Err(CalcError::domain(
                "previous_crops",
                self.previous_crops.len().to_string(),
                "More previous crops than beds",
            ));
        }
        let mut seen = BTreeSet::new();
        for amendment in &self.amendments {
            if !seen.insert(amendment.as_str()) {
                return Err(CalcError::domain("amendments", amendment.clone(), "Listed more than once"));
            }
        }
        Ok(())
    }

    fn area(&self) -> SquareFeet {
        SquareFeet(self.garden_area_sq_ft)
    }

    fn has_amendment(&self, key: &str) -> bool {
        self.amendments.iter().any(|a| a == key)
    }

    /// Primary crop followed by the other crops, without duplicates
    fn all_crops(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        std::iter::once(self.primary_crop.as_str())
            .chain(self.crops.iter().map(String::as_str))
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

fn validate_area(area_sq_ft: f64) -> CalcResult<()> {
    if !area_sq_ft.is_finite() || area_sq_ft <= 0.0 {
        return Err(CalcError::domain(
            "garden_area_sq_ft",
            area_sq_ft.to_string(),
            "Area must be positive",
        ));
    }
    if area_sq_ft > MAX_AREA_SQ_FT {
        return Err(CalcError::domain(
            "garden_area_sq_ft",
            area_sq_ft.to_string(),
            "Area exceeds 1,000,000 sq ft",
        ));
    }
    Ok(())
}

// ============================================================================
// Soil Amendments
// ============================================================================

/// How much of one amendment to apply, and what it costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmendmentAmount {
    pub amendment: String,
    pub name: String,
    /// Quantity in `unit`
    pub amount: f64,
    pub unit: String,
    pub cost: Dollars,
    pub purpose: String,
}

/// Amount of `amendment` needed for `area`: `area / 100 * rate`.
pub fn soil_amendment(amendment: &str, area: SquareFeet, tables: &CropRotationTables) -> CalcResult<AmendmentAmount> {
    validate_area(area.0)?;
    let row = tables.amendments.resolve("amendment", amendment)?;
    Ok(amendment_amount(amendment, row, area))
}

fn amendment_amount(key: &str, row: &AmendmentRow, area: SquareFeet) -> AmendmentAmount {
    let amount = area.hundreds() * row.rate_per_100_sq_ft;
    AmendmentAmount {
        amendment: key.to_string(),
        name: row.name.clone(),
        amount,
        unit: row.unit.clone(),
        cost: Dollars(amount * row.price_per_unit),
        purpose: row.purpose.clone(),
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// The crop rotation season-budget estimator.
pub struct CropRotation;

impl Estimator for CropRotation {
    type Input = CropRotationInput;
    type Tables = CropRotationTables;

    const NAME: &'static str = "crop_rotation";
    const DEFAULT_COMPARISONS: &'static [&'static str] = &["soil_type"];

    fn validate(input: &CropRotationInput) -> CalcResult<()> {
        input.validate()
    }

    fn plan(input: &CropRotationInput, tables: &CropRotationTables) -> CalcResult<PricingPlan<CropRotationInput>> {
        let (crop, family) = tables.crop_with_family("primary_crop", &input.primary_crop)?;
        tables.resolve_crop_lists(input)?;
        let soil = tables.soil_types.resolve("soil_type", &input.soil_type)?;
        let area = input.area();

        let base = Charge::new(
            format!("Plants & seed - {}", crop.name),
            Dollars(area.hundreds() * crop.cost_per_100_sq_ft),
            format!("{} sq ft at {} per 100 sq ft", area.0, Dollars(crop.cost_per_100_sq_ft)),
        );

        let heavy_feeder = family.feeder == Feeder::Heavy;
        let mut plan = PricingPlan::new(base)
            .with_multiplier("soil_type", soil.name.clone(), soil.multiplier)
            .with_fee(
                "pH correction",
                Dollars(tables.fees.ph_correction),
                format!("Soil test and corrective amendment (target {}-{})", PH_LOW, PH_HIGH),
                |i: &CropRotationInput| i.soil_ph < PH_LOW || i.soil_ph > PH_HIGH,
            )
            .with_fee(
                "Heavy-feeder fertilizer",
                Dollars(tables.fees.heavy_feeder_fertilizer),
                format!("{} is a heavy feeder", family.name),
                move |_: &CropRotationInput| heavy_feeder,
            );

        for key in &input.amendments {
            let row = tables.amendments.resolve("amendments", key)?;
            let amount = amendment_amount(key, row, area);
            plan = plan.with_add_on(Charge::new(
                row.name.clone(),
                amount.cost,
                format!("{:.1} {}", amount.amount, amount.unit),
            ));
        }

        if input.include_cover_crop {
            plan = plan.with_add_on(Charge::new(
                tables.cover_crop.name.clone(),
                Dollars(area.hundreds() * tables.cover_crop.cost_per_100_sq_ft),
                "Sown after harvest",
            ));
        }

        let bulk = tables.bulk_discount;
        plan = plan
            .with_discount(PercentDiscount::new(
                "Bulk purchase discount",
                bulk.per_unit,
                input.number_of_beds.saturating_sub(1),
                bulk.cap,
            ))
            .with_credit(Charge::new("Garden grant", Dollars(input.garden_grant), ""));

        Ok(plan)
    }

    fn advise(input: &CropRotationInput, tables: &CropRotationTables) -> Vec<Advice> {
        let mut advice = Vec::new();
        let primary = tables.crop_with_family("primary_crop", &input.primary_crop).ok();

        // Soil and rotation warnings
        if input.soil_ph < PH_LOW && !input.has_amendment("lime") {
            advice.push(Advice::warning(format!(
                "Soil pH {:.1} is too acidic for most vegetables; add garden lime.",
                input.soil_ph
            )));
        }
        if input.soil_ph > PH_HIGH && !input.has_amendment("sulfur") {
            advice.push(Advice::warning(format!(
                "Soil pH {:.1} is too alkaline for most vegetables; add elemental sulfur.",
                input.soil_ph
            )));
        }
        if input.has_amendment("lime") && input.has_amendment("sulfur") {
            advice.push(Advice::warning(
                "Lime raises pH and sulfur lowers it; applying both cancels them out.",
            ));
        }
        if let Some((crop, family)) = primary {
            // Keys already resolved by `plan`, which runs before advice
            for (bed, previous) in input.previous_crops.iter().enumerate() {
                let Ok((prev_crop, prev_family)) = tables.crop_with_family("previous_crops", previous) else {
                    continue;
                };
                if prev_crop.family == crop.family {
                    advice.push(Advice::warning(format!(
                        "Bed {} grew {} last season; {} is the same family ({}). Wait {} years before replanting it there.",
                        bed + 1,
                        prev_crop.name,
                        crop.name,
                        prev_family.name,
                        family.years_between
                    )));
                }
            }
            if family.feeder == Feeder::Heavy && !input.has_amendment("compost") && !input.has_amendment("aged-manure") {
                advice.push(Advice::warning(format!(
                    "{} is a heavy feeder; work in compost or aged manure before planting.",
                    crop.name
                )));
            }
        }
        if input.soil_type == "clay" && !input.has_amendment("gypsum") && !input.has_amendment("compost") {
            advice.push(Advice::warning(
                "Clay soil compacts easily; gypsum or compost will improve drainage.",
            ));
        }

        // Cost savings
        if !input.include_cover_crop {
            let cost = Dollars(input.area().hundreds() * tables.cover_crop.cost_per_100_sq_ft);
            advice.push(Advice::saving_tip(format!(
                "A legume cover crop (about {}) adds free nitrogen for next season.",
                cost.rounded()
            )));
        }
        if input.number_of_beds > 1 {
            let rate = PercentDiscount::new(
                "",
                tables.bulk_discount.per_unit,
                input.number_of_beds - 1,
                tables.bulk_discount.cap,
            )
            .rate();
            advice.push(Advice::saving_tip(format!(
                "Buying supplies for all {} beds at once earns a {:.0}% bulk discount.",
                input.number_of_beds,
                rate * 100.0
            )));
        }
        if input.garden_grant == 0.0 {
            advice.push(Advice::saving_tip(
                "Community garden programs and extension offices often offer grants or free compost.",
            ));
        }

        // Next steps
        advice.push(Advice::next_step(
            "Test soil pH and nutrients before buying amendments.",
        ));
        advice.push(Advice::next_step(format!(
            "Rotate each bed one group per season: {}.",
            tables.rotation_groups.join(" -> ")
        )));
        if input.include_cover_crop {
            advice.push(Advice::next_step(
                "Sow the cover crop right after harvest and turn it under 3 weeks before planting.",
            ));
        }

        advice
    }

    fn dimension<'t>(tables: &'t CropRotationTables, key: &str) -> CalcResult<Dimension<'t, CropRotationInput>> {
        match key {
            "soil_type" => Ok(Dimension {
                key: "soil_type",
                rows: &tables.soil_types,
                get: |i| i.soil_type.as_str(),
                set: |i, v| i.soil_type = v.to_string(),
            }),
            other => Err(CalcError::unknown_category("dimension", other)),
        }
    }
}

/// Price the season budget.
pub fn estimate(input: &CropRotationInput, tables: &CropRotationTables) -> CalcResult<Estimate> {
    engine::estimate::<CropRotation>(input, tables)
}

/// Compare totals across values of one dimension ("soil_type").
pub fn compare<S: AsRef<str>>(
    dimension: &str,
    candidates: &[S],
    input: &CropRotationInput,
    tables: &CropRotationTables,
) -> CalcResult<ComparisonTable> {
    engine::compare_across::<CropRotation, S>(dimension, candidates, input, tables)
}

// ============================================================================
// Rotation Schedule
// ============================================================================

/// What one bed grows in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedAssignment {
    /// 1-based bed number
    pub bed: u32,
    pub group: String,
    /// Crop display names; empty means cover crop or rest
    pub crops: Vec<String>,
    /// Family keys of `crops`
    pub families: Vec<String>,
}

/// One year of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationYear {
    /// 1-based year number
    pub year: u32,
    pub beds: Vec<BedAssignment>,
}

/// A family returning to a bed before its rest period is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConflict {
    pub bed: u32,
    /// Year the family returns (0 = last season)
    pub year: u32,
    pub family: String,
    pub message: String,
}

/// Beds x years rotation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationPlan {
    pub groups: Vec<String>,
    pub years: Vec<RotationYear>,
    pub conflicts: Vec<RotationConflict>,
}

impl RotationPlan {
    /// Assignment for a 1-based bed and year
    pub fn assignment(&self, bed: u32, year: u32) -> Option<&BedAssignment> {
        self.years
            .iter()
            .find(|y| y.year == year)?
            .beds
            .iter()
            .find(|b| b.bed == bed)
    }
}

/// Build a rotation schedule for every bed over `rotation_years`.
///
/// A bed with a known previous crop starts at the group after that crop's
/// group; other beds are staggered so neighbouring beds start on
/// different groups.
///
/// # Errors
///
/// - `CalcError::Domain` for out-of-range numeric fields
/// - `CalcError::UnknownCategory` for unknown crop keys in `primary_crop`,
///   `crops` or `previous_crops`
pub fn plan_rotation(input: &CropRotationInput, tables: &CropRotationTables) -> CalcResult<RotationPlan> {
    input.validate()?;
    let group_count = tables.rotation_groups.len();

    // Crops by rotation group, as (display name, family key)
    let mut by_group: Vec<Vec<(&str, &str)>> = vec![Vec::new(); group_count];
    for (i, key) in input.all_crops().into_iter().enumerate() {
        let field = if i == 0 { "primary_crop" } else { "crops" };
        let (crop, family) = tables.crop_with_family(field, key)?;
        by_group[family.group].push((crop.name.as_str(), crop.family.as_str()));
    }

    let mut start_groups = Vec::with_capacity(input.number_of_beds as usize);
    let mut history: Vec<Vec<Vec<String>>> = Vec::with_capacity(input.number_of_beds as usize);
    for bed in 0..input.number_of_beds as usize {
        match input.previous_crops.get(bed) {
            Some(previous) => {
                let (crop, family) = tables.crop_with_family("previous_crops", previous)?;
                start_groups.push((family.group + 1) % group_count);
                history.push(vec![vec![crop.family.clone()]]);
            }
            None => {
                start_groups.push(bed % group_count);
                history.push(vec![Vec::new()]);
            }
        }
    }

    let mut years = Vec::with_capacity(input.rotation_years as usize);
    for year in 0..input.rotation_years as usize {
        let mut beds = Vec::with_capacity(start_groups.len());
        for (bed, start) in start_groups.iter().enumerate() {
            let group = (start + year) % group_count;
            let crops = &by_group[group];
            let families: Vec<String> = crops
                .iter()
                .map(|(_, family)| family.to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            history[bed].push(families.clone());
            beds.push(BedAssignment {
                bed: bed as u32 + 1,
                group: tables.rotation_groups[group].clone(),
                crops: crops.iter().map(|(name, _)| name.to_string()).collect(),
                families,
            });
        }
        years.push(RotationYear {
            year: year as u32 + 1,
            beds,
        });
    }

    let mut conflicts = Vec::new();
    for (bed, seasons) in history.iter().enumerate() {
        conflicts.extend(check_bed_history(bed as u32 + 1, seasons, tables)?);
    }

    debug!(
        beds = input.number_of_beds,
        years = input.rotation_years,
        conflicts = conflicts.len(),
        "rotation planned"
    );

    Ok(RotationPlan {
        groups: tables.rotation_groups.clone(),
        years,
        conflicts,
    })
}

/// Find families that return to a bed too soon.
///
/// `seasons[0]` is last season; `seasons[n]` is planned year `n`. Each
/// season lists family keys.
///
/// # Errors
///
/// `CalcError::UnknownCategory` for a family key not in the families table.
pub fn check_bed_history(
    bed: u32,
    seasons: &[Vec<String>],
    tables: &CropRotationTables,
) -> CalcResult<Vec<RotationConflict>> {
    let mut conflicts = Vec::new();
    for (later, families) in seasons.iter().enumerate() {
        for family_key in families {
            let family = tables.families.resolve("family", family_key)?;
            let earlier = seasons[..later]
                .iter()
                .rposition(|season| season.contains(family_key));
            if let Some(earlier) = earlier {
                let gap = (later - earlier) as u32;
                if gap < family.years_between {
                    conflicts.push(RotationConflict {
                        bed,
                        year: later as u32,
                        family: family_key.clone(),
                        message: format!(
                            "{} returns to bed {} after {} year(s); it needs {}",
                            family.name, bed, gap, family.years_between
                        ),
                    });
                }
            }
        }
    }
    Ok(conflicts)
}
