//! End-to-end calculator scenarios with known figures.

use calc_core::calculations::bmi::{self, BmiInput};
use calc_core::calculations::crop_rotation::{self, CropRotationInput};
use calc_core::calculations::spay_neuter::{self, SpayNeuterInput};
use calc_core::engine::{AdviceKind, LineItemKind};
use calc_core::input::{parse_in_range, sanitize_text};
use calc_core::rules::{self, RuleTables};
use calc_core::units::{Dollars, SquareFeet};
use calc_core::{CalcError, CalculatorRequest, CalculatorResponse};

fn tables() -> &'static RuleTables {
    rules::builtin().unwrap()
}

fn medium_dog() -> SpayNeuterInput {
    let mut input = SpayNeuterInput::new("dog", "female", "10-25");
    input.include_pain_medication = true;
    input.include_e_collar = true;
    input
}

#[test]
fn spay_medium_dog_with_recovery_add_ons() {
    let est = spay_neuter::estimate(&medium_dog(), &tables().spay_neuter).unwrap();

    assert_eq!(est.total, Dollars(482.0));
    assert_eq!(est.line_items.len(), 3);
    assert_eq!(est.line_items[0].amount, Dollars(455.0));
    assert_eq!(est.line_items[1].amount, Dollars(15.0));
    assert_eq!(est.line_items[2].amount, Dollars(12.0));
    assert_eq!(est.total.to_string(), "$482.00");
}

#[test]
fn spay_three_pets_gets_ten_percent_off() {
    let mut input = medium_dog();
    input.number_of_pets = 3;
    let est = spay_neuter::estimate(&input, &tables().spay_neuter).unwrap();

    let discount = est.items_of(LineItemKind::Discount).next().unwrap();
    assert_eq!(discount.display_amount(), Dollars(-48.2));
    assert_eq!(discount.display_amount().to_string(), "-$48.20");
    assert_eq!(est.total, Dollars(433.8));
}

#[test]
fn spay_estimate_carries_comparisons_and_references() {
    let est = spay_neuter::estimate(&medium_dog(), &tables().spay_neuter).unwrap();

    let tiers = est.comparison("clinic_tier").unwrap();
    assert_eq!(tiers.selected().unwrap().value, "private-practice");
    assert_eq!(tiers.cheapest().unwrap().value, "animal-shelter");
    assert!(est.comparison("procedure_method").is_some());

    assert_eq!(est.references.len(), 2);
    assert_eq!(est.references[0].amount, Dollars(455.0));
}

#[test]
fn spay_unknown_clinic_tier_is_rejected() {
    let mut input = medium_dog();
    input.clinic_tier = "luxury-spa".to_string();
    let err = spay_neuter::estimate(&input, &tables().spay_neuter).unwrap_err();

    assert_eq!(err, CalcError::unknown_category("clinic_tier", "luxury-spa"));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["type"], "UnknownCategory");
    assert_eq!(json["details"]["field"], "clinic_tier");
}

#[test]
fn compost_for_250_square_feet() {
    let compost = crop_rotation::soil_amendment("compost", SquareFeet(250.0), &tables().crop_rotation).unwrap();
    assert_eq!(compost.amount, 5.0);
    assert_eq!(compost.unit, "inches");
}

#[test]
fn garden_budget_and_rotation_from_json() {
    let json = r#"{
        "garden_area_sq_ft": 400,
        "number_of_beds": 4,
        "primary_crop": "tomato",
        "crops": ["bean", "kale", "carrot"],
        "soil_type": "clay",
        "amendments": ["compost"],
        "include_cover_crop": true
    }"#;
    let input: CropRotationInput = serde_json::from_str(json).unwrap();
    let tables = &tables().crop_rotation;

    let est = crop_rotation::estimate(&input, tables).unwrap();
    // 4 x $45 x 1.2 = 216, + $25 fertilizer, + $96 compost, + $12 cover crop
    // = 349, 6% bulk discount = 328.06
    assert_eq!(est.subtotal().rounded(), Dollars(349.0));
    assert_eq!(est.total, Dollars(328.06));
    assert!(est.advice_of(AdviceKind::Warning).next().is_none());

    let plan = crop_rotation::plan_rotation(&input, tables).unwrap();
    assert_eq!(plan.years.len(), 4);
    assert!(plan.conflicts.is_empty());
    for bed in 1..=4 {
        let groups: Vec<&str> = (1..=4)
            .map(|year| plan.assignment(bed, year).unwrap().group.as_str())
            .collect();
        let mut unique = groups.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 4, "bed {} repeats a group: {:?}", bed, groups);
    }
}

#[test]
fn bmi_metric_and_imperial_agree() {
    let metric = bmi::calculate(&BmiInput::metric(90.718474, 177.8), &tables().bmi).unwrap();
    let imperial = bmi::calculate(&BmiInput::imperial(200.0, 70.0), &tables().bmi).unwrap();
    assert_eq!(metric.bmi, imperial.bmi);
    assert_eq!(metric.category, imperial.category);
}

#[test]
fn tagged_request_runs_each_calculator() {
    let requests = [
        r#"{"calculator": "spay_neuter", "species": "dog", "gender": "female", "weight_tier": "10-25", "include_pain_medication": true, "include_e_collar": true}"#,
        r#"{"calculator": "crop_rotation", "garden_area_sq_ft": 100, "primary_crop": "lettuce"}"#,
        r#"{"calculator": "bmi", "weight": 150, "height": 68, "system": "imperial"}"#,
    ];
    let mut totals = Vec::new();
    for json in requests {
        let request: CalculatorRequest = serde_json::from_str(json).unwrap();
        match request.run(tables()).unwrap() {
            CalculatorResponse::Estimate(est) => totals.push(est.total),
            CalculatorResponse::Bmi(result) => assert_eq!(result.category, "normal"),
        }
    }
    assert_eq!(totals, vec![Dollars(482.0), Dollars(18.0)]);
}

#[test]
fn raw_form_values_pass_through_input_boundary() {
    let area = parse_in_range("garden_area_sq_ft", " 250 ", 1.0, 1_000_000.0).unwrap();
    let compost = crop_rotation::soil_amendment("compost", SquareFeet(area), &tables().crop_rotation).unwrap();
    assert_eq!(compost.amount, 5.0);

    let err = parse_in_range("garden_area_sq_ft", "lots", 1.0, 1_000_000.0).unwrap_err();
    assert_eq!(err.field(), Some("garden_area_sq_ft"));

    assert_eq!(sanitize_text("  <b>Biscuit</b> "), "bBiscuit/b");
}
