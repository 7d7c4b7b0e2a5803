use proptest::prelude::*;
use quiver_core::matching::{evaluate_arrow, MatchRequest};
use quiver_core::model::spine::classify;
use quiver_core::model::{ArrowRecord, BowConfiguration, BowType, SpineSpecRecord};
use quiver_core::spine::{calculate_foc, calculate_required_spine, FocInput, SpineRequest};

fn bow_type() -> impl Strategy<Value = BowType> {
    prop_oneof![
        Just(BowType::Compound),
        Just(BowType::Recurve),
        Just(BowType::Traditional),
    ]
}

fn record(spines: &[i64], od: f64, gpi: f64) -> ArrowRecord {
    ArrowRecord {
        id: 1,
        manufacturer: "Gold Tip".to_string(),
        model_name: "Pierce".to_string(),
        material: Some("Carbon".to_string()),
        carbon_content: None,
        arrow_type: None,
        description: None,
        image_url: None,
        source_url: None,
        recommended_use: None,
        price_range: None,
        spine_specifications: spines
            .iter()
            .enumerate()
            .map(|(i, s)| SpineSpecRecord {
                id: i as i64,
                arrow_id: 1,
                spine: Some(*s),
                outer_diameter: Some(od),
                inner_diameter: None,
                gpi_weight: Some(gpi),
                diameter_category: None,
                length_options: Vec::new(),
                wall_thickness: None,
                insert_weight_range: None,
                nock_size: None,
                notes: None,
            })
            .collect(),
    }
}

proptest! {
    #[test]
    fn spine_range_brackets_optimal(
        draw_weight in 15.0f64..90.0,
        arrow_length in 22.0f64..34.0,
        point_weight in 50.0f64..300.0,
        bow_type in bow_type(),
        wood in any::<bool>(),
    ) {
        let bow = BowConfiguration::new(draw_weight, 28.0, bow_type);
        let mut request = SpineRequest::new(arrow_length).with_point_weight(point_weight);
        if wood {
            request = request.with_material("wood");
        }
        let result = calculate_required_spine(&bow, &request).unwrap();
        prop_assert!(result.spine_range.minimum < result.spine_range.optimal);
        prop_assert!(result.spine_range.optimal < result.spine_range.maximum);
        prop_assert_eq!(result.spine_range.optimal, result.calculated_spine);
    }

    #[test]
    fn diameter_classes_never_shrink(a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(small) <= classify(large));
    }

    #[test]
    fn foc_weights_add_up(
        length in 20.0f64..34.0,
        point in 50.0f64..300.0,
        shaft in 100.0f64..500.0,
    ) {
        let foc = calculate_foc(&FocInput::new(length, point, shaft)).unwrap();
        prop_assert!((foc.front_weight + foc.back_weight - foc.total_weight).abs() < 0.16);
        prop_assert!(foc.balance_point > 0.0 && foc.balance_point < length);
    }

    #[test]
    fn match_scores_stay_in_bounds(
        draw_weight in 30.0f64..80.0,
        spines in proptest::collection::vec(150i64..1200, 1..10),
        od in 0.15f64..0.45,
        gpi in 3.0f64..20.0,
        foc_low in 0.0f64..20.0,
    ) {
        let mut request = MatchRequest::new(
            BowConfiguration::new(draw_weight, 28.0, BowType::Compound),
            28.0,
        );
        request.target_diameter_range = Some((0.2, 0.3));
        request.target_foc_range = Some((foc_low, foc_low + 4.0));
        request.preferred_manufacturers = vec!["Easton".to_string()];
        let spine = calculate_required_spine(&request.bow, &request.spine_request()).unwrap();

        let m = evaluate_arrow(&record(&spines, od, gpi), &spine, &request).unwrap();
        prop_assert!(m.match_score >= 0.0 && m.match_score <= 100.0);
        prop_assert!(spines.contains(&m.matched_spine));
    }
}
