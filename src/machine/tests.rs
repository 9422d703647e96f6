use super::*;
use crate::chemicals::{
    models::create_chemical, quantities::models::QuantityType, services::add_quantity,
};
use crate::common::test_helpers::{
    assign_design_values, create_test_design, create_test_plate, create_test_project,
    setup_test_db,
};
use rstest::rstest;

#[rstest]
#[case("media=LB", vec![("media", vec!["LB"])])]
#[case(
    " media = LB , M9 ;temperature=37",
    vec![("media", vec!["LB", "M9"]), ("temperature", vec!["37"])]
)]
#[case("media=LB\nstrain=wt,", vec![("media", vec!["LB"]), ("strain", vec!["wt"])])]
#[case("media=LB;;", vec![("media", vec!["LB"])])]
fn test_query_parse(#[case] text: &str, #[case] expected: Vec<(&str, Vec<&str>)>) {
    let query = Query::parse(text).unwrap();
    let parsed: Vec<(&str, Vec<&str>)> = query
        .criteria()
        .map(|(field, values)| (field, values.iter().map(String::as_str).collect()))
        .collect();
    assert_eq!(parsed, expected);
}

#[rstest]
#[case("media")]
#[case("media=")]
#[case("media= , ")]
fn test_query_parse_rejects_malformed(#[case] text: &str) {
    let err = Query::parse(text).unwrap_err();
    assert!(matches!(err, MachineError::InvalidInput { .. }), "{err:?}");
}

#[test]
fn test_reserved_fields_are_not_grouping_fields() {
    let query = Query::parse("media=LB; include=strain,temperature; plates=P1").unwrap();
    assert_eq!(query.grouping_fields(), vec!["media"]);
    assert_eq!(query.include(), ["strain", "temperature"]);
    assert_eq!(query.plates().unwrap(), ["P1"]);
    assert_eq!(query.to_string(), "{media=LB; include=strain,temperature; plates=P1}");
}

#[test]
fn test_insert_replaces_values() {
    let query = Query::new().with("media", ["LB"]).with("media", ["M9", " "]);
    assert_eq!(query.values("media").unwrap(), ["M9"]);
}

/// Ten wells on one plate; wells 1-4 grown in LB, the rest in M9. Well 10
/// has no temperature.
async fn media_plate(db: &sea_orm::DatabaseConnection) -> Vec<wells::Model> {
    let project = create_test_project(db).await;
    let (_, wells) = create_test_plate(db, project.id, "P1", 10).await;

    let media = create_test_design(db, "media", DesignType::Str).await;
    let media_values: Vec<Option<&str>> = (1..=10)
        .map(|n| Some(if n <= 4 { "LB" } else { "M9" }))
        .collect();
    assign_design_values(db, &media, &wells, &media_values).await;

    let temperature = create_test_design(db, "temperature", DesignType::Float).await;
    let temperature_values: Vec<Option<&str>> = (1..=10)
        .map(|n| match n {
            10 => None,
            n if n % 2 == 0 => Some("37"),
            _ => Some("30.0"),
        })
        .collect();
    assign_design_values(db, &temperature, &wells, &temperature_values).await;

    wells
}

#[tokio::test]
async fn test_filter_single_criterion() {
    let db = setup_test_db().await;
    let wells = media_plate(&db).await;

    let selected = Machine::new(&db)
        .filter(&Query::new().with("media", ["LB"]))
        .await
        .unwrap();

    assert_eq!(selected.len(), 4);
    let expected: Vec<Uuid> = wells[..4].iter().map(|w| w.id).collect();
    let got: Vec<Uuid> = selected.iter().map(|w| w.id).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_filter_criteria_combine_with_and() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let selected = Machine::new(&db)
        .filter(&Query::parse("media=LB; temperature=37").unwrap())
        .await
        .unwrap();

    // Wells 2 and 4
    let numbers: Vec<i32> = selected.iter().map(|w| w.plate_number).collect();
    assert_eq!(numbers, vec![2, 4]);
}

#[tokio::test]
async fn test_filter_any_accepted_value_matches() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let selected = Machine::new(&db)
        .filter(&Query::new().with("media", ["LB", "M9"]))
        .await
        .unwrap();
    assert_eq!(selected.len(), 10);
}

#[tokio::test]
async fn test_numeric_design_matches_by_number() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let machine = Machine::new(&db);
    let by_text = machine
        .filter(&Query::new().with("temperature", ["30.0"]))
        .await
        .unwrap();
    let by_number = machine
        .filter(&Query::new().with("temperature", ["30"]))
        .await
        .unwrap();
    assert_eq!(by_text.len(), 5);
    assert_eq!(by_number.len(), 5);
}

#[tokio::test]
async fn test_wells_without_value_do_not_match() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let selected = Machine::new(&db)
        .filter(&Query::new().with("temperature", ["37", "30"]))
        .await
        .unwrap();
    assert_eq!(selected.len(), 9);
}

#[tokio::test]
async fn test_unknown_field_is_not_empty_result() {
    let db = setup_test_db().await;
    media_plate(&db).await;
    let machine = Machine::new(&db);

    let err = machine
        .search(&Query::new().with("colour", ["red"]))
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::UnknownField { ref field } if field == "colour"));

    let err = machine
        .search(&Query::new().with("media", ["TSB"]))
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::EmptyResult { .. }), "{err:?}");
}

#[tokio::test]
async fn test_unknown_include_field() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let err = Machine::new(&db)
        .search(&Query::parse("media=LB; include=nonsense").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::UnknownField { ref field } if field == "nonsense"));
}

#[tokio::test]
async fn test_get_with_no_wells_is_empty_result() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let err = Machine::new(&db)
        .get(&[], &["media".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::EmptyResult { .. }));
}

#[tokio::test]
async fn test_search_builds_dataset() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let dataset = Machine::new(&db)
        .search(&Query::parse("media=LB; include=temperature").unwrap())
        .await
        .unwrap();

    assert_eq!(dataset.columns, vec!["media", "temperature"]);
    assert_eq!(dataset.len(), 4);
    assert!(dataset.rows.iter().all(|r| r.plate == "P1"));
    assert!(dataset.rows.iter().all(|r| r.series.len() == 3));

    let media = dataset.column("media").unwrap();
    assert!(
        media
            .iter()
            .all(|v| *v == Some(&FieldValue::Str("LB".to_string())))
    );
    let temperature = dataset.column("temperature").unwrap();
    assert_eq!(temperature[0], Some(&FieldValue::Float(30.0)));
    assert_eq!(temperature[1], Some(&FieldValue::Float(37.0)));
}

#[tokio::test]
async fn test_empty_query_selects_every_well() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let dataset = Machine::new(&db)
        .search(&Query::parse("include=temperature").unwrap())
        .await
        .unwrap();
    assert_eq!(dataset.len(), 10);
    assert_eq!(dataset.missing("temperature").unwrap(), 1);
}

#[tokio::test]
async fn test_assert_complete_and_color_groups() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let dataset = Machine::new(&db)
        .search(&Query::parse("media=LB,M9; include=temperature").unwrap())
        .await
        .unwrap();

    let err = dataset.assert_complete("temperature").unwrap_err();
    assert!(matches!(
        err,
        MachineError::MissingValues { ref field, missing: 1 } if field == "temperature"
    ));
    assert!(matches!(
        dataset.color_groups("temperature").unwrap_err(),
        MachineError::MissingValues { .. }
    ));

    dataset.assert_complete("media").unwrap();
    assert_eq!(
        dataset.color_groups("media").unwrap(),
        vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1]
    );
    assert_eq!(
        dataset.unique_values("media").unwrap(),
        vec![
            FieldValue::Str("LB".to_string()),
            FieldValue::Str("M9".to_string())
        ]
    );
    assert!(matches!(
        dataset.column("strain").unwrap_err(),
        MachineError::UnknownField { .. }
    ));
}

#[tokio::test]
async fn test_plates_directive_restricts_selection() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let (_, first) = create_test_plate(&db, project.id, "P1", 3).await;
    let (_, second) = create_test_plate(&db, project.id, "P2", 3).await;

    let media = create_test_design(&db, "media", DesignType::Str).await;
    assign_design_values(&db, &media, &first, &[Some("LB"); 3]).await;
    assign_design_values(&db, &media, &second, &[Some("LB"); 3]).await;

    let machine = Machine::new(&db);
    let all = machine.filter(&Query::new().with("media", ["LB"])).await.unwrap();
    assert_eq!(all.len(), 6);

    let dataset = machine
        .search(&Query::parse("media=LB; plates=P2").unwrap())
        .await
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert!(dataset.rows.iter().all(|r| r.plate == "P2"));
    assert_eq!(dataset.columns, vec!["media"]);

    let err = machine
        .search(&Query::parse("media=LB; plates=P9").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::EmptyResult { .. }));
}

#[tokio::test]
async fn test_chemical_criterion_by_abbreviation() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let (_, wells) = create_test_plate(&db, project.id, "P1", 4).await;

    let glucose = create_chemical(&db, "glucose", Some("glc")).await.unwrap();
    for (well, amount) in wells.iter().zip([0.5, 1.0, 1.0, 2.0]) {
        add_quantity(&db, well.id, glucose.id, QuantityType::Concentration, amount)
            .await
            .unwrap();
    }

    let machine = Machine::new(&db);
    let by_abbreviation = machine
        .filter(&Query::new().with("glc", ["1"]))
        .await
        .unwrap();
    assert_eq!(by_abbreviation.len(), 2);

    let dataset = machine
        .search(&Query::new().with("glucose", ["1.0", "2"]))
        .await
        .unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(
        dataset.column("glucose").unwrap()[2],
        Some(&FieldValue::Float(2.0))
    );
}

#[tokio::test]
async fn test_design_wins_over_chemical_with_same_name() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let (_, wells) = create_test_plate(&db, project.id, "P1", 2).await;

    let design = create_test_design(&db, "iptg", DesignType::Str).await;
    assign_design_values(&db, &design, &wells, &[Some("yes"), Some("no")]).await;
    let chemical = create_chemical(&db, "iptg", None).await.unwrap();
    add_quantity(&db, wells[1].id, chemical.id, QuantityType::Concentration, 1.0)
        .await
        .unwrap();

    let selected = Machine::new(&db)
        .filter(&Query::new().with("iptg", ["yes"]))
        .await
        .unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, wells[0].id);
}

#[tokio::test]
async fn test_dataset_csv_export() {
    let db = setup_test_db().await;
    media_plate(&db).await;

    let dataset = Machine::new(&db)
        .search(&Query::parse("media=LB; include=temperature").unwrap())
        .await
        .unwrap();

    let mut buffer = Vec::new();
    dataset.write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "well_id,plate,plate_number,media,temperature"
    );
    assert!(lines.next().unwrap().ends_with(",P1,1,LB,30"));
    assert_eq!(text.lines().count(), 5);

    let mut series = Vec::new();
    dataset.write_series_csv(&mut series).unwrap();
    assert_eq!(String::from_utf8(series).unwrap().lines().count(), 1 + 4 * 3);
}

#[rstest]
#[case(DesignType::Str, " LB ", "LB", true)]
#[case(DesignType::Str, "37", "37.0", false)]
#[case(DesignType::Int, "37", "37.0", true)]
#[case(DesignType::Float, "0.1", "1e-1", true)]
#[case(DesignType::Bool, "True", "true", false)]
fn test_design_value_matches(
    #[case] design_type: DesignType,
    #[case] stored: &str,
    #[case] accepted: &str,
    #[case] expected: bool,
) {
    assert_eq!(design_value_matches(design_type, stored, accepted), expected);
}
