//! End-to-end checks over the load → preproc → lookup → summarize pipeline.

use chsi_atlas::data::{AgeGroup, Cause, Dataset, Ethnicity, LookupError};
use chsi_atlas::stats::StateAggregator;
use std::io::Write;
use tempfile::NamedTempFile;

fn dataset_from(csv: &str) -> Dataset {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(csv.as_bytes()).unwrap();
    let mut dataset = Dataset::load(tmp.path()).unwrap();
    dataset.preproc().unwrap();
    dataset
}

#[test]
fn ci_columns_vanish_and_lookup_sees_clean_values() {
    let dataset = dataset_from(
        "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,Strata_ID_Number,CI_D_Wh_Homicide,D_Wh_Homicide
6,1,Alameda,California,CA,1,-1111,5.0
",
    );

    assert!(!dataset.columns().iter().any(|c| c.contains("CI_")));

    let projection = dataset
        .lookup(AgeGroup::D, Ethnicity::Wh, Cause::Homicide)
        .unwrap();
    let pairs = Dataset::column_pairs(&projection, "D_Wh_Homicide").unwrap();
    assert_eq!(pairs, [("06001".to_string(), Some(5.0))]);
}

#[test]
fn county_view_survives_an_unusable_summary_input() {
    // No Strata_ID_Number column: the summary fails, the lookup path must not.
    let dataset = dataset_from(
        "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,A_Wh_Comp
48,201,Harris,Texas,TX,3.5
",
    );

    assert!(StateAggregator::summarize(&dataset).is_err());

    let projection = dataset
        .lookup(AgeGroup::A, Ethnicity::Wh, Cause::Comp)
        .unwrap();
    assert_eq!(projection.height(), 1);
}

#[test]
fn dashboard_round_trip() {
    let dataset = dataset_from(
        "\
State_FIPS_Code,County_FIPS_Code,CHSI_County_Name,CHSI_State_Name,CHSI_State_Abbreviation,Strata_ID_Number,A_Wh_Comp,D_Wh_Homicide,D_Bl_Homicide
48,201,Harris,Texas,TX,1,2.0,10.0,20.0
48,113,Dallas,Texas,TX,2,-2222.2,12.0,-1
6,37,Los Angeles,California,CA,3,4.0,6.0,8.0
",
    );

    // The dropdown guard: an unbacked combination is rejected up front and the
    // caller falls back to a selection that is known to exist.
    let selection = (AgeGroup::F, Ethnicity::Ot, Cause::Cancer);
    assert!(!dataset.has_column(selection.0, selection.1, selection.2));
    assert!(matches!(
        dataset.lookup(selection.0, selection.1, selection.2),
        Err(LookupError::ColumnNotFound(_))
    ));

    let projection = dataset
        .lookup(AgeGroup::A, Ethnicity::Wh, Cause::Comp)
        .unwrap();
    let texas = Dataset::filter_by_fips_prefix(&projection, "48").unwrap();
    assert_eq!(texas.height(), 2);

    let filled = Dataset::fill_missing(&texas, 0.0).unwrap();
    let pairs = Dataset::column_pairs(&filled, "A_Wh_Comp").unwrap();
    assert_eq!(
        pairs,
        [
            ("48201".to_string(), Some(2.0)),
            ("48113".to_string(), Some(0.0)),
        ]
    );

    let summary = StateAggregator::summarize(&dataset).unwrap();
    let rows = summary.rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].state_name, "California");
    assert_eq!(rows[1].state_name, "Texas");
    // Texas: D_Wh mean 11 over two counties, D_Bl mean 20 (sentinel ignored).
    assert_eq!(rows[1].rates["D_Homicide"], Some(15.5));
    assert_eq!(rows[1].rates["B_Injury"], None);

    // The rows serialize into the payload shape the chart layer consumes.
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[1]["state_fips"], "48");
    assert_eq!(json[1]["rates"]["D_Homicide"], 15.5);
}
