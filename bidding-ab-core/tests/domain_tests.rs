use bidding_ab_core::domain::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn table() -> ExperimentTable {
    let control = vec![
        CampaignRecord::new(100_000.0, 5_000.0, 500.0, 2_000.0),
        CampaignRecord::new(120_000.0, 0.0, 0.0, 0.0),
    ];
    let test = vec![
        CampaignRecord::new(110_000.0, 4_000.0, 600.0, 2_500.0),
        CampaignRecord::new(90_000.0, 3_000.0, 300.0, 1_500.0),
    ];
    let stats = vec![
        GroupLoadStats::new(Group::Control, "Control Group"),
        GroupLoadStats::new(Group::Test, "Test Group"),
    ];
    ExperimentTable::concat(control, test, stats).unwrap()
}

#[test]
fn test_group_labels_and_methods() {
    assert_eq!(Group::Control.to_string(), "Control");
    assert_eq!(Group::Test.to_string(), "Test");
    assert_eq!(Group::Control.bidding_method(), BiddingMethod::MaximumBidding);
    assert_eq!(Group::Test.bidding_method().to_string(), "average bidding");
}

#[rstest]
#[case(Metric::Purchase, Group::Control, vec![500.0, 0.0])]
#[case(Metric::Earning, Group::Test, vec![2_500.0, 1_500.0])]
#[case(Metric::ConversionRate, Group::Control, vec![0.1])]
#[case(Metric::ConversionRate, Group::Test, vec![0.15, 0.1])]
fn test_sample_extraction(#[case] metric: Metric, #[case] group: Group, #[case] expected: Vec<f64>) {
    assert_eq!(table().sample(group, metric), expected);
}

#[test]
fn test_every_record_has_one_group() {
    let table = table();
    let total: usize = Group::ALL.iter().map(|g| table.group_len(*g)).sum();
    assert_eq!(total, table.len());
}

#[test]
fn test_load_stats_lookup() {
    let table = table();
    assert_eq!(table.load_stats(Group::Test).unwrap().origin, "Test Group");
}

#[test]
fn test_labeled_record_serializes_flat() {
    let record = LabeledRecord {
        group: Group::Control,
        record: CampaignRecord::new(1.0, 2.0, 3.0, 4.0),
    };
    let value = serde_json::to_value(record).unwrap();

    assert_eq!(value["group"], "control");
    assert_eq!(value["purchase"], 3.0);
}
