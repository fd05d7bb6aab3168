//! Statistics cache integration tests

use internship_tracker::domain::{Bucket, InternshipState};
use internship_tracker::statistics::{
    clean_campaign_statistics, clean_statistics, CampaignInternshipCounters, CampaignStatistics,
    Statistics, StatisticsCache,
};
use serde_json::json;

/// Cache seeded with the dashboard fixture used across these tests
fn seeded_cache() -> StatisticsCache {
    let global = clean_statistics(&json!({
        "internships": { "total": 250, "availables": 150, "validated": 100 },
        "students": 150,
        "mentors": 200
    }));
    let campaign = clean_campaign_statistics(&json!({
        "internships": { "total": 250, "availables": 150, "validated": 100 },
        "students": 150,
        "mentors": 200,
        "campaign": 10
    }))
    .expect("campaign 10 should be accepted");

    let cache = StatisticsCache::new();
    cache.init(global, vec![campaign]);
    cache
}

#[test]
fn test_add_then_remove_student_is_identity() {
    let cache = seeded_cache();
    let statistics = cache.statistics();
    let campaigns = cache.campaigns();

    cache.add_student(None);
    assert_eq!(cache.statistics().students, statistics.students + 1);
    cache.remove_student(None);
    assert_eq!(cache.statistics(), statistics);
    assert_eq!(cache.campaigns(), campaigns);

    cache.add_student(Some(10));
    assert_eq!(cache.get_campaign(10).unwrap().students, 151);
    cache.remove_student(Some(10));
    assert_eq!(cache.statistics(), statistics);
    assert_eq!(cache.campaigns(), campaigns);
}

#[test]
fn test_new_campaign_yields_zeroed_snapshot() {
    let cache = seeded_cache();

    cache.new_campaign(80, CampaignStatistics::default());

    assert!(cache.is_defined(80));
    assert_eq!(cache.get_campaign(80), Some(CampaignStatistics::empty(80)));
    assert_eq!(
        serde_json::to_value(cache.get_campaign(80).unwrap()).unwrap(),
        json!({
            "internships": { "total": 0, "availables": 0, "attributed": 0 },
            "students": 0,
            "mentors": 0,
            "propositions": 0,
            "campaign": 80
        })
    );
}

#[test]
fn test_transfer_from_empty_bucket_is_noop() {
    let cache = seeded_cache();
    cache.new_campaign(
        30,
        CampaignStatistics {
            internships: CampaignInternshipCounters {
                total: 4,
                availables: 4,
                attributed: 0,
            },
            ..CampaignStatistics::default()
        },
    );
    let before = cache.get_campaign(30);
    let ignored = cache.ignored_operations();

    cache.validated_to_available(30);

    assert_eq!(cache.get_campaign(30), before);
    assert_eq!(cache.ignored_operations(), ignored + 1);

    // The opposite direction has a unit to move
    cache.available_to_validated(30);
    let after = cache.get_campaign(30).unwrap();
    assert_eq!(after.internships.availables, 3);
    assert_eq!(after.internships.attributed, 1);
    assert_eq!(after.internships.total, 4);
}

#[test]
fn test_transfer_on_unknown_campaign_creates_nothing() {
    let cache = seeded_cache();

    cache.available_to_validated(99);

    assert!(!cache.is_defined(99));
}

#[test]
fn test_inc_availables_on_known_and_unknown_campaign() {
    let cache = seeded_cache();

    cache.inc_internship_availables(10);

    let global = cache.statistics();
    assert_eq!(global.internships.availables, 151);
    assert_eq!(global.internships.total, 251);
    let campaign = cache.get_campaign(10).unwrap();
    assert_eq!(campaign.internships.availables, 151);
    assert_eq!(campaign.internships.total, 251);
    assert_eq!(campaign.internships.attributed, 100);

    cache.inc_internship_availables(25);

    let created = cache.get_campaign(25).expect("campaign 25 should exist");
    let expected = clean_campaign_statistics(&json!({
        "internships": { "total": 1, "availables": 1, "validated": 0 },
        "students": 0,
        "mentors": 0,
        "campaign": 25
    }))
    .unwrap();
    assert_eq!(created, expected);
    assert_eq!(cache.statistics().internships.availables, 152);
}

#[test]
fn test_reset_lifecycle() {
    let cache = StatisticsCache::new();

    // Uninitialized reset changes nothing, however often it runs
    cache.reset();
    cache.reset();
    assert!(!cache.is_initialized());
    assert_eq!(cache.statistics(), Statistics::default());

    let cache = seeded_cache();
    assert!(cache.is_initialized());

    cache.reset();
    assert!(!cache.is_initialized());
    assert_eq!(cache.statistics(), Statistics::default());
    assert!(cache.campaigns().is_empty());

    cache.init(
        clean_statistics(&json!({ "internships": { "total": 3, "waiting": 3 }, "students": 2 })),
        vec![CampaignStatistics::empty(4)],
    );
    assert!(cache.is_initialized());
    assert_eq!(cache.statistics().internships.waiting, 3);
    assert_eq!(cache.statistics().students, 2);
    assert!(cache.is_defined(4));
}

#[test]
fn test_second_init_is_ignored() {
    let cache = seeded_cache();
    let before = cache.statistics();

    cache.init(Statistics::default(), Vec::new());

    assert_eq!(cache.statistics(), before);
    assert!(cache.is_defined(10));
}

#[test]
fn test_invalid_campaign_ids_are_ignored() {
    let cache = seeded_cache();
    let ignored = cache.ignored_operations();

    cache.new_campaign(0, CampaignStatistics::default());
    cache.link_mentor(-3);
    cache.inc_internship_availables(0);

    assert!(!cache.is_defined(0));
    assert!(!cache.is_defined(-3));
    // The global side of the increment still applies
    assert_eq!(cache.statistics().internships.availables, 151);
    assert!(cache.ignored_operations() >= ignored + 3);
}

#[test]
fn test_counters_never_go_negative() {
    let cache = StatisticsCache::new();
    cache.init(Statistics::default(), Vec::new());

    cache.remove_mentor();
    cache.state_remove(Bucket::Waiting, -2, None);

    let statistics = cache.statistics();
    assert_eq!(statistics.mentors, 0);
    assert_eq!(statistics.internships.waiting, 0);
    assert_eq!(statistics.internships.total, 0);
    assert!(cache.ignored_operations() >= 2);
}

#[test]
fn test_state_change_moves_one_unit() {
    let cache = seeded_cache();

    cache.state_change(Bucket::Attributed, Some(Bucket::Available), Some(10));

    let global = cache.statistics();
    assert_eq!(global.internships.availables, 149);
    assert_eq!(global.internships.attributed, 1);
    assert_eq!(global.internships.total, 250);

    let campaign = cache.get_campaign(10).unwrap();
    assert_eq!(campaign.internships.availables, 149);
    assert_eq!(campaign.internships.attributed, 101);
}

#[test]
fn test_state_change_without_previous_bucket() {
    let cache = seeded_cache();

    cache.state_change(Bucket::Waiting, None, None);

    let global = cache.statistics();
    assert_eq!(global.internships.waiting, 1);
    assert_eq!(global.internships.availables, 150);
    assert_eq!(global.internships.total, 250);
}

#[test]
fn test_remove_student_from_unknown_campaign_creates_nothing() {
    let cache = seeded_cache();

    cache.remove_student(Some(42));

    assert!(!cache.is_defined(42));
    assert_eq!(cache.statistics().students, 149);
    assert_eq!(cache.campaigns().len(), 1);
}

#[test]
fn test_record_transition_between_campaigns() {
    let cache = seeded_cache();

    cache.record_transition(
        InternshipState::AvailableCampaign,
        InternshipState::AttributedMentor,
        Some(10),
        Some(20),
    );

    let global = cache.statistics();
    assert_eq!(global.internships.availables, 149);
    assert_eq!(global.internships.attributed, 1);
    assert_eq!(global.internships.total, 250);

    let left = cache.get_campaign(10).unwrap();
    assert_eq!(left.internships.total, 249);
    assert_eq!(left.internships.availables, 149);
    assert_eq!(left.internships.attributed, 100);

    let joined = cache.get_campaign(20).expect("campaign 20 should exist");
    assert_eq!(joined.internships.total, 1);
    assert_eq!(joined.internships.availables, 0);
    assert_eq!(joined.internships.attributed, 1);
}

#[test]
fn test_oversized_removal_keeps_total_equal_to_bucket_sum() {
    let cache = seeded_cache();
    let ignored = cache.ignored_operations();

    cache.state_remove(Bucket::Available, -151, Some(10));

    let global = cache.statistics();
    let bucket_sum: u64 = Bucket::ALL
        .iter()
        .map(|&bucket| global.internships.get(bucket))
        .sum();
    assert_eq!(global.internships.availables, 150);
    assert_eq!(global.internships.total, bucket_sum);
    assert_eq!(cache.get_campaign(10).unwrap().internships.total, 250);
    assert_eq!(cache.ignored_operations(), ignored + 2);
}
