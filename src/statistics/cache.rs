//! Statistics Cache
//!
//! In-memory placement counters served to dashboards without touching the
//! database. One global snapshot plus one snapshot per campaign.
//!
//! Mutators never fail. Input that cannot be applied (non-positive ids,
//! unknown campaigns where one is required, sign mismatches, decrements
//! below zero) is logged at debug level and counted in
//! [`StatisticsCache::ignored_operations`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{Bucket, CampaignBucket, InternshipEvent, InternshipState};
use crate::workflow::TransitionObserver;

use super::snapshot::{apply_delta, CampaignStatistics, Statistics};

#[derive(Debug, Default)]
struct CacheState {
    initialized: bool,
    statistics: Statistics,
    campaigns: HashMap<i64, CampaignStatistics>,
    ignored: u64,
}

impl CacheState {
    fn ignore(&mut self, operation: &'static str, campaign: Option<i64>, reason: &'static str) {
        self.ignored += 1;
        tracing::debug!(operation, campaign = ?campaign, reason, "Statistics operation ignored");
    }

    fn campaign_mut(&mut self, id: i64) -> &mut CampaignStatistics {
        self.campaigns
            .entry(id)
            .or_insert_with(|| CampaignStatistics::empty(id))
    }

    /// Resolve a campaign id for a get-or-create mutation
    fn valid_campaign(&mut self, operation: &'static str, id: i64) -> bool {
        if id > 0 {
            true
        } else {
            self.ignore(operation, Some(id), "invalid campaign id");
            false
        }
    }

    /// Resolve a campaign id that must already be known
    fn known_campaign(&mut self, operation: &'static str, id: i64) -> bool {
        if self.campaigns.contains_key(&id) {
            true
        } else {
            self.ignore(operation, Some(id), "unknown campaign");
            false
        }
    }

    fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Bucket(bucket) => self.statistics.internships.bucket_mut(bucket),
            Counter::Total => &mut self.statistics.internships.total,
            Counter::Scalar(scalar) => {
                let stats = &mut self.statistics;
                scalar.select(&mut stats.mentors, &mut stats.students, &mut stats.propositions)
            }
            Counter::CampaignBucket(id, bucket) => {
                self.campaign_mut(id).internships.bucket_mut(bucket)
            }
            Counter::CampaignTotal(id) => &mut self.campaign_mut(id).internships.total,
            Counter::CampaignScalar(id, scalar) => {
                let snapshot = self.campaign_mut(id);
                scalar.select(&mut snapshot.mentors, &mut snapshot.students, &mut snapshot.propositions)
            }
        }
    }

    fn delta(&mut self, operation: &'static str, campaign: Option<i64>, counter: Counter, delta: i64) {
        if !apply_delta(self.counter_mut(counter), delta) {
            self.ignore(operation, campaign, "counter already at zero");
        }
    }

    /// Apply `delta` to every counter in `counters` or to none of them
    fn delta_all(&mut self, operation: &'static str, campaign: Option<i64>, counters: &[Counter], delta: i64) {
        let floor = delta.unsigned_abs();
        if delta < 0 && counters.iter().any(|&counter| *self.counter_mut(counter) < floor) {
            self.ignore(operation, campaign, "counter would drop below zero");
            return;
        }
        for &counter in counters {
            apply_delta(self.counter_mut(counter), delta);
        }
    }

    /// Move one internship between global buckets
    fn shift_global(&mut self, operation: &'static str, prev: Option<Bucket>, next: Bucket) {
        if prev == Some(next) {
            return;
        }
        if let Some(prev) = prev {
            self.delta(operation, None, Counter::Bucket(prev), -1);
        }
        self.delta(operation, None, Counter::Bucket(next), 1);
    }

    /// Move one internship between the buckets a campaign tracks
    fn shift_campaign(&mut self, operation: &'static str, id: i64, prev: Option<Bucket>, next: Bucket) {
        self.campaign_mut(id);
        if prev == Some(next) {
            return;
        }
        if let Some(counter) = prev.and_then(Bucket::campaign_counter) {
            self.delta(operation, Some(id), Counter::CampaignBucket(id, counter), -1);
        }
        if let Some(counter) = next.campaign_counter() {
            self.delta(operation, Some(id), Counter::CampaignBucket(id, counter), 1);
        }
    }

    /// Signed adjustment of a bucket and the total it belongs to. The
    /// bucket and its total move together or not at all. Removals only
    /// reach campaigns that already exist.
    fn adjust(&mut self, operation: &'static str, bucket: Bucket, qty: i64, campaign: Option<i64>) {
        self.delta_all(operation, None, &[Counter::Bucket(bucket), Counter::Total], qty);

        if let Some(id) = campaign {
            let resolved = if qty < 0 {
                self.known_campaign(operation, id)
            } else {
                self.valid_campaign(operation, id)
            };
            if resolved {
                self.adjust_campaign(operation, id, Some(bucket), qty);
            }
        }
    }

    fn adjust_campaign(&mut self, operation: &'static str, id: i64, bucket: Option<Bucket>, qty: i64) {
        let total = Counter::CampaignTotal(id);
        match bucket.and_then(Bucket::campaign_counter) {
            Some(counter) => {
                self.delta_all(operation, Some(id), &[total, Counter::CampaignBucket(id, counter)], qty)
            }
            None => self.delta_all(operation, Some(id), &[total], qty),
        }
    }
}

/// Which counter a delta lands on
#[derive(Debug, Clone, Copy)]
enum Counter {
    Bucket(Bucket),
    Total,
    Scalar(Scalar),
    CampaignBucket(i64, CampaignBucket),
    CampaignTotal(i64),
    CampaignScalar(i64, Scalar),
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Mentors,
    Students,
    Propositions,
}

impl Scalar {
    fn select<'a>(
        self,
        mentors: &'a mut u64,
        students: &'a mut u64,
        propositions: &'a mut u64,
    ) -> &'a mut u64 {
        match self {
            Scalar::Mentors => mentors,
            Scalar::Students => students,
            Scalar::Propositions => propositions,
        }
    }
}

/// Process-wide placement counters
///
/// Share one instance through an `Arc`; every method takes `&self` and
/// serializes on a single internal mutex.
#[derive(Debug, Default)]
pub struct StatisticsCache {
    state: Mutex<CacheState>,
}

impl StatisticsCache {
    /// Create an empty, uninitialized cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Counters stay usable even if a holder panicked mid-update
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Seed the cache. Ignored when already initialized.
    pub fn init(&self, global: Statistics, campaigns: impl IntoIterator<Item = CampaignStatistics>) {
        let mut state = self.lock();
        if state.initialized {
            state.ignore("init", None, "already initialized");
            return;
        }

        state.statistics = global;
        state.campaigns.clear();
        for snapshot in campaigns {
            if snapshot.campaign > 0 {
                state.campaigns.insert(snapshot.campaign, snapshot);
            } else {
                state.ignore("init", Some(snapshot.campaign), "invalid campaign id");
            }
        }
        state.initialized = true;

        tracing::info!(
            internships = state.statistics.internships.total,
            campaigns = state.campaigns.len(),
            "Statistics cache initialized"
        );
    }

    /// Zero every counter and forget all campaigns. Ignored when not
    /// initialized.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !state.initialized {
            state.ignore("reset", None, "not initialized");
            return;
        }

        state.statistics = Statistics::default();
        state.campaigns.clear();
        state.initialized = false;
        tracing::info!("Statistics cache reset");
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Count of mutations absorbed as no-ops since creation
    pub fn ignored_operations(&self) -> u64 {
        self.lock().ignored
    }

    // =========================================================================
    // Internship buckets
    // =========================================================================

    /// Move one internship from `prev` into `next`, globally and on
    /// `campaign` when given. Campaigns only track their own buckets.
    pub fn state_change(&self, next: Bucket, prev: Option<Bucket>, campaign: Option<i64>) {
        let mut state = self.lock();
        state.shift_global("state_change", prev, next);

        if let Some(id) = campaign {
            if state.valid_campaign("state_change", id) {
                state.shift_campaign("state_change", id, prev, next);
            }
        }
    }

    /// Add `qty` internships to `bucket`. Only positive quantities apply.
    pub fn state_add(&self, bucket: Bucket, qty: i64, campaign: Option<i64>) {
        let mut state = self.lock();
        if qty <= 0 {
            state.ignore("state_add", campaign, "quantity must be positive");
            return;
        }
        state.adjust("state_add", bucket, qty, campaign);
    }

    /// Remove `-qty` internships from `bucket`. Only negative quantities
    /// apply.
    pub fn state_remove(&self, bucket: Bucket, qty: i64, campaign: Option<i64>) {
        let mut state = self.lock();
        if qty >= 0 {
            state.ignore("state_remove", campaign, "quantity must be negative");
            return;
        }
        state.adjust("state_remove", bucket, qty, campaign);
    }

    pub fn inc_internship_availables(&self, campaign: i64) {
        self.state_add(Bucket::Available, 1, Some(campaign));
    }

    pub fn dec_internship_availables(&self, campaign: i64) {
        self.state_remove(Bucket::Available, -1, Some(campaign));
    }

    /// Fold a committed workflow transition into the counters
    pub fn record_transition(
        &self,
        previous: InternshipState,
        next: InternshipState,
        previous_campaign: Option<i64>,
        campaign: Option<i64>,
    ) {
        const OP: &str = "record_transition";
        let (from, to) = (previous.bucket(), next.bucket());
        let mut state = self.lock();

        state.shift_global(OP, Some(from), to);

        match (previous_campaign, campaign) {
            (Some(before), Some(after)) if before == after => {
                if state.valid_campaign(OP, after) {
                    state.shift_campaign(OP, after, Some(from), to);
                }
            }
            (before, after) => {
                if let Some(id) = before {
                    if state.known_campaign(OP, id) {
                        state.adjust_campaign(OP, id, Some(from), -1);
                    }
                }
                if let Some(id) = after {
                    if state.valid_campaign(OP, id) {
                        state.adjust_campaign(OP, id, Some(to), 1);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Mentors, students, propositions
    // =========================================================================

    pub fn add_mentor(&self) {
        self.lock().delta("add_mentor", None, Counter::Scalar(Scalar::Mentors), 1);
    }

    pub fn remove_mentor(&self) {
        self.lock().delta("remove_mentor", None, Counter::Scalar(Scalar::Mentors), -1);
    }

    pub fn link_mentor(&self, campaign: i64) {
        self.campaign_scalar("link_mentor", campaign, Scalar::Mentors, 1);
    }

    pub fn unlink_mentor(&self, campaign: i64) {
        self.campaign_scalar("unlink_mentor", campaign, Scalar::Mentors, -1);
    }

    pub fn add_student(&self, campaign: Option<i64>) {
        self.global_and_campaign("add_student", campaign, Scalar::Students, 1);
    }

    pub fn remove_student(&self, campaign: Option<i64>) {
        self.global_and_campaign("remove_student", campaign, Scalar::Students, -1);
    }

    pub fn link_student(&self, campaign: i64) {
        self.campaign_scalar("link_student", campaign, Scalar::Students, 1);
    }

    pub fn add_proposition(&self, campaign: Option<i64>) {
        self.global_and_campaign("add_proposition", campaign, Scalar::Propositions, 1);
    }

    pub fn remove_proposition(&self, campaign: Option<i64>) {
        self.global_and_campaign("remove_proposition", campaign, Scalar::Propositions, -1);
    }

    pub fn link_proposition(&self, campaign: i64) {
        self.campaign_scalar("link_proposition", campaign, Scalar::Propositions, 1);
    }

    /// Per-campaign scalar adjustment, creating the snapshot if needed
    fn campaign_scalar(&self, operation: &'static str, campaign: i64, scalar: Scalar, delta: i64) {
        let mut state = self.lock();
        if state.valid_campaign(operation, campaign) {
            state.delta(operation, Some(campaign), Counter::CampaignScalar(campaign, scalar), delta);
        }
    }

    /// Global adjustment, mirrored on the campaign when one is given.
    /// Decrements only reach campaigns that already exist.
    fn global_and_campaign(&self, operation: &'static str, campaign: Option<i64>, scalar: Scalar, delta: i64) {
        let mut state = self.lock();
        state.delta(operation, None, Counter::Scalar(scalar), delta);

        let Some(id) = campaign else {
            return;
        };
        let resolved = if delta < 0 {
            state.known_campaign(operation, id)
        } else {
            state.valid_campaign(operation, id)
        };
        if resolved {
            state.delta(operation, Some(id), Counter::CampaignScalar(id, scalar), delta);
        }
    }

    // =========================================================================
    // Campaign transfers
    // =========================================================================

    /// Move one internship of `campaign` from attributed back to available
    pub fn validated_to_available(&self, campaign: i64) {
        self.transfer(
            "validated_to_available",
            campaign,
            CampaignBucket::Attributed,
            CampaignBucket::Availables,
        );
    }

    /// Move one internship of `campaign` from available to attributed
    pub fn available_to_validated(&self, campaign: i64) {
        self.transfer(
            "available_to_validated",
            campaign,
            CampaignBucket::Availables,
            CampaignBucket::Attributed,
        );
    }

    fn transfer(
        &self,
        operation: &'static str,
        campaign: i64,
        from: CampaignBucket,
        to: CampaignBucket,
    ) {
        let mut state = self.lock();
        if !state.known_campaign(operation, campaign) {
            return;
        }
        if state.campaign_mut(campaign).internships.get(from) == 0 {
            state.ignore(operation, Some(campaign), "source bucket empty");
            return;
        }

        let snapshot = state.campaign_mut(campaign);
        *snapshot.internships.bucket_mut(from) -= 1;
        *snapshot.internships.bucket_mut(to) += 1;
    }

    // =========================================================================
    // Campaign snapshots
    // =========================================================================

    /// Create or overwrite a campaign snapshot. The id always wins over
    /// `partial.campaign`.
    pub fn new_campaign(&self, id: i64, partial: CampaignStatistics) {
        let mut state = self.lock();
        if !state.valid_campaign("new_campaign", id) {
            return;
        }
        state.campaigns.insert(
            id,
            CampaignStatistics {
                campaign: id,
                ..partial
            },
        );
    }

    pub fn is_defined(&self, id: i64) -> bool {
        self.lock().campaigns.contains_key(&id)
    }

    pub fn get_campaign(&self, id: i64) -> Option<CampaignStatistics> {
        self.lock().campaigns.get(&id).copied()
    }

    /// All campaign snapshots ordered by campaign id
    pub fn campaigns(&self) -> Vec<CampaignStatistics> {
        let mut campaigns: Vec<_> = self.lock().campaigns.values().copied().collect();
        campaigns.sort_by_key(|c| c.campaign);
        campaigns
    }

    /// Global snapshot
    pub fn statistics(&self) -> Statistics {
        self.lock().statistics
    }
}

impl TransitionObserver for StatisticsCache {
    fn on_event(&self, event: &InternshipEvent) {
        match event {
            InternshipEvent::Created { state, .. } => self.state_add(state.bucket(), 1, None),
            InternshipEvent::StateChanged {
                previous,
                next,
                previous_campaign,
                campaign,
                ..
            } => self.record_transition(*previous, *next, *previous_campaign, *campaign),
        }
    }
}
