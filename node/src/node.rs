//! The polity node: drives the engines on a schedule.
//!
//! Two loops run side by side. The heartbeat opens polls, reviews judicial
//! challenges and resolves closed polls, strictly in that order. The
//! reconcile loop pulls the roster from the platform, pays income and
//! advances expired positions. Reconciliation rewrites the shared
//! [`CivicContext`], so at most one pass runs at a time.
//!
//! A tick that fails is logged and abandoned; the next tick starts over.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use polity_economy::{
    Blessing, Payday, Payroll, PositionEvent, PositionLifecycle, PricingEngine,
};
use polity_governance::{
    BallotSource, ChallengeEvent, CoinFlip, GovernanceEngine, ResolvedProposal, StoredBallots,
    ThreadCoin,
};
use polity_store::{
    MemoryStore, ProposalFilter, RegionRecord, Repository, RoleRecord, UserPatch, UserRecord,
};
use polity_types::{Clock, ProposalId, RoleId, SystemClock, UserId};

use crate::config::NodeConfig;
use crate::context::CivicContext;
use crate::dispatch::Dispatcher;
use crate::platform::{LogPlatform, Member, Notifier, PrivilegeGate, RosterSource};
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// The platform collaborators a node talks to.
#[derive(Clone)]
pub struct Platform {
    pub roster: Arc<dyn RosterSource>,
    pub gate: Arc<dyn PrivilegeGate>,
    pub notifier: Arc<dyn Notifier>,
}

impl Platform {
    /// Roster from `roster`; role changes and messages only go to the log.
    pub fn logging(roster: Arc<dyn RosterSource>) -> Self {
        Self {
            roster,
            gate: Arc::new(LogPlatform),
            notifier: Arc::new(LogPlatform),
        }
    }
}

/// Persists state after each tick.
pub trait Checkpoint: Send + Sync {
    fn checkpoint(&self) -> Result<(), NodeError>;
}

/// Writes a [`MemoryStore`] snapshot to a JSON file.
pub struct SnapshotCheckpoint {
    store: Arc<MemoryStore>,
    path: PathBuf,
}

impl SnapshotCheckpoint {
    pub fn new(store: Arc<MemoryStore>, path: PathBuf) -> Self {
        Self { store, path }
    }
}

impl Checkpoint for SnapshotCheckpoint {
    fn checkpoint(&self) -> Result<(), NodeError> {
        self.store.save(&self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeartbeatReport {
    pub opened: Vec<ProposalId>,
    pub challenges: Vec<ChallengeEvent>,
    pub resolved: Vec<ResolvedProposal>,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub members_added: usize,
    pub roles_added: usize,
    pub payday: Option<Payday>,
    pub positions: Vec<PositionEvent>,
}

pub struct PolityNode<S: ?Sized> {
    config: NodeConfig,
    store: Arc<S>,
    context: RwLock<CivicContext>,
    /// Held for the whole of a reconciliation pass.
    reconciling: Mutex<()>,
    governance: GovernanceEngine,
    lifecycle: PositionLifecycle,
    payroll: Payroll,
    dispatcher: Dispatcher,
    roster: Arc<dyn RosterSource>,
    gate: Arc<dyn PrivilegeGate>,
    clock: Arc<dyn Clock>,
    coin: Arc<dyn CoinFlip + Send + Sync>,
    /// Ballots come from the store unless a source is attached.
    ballots: Option<Arc<dyn BallotSource + Send + Sync>>,
    checkpoint: Option<Arc<dyn Checkpoint>>,
}

impl<S> PolityNode<S>
where
    S: Repository + Send + Sync + ?Sized + 'static,
{
    pub fn new(config: NodeConfig, store: Arc<S>, platform: Platform) -> Self {
        let pricing = PricingEngine::new(config.base_price, config.treasury_user.clone());
        Self {
            governance: GovernanceEngine::new(config.rules.clone(), config.challenge_window_hours),
            lifecycle: PositionLifecycle::new(
                pricing,
                config.priced_role.clone(),
                config.notify_on_role_loss,
            ),
            payroll: Payroll::new(config.treasury_user.clone(), config.rules.ubi_amount),
            dispatcher: Dispatcher::new(platform.gate.clone(), platform.notifier),
            gate: platform.gate,
            roster: platform.roster,
            clock: Arc::new(SystemClock),
            coin: Arc::new(ThreadCoin),
            ballots: None,
            checkpoint: None,
            context: RwLock::new(CivicContext::default()),
            reconciling: Mutex::new(()),
            store,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_coin(mut self, coin: Arc<dyn CoinFlip + Send + Sync>) -> Self {
        self.coin = coin;
        self
    }

    pub fn with_ballots(mut self, ballots: Arc<dyn BallotSource + Send + Sync>) -> Self {
        self.ballots = Some(ballots);
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Arc<dyn Checkpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn governance(&self) -> &GovernanceEngine {
        &self.governance
    }

    /// A copy of the current context.
    pub async fn context(&self) -> CivicContext {
        self.context.read().await.clone()
    }

    // ── Heartbeat ──────────────────────────────────────────────────────

    /// Open polls, review challenges, then resolve closed polls.
    pub async fn heartbeat(&self) -> Result<HeartbeatReport, NodeError> {
        let roster = self.context.read().await.judicial_roster();
        let now = self.clock.now();
        let store: &S = &self.store;

        let opened = self.governance.open_polls(store, now)?;

        let stored = StoredBallots::new(store);
        let ballots: &dyn BallotSource = match &self.ballots {
            Some(source) => source.as_ref(),
            None => &stored,
        };

        let challenges = if store.list_challenges(true)?.is_empty() {
            Vec::new()
        } else {
            match roster {
                Ok(roster) => self.governance.review_challenges(store, ballots, &roster, now)?,
                // Challenges wait for a bench; proposals still resolve.
                Err(e) => {
                    tracing::warn!(error = %e, "skipping challenge review");
                    self.dispatcher
                        .warn(&format!("challenges cannot be reviewed: {e}"));
                    Vec::new()
                }
            }
        };
        for event in &challenges {
            self.dispatcher.challenge_event(event, now);
        }

        let mut resolved = Vec::new();
        for proposal in store.list_proposals(ProposalFilter::Resolvable(now))? {
            let result =
                self.governance
                    .resolve_proposal(store, proposal.id, ballots, self.coin.as_ref())?;
            self.dispatcher.enact(store, &result, now)?;
            resolved.push(result);
        }

        Ok(HeartbeatReport {
            opened,
            challenges,
            resolved,
        })
    }

    // ── Member actions ─────────────────────────────────────────────────

    /// `actor` blesses the member called `name`: their position in the
    /// priced role runs two days longer and they are marked blessed.
    pub fn bless(&self, actor: &UserId, name: &str) -> Result<Blessing, NodeError> {
        let (Some(pope), Some(blessed), Some(blessable)) = (
            &self.config.pope_role,
            &self.config.blessed_role,
            &self.config.priced_role,
        ) else {
            return Err(NodeError::Config(
                "blessing needs pope_role, blessed_role and priced_role".into(),
            ));
        };
        if !self.member_roles(actor)?.contains(pope) {
            return Err(NodeError::NotPermitted {
                user: actor.clone(),
                role: pope.clone(),
            });
        }
        let target = self
            .store
            .find_user_by_name(name)?
            .ok_or_else(|| NodeError::UnknownMember(name.to_string()))?;

        let blessing =
            self.lifecycle
                .bless(self.store.as_ref(), &target.id, blessable, blessed, self.clock.now())?;
        self.dispatcher.grant(&target.id, blessed);
        Ok(blessing)
    }

    /// Give `actor` the role of the recognized party called `party`.
    pub fn join_party(&self, actor: &UserId, party: &str) -> Result<RoleRecord, NodeError> {
        self.adjust_party(actor, party, true)
    }

    pub fn leave_party(&self, actor: &UserId, party: &str) -> Result<RoleRecord, NodeError> {
        self.adjust_party(actor, party, false)
    }

    fn adjust_party(
        &self,
        actor: &UserId,
        party: &str,
        joining: bool,
    ) -> Result<RoleRecord, NodeError> {
        let role = self
            .store
            .find_party_by_name(party)?
            .ok_or_else(|| NodeError::UnknownParty(party.trim().to_string()))?;
        let member = self.member_roles(actor)?.contains(&role.id);

        match (joining, member) {
            (true, true) => {
                return Err(NodeError::AlreadyInParty {
                    user: actor.clone(),
                    party: role.name,
                })
            }
            (false, false) => {
                return Err(NodeError::NotInParty {
                    user: actor.clone(),
                    party: role.name,
                })
            }
            (true, false) => self.gate.grant(actor, &role.id)?,
            (false, true) => self.gate.revoke(actor, &role.id)?,
        }
        tracing::info!(user = %actor, party = %role.name, joining, "party membership changed");
        Ok(role)
    }

    /// Roles `user` holds on the platform right now.
    fn member_roles(&self, user: &UserId) -> Result<Vec<RoleId>, NodeError> {
        self.roster
            .members()?
            .into_iter()
            .find(|m| &m.id == user)
            .map(|m| m.roles)
            .ok_or_else(|| NodeError::UnknownMember(user.to_string()))
    }

    // ── Reconciliation ─────────────────────────────────────────────────

    /// Users, roles, payday, then temporary positions.
    pub async fn reconcile(&self) -> Result<ReconcileReport, NodeError> {
        let _pass = self.reconciling.lock().await;
        let now = self.clock.now();

        let members = self.roster.members()?;
        let members_added = self.reconcile_users(&members)?;
        let roles_added = self.reconcile_roles()?;
        self.refresh_context(&members).await?;

        let payday = {
            let ctx = self.context.read().await;
            self.payroll.pay_income(self.store.as_ref(), &ctx.holdings, now)?
        };
        if let Some(payday) = &payday {
            self.dispatcher.payday(payday);
        }

        let positions = self.lifecycle.process_expired(self.store.as_ref(), now)?;
        {
            let ctx = self.context.read().await;
            for event in &positions {
                self.dispatcher.position_event(&ctx, event);
            }
        }

        // Balances moved during payday and renewals.
        self.context
            .write()
            .await
            .set_users(self.store.list_users()?);

        Ok(ReconcileReport {
            members_added,
            roles_added,
            payday,
            positions,
        })
    }

    /// Add newly seen members and refresh names and judicial seats of the
    /// rest. Returns how many members were added.
    fn reconcile_users(&self, members: &[Member]) -> Result<usize, NodeError> {
        let store: &S = &self.store;
        if !store
            .list_regions()?
            .iter()
            .any(|r| r.name == self.config.home_region)
        {
            store.put_region(&RegionRecord {
                name: self.config.home_region.clone(),
                is_recognized: true,
            })?;
        }

        let known: HashSet<_> = store.list_users()?.into_iter().map(|u| u.id).collect();
        let mut patches = Vec::new();
        let mut added = 0;
        for member in members {
            let on_bench = self
                .config
                .judiciary_role
                .as_ref()
                .map(|role| member.roles.contains(role));

            if known.contains(&member.id) {
                patches.push(UserPatch {
                    name: Some(member.name.clone()),
                    is_judiciary: on_bench,
                    ..UserPatch::for_user(member.id.clone())
                });
                continue;
            }

            let mut user =
                UserRecord::new(member.id.clone(), &member.name, &self.config.home_region);
            user.balance = self.config.starting_balance;
            user.is_judiciary = on_bench.unwrap_or(false);
            store.add_user(&user)?;
            tracing::info!(user = %user.id, name = %user.name, "member added");
            added += 1;
        }
        store.update_many_users(&patches)?;
        Ok(added)
    }

    /// Record roles the platform knows and the store does not, and follow
    /// renames and party status of the rest.
    fn reconcile_roles(&self) -> Result<usize, NodeError> {
        let store: &S = &self.store;
        let existing = store.list_roles()?;
        let mut added = 0;
        for role in self.roster.roles()? {
            match existing.iter().find(|r| r.id == role.id) {
                Some(record)
                    if record.name == role.name
                        && record.is_political_party == role.is_political_party => {}
                Some(record) => {
                    store.put_role(&RoleRecord {
                        name: role.name,
                        is_political_party: role.is_political_party,
                        ..record.clone()
                    })?;
                }
                None => {
                    let mut record = RoleRecord::new(role.id.clone(), role.name);
                    record.is_political_party = role.is_political_party;
                    store.put_role(&record)?;
                    tracing::info!(role = %role.id, "role added");
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    /// Rebuild the context from the store and the latest roster pull.
    async fn refresh_context(&self, members: &[Member]) -> Result<(), NodeError> {
        let store: &S = &self.store;
        let users = store.list_users()?;
        let roles = store.list_roles()?;
        let regions = store
            .list_regions()?
            .into_iter()
            .filter(|r| r.is_recognized)
            .map(|r| r.name)
            .collect();

        let mut ctx = self.context.write().await;
        ctx.set_users(users);
        ctx.set_roles(roles);
        ctx.set_holdings(members);
        ctx.regions = regions;
        tracing::debug!(
            users = ctx.users.len(),
            roles = ctx.roles.len(),
            judges = ctx.judge_count(),
            "context refreshed"
        );
        Ok(())
    }

    // ── Scheduler ──────────────────────────────────────────────────────

    /// Run both loops until `shutdown` fires.
    ///
    /// One reconciliation pass runs first so the heartbeat starts with a
    /// populated context.
    pub async fn run(self: Arc<Self>, shutdown: &ShutdownController) {
        tracing::info!(
            heartbeat_secs = self.config.heartbeat_secs,
            reconcile_secs = self.config.reconcile_secs,
            "polity node starting"
        );
        let mut heartbeat_stop = shutdown.subscribe();
        let mut reconcile_stop = shutdown.subscribe();
        if let Err(e) = self.reconcile().await {
            self.tick_failed("reconcile", &e);
        }
        self.checkpoint();

        let node = Arc::clone(&self);
        let heartbeat = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(node.config.heartbeat_secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = heartbeat_stop.recv() => {
                        tracing::info!("heartbeat loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match node.heartbeat().await {
                            Ok(report) if !report.opened.is_empty() || !report.resolved.is_empty() => {
                                tracing::debug!(
                                    opened = report.opened.len(),
                                    challenges = report.challenges.len(),
                                    resolved = report.resolved.len(),
                                    "heartbeat"
                                );
                            }
                            Ok(_) => {}
                            Err(e) => node.tick_failed("heartbeat", &e),
                        }
                        node.checkpoint();
                    }
                }
            }
        });

        let node = Arc::clone(&self);
        let reconcile = tokio::spawn(async move {
            let period = Duration::from_secs(node.config.reconcile_secs.max(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = reconcile_stop.recv() => {
                        tracing::info!("reconcile loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = node.reconcile().await {
                            node.tick_failed("reconcile", &e);
                        }
                        node.checkpoint();
                    }
                }
            }
        });

        for (name, handle) in [("heartbeat", heartbeat), ("reconcile", reconcile)] {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "scheduler task panicked");
            }
        }
        self.checkpoint();
        tracing::info!("polity node stopped");
    }

    fn tick_failed(&self, pass: &str, error: &NodeError) {
        if error.is_transient() {
            tracing::warn!(pass, error = %error, "tick failed, retrying next tick");
        } else {
            tracing::error!(pass, error = %error, "tick aborted");
            self.dispatcher.warn(&format!("{pass} aborted: {error}"));
        }
    }

    fn checkpoint(&self) {
        if let Some(checkpoint) = &self.checkpoint {
            if let Err(e) = checkpoint.checkpoint() {
                tracing::warn!(error = %e, "checkpoint failed");
            }
        }
    }
}
