//! Polity daemon: runs the scheduler, or performs one action against the
//! saved state and exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use polity_consti::ConstiEngine;
use polity_economy::{Market, PricingEngine};
use polity_governance::GovernanceEngine;
use polity_node::{
    init_logging, NodeConfig, Platform, PolityNode, ShutdownController, SnapshotCheckpoint,
    StaticRoster,
};
use polity_store::{ChallengeTarget, MemoryStore, RegionRecord, RegionStore, UserStore};
use polity_types::{
    period_for, AmendmentNumber, ChallengeId, GoodId, JudicialAnswer, Money, ProposalId,
    ProposalKind, RoleId, Timestamp, UserId,
};

#[derive(Parser)]
#[command(name = "polity", about = "A simulated community government")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; flags
    /// and env vars override them.
    #[arg(long, env = "POLITY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding state.json.
    #[arg(long, env = "POLITY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "POLITY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format for `run`: "human" or "json".
    #[arg(long, env = "POLITY_LOG_FORMAT")]
    log_format: Option<String>,

    /// The treasury account: pays income, excluded from the money supply.
    #[arg(long, env = "POLITY_TREASURY")]
    treasury: Option<String>,

    /// TOML roster of members and roles.
    #[arg(long, env = "POLITY_ROSTER")]
    roster: Option<PathBuf>,

    #[arg(long, env = "POLITY_HEARTBEAT_SECS")]
    heartbeat_secs: Option<u64>,

    #[arg(long, env = "POLITY_RECONCILE_SECS")]
    reconcile_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the heartbeat and reconcile loops until interrupted.
    Run,

    /// Submit a proposal.
    Propose {
        #[arg(long = "as")]
        proposer: String,
        #[command(subcommand)]
        kind: KindArg,
    },

    /// Vote on an open poll: Yae, Nay or Abstain.
    Vote {
        #[arg(long = "as")]
        voter: String,
        proposal: u64,
        answer: String,
    },

    /// Veto an open proposal (god-king or proposer only).
    Veto {
        #[arg(long = "as")]
        actor: String,
        proposal: u64,
    },

    /// Ask the judiciary to rule a proposal or amendment unconstitutional.
    Challenge {
        #[arg(long = "as")]
        challenger: String,
        #[arg(long, conflicts_with = "amendment", required_unless_present = "amendment")]
        proposal: Option<u64>,
        #[arg(long)]
        amendment: Option<u64>,
    },

    /// Rule on a challenge: constitutional or unconstitutional.
    Rule {
        #[arg(long = "as")]
        judge: String,
        challenge: u64,
        answer: String,
    },

    /// Register to vote at a region.
    Register {
        #[arg(long = "as")]
        voter: String,
        region: String,
    },

    /// Recognize a region voters may register at.
    Recognize { region: String },

    /// Send money to another member, by name.
    Transfer {
        #[arg(long = "as")]
        sender: String,
        to: String,
        amount: u64,
    },

    /// Buy a temporary role at the market price.
    Buy {
        #[arg(long = "as")]
        buyer: String,
        role: String,
        /// Ledger name of the good; defaults to the role id.
        #[arg(long)]
        good: Option<String>,
    },

    /// Bless a member: their priced privilege runs two days longer.
    Bless {
        #[arg(long = "as")]
        pope: String,
        user: String,
    },

    /// Join a recognized political party, by name.
    JoinParty {
        #[arg(long = "as")]
        member: String,
        party: String,
    },

    /// Leave a political party, by name.
    LeaveParty {
        #[arg(long = "as")]
        member: String,
        party: String,
    },

    /// Show a member's balance.
    Balance {
        #[arg(long = "as")]
        user: String,
    },

    /// Show the current market price.
    Price {
        /// Print every intermediate value as JSON.
        #[arg(long)]
        debug: bool,
    },

    /// Show the lunar payday period.
    Period {
        /// Unix seconds; defaults to now.
        #[arg(long)]
        at: Option<u64>,
    },

    /// Print the constitution in force.
    Constitution,
}

#[derive(clap::Subcommand)]
enum KindArg {
    /// Dissolve the government.
    Dissolve,
    /// Add an amendment to the constitution.
    Amend { text: String },
    /// Repeal an amendment.
    Repeal { number: u64 },
    /// Adopt a resolution.
    Resolve { text: String },
}

impl From<KindArg> for ProposalKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Dissolve => Self::Dissolve,
            KindArg::Amend { text } => Self::AddAmendment { text },
            KindArg::Repeal { number } => Self::RepealAmendment {
                number: AmendmentNumber::new(number),
            },
            KindArg::Resolve { text } => Self::Resolution { text },
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };

    Ok(NodeConfig {
        data_dir: cli.data_dir.clone().unwrap_or(base.data_dir.clone()),
        log_level: cli.log_level.clone().unwrap_or(base.log_level.clone()),
        log_format: cli.log_format.clone().unwrap_or(base.log_format.clone()),
        treasury_user: cli
            .treasury
            .as_deref()
            .map(UserId::new)
            .unwrap_or(base.treasury_user.clone()),
        roster_file: cli.roster.clone().or(base.roster_file.clone()),
        heartbeat_secs: cli.heartbeat_secs.unwrap_or(base.heartbeat_secs),
        reconcile_secs: cli.reconcile_secs.unwrap_or(base.reconcile_secs),
        ..base
    })
}

fn open_store(config: &NodeConfig) -> anyhow::Result<Arc<MemoryStore>> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    let path = config.state_path();
    let store = MemoryStore::load(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Arc::new(store))
}

fn save_store(store: &MemoryStore, path: &Path) -> anyhow::Result<()> {
    store
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn load_roster(config: &NodeConfig) -> anyhow::Result<StaticRoster> {
    Ok(match &config.roster_file {
        Some(path) => StaticRoster::from_toml_file(path)?,
        None => {
            tracing::warn!("no roster configured; membership comes from the saved state only");
            StaticRoster::default()
        }
    })
}

/// A node for one member action, outside the scheduler.
fn one_shot_node(
    config: &NodeConfig,
    store: &Arc<MemoryStore>,
) -> anyhow::Result<PolityNode<MemoryStore>> {
    let roster = load_roster(config)?;
    Ok(PolityNode::new(
        config.clone(),
        store.clone(),
        Platform::logging(Arc::new(roster)),
    ))
}

async fn run(config: NodeConfig, store: Arc<MemoryStore>) -> anyhow::Result<()> {
    let roster = load_roster(&config)?;
    let checkpoint = SnapshotCheckpoint::new(store.clone(), config.state_path());
    let node = Arc::new(
        PolityNode::new(config, store, Platform::logging(Arc::new(roster)))
            .with_checkpoint(Arc::new(checkpoint)),
    );

    let shutdown = Arc::new(ShutdownController::new());
    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };
    node.run(&shutdown).await;
    signals.abort();

    tracing::info!("polity daemon exited cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if matches!(cli.command, Command::Run) {
        init_logging(config.log_format(), &config.log_level)?;
    } else {
        // One-shot commands only report problems unless asked otherwise.
        polity_utils::init_tracing(cli.log_level.as_deref().unwrap_or("warn"));
    }

    let store = open_store(&config)?;
    let state_path = config.state_path();
    let now = Timestamp::now();
    let governance = GovernanceEngine::new(config.rules.clone(), config.challenge_window_hours);
    let pricing = PricingEngine::new(config.base_price, config.treasury_user.clone());

    match cli.command {
        Command::Run => return run(config, store).await,
        Command::Propose { proposer, kind } => {
            let id =
                governance.submit_proposal(store.as_ref(), &UserId::new(proposer), kind.into(), now)?;
            println!("submitted proposal {id}; its poll opens on the next heartbeat");
        }
        Command::Vote {
            voter,
            proposal,
            answer,
        } => {
            let proposal = ProposalId::new(proposal);
            governance.cast_ballot(store.as_ref(), proposal, &UserId::new(voter), &answer)?;
            println!("ballot recorded on proposal {proposal}");
        }
        Command::Veto { actor, proposal } => {
            let record =
                governance.veto(store.as_ref(), &UserId::new(actor), ProposalId::new(proposal), now)?;
            println!("proposal {} vetoed", record.id);
        }
        Command::Challenge {
            challenger,
            proposal,
            amendment,
        } => {
            let target = match (proposal, amendment) {
                (Some(id), _) => ChallengeTarget::Proposal(ProposalId::new(id)),
                (None, Some(number)) => ChallengeTarget::Amendment(AmendmentNumber::new(number)),
                (None, None) => anyhow::bail!("give --proposal or --amendment"),
            };
            let id = governance.file_challenge(store.as_ref(), &UserId::new(challenger), target, now)?;
            println!("filed {id} against {target}");
        }
        Command::Rule {
            judge,
            challenge,
            answer,
        } => {
            let answer = JudicialAnswer::from_label(&answer)
                .with_context(|| format!("unknown ruling {answer:?}"))?;
            let challenge = ChallengeId::new(challenge);
            governance.cast_ruling(store.as_ref(), challenge, &UserId::new(judge), answer)?;
            println!("ruled {answer} on {challenge}");
        }
        Command::Register { voter, region } => {
            governance.register(store.as_ref(), &UserId::new(voter), &region, now)?;
            println!("registered at {region}");
        }
        Command::Recognize { region } => {
            store.put_region(&RegionRecord {
                name: region.clone(),
                is_recognized: true,
            })?;
            println!("{region} is now a recognized region");
        }
        Command::Transfer { sender, to, amount } => {
            let transfer = Market::new(pricing).transfer(
                store.as_ref(),
                &UserId::new(sender),
                &to,
                Money::new(amount),
            )?;
            println!("sent {} to {}", transfer.amount, transfer.to);
        }
        Command::Buy { buyer, role, good } => {
            let good = GoodId::new(good.unwrap_or_else(|| role.clone()));
            let purchase = Market::new(pricing).purchase_privilege(
                store.as_ref(),
                &UserId::new(buyer),
                good,
                &RoleId::new(role),
                now,
            )?;
            println!(
                "bought {} for {}; it lapses at {}",
                purchase.role, purchase.price, purchase.expires_at
            );
        }
        Command::Bless { pope, user } => {
            let blessing = one_shot_node(&config, &store)?.bless(&UserId::new(pope), &user)?;
            println!(
                "{} is blessed; their {} now lapses at {}",
                user, blessing.role, blessing.expires_at
            );
        }
        Command::JoinParty { member, party } => {
            let role = one_shot_node(&config, &store)?.join_party(&UserId::new(member), &party)?;
            println!("you are now a proud member of {}", role.name);
        }
        Command::LeaveParty { member, party } => {
            let role = one_shot_node(&config, &store)?.leave_party(&UserId::new(member), &party)?;
            println!("you are now a scornful ex-member of {}", role.name);
        }
        Command::Balance { user } => {
            let user = store.get_user(&UserId::new(user))?;
            println!("{}: {}", user.name, user.balance);
        }
        Command::Price { debug } => {
            if debug {
                let breakdown = pricing.quote_breakdown(store.as_ref(), now)?;
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                println!("{}", pricing.quote(store.as_ref(), now)?);
            }
        }
        Command::Period { at } => {
            let t = at.map(Timestamp::new).unwrap_or(now);
            println!("{:?}", period_for(t));
        }
        Command::Constitution => {
            let document = ConstiEngine.active(store.as_ref())?;
            if document.articles.is_empty() {
                println!("the constitution is empty");
            } else {
                print!("{document}");
            }
        }
    }

    save_store(&store, &state_path)?;
    Ok(())
}
