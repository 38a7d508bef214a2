//! Bot bridge demo
//!
//! Loads a scenario into an in-memory world, starts its owner thread and
//! runs several scripts against it at the same time:
//! - bank at the nearest banker
//! - drop every log in the inventory
//! - pick up coins from the ground
//!
//! Usage: `botbridge-demo [scenario.json] [--json]`

use anyhow::Result;
use botbridge_core::EntityKind;
use botbridge_facade::ScriptApi;
use botbridge_runtime::{BridgeConfig, ClientContext, Scenario, SimWorld, WorldModel, spawn_owner_thread};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/lumbridge.json");

type Script = fn(&ClientContext<SimWorld>) -> botbridge_core::Result<String>;

fn bank_at_nearest_banker(ctx: &ClientContext<SimWorld>) -> botbridge_core::Result<String> {
    let npcs = ctx.npcs();
    let banker = npcs.closest_named(["Banker"])?;
    let summary = match &banker {
        Some(banker) => format!("opened bank at {}", banker),
        None => "no banker in sight".to_string(),
    };
    npcs.interact(banker.as_ref(), "Bank")?;
    Ok(summary)
}

fn drop_logs(ctx: &ClientContext<SimWorld>) -> botbridge_core::Result<String> {
    let dropped = ctx.inventory().drop_all("Logs")?;
    Ok(format!("dropped {} logs", dropped))
}

fn take_coins(ctx: &ClientContext<SimWorld>) -> botbridge_core::Result<String> {
    if !ctx.ground_items().interact_named("Coins", "Take")? {
        return Ok("no coins on the ground".to_string());
    }
    Ok(format!("carrying {} coins", ctx.inventory().count("Coins")?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json_output = args.iter().any(|a| a == "--json");
    let scenario = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => {
            info!("Loading scenario from {}", path);
            Scenario::from_json_file(path)?
        }
        None => Scenario::from_json_str(DEFAULT_SCENARIO)?,
    };
    let config = BridgeConfig::default().with_env_overrides()?;
    info!(?config, "Bot bridge demo starting");

    let (ctx, owner) = spawn_owner_thread(config, move || SimWorld::from_scenario(scenario))?;

    let scripts: [(&str, Script); 3] = [
        ("bank", bank_at_nearest_banker),
        ("drop-logs", drop_logs),
        ("take-coins", take_coins),
    ];
    let running: Vec<_> = scripts
        .into_iter()
        .map(|(name, script)| {
            let ctx = ctx.clone();
            (name, tokio::task::spawn_blocking(move || script(&ctx)))
        })
        .collect();

    for (name, task) in running {
        match task.await? {
            Ok(summary) => info!(script = name, "{}", summary),
            Err(e) => warn!(script = name, error = %e, "Script failed"),
        }
    }

    let tick = ctx
        .submit_async(|world: &SimWorld| Ok(world.tick()))?
        .join()
        .await?;
    let npcs = ctx.clone();
    let snapshot = tokio::task::spawn_blocking(move || npcs.snapshot(EntityKind::Npc)).await??;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("NPCs at tick {} (owner tick now {}):", snapshot.tick(), tick);
        for npc in &snapshot {
            println!("  {} actions={:?}", npc, npc.actions);
        }
    }
    println!("fingerprint {}", snapshot.fingerprint()?);

    tokio::task::spawn_blocking(move || owner.shutdown()).await??;
    info!("Bot bridge demo finished");
    Ok(())
}
