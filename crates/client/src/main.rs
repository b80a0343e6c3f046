//! Headless lighthouse session.
//!
//! Plays a few scripted runs against an in-process ledger and prints the
//! player-facing notices to stdout. Logs go to the session log directory.
use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use client_blockchain_core::{Address, ChainId, InMemoryChain, TokenAmount};
use client_bootstrap::{BootstrapConfig, SessionBuilder};
use game_core::{RewardPolicy, RunOutcome};
use lighthouse_client::{Autoplay, logging};
use runtime::{Event, RuntimeError, SessionHandle, StakeError, Topic};

const DEMO_PLAYER: Address = Address::from_bytes([
    0x5a, 0x1e, 0x7c, 0x0d, 0x4f, 0x2b, 0x93, 0x66, 0x10, 0xe8, 0x3a, 0xc4, 0x71, 0x0b, 0x9d,
    0x28, 0xf5, 0x46, 0x8e, 0x02,
]);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = BootstrapConfig::from_env();
    logging::setup_logging(&config.session_id)?;

    let session = &config.session;
    let asset = session.game.stake.asset;

    // The wallet starts on an unrelated network that does not know the game's
    // chain yet, so connecting walks the add-then-switch path.
    let wallet = InMemoryChain::new(DEMO_PLAYER, ChainId(1));
    wallet.forget_network(session.required_network.chain_id);
    wallet.fund(
        DEMO_PLAYER,
        asset,
        TokenAmount(session.game.stake.amount.units() * 10),
    );
    let payouts = u128::from(session.game.max_plays_per_day);
    wallet.fund(
        session.bank_address,
        asset,
        TokenAmount(session.game.reward_amount.units() * payouts),
    );
    let treasury = wallet.signer(session.bank_address);

    let setup = SessionBuilder::new(config.clone())
        .wallet(wallet)
        .treasury(treasury)
        .build()
        .await?;
    let handle = setup.runtime.handle();
    let printer = tokio::spawn(print_notices(handle.clone()));

    let account = handle.connect_wallet().await?;
    println!(
        "Connected {} on chain {}",
        account.address.short(),
        account.chain_id
    );

    let autoplay = Autoplay::new(handle.clone(), &session.game);
    let mut wins = 0;
    for run in 1..=config.autoplay_runs {
        match autoplay.play_run().await {
            Ok(report) => {
                tracing::info!(
                    run,
                    outcome = %report.outcome,
                    frames = report.frames,
                    "run complete"
                );
                if report.outcome == RunOutcome::Won {
                    wins += 1;
                    if session.game.reward_policy == RewardPolicy::ClaimGated {
                        tracing::info!(status = ?report.reward, "reward claimed");
                    }
                }
            }
            Err(error) => match error.downcast_ref::<RuntimeError>() {
                Some(RuntimeError::Stake(StakeError::QuotaExhausted)) => {
                    println!("Daily plays used up, come back tomorrow");
                    break;
                }
                Some(RuntimeError::Stake(stake)) => {
                    tracing::warn!(run, %stake, "stake rejected");
                    break;
                }
                _ => return Err(error),
            },
        }
    }

    let balance = handle.refresh_balance().await?;
    println!(
        "{} wins, wallet holds {} {}",
        wins,
        balance.format_units(session.game.asset_decimals),
        session.game.asset_symbol
    );

    drop(autoplay);
    drop(handle);
    setup.runtime.shutdown().await?;
    printer.abort();
    Ok(())
}

async fn print_notices(handle: SessionHandle) {
    let mut notices = handle.subscribe(Topic::Notice);
    drop(handle);
    loop {
        match notices.recv().await {
            Ok(Event::Notice(notice)) => println!("{notice}"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "notice printer lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
