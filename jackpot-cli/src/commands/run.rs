use crate::config::CliConfig;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use jackpot_engine::{JackpotError, Player, RoundEvent, RoundManager, RoundSnapshot};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[derive(Args)]
pub struct RunArgs {
    /// Number of simulated players
    #[arg(short, long, default_value_t = 3)]
    players: u64,

    /// Stop after this many rounds have been settled (0 runs until Ctrl-C)
    #[arg(short, long, default_value_t = 1)]
    rounds: usize,

    /// Override the countdown, in seconds
    #[arg(long)]
    countdown: Option<f64>,

    /// Override the delay before the next round, in seconds
    #[arg(long)]
    delay: Option<f64>,
}

pub async fn handle_run_command(args: RunArgs, settings: &CliConfig) -> anyhow::Result<()> {
    let mut config = settings.engine_config()?;
    check_player_count(args.players, config.quorum)?;

    if let Some(secs) = args.countdown {
        config.countdown = Duration::try_from_secs_f64(secs)?;
        config.countdown_tick = config.countdown_tick.min(config.countdown);
    }
    if let Some(secs) = args.delay {
        config.restart_delay = Duration::try_from_secs_f64(secs)?;
    }

    let manager = RoundManager::new(config)?;
    let mut events = manager.subscribe();
    let lifecycle = manager.spawn();
    let bots = tokio::spawn(simulate_players(manager.clone(), args.players));

    let mut settled = 0;
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
        };

        match event {
            Ok(event) => {
                if print_event(&event) {
                    settled += 1;
                    if args.rounds > 0 && settled >= args.rounds {
                        break;
                    }
                }
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Output fell behind, skipped {} events", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }

    bots.abort();
    lifecycle.shutdown().await?;

    println!();
    println!("Settled {} round(s), {} archived", settled, manager.past_rounds().len());
    Ok(())
}

fn check_player_count(players: u64, quorum: usize) -> anyhow::Result<()> {
    if players < quorum as u64 {
        anyhow::bail!(
            "{} simulated players can never reach the quorum of {}",
            players,
            quorum
        );
    }
    Ok(())
}

/// Bet at random intervals on behalf of `count` players.
async fn simulate_players(manager: Arc<RoundManager>, count: u64) {
    let players: Vec<Player> = (1..=count)
        .map(|id| Player::new(id, format!("player{}@example.com", id)))
        .collect();

    loop {
        let (pause, player, amount) = {
            let mut rng = rand::thread_rng();
            let pause = Duration::from_millis(rng.gen_range(200..1200));
            let player = players[rng.gen_range(0..players.len())].clone();
            let cents: u64 = rng.gen_range(100..5000);
            (pause, player, cents as f64 / 100.0)
        };
        tokio::time::sleep(pause).await;

        match manager.place_bet(&player, amount) {
            Ok(_) => {}
            Err(JackpotError::BettingClosed { round_id }) => {
                tracing::debug!("Round {} closed, player {} waits", round_id, player.id);
            }
            Err(e) => tracing::warn!("Bet from player {} failed: {}", player.id, e),
        }
    }
}

/// Print an event; returns true once a round is settled.
fn print_event(event: &RoundEvent) -> bool {
    match event {
        RoundEvent::NewGame { round } => {
            println!();
            println!("------ ROUND {} ------", round.id);
            println!("Waiting for players...");
        }
        RoundEvent::StartGame { round } => {
            println!(
                "Round started with {} players, pot ${:.2}",
                round.positions.len(),
                round.total_pot
            );
        }
        RoundEvent::Countdown { time_left } => {
            println!("  {:.1}s left", time_left);
        }
        RoundEvent::BetPlaced {
            round,
            player,
            amount,
        } => {
            println!(
                "  {} bet ${:.2} (pot ${:.2})",
                player.email, amount, round.total_pot
            );
        }
        RoundEvent::EndGame { round } => {
            println!("Round closed, no more bets. Final pot: ${:.2}", round.total_pot);
        }
        RoundEvent::SharesUpdated { round } => {
            println!("{}", shares_table(round));
        }
        RoundEvent::WinnerPicked {
            player, payout, ..
        } => {
            println!("═══════════════════════════════════");
            println!("Winner: {}", player);
            println!("Winnings: ${:.2}", payout);
            return true;
        }
        RoundEvent::DrawFailed { round_id, reason } => {
            println!("Round {} settled without a winner: {}", round_id, reason);
            return true;
        }
    }
    false
}

fn shares_table(round: &RoundSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Player", "Email", "Bets", "Total", "Tickets", "Share",
    ]);

    for position in &round.positions {
        table.add_row(vec![
            position.player.id.to_string(),
            position.player.email.clone(),
            position.wagers.len().to_string(),
            format!("${:.2}", position.total_bet()),
            format!("{}-{}", position.start_ticket, position.end_ticket),
            format!("{:.2}%", position.share),
        ]);
    }

    table
}
