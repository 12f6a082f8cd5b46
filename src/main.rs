use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use streak_core::ledger::{
    Amount, LedgerSnapshot, StreakLedger, StreakView, ACTIVATION_FEE, MIN_CHECKIN_INTERVAL,
    NATIVE_SCALE, STREAK_WINDOW,
};
use streak_core::shared::unix_now;

/// What the reference client submits per check-in (0.0001 native units,
/// well above the activation fee).
const DEFAULT_PAYMENT: Amount = NATIVE_SCALE / 10_000;

#[derive(Parser)]
#[command(name = "streak", about = "Daily check-in streak ledger", version)]
struct Cli {
    /// Path of the ledger snapshot file.
    #[arg(long, global = true, default_value = "streak-ledger.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh ledger with a fixed administrator.
    Init {
        #[arg(long)]
        admin: String,
    },
    /// Check in as a user, paying the submitted amount.
    CheckIn {
        #[arg(long)]
        user: String,
        /// Payment in minimal units; must be at least the activation fee.
        #[arg(long, default_value_t = DEFAULT_PAYMENT)]
        amount: Amount,
    },
    /// Show a user's streak.
    Status {
        #[arg(long)]
        user: String,
        /// Emit the raw view as JSON instead of prose.
        #[arg(long)]
        json: bool,
    },
    /// Withdraw the accumulated balance (administrator only).
    Withdraw {
        #[arg(long)]
        caller: String,
    },
    /// Dump the event log as JSON lines.
    Events,
    /// Verify the snapshot file's merkle root.
    Verify,
    /// Print the protocol constants for client verification.
    Constants,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Init { admin } => {
            if cli.state.exists() {
                return Err(format!("{} already exists", cli.state.display()));
            }
            let ledger = StreakLedger::new(admin);
            save_ledger(&cli.state, &ledger)?;
            println!("initialized ledger at {}", cli.state.display());
            Ok(())
        }
        Command::CheckIn { user, amount } => {
            let mut ledger = load_ledger(&cli.state)?;
            let outcome = ledger
                .check_in(&user, amount, unix_now())
                .map_err(|e| e.to_string())?;
            save_ledger(&cli.state, &ledger)?;
            println!(
                "{}: streak {:?} at count {}",
                user, outcome.kind, outcome.record.count
            );
            Ok(())
        }
        Command::Status { user, json } => {
            let ledger = load_ledger(&cli.state)?;
            let now = unix_now();
            let view = ledger.get_streak(&user, now);
            if json {
                let encoded = serde_json::to_string_pretty(&view)
                    .map_err(|e| format!("encode view: {e}"))?;
                println!("{encoded}");
            } else {
                print_status(&user, &view, now);
            }
            Ok(())
        }
        Command::Withdraw { caller } => {
            let mut ledger = load_ledger(&cli.state)?;
            let amount = ledger
                .withdraw(&caller, unix_now())
                .map_err(|e| e.to_string())?;
            save_ledger(&cli.state, &ledger)?;
            println!("withdrew {amount} minimal units to {caller}");
            Ok(())
        }
        Command::Events => {
            let ledger = load_ledger(&cli.state)?;
            for event in ledger.events() {
                let line =
                    serde_json::to_string(event).map_err(|e| format!("encode event: {e}"))?;
                println!("{line}");
            }
            Ok(())
        }
        Command::Verify => {
            let ledger = load_ledger(&cli.state)?;
            let snapshot = ledger.snapshot();
            println!(
                "{}: ok, root {}",
                cli.state.display(),
                snapshot.merkle_root_hex()
            );
            Ok(())
        }
        Command::Constants => {
            println!("ACTIVATION_FEE       = {ACTIVATION_FEE}");
            println!("MIN_CHECKIN_INTERVAL = {MIN_CHECKIN_INTERVAL}");
            println!("STREAK_WINDOW        = {STREAK_WINDOW}");
            Ok(())
        }
    }
}

fn load_ledger(path: &Path) -> Result<StreakLedger, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("read {}: {e} (run `streak init` first?)", path.display()))?;
    let snapshot: LedgerSnapshot =
        serde_json::from_str(&raw).map_err(|e| format!("parse {}: {e}", path.display()))?;
    StreakLedger::from_snapshot(snapshot).map_err(|e| e.to_string())
}

fn save_ledger(path: &Path, ledger: &StreakLedger) -> Result<(), String> {
    let encoded = serde_json::to_string_pretty(&ledger.snapshot())
        .map_err(|e| format!("encode snapshot: {e}"))?;
    fs::write(path, encoded).map_err(|e| format!("write {}: {e}", path.display()))
}

fn print_status(user: &str, view: &StreakView, now: u64) {
    println!("user:          {user}");
    println!("count:         {}", view.count);
    println!("last check-in: {}", view.last_check_in);
    println!("active:        {}", view.is_active);
    println!("expired:       {}", view.is_expired);
    if view.is_active && !view.is_expired {
        let elapsed = now.saturating_sub(view.last_check_in);
        let window_left = STREAK_WINDOW.saturating_sub(elapsed);
        println!("window left:   {}", format_remaining(window_left));
        if elapsed < MIN_CHECKIN_INTERVAL {
            println!(
                "next check-in: in {}",
                format_remaining(MIN_CHECKIN_INTERVAL - elapsed)
            );
        } else {
            println!("next check-in: available now");
        }
    }
    println!("status:        {}", status_line(view));
}

fn format_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "expired".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn status_line(view: &StreakView) -> &'static str {
    if !view.is_active {
        return "start your streak";
    }
    if view.is_expired {
        return "streak expired, start fresh";
    }
    match view.count {
        1 => "great start, keep it going",
        2..=6 => "building momentum",
        7..=29 => "on fire",
        30..=99 => "incredible dedication",
        _ => "legendary streak",
    }
}
