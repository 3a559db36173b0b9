use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use stakelock_primitives::{ExecutorId, Hotkey};

#[derive(Parser)]
#[command(
    name = "stakelock-cli",
    about = "Operate the stakelock collateral protocol: deposits, slashes and the reclaim lifecycle",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Deposit(DepositArgs),

    Slash(SlashArgs),

    Reclaim(ReclaimArgs),

    Deny(DenyArgs),

    Finalize(FinalizeArgs),

    MapHotkey(MapHotkeyArgs),

    HotkeyAddress(HotkeyAddressArgs),

    TransferSs58(TransferSs58Args),

    Balance(BalanceArgs),

    EligibleExecutors(EligibleExecutorsArgs),

    Events(EventsArgs),
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct ConnectionArgs {
    #[arg(
        long,
        env = "STAKELOCK_PARAMS",
        help = "the path to the params file (rpc url, contract address)"
    )]
    pub(crate) params: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct SignerArgs {
    #[arg(
        long,
        env = "PRIVATE_KEY",
        hide_env_values = true,
        help = "hex-encoded private key of the signing account"
    )]
    pub(crate) private_key: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Deposit collateral for an executor", version)]
pub(crate) struct DepositArgs {
    #[arg(help = "executor UUID to bind the deposit to")]
    pub(crate) executor: ExecutorId,

    #[arg(help = "amount to deposit, in full units (e.g. 0.01)")]
    pub(crate) amount: String,

    #[arg(long, help = "abort unless the ledger names this trustee")]
    pub(crate) trustee: Option<Address>,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Slash a miner's executor (trustee only)", version)]
pub(crate) struct SlashArgs {
    #[arg(help = "address of the miner to slash")]
    pub(crate) miner: Address,

    #[arg(help = "executor UUID whose account is debited")]
    pub(crate) executor: ExecutorId,

    #[arg(help = "amount to slash, in full units")]
    pub(crate) amount: String,

    #[arg(help = "justification URL published with the slash")]
    pub(crate) url: String,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Open a reclaim request for deposited collateral", version)]
pub(crate) struct ReclaimArgs {
    #[arg(help = "executor UUID the collateral was deposited under")]
    pub(crate) executor: ExecutorId,

    #[arg(help = "amount to reclaim, in full units")]
    pub(crate) amount: String,

    #[arg(help = "justification URL published with the request")]
    pub(crate) url: String,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Deny an open reclaim request (trustee only)", version)]
pub(crate) struct DenyArgs {
    #[arg(help = "id of the reclaim request to deny")]
    pub(crate) request_id: U256,

    #[arg(help = "justification URL published with the denial")]
    pub(crate) url: String,

    #[arg(
        long,
        help = "sync the local reclaim view from this block before the pre-flight check"
    )]
    pub(crate) sync_from: Option<u64>,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Finalize a reclaim request past its deny window", version)]
pub(crate) struct FinalizeArgs {
    #[arg(help = "id of the reclaim request to finalize")]
    pub(crate) request_id: U256,

    #[arg(
        long,
        help = "sync the local reclaim view from this block before the pre-flight check"
    )]
    pub(crate) sync_from: Option<u64>,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Map a hotkey to a settlement address (trustee only)", version)]
pub(crate) struct MapHotkeyArgs {
    #[arg(help = "hotkey to map, as SS58 or 32-byte hex")]
    pub(crate) hotkey: Hotkey,

    #[arg(help = "settlement address to associate with the hotkey")]
    pub(crate) address: Address,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Look up the settlement address mapped to a hotkey", version)]
pub(crate) struct HotkeyAddressArgs {
    #[arg(help = "hotkey to look up, as SS58 or 32-byte hex")]
    pub(crate) hotkey: Hotkey,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Send native value to an SS58 recipient", version)]
pub(crate) struct TransferSs58Args {
    #[arg(help = "SS58 address of the recipient")]
    pub(crate) recipient: String,

    #[arg(help = "amount to send, in full units")]
    pub(crate) amount: String,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,

    #[clap(flatten)]
    pub(crate) signer: SignerArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Read the collateral balance of a (miner, executor) account", version)]
pub(crate) struct BalanceArgs {
    #[arg(help = "address of the miner")]
    pub(crate) miner: Address,

    #[arg(help = "executor UUID")]
    pub(crate) executor: ExecutorId,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "List the executors of a miner holding usable collateral", version)]
pub(crate) struct EligibleExecutorsArgs {
    #[arg(help = "address of the miner")]
    pub(crate) miner: Address,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Decode collateral events over a block range", version)]
pub(crate) struct EventsArgs {
    #[arg(long, help = "first block of the range, inclusive")]
    pub(crate) from_block: u64,

    #[arg(long, help = "last block of the range, inclusive")]
    pub(crate) to_block: u64,

    #[arg(
        long,
        help = "restrict to one kind: deposit, slashed, reclaim-started, denied or reclaimed"
    )]
    pub(crate) kind: Option<String>,

    #[clap(flatten)]
    pub(crate) conn: ConnectionArgs,
}
