//! Command handlers for the stakelock CLI.

pub(crate) mod identity;
pub(crate) mod query;
pub(crate) mod reclaim;
pub(crate) mod stake;

use alloy::{primitives::U256, signers::local::PrivateKeySigner};
use alloy_signer::k256::ecdsa::SigningKey;
use anyhow::{Context, Result};
use stakelock_client::ChainClient;
use stakelock_coordinator::CollateralCoordinator;
use stakelock_params::StakelockParams;

use crate::cli::{ConnectionArgs, SignerArgs};

pub(crate) fn chain_client(conn: &ConnectionArgs) -> Result<ChainClient> {
    let raw = std::fs::read_to_string(&conn.params)
        .with_context(|| format!("read params file {}", conn.params.display()))?;
    let params: StakelockParams = toml::from_str(&raw).context("parse params file")?;

    Ok(ChainClient::new(params))
}

pub(crate) fn coordinator(
    conn: &ConnectionArgs,
    signer: &SignerArgs,
) -> Result<CollateralCoordinator> {
    let client = chain_client(conn)?;

    let private_key_bytes = hex::decode(signer.private_key.trim_start_matches("0x"))
        .context("decode private key")?;
    let signing_key = SigningKey::from_slice(&private_key_bytes).context("signing key")?;
    let signer = PrivateKeySigner::from(signing_key);

    Ok(CollateralCoordinator::new(client, signer))
}

pub(crate) fn parse_amount(amount: &str) -> Result<U256> {
    alloy::primitives::utils::parse_ether(amount)
        .with_context(|| format!("parse amount '{amount}'"))
}
