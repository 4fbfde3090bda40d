// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Runs both clients against an in-process server until the game ends.

use anyhow::{bail, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};
use umbra_config::AppConfig;
use umbra_fhe::{
    CryptoContext, Direction, EncryptedVector, JointPublicKey, LocalParty, PartialDecryption,
    PublicKeyContribution,
};
use umbra_game::{PlayerId, SessionId, SessionManager, ShareResponse, StageReveal};

const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

struct Client {
    id: PlayerId,
    party: LocalParty,
}

pub fn execute(config: AppConfig, stages: Option<u64>, seed: Option<u64>) -> Result<()> {
    let config = match stages {
        Some(stages) => config.with_max_stages(stages),
        None => config,
    };
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let manager = SessionManager::from_config(&config)?;
    let session = manager.create_session()?;
    info!(%session, seed, preset = %config.preset(), "simulation started");

    let ctx = CryptoContext::from_json(&manager.context_json(&session)?)?;
    let mut seeker = Client {
        id: PlayerId::from("seeker"),
        party: LocalParty::new(ctx.clone()),
    };
    let mut hider = Client {
        id: PlayerId::from("hider"),
        party: LocalParty::new(ctx.clone()),
    };
    manager.join(&session, seeker.id.clone())?;
    manager.join(&session, hider.id.clone())?;

    run_ceremony(&manager, &session, &ctx, &mut seeker, &mut hider, &mut rng)?;

    loop {
        let state = manager.state(&session)?;
        if let Some(outcome) = state.outcome {
            println!("game over after stage {}: {outcome}", state.stage);
            return Ok(());
        }
        for client in [&seeker, &hider] {
            let direction = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
            debug!(player = %client.id, %direction, "moving");
            let mv = client.party.encrypt_direction(direction, &mut rng)?;
            manager.submit_move(&session, &client.id, &mv.to_json()?)?;
        }
        let reveal = decrypt_checkpoint(&manager, &session, &ctx, &seeker, &hider, &mut rng)?;
        print_reveal(&reveal);
    }
}

fn run_ceremony(
    manager: &SessionManager,
    session: &SessionId,
    ctx: &CryptoContext,
    seeker: &mut Client,
    hider: &mut Client,
    rng: &mut ChaCha20Rng,
) -> Result<()> {
    let epoch = manager.state(session)?.epoch;
    let contribution = seeker.party.start_ceremony(epoch, rng)?;
    manager.submit_key_contribution(session, &seeker.id, &contribution.to_json()?)?;

    let stored = manager
        .ceremony(session)?
        .lead_contribution
        .context("server holds no lead contribution")?;
    let joint = hider
        .party
        .extend(&PublicKeyContribution::from_json(ctx, &stored)?, rng)?;
    manager.submit_joint_key(session, &hider.id, &joint.to_json()?)?;

    let published = manager
        .joint_key_json(session)?
        .context("server published no joint key")?;
    seeker
        .party
        .install_joint_key(JointPublicKey::from_json(ctx, &published)?)?;
    info!(%epoch, "joint key installed on both clients");
    Ok(())
}

fn decrypt_checkpoint(
    manager: &SessionManager,
    session: &SessionId,
    ctx: &CryptoContext,
    seeker: &Client,
    hider: &Client,
    rng: &mut ChaCha20Rng,
) -> Result<StageReveal> {
    let checkpoint = manager.checkpoint(session)?;
    let targets = checkpoint
        .targets
        .iter()
        .map(|t| EncryptedVector::from_json(ctx, t))
        .collect::<Result<Vec<_>, _>>()?;

    let lead = seeker.party.lead_decrypt(&targets, checkpoint.stage, rng)?;
    manager.submit_decryption_share(session, &seeker.id, &lead.to_json()?)?;

    let stored = manager
        .checkpoint(session)?
        .lead_share
        .context("server holds no lead share")?;
    let lead = PartialDecryption::from_json(ctx, &stored)?;
    let main = hider.party.main_decrypt(&targets, &lead, rng)?;
    match manager.submit_decryption_share(session, &hider.id, &main.to_json()?)? {
        ShareResponse::Revealed(reveal) => Ok(reveal),
        ShareResponse::ShareAccepted { role } => {
            bail!("checkpoint still waiting after the {role} share")
        }
    }
}

fn point(values: &[i64]) -> String {
    let coords: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("({})", coords.join(", "))
}

fn print_reveal(reveal: &StageReveal) {
    let positions: Vec<String> = reveal
        .positions
        .iter()
        .map(|p| format!("{} ({}) at {}", p.player, p.role, point(&p.position)))
        .collect();
    println!(
        "stage {}: {}, combined {}",
        reveal.stage,
        positions.join(", "),
        point(&reveal.combined)
    );
}
