// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.
use anyhow::Result;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use umbra_fhe::{
    combine, create_context, CryptoContext, DecryptionRole, EncryptedVector, FheError, GamePreset,
    KeyEpoch, LocalParty, PartialDecryption, SchemeParameters,
};

fn test_context(seed: [u8; 32]) -> CryptoContext {
    create_context(&SchemeParameters::from_preset(GamePreset::InsecureGame512).with_seed(seed))
        .unwrap()
}

fn ceremony(ctx: &CryptoContext, rng: &mut ChaCha20Rng) -> Result<(LocalParty, LocalParty)> {
    let mut seeker = LocalParty::new(ctx.clone());
    let mut hider = LocalParty::new(ctx.clone());
    let contribution = seeker.start_ceremony(KeyEpoch::INITIAL, rng)?;
    let joint = hider.extend(&contribution, rng)?;
    seeker.install_joint_key(joint)?;
    Ok((seeker, hider))
}

#[test]
fn test_threshold_roundtrip() -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let ctx = test_context([0u8; 32]);
    let (seeker, hider) = ceremony(&ctx, &mut rng)?;

    let a = seeker.encrypt_move(&[0, 1], &mut rng)?;
    let b = hider.encrypt_move(&[1, 0], &mut rng)?;
    let combined = a.add(&b)?;
    let targets = vec![a, b, combined];

    let lead = seeker.lead_decrypt(&targets, 1, &mut rng)?;
    let main = hider.main_decrypt(&targets, &lead, &mut rng)?;
    assert_eq!(main.role(), DecryptionRole::Main);
    assert_eq!(main.lead_digest(), Some(lead.digest()));

    let revealed = combine(&ctx, &targets, Some(&lead), Some(&main))?;
    assert_eq!(revealed, vec![vec![0, 1], vec![1, 0], vec![1, 1]]);
    Ok(())
}

#[test]
fn test_negative_moves_decode_signed() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let ctx = test_context([0u8; 32]);
    let (seeker, hider) = ceremony(&ctx, &mut rng)?;

    let moves = [[-1, 0], [0, -1], [-1, 0]];
    let encrypted = moves
        .iter()
        .map(|m| seeker.encrypt_move(m, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    let total = EncryptedVector::sum(encrypted.iter())?.expect("non-empty");
    let targets = vec![total];

    let lead = seeker.lead_decrypt(&targets, 1, &mut rng)?;
    let main = hider.main_decrypt(&targets, &lead, &mut rng)?;
    assert_eq!(
        combine(&ctx, &targets, Some(&lead), Some(&main))?,
        vec![vec![-2, -1]]
    );
    Ok(())
}

#[test]
fn test_lead_share_alone_is_not_enough() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let ctx = test_context([0u8; 32]);
    let (seeker, _hider) = ceremony(&ctx, &mut rng)?;

    let targets = vec![seeker.encrypt_move(&[4, 4], &mut rng)?];
    let lead = seeker.lead_decrypt(&targets, 1, &mut rng)?;

    assert!(matches!(
        combine(&ctx, &targets, Some(&lead), None),
        Err(FheError::IncompleteDecryption(_))
    ));
    assert!(matches!(
        combine(&ctx, &targets, None, None),
        Err(FheError::IncompleteDecryption(_))
    ));
    // a second lead share does not stand in for the main share
    let again = seeker.lead_decrypt(&targets, 1, &mut rng)?;
    assert!(matches!(
        combine(&ctx, &targets, Some(&lead), Some(&again)),
        Err(FheError::IncompleteDecryption(_))
    ));
    Ok(())
}

#[test]
fn test_main_share_bound_to_its_lead() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let ctx = test_context([0u8; 32]);
    let (seeker, hider) = ceremony(&ctx, &mut rng)?;

    let targets = vec![hider.encrypt_move(&[2, 3], &mut rng)?];
    let lead = seeker.lead_decrypt(&targets, 1, &mut rng)?;
    let other_lead = seeker.lead_decrypt(&targets, 1, &mut rng)?;
    let main = hider.main_decrypt(&targets, &lead, &mut rng)?;

    assert!(matches!(
        combine(&ctx, &targets, Some(&other_lead), Some(&main)),
        Err(FheError::IncompleteDecryption(_))
    ));
    Ok(())
}

#[test]
fn test_partial_decryption_wire_roundtrip() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let ctx = test_context([0u8; 32]);
    let (seeker, hider) = ceremony(&ctx, &mut rng)?;

    let ct = seeker.encrypt_move(&[5, -5], &mut rng)?;
    let ct = EncryptedVector::from_json(&ctx, &ct.to_json()?)?;
    let targets = vec![ct];

    let lead = seeker.lead_decrypt(&targets, 4, &mut rng)?;
    let lead = PartialDecryption::from_json(&ctx, &lead.to_json()?)?;
    assert_eq!(lead.stage(), 4);

    let main = hider.main_decrypt(&targets, &lead, &mut rng)?;
    let main = PartialDecryption::from_json(&ctx, &main.to_json()?)?;
    assert_eq!(
        combine(&ctx, &targets, Some(&lead), Some(&main))?,
        vec![vec![5, -5]]
    );
    Ok(())
}

#[test]
fn test_ciphertext_from_other_context_is_rejected() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(13);
    let ctx_a = test_context([0u8; 32]);
    let ctx_b = test_context([1u8; 32]);
    let (seeker_a, _) = ceremony(&ctx_a, &mut rng)?;
    let (seeker_b, _) = ceremony(&ctx_b, &mut rng)?;

    let ct_a = seeker_a.encrypt_move(&[1, 1], &mut rng)?;
    let ct_b = seeker_b.encrypt_move(&[1, 1], &mut rng)?;

    assert!(matches!(
        EncryptedVector::from_json(&ctx_b, &ct_a.to_json()?),
        Err(FheError::ContextMismatch { .. })
    ));
    assert!(matches!(
        ct_a.add(&ct_b),
        Err(FheError::ContextMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_epochs_do_not_mix() -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(17);
    let ctx = test_context([0u8; 32]);
    let (seeker, _) = ceremony(&ctx, &mut rng)?;

    let mut seeker2 = LocalParty::new(ctx.clone());
    let mut hider2 = LocalParty::new(ctx.clone());
    let contribution = seeker2.start_ceremony(KeyEpoch::INITIAL.next(), &mut rng)?;
    seeker2.install_joint_key(hider2.extend(&contribution, &mut rng)?)?;

    let old = seeker.encrypt_move(&[1, 0], &mut rng)?;
    let new = seeker2.encrypt_move(&[1, 0], &mut rng)?;
    assert_eq!(new.epoch(), KeyEpoch::new(2));
    assert!(matches!(old.add(&new), Err(FheError::EpochMismatch { .. })));
    assert!(matches!(
        seeker2.lead_decrypt(&[old], 1, &mut rng),
        Err(FheError::EpochMismatch { .. })
    ));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn homomorphic_sum_is_order_independent(
        moves in prop::collection::vec((-50i64..50, -50i64..50), 1..6),
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ctx = test_context([0u8; 32]);
        let (seeker, hider) = ceremony(&ctx, &mut rng).unwrap();

        let encrypted: Vec<_> = moves
            .iter()
            .map(|(x, y)| seeker.encrypt_move(&[*x, *y], &mut rng).unwrap())
            .collect();
        let forward = EncryptedVector::sum(encrypted.iter()).unwrap().unwrap();
        let backward = EncryptedVector::sum(encrypted.iter().rev()).unwrap().unwrap();
        let targets = vec![forward, backward];

        let lead = seeker.lead_decrypt(&targets, 1, &mut rng).unwrap();
        let main = hider.main_decrypt(&targets, &lead, &mut rng).unwrap();
        let revealed = combine(&ctx, &targets, Some(&lead), Some(&main)).unwrap();

        let expected = vec![
            moves.iter().map(|m| m.0).sum::<i64>(),
            moves.iter().map(|m| m.1).sum::<i64>(),
        ];
        prop_assert_eq!(&revealed[0], &expected);
        prop_assert_eq!(&revealed[1], &expected);
    }
}
