use libp2p::identity::{DecodingError, Keypair};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Generate a fresh Ed25519 keypair from OS entropy.
pub fn generate() -> Keypair {
    Keypair::generate_ed25519()
}

/// Derive an Ed25519 keypair deterministically from `seed`.
///
/// The same seed always yields the same keypair, and therefore the same
/// peer id, within and across processes. Seeded identities are fully
/// predictable: they exist for reproducible tests only and must never be
/// used for a production host.
pub fn from_seed(seed: u64) -> Result<Keypair, DecodingError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut secret = [0u8; 32];
    rng.fill_bytes(&mut secret);
    Keypair::ed25519_from_bytes(secret)
}

/// Seeded identity if a seed was given, random otherwise.
pub fn make_keypair(seed: Option<u64>) -> Result<Keypair, DecodingError> {
    match seed {
        Some(seed) => from_seed(seed),
        None => Ok(generate()),
    }
}

#[cfg(test)]
mod tests {
    use libp2p::PeerId;

    use super::*;

    #[test]
    fn same_seed_yields_same_peer_id() {
        let a = from_seed(1).unwrap();
        let b = from_seed(1).unwrap();
        assert_eq!(PeerId::from(a.public()), PeerId::from(b.public()));
    }

    #[test]
    fn different_seeds_yield_different_peer_ids() {
        let a = from_seed(1).unwrap();
        let b = from_seed(2).unwrap();
        assert_ne!(PeerId::from(a.public()), PeerId::from(b.public()));
    }

    #[test]
    fn random_keypairs_differ() {
        let a = generate();
        let b = generate();
        assert_ne!(PeerId::from(a.public()), PeerId::from(b.public()));
    }

    #[test]
    fn make_keypair_dispatches_on_seed() {
        let seeded = make_keypair(Some(7)).unwrap();
        let again = from_seed(7).unwrap();
        assert_eq!(
            PeerId::from(seeded.public()),
            PeerId::from(again.public())
        );
    }
}
