//! Program derived addresses
//!
//! Bumps are searched from 255 downwards; the first off-curve address is the
//! canonical one, matching what the chain's own programs derive.

use {
    crate::config::ClientConfig,
    metadata_wrapper_interface::{EDITION_SEED, METADATA_SEED},
    solana_program::pubkey::{Pubkey, PubkeyError, MAX_SEEDS, MAX_SEED_LEN},
    thiserror::Error,
};

/// Seed material accepted by [`AddressDeriver::derive`]. Every variant is
/// normalized to its raw bytes before hashing.
#[derive(Clone, Copy, Debug)]
pub enum Seed<'a> {
    /// Raw bytes
    Bytes(&'a [u8]),
    /// UTF-8 string
    Str(&'a str),
    /// Another address
    Address(&'a Pubkey),
}

impl<'a> Seed<'a> {
    /// Raw bytes hashed for this seed.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Seed::Bytes(bytes) => bytes,
            Seed::Str(s) => s.as_bytes(),
            Seed::Address(address) => address.as_ref(),
        }
    }
}

impl<'a> From<&'a [u8]> for Seed<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Seed::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Seed<'a> {
    fn from(s: &'a str) -> Self {
        Seed::Str(s)
    }
}

impl<'a> From<&'a Pubkey> for Seed<'a> {
    fn from(address: &'a Pubkey) -> Self {
        Seed::Address(address)
    }
}

/// Errors deriving a program address.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DerivationError {
    /// Every bump in 0..=255 produced an on-curve address
    #[error("no off-curve address exists for program {program_id} within the bump range")]
    Exhausted {
        /// Program the derivation ran under
        program_id: Pubkey,
    },
    /// A seed exceeds the per-seed limit
    #[error("seed {index} is {len} bytes, limit is {}", MAX_SEED_LEN)]
    SeedTooLong {
        /// Position of the offending seed
        index: usize,
        /// Its length
        len: usize,
    },
    /// Too many seeds to leave room for the bump
    #[error("{count} seeds given, at most {} allowed", MAX_SEEDS - 1)]
    TooManySeeds {
        /// Number of seeds supplied
        count: usize,
    },
}

/// Capability to turn seeds into a program-owned address and its bump.
pub trait SeedDeriver: Send + Sync {
    /// Derive the canonical `(address, bump)` for `seeds` under `program_id`.
    fn derive(
        &self,
        program_id: &Pubkey,
        seeds: &[&[u8]],
    ) -> Result<(Pubkey, u8), DerivationError>;
}

/// [`SeedDeriver`] using the chain's `create_program_address` primitive.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProgramAddressDeriver;

impl SeedDeriver for ProgramAddressDeriver {
    fn derive(
        &self,
        program_id: &Pubkey,
        seeds: &[&[u8]],
    ) -> Result<(Pubkey, u8), DerivationError> {
        if seeds.len() >= MAX_SEEDS {
            return Err(DerivationError::TooManySeeds { count: seeds.len() });
        }
        if let Some((index, seed)) = seeds
            .iter()
            .enumerate()
            .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
        {
            return Err(DerivationError::SeedTooLong {
                index,
                len: seed.len(),
            });
        }

        for bump in (0..=u8::MAX).rev() {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
            with_bump.extend_from_slice(seeds);
            with_bump.push(&bump_seed);

            match Pubkey::create_program_address(&with_bump, program_id) {
                Ok(address) => return Ok((address, bump)),
                // on curve, try the next bump
                Err(PubkeyError::InvalidSeeds) => continue,
                Err(_) => break,
            }
        }
        Err(DerivationError::Exhausted {
            program_id: *program_id,
        })
    }
}

/// Derives the addresses the metadata flows touch.
#[derive(Clone, Debug)]
pub struct AddressDeriver<D = ProgramAddressDeriver> {
    config: ClientConfig,
    deriver: D,
}

impl AddressDeriver {
    /// Deriver backed by [`ProgramAddressDeriver`].
    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(config, ProgramAddressDeriver)
    }
}

impl<D: SeedDeriver> AddressDeriver<D> {
    /// Build a deriver from an explicit seed capability.
    pub fn new(config: ClientConfig, deriver: D) -> Self {
        Self { config, deriver }
    }

    /// Configuration the deriver was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Derive `(address, bump)` from heterogeneous seeds.
    pub fn derive(
        &self,
        program_id: &Pubkey,
        seeds: &[Seed<'_>],
    ) -> Result<(Pubkey, u8), DerivationError> {
        let bytes: Vec<&[u8]> = seeds.iter().map(Seed::as_bytes).collect();
        self.deriver.derive(program_id, &bytes)
    }

    /// Derive the metadata PDA for a given mint, with the bump.
    pub fn metadata_pda_and_bump(&self, mint: &Pubkey) -> Result<(Pubkey, u8), DerivationError> {
        let program_id = self.config.token_metadata_program_id;
        self.derive(
            &program_id,
            &[
                Seed::Bytes(METADATA_SEED),
                Seed::Address(&program_id),
                Seed::Address(mint),
            ],
        )
    }

    /// Derive the metadata PDA for a given mint.
    pub fn metadata_pda(&self, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        self.metadata_pda_and_bump(mint).map(|(pda, _bump)| pda)
    }

    /// Derive the master edition PDA for a given mint, with the bump.
    pub fn master_edition_pda_and_bump(
        &self,
        mint: &Pubkey,
    ) -> Result<(Pubkey, u8), DerivationError> {
        let program_id = self.config.token_metadata_program_id;
        self.derive(
            &program_id,
            &[
                Seed::Bytes(METADATA_SEED),
                Seed::Address(&program_id),
                Seed::Address(mint),
                Seed::Bytes(EDITION_SEED),
            ],
        )
    }

    /// Derive the master edition PDA for a given mint.
    pub fn master_edition_pda(&self, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        self.master_edition_pda_and_bump(mint).map(|(pda, _bump)| pda)
    }

    /// Canonical token account holding `owner`'s balance of `mint`, as defined
    /// by the associated token account program.
    pub fn associated_token_address(&self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        spl_associated_token_account::get_associated_token_address_with_program_id(
            owner,
            mint,
            &spl_token::id(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deriver() -> AddressDeriver {
        AddressDeriver::with_config(ClientConfig::default())
    }

    struct NeverOffCurve;

    impl SeedDeriver for NeverOffCurve {
        fn derive(
            &self,
            program_id: &Pubkey,
            _seeds: &[&[u8]],
        ) -> Result<(Pubkey, u8), DerivationError> {
            Err(DerivationError::Exhausted {
                program_id: *program_id,
            })
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let d = deriver();
        let program_id = Pubkey::new_unique();
        let seeds = [Seed::Str("vault"), Seed::Bytes(&[1, 2, 3])];
        let first = d.derive(&program_id, &seeds).unwrap();
        for _ in 0..10 {
            assert_eq!(d.derive(&program_id, &seeds).unwrap(), first);
        }
    }

    #[test]
    fn derived_addresses_are_off_curve() {
        let d = deriver();
        for _ in 0..256 {
            let mint = Pubkey::new_unique();
            let (metadata, _) = d.metadata_pda_and_bump(&mint).unwrap();
            let (edition, _) = d.master_edition_pda_and_bump(&mint).unwrap();
            assert!(!metadata.is_on_curve());
            assert!(!edition.is_on_curve());
            assert_ne!(metadata, edition);
        }
    }

    #[test]
    fn matches_the_runtime_search() {
        let d = deriver();
        let program_id = d.config().token_metadata_program_id;
        for _ in 0..64 {
            let mint = Pubkey::new_unique();
            let expected = Pubkey::find_program_address(
                &[METADATA_SEED, program_id.as_ref(), mint.as_ref()],
                &program_id,
            );
            assert_eq!(d.metadata_pda_and_bump(&mint).unwrap(), expected);

            let expected = Pubkey::find_program_address(
                &[METADATA_SEED, program_id.as_ref(), mint.as_ref(), EDITION_SEED],
                &program_id,
            );
            assert_eq!(d.master_edition_pda_and_bump(&mint).unwrap(), expected);
        }
    }

    #[test]
    fn seeds_normalize_to_bytes() {
        let d = deriver();
        let program_id = Pubkey::new_unique();
        let key = Pubkey::new_unique();
        let typed = d
            .derive(&program_id, &[Seed::Str("metadata"), Seed::Address(&key)])
            .unwrap();
        let raw = d
            .derive(
                &program_id,
                &[Seed::Bytes(b"metadata"), Seed::Bytes(key.as_ref())],
            )
            .unwrap();
        assert_eq!(typed, raw);
    }

    #[test]
    fn seed_order_matters() {
        let d = deriver();
        let program_id = Pubkey::new_unique();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ab = d.derive(&program_id, &[(&a).into(), (&b).into()]).unwrap();
        let ba = d.derive(&program_id, &[(&b).into(), (&a).into()]).unwrap();
        assert_ne!(ab.0, ba.0);
    }

    #[test]
    fn rejects_oversized_seeds() {
        let d = deriver();
        let long = [7u8; MAX_SEED_LEN + 1];
        assert_eq!(
            d.derive(&Pubkey::new_unique(), &[Seed::Str("ok"), Seed::Bytes(&long)]),
            Err(DerivationError::SeedTooLong {
                index: 1,
                len: MAX_SEED_LEN + 1
            })
        );

        let many: Vec<Seed> = (0..MAX_SEEDS).map(|_| Seed::Str("x")).collect();
        assert_eq!(
            d.derive(&Pubkey::new_unique(), &many),
            Err(DerivationError::TooManySeeds { count: MAX_SEEDS })
        );
    }

    #[test]
    fn exhaustion_surfaces_from_injected_deriver() {
        let config = ClientConfig::default();
        let d = AddressDeriver::new(config, NeverOffCurve);
        assert_eq!(
            d.metadata_pda(&Pubkey::new_unique()),
            Err(DerivationError::Exhausted {
                program_id: config.token_metadata_program_id
            })
        );
    }

    #[test]
    fn associated_token_address_matches_protocol() {
        let d = deriver();
        let (owner, mint) = (Pubkey::new_unique(), Pubkey::new_unique());
        assert_eq!(
            d.associated_token_address(&owner, &mint),
            spl_associated_token_account::get_associated_token_address(&owner, &mint)
        );
        let (expected, _) = Pubkey::find_program_address(
            &[owner.as_ref(), spl_token::id().as_ref(), mint.as_ref()],
            &spl_associated_token_account::id(),
        );
        assert_eq!(d.associated_token_address(&owner, &mint), expected);
    }
}
