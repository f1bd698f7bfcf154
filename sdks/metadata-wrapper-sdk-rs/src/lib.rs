//! Metadata Wrapper – Rust SDK
//!
//! Client side of the metadata wrapper program:
//! - [`AddressDeriver`]: metadata, master edition and associated token addresses
//! - [`InstructionComposer`]: mint setup and wrapper instructions with
//!   correct account ordering and client-side validation
//! - [`MetadataClient`]: fetch-and-decode getters and the four state-changing
//!   calls, over caller-supplied [`Connection`] and [`TransactionSubmitter`]
//!
//! Record layouts and decoders live in `metadata_wrapper_interface::state`
//! and are re-exported here.

pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod pda;
pub mod provider;
pub mod signer;

pub use {
    client::{GeneratedMetadata, MetadataClient},
    composer::{InstructionComposer, MetadataAccounts, MintSequenceParams},
    config::{ClientConfig, ConfigError},
    error::{ComposeError, MetadataClientError},
    metadata_wrapper_interface::{
        error::DecodeError,
        instruction::{MetadataInfo, UpdateMetadataInfo},
        state::{
            Collection, Creator, MasterEditionRecord, MasterEditionV1, MasterEditionV2,
            MetadataRecord, UsageLimit,
        },
    },
    pda::{AddressDeriver, DerivationError, ProgramAddressDeriver, Seed, SeedDeriver},
    provider::{Connection, ProviderError, TransactionSubmitter},
    signer::{Payer, SignerInfo},
};
