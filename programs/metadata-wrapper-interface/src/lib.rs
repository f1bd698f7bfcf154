#![deny(missing_docs)]
#![forbid(unsafe_code)]

//! Metadata Wrapper – program interface
//!
//! Program ids, PDA seeds, the wrapper program's instruction encoding and the
//! token metadata program's account layouts. Nothing in this crate performs I/O.

pub mod error;
pub mod instruction;
pub mod state;

use solana_program::{pubkey, pubkey::Pubkey};

/// The deployed metadata wrapper program
pub const WRAPPER_PROGRAM_ID: Pubkey = pubkey!("FGDFtTf13pWintava7VXbpytXWDmXoxVKP2w4fafHhQQ");

/// The token metadata program the wrapper forwards into
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// PDA seed prefix shared by metadata and master edition accounts
pub const METADATA_SEED: &[u8] = b"metadata";

/// PDA seed suffix for master edition accounts
pub const EDITION_SEED: &[u8] = b"edition";
