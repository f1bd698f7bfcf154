//! Instruction types

use {
    crate::state::{Collection, Creator, UsageLimit},
    borsh::{BorshDeserialize, BorshSerialize},
    solana_program::{hash::hash, program_error::ProgramError, pubkey::Pubkey},
};

/// Length of the instruction discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Arguments of the `generate` instruction.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataInfo {
    /// The name of the asset
    pub name: String,
    /// The symbol of the asset
    pub symbol: String,
    /// URI pointing to JSON representing the asset
    pub uri: String,
    /// Attributed creators, shares summing to 100
    pub creators: Option<Vec<Creator>>,
    /// Royalty basis points that go to creators in secondary sales (0-10000)
    pub seller_fee_basis_points: u16,
    /// Whether the update authority signs the creation
    pub update_authority_is_signer: bool,
    /// If false, the record can never be changed again
    pub is_mutable: bool,
    /// Collection membership
    pub collection: Option<Collection>,
    /// Usage limit
    pub uses: UsageLimit,
    /// Master edition cap; `None` skips master edition creation
    pub supply: Option<u64>,
    /// Authority handed the record once primary sale is recorded
    pub new_update_authority: Option<Pubkey>,
}

/// Arguments of the `update_metadata` instruction. Every field replaces the
/// stored value; `None` clears.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateMetadataInfo {
    /// The name of the asset
    pub name: String,
    /// The symbol of the asset
    pub symbol: String,
    /// URI pointing to JSON representing the asset
    pub uri: String,
    /// Royalty basis points (0-10000)
    pub seller_fee_basis_points: u16,
    /// Attributed creators
    pub creators: Option<Vec<Creator>>,
    /// Collection membership
    pub collection: Option<Collection>,
    /// Usage limit
    pub uses: UsageLimit,
}

/// Instructions supported by the metadata wrapper program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WrapperInstruction {
    /// Create metadata, optionally a master edition, and record the primary sale
    Generate(MetadataInfo),
    /// Verify the signing creator on a metadata record
    SignMetadata,
    /// Replace only the URI
    UpdateMetadataUri {
        /// New URI
        uri: String,
    },
    /// Replace every mutable field
    UpdateMetadata(UpdateMetadataInfo),
}

impl WrapperInstruction {
    /// Method name hashed into the discriminator.
    pub fn name(&self) -> &'static str {
        match self {
            WrapperInstruction::Generate(_) => "generate",
            WrapperInstruction::SignMetadata => "sign_metadata",
            WrapperInstruction::UpdateMetadataUri { .. } => "update_metadata_uri",
            WrapperInstruction::UpdateMetadata(_) => "update_metadata",
        }
    }

    /// First eight bytes of `sha256("global:<name>")`.
    pub fn discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
        let digest = hash(format!("global:{name}").as_bytes());
        let mut out = [0u8; DISCRIMINATOR_LEN];
        out.copy_from_slice(&digest.to_bytes()[..DISCRIMINATOR_LEN]);
        out
    }

    /// Pack the instruction into its wire form.
    pub fn pack(&self) -> Vec<u8> {
        let mut data = Self::discriminator(self.name()).to_vec();
        let args = match self {
            WrapperInstruction::Generate(info) => borsh::to_vec(info),
            WrapperInstruction::SignMetadata => Ok(Vec::new()),
            WrapperInstruction::UpdateMetadataUri { uri } => borsh::to_vec(uri),
            WrapperInstruction::UpdateMetadata(info) => borsh::to_vec(info),
        };
        data.extend(args.expect("serializing into a Vec cannot fail"));
        data
    }

    /// Unpack a byte array into a WrapperInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        if input.len() < DISCRIMINATOR_LEN {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (tag, args) = input.split_at(DISCRIMINATOR_LEN);
        let invalid = |_| ProgramError::InvalidInstructionData;

        if tag == Self::discriminator("generate") {
            Ok(Self::Generate(borsh::from_slice(args).map_err(invalid)?))
        } else if tag == Self::discriminator("sign_metadata") {
            Ok(Self::SignMetadata)
        } else if tag == Self::discriminator("update_metadata_uri") {
            Ok(Self::UpdateMetadataUri {
                uri: borsh::from_slice(args).map_err(invalid)?,
            })
        } else if tag == Self::discriminator("update_metadata") {
            Ok(Self::UpdateMetadata(borsh::from_slice(args).map_err(invalid)?))
        } else {
            Err(ProgramError::InvalidInstructionData)
        }
    }
}
