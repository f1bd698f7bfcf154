//! Account layouts owned by the token metadata program

use {
    crate::error::DecodeError,
    borsh::{BorshDeserialize, BorshSerialize},
    num_derive::FromPrimitive,
    num_traits::FromPrimitive,
    solana_program::pubkey::Pubkey,
};

/// Capacity of the padded `name` field
pub const MAX_NAME_LENGTH: usize = 32;

/// Capacity of the padded `symbol` field
pub const MAX_SYMBOL_LENGTH: usize = 10;

/// Capacity of the padded `uri` field
pub const MAX_URI_LENGTH: usize = 200;

/// Maximum number of creators a metadata account may list
pub const MAX_CREATOR_LIMIT: usize = 5;

/// Serialized size of one creator entry
pub const MAX_CREATOR_LEN: usize = 32 + 1 + 1;

/// Upper bound for seller fee basis points
pub const MAX_SELLER_FEE_BASIS_POINTS: u16 = 10_000;

/// Serialized size of the `Data` section at full capacity
pub const MAX_DATA_SIZE: usize = 4
    + MAX_NAME_LENGTH
    + 4
    + MAX_SYMBOL_LENGTH
    + 4
    + MAX_URI_LENGTH
    + 2
    + 1
    + 4
    + MAX_CREATOR_LIMIT * MAX_CREATOR_LEN;

/// Bytes allocated for a metadata account
pub const MAX_METADATA_LEN: usize = 1 // key
    + 32 // update authority
    + 32 // mint
    + MAX_DATA_SIZE
    + 1 // primary sale
    + 1 // mutable
    + 9 // edition nonce
    + 2 // token standard
    + 34 // collection
    + 18 // uses
    + 118; // padding

/// Bytes allocated for a master edition account. V1 and V2 share the
/// allocation so an account can be rewritten in place between versions.
pub const MAX_MASTER_EDITION_LEN: usize = 1 + 9 + 8 + 264;

/// Leading discriminator byte of every token metadata account.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum AccountKey {
    /// Allocated but never written
    Uninitialized = 0,
    /// Print edition
    EditionV1 = 1,
    /// Legacy master edition carrying printing mints
    MasterEditionV1 = 2,
    /// Legacy reservation list
    ReservationListV1 = 3,
    /// Metadata record
    MetadataV1 = 4,
    /// Reservation list
    ReservationListV2 = 5,
    /// Current master edition
    MasterEditionV2 = 6,
    /// Edition marker bitmap
    EditionMarker = 7,
}

/// A creator attributed in a metadata record.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    /// Creator address
    pub address: Pubkey,
    /// Set only by a transaction the creator co-signed
    pub verified: bool,
    /// Share of royalties in percent, not basis points
    pub share: u8,
}

/// Reference to the collection a token belongs to.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    /// Whether the collection authority verified membership
    pub verified: bool,
    /// Collection mint
    pub key: Pubkey,
}

/// Wire encoding of the use method.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseMethod {
    /// Token is burned on use
    Burn,
    /// Token may be used several times
    Multiple,
    /// Token may be used once
    Single,
}

/// Wire encoding of a usage limit, as stored on chain and in instruction args.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Uses {
    /// How the token is consumed
    pub use_method: UseMethod,
    /// Uses left
    pub remaining: u64,
    /// Uses granted at creation
    pub total: u64,
}

/// Typed usage limit attached to a metadata record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UsageLimit {
    /// No usage limit is attached
    #[default]
    None,
    /// Token is burned when used
    Burn,
    /// Token may be used up to `total` times
    Multiple {
        /// Uses left
        remaining: u64,
        /// Uses granted at creation
        total: u64,
    },
    /// Token may be used once
    Single {
        /// Uses left
        remaining: u64,
        /// Uses granted at creation
        total: u64,
    },
}

impl UsageLimit {
    /// Convert from the optional wire form.
    pub fn from_uses(uses: Option<Uses>) -> Self {
        match uses {
            None => UsageLimit::None,
            Some(u) => match u.use_method {
                UseMethod::Burn => UsageLimit::Burn,
                UseMethod::Multiple => UsageLimit::Multiple {
                    remaining: u.remaining,
                    total: u.total,
                },
                UseMethod::Single => UsageLimit::Single {
                    remaining: u.remaining,
                    total: u.total,
                },
            },
        }
    }

    /// Convert into the optional wire form. `Burn` carries no counters and
    /// is written as a single remaining use.
    pub fn to_uses(self) -> Option<Uses> {
        match self {
            UsageLimit::None => None,
            UsageLimit::Burn => Some(Uses {
                use_method: UseMethod::Burn,
                remaining: 1,
                total: 1,
            }),
            UsageLimit::Multiple { remaining, total } => Some(Uses {
                use_method: UseMethod::Multiple,
                remaining,
                total,
            }),
            UsageLimit::Single { remaining, total } => Some(Uses {
                use_method: UseMethod::Single,
                remaining,
                total,
            }),
        }
    }
}

// On the wire a usage limit is `Option<Uses>`.
impl BorshSerialize for UsageLimit {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.to_uses().serialize(writer)
    }
}

impl BorshDeserialize for UsageLimit {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Self::from_uses(Option::<Uses>::deserialize_reader(reader)?))
    }
}

/// Token standard recorded by newer metadata accounts.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStandard {
    /// Unique token with a master edition
    NonFungible,
    /// Fungible token with metadata attributes
    FungibleAsset,
    /// Plain fungible token
    Fungible,
    /// Print of a master edition
    NonFungibleEdition,
    /// Non-fungible token with transfer rules
    ProgrammableNonFungible,
    /// Print of a programmable master edition
    ProgrammableNonFungibleEdition,
}

/// Token metadata record (`MetadataV1`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Address allowed to mutate the record
    pub update_authority: Pubkey,
    /// Mint the record describes
    pub mint: Pubkey,
    /// Token name (<= MAX_NAME_LENGTH bytes)
    pub name: String,
    /// Token symbol (<= MAX_SYMBOL_LENGTH bytes)
    pub symbol: String,
    /// URI of the off-chain JSON (<= MAX_URI_LENGTH bytes)
    pub uri: String,
    /// Royalty in basis points (0-10000)
    pub seller_fee_basis_points: u16,
    /// Attributed creators
    pub creators: Option<Vec<Creator>>,
    /// Set once the first sale happened
    pub primary_sale_happened: bool,
    /// Cleared permanently once the record is frozen
    pub is_mutable: bool,
    /// Bump of the edition PDA, when recorded
    pub edition_nonce: Option<u8>,
    /// Token standard, when recorded
    pub token_standard: Option<TokenStandard>,
    /// Collection membership
    pub collection: Option<Collection>,
    /// Usage limit
    pub uses: UsageLimit,
}

impl MetadataRecord {
    /// Allocated account size.
    pub const LEN: usize = MAX_METADATA_LEN;

    /// Decode a fetched metadata account.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (&tag, mut buf) = data.split_first().ok_or(DecodeError::Empty)?;
        if tag != AccountKey::MetadataV1 as u8 {
            return Err(DecodeError::UnexpectedKey {
                found: tag,
                expected: AccountKey::MetadataV1 as u8,
            });
        }
        let buf = &mut buf;

        let update_authority = Pubkey::deserialize(buf)?;
        let mint = Pubkey::deserialize(buf)?;
        let name = read_padded(buf)?;
        let symbol = read_padded(buf)?;
        let uri = read_padded(buf)?;
        let seller_fee_basis_points = u16::deserialize(buf)?;
        let creators = Option::<Vec<Creator>>::deserialize(buf)?;
        let primary_sale_happened = bool::deserialize(buf)?;
        let is_mutable = bool::deserialize(buf)?;

        // Older accounts end before these fields.
        let edition_nonce = read_trailing::<u8>(buf)?;
        let token_standard = read_trailing::<TokenStandard>(buf)?;
        let collection = read_trailing::<Collection>(buf)?;
        let uses = UsageLimit::from_uses(read_trailing::<Uses>(buf)?);

        Ok(Self {
            update_authority,
            mint,
            name,
            symbol,
            uri,
            seller_fee_basis_points,
            creators,
            primary_sale_happened,
            is_mutable,
            edition_nonce,
            token_standard,
            collection,
            uses,
        })
    }

    /// Encode into a zero-padded account image of `LEN` bytes, padding string
    /// fields to their capacity.
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        let creator_count = self.creators.as_ref().map_or(0, Vec::len);
        if creator_count > MAX_CREATOR_LIMIT {
            return Err(DecodeError::TooManyCreators {
                count: creator_count,
                max: MAX_CREATOR_LIMIT,
            });
        }
        let mut out = Vec::with_capacity(Self::LEN);
        out.push(AccountKey::MetadataV1 as u8);
        self.update_authority.serialize(&mut out)?;
        self.mint.serialize(&mut out)?;
        write_padded(&mut out, "name", &self.name, MAX_NAME_LENGTH)?;
        write_padded(&mut out, "symbol", &self.symbol, MAX_SYMBOL_LENGTH)?;
        write_padded(&mut out, "uri", &self.uri, MAX_URI_LENGTH)?;
        self.seller_fee_basis_points.serialize(&mut out)?;
        self.creators.serialize(&mut out)?;
        self.primary_sale_happened.serialize(&mut out)?;
        self.is_mutable.serialize(&mut out)?;
        self.edition_nonce.serialize(&mut out)?;
        self.token_standard.serialize(&mut out)?;
        self.collection.serialize(&mut out)?;
        self.uses.serialize(&mut out)?;
        if out.len() < Self::LEN {
            out.resize(Self::LEN, 0);
        }
        Ok(out)
    }
}

/// Current master edition layout.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MasterEditionV2 {
    /// Prints minted so far
    pub supply: u64,
    /// Cap on prints; `Some(0)` means no prints may ever be made
    pub max_supply: Option<u64>,
}

/// Legacy master edition layout with printing mints.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MasterEditionV1 {
    /// Prints minted so far
    pub supply: u64,
    /// Cap on prints
    pub max_supply: Option<u64>,
    /// Mint of the printing tokens
    pub printing_mint: Pubkey,
    /// Mint of the one-time printing authorization tokens
    pub one_time_printing_authorization_mint: Pubkey,
}

/// Master edition record, discriminated by its leading key byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MasterEditionRecord {
    /// Legacy layout (key 2)
    V1(MasterEditionV1),
    /// Current layout (key 6)
    V2(MasterEditionV2),
}

impl MasterEditionRecord {
    /// Allocated account size.
    pub const LEN: usize = MAX_MASTER_EDITION_LEN;

    /// Decode a fetched master edition account.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (&tag, mut buf) = data.split_first().ok_or(DecodeError::Empty)?;
        match AccountKey::from_u8(tag) {
            Some(AccountKey::MasterEditionV1) => {
                Ok(Self::V1(MasterEditionV1::deserialize(&mut buf)?))
            }
            Some(AccountKey::MasterEditionV2) => {
                Ok(Self::V2(MasterEditionV2::deserialize(&mut buf)?))
            }
            _ => Err(DecodeError::UnrecognizedVersion(tag)),
        }
    }

    /// Encode into a zero-padded account image of `LEN` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::with_capacity(Self::LEN);
        match self {
            Self::V1(edition) => {
                out.push(AccountKey::MasterEditionV1 as u8);
                edition.serialize(&mut out)?;
            }
            Self::V2(edition) => {
                out.push(AccountKey::MasterEditionV2 as u8);
                edition.serialize(&mut out)?;
            }
        }
        out.resize(Self::LEN, 0);
        Ok(out)
    }

    /// Prints minted so far.
    pub fn supply(&self) -> u64 {
        match self {
            Self::V1(e) => e.supply,
            Self::V2(e) => e.supply,
        }
    }

    /// Cap on prints.
    pub fn max_supply(&self) -> Option<u64> {
        match self {
            Self::V1(e) => e.max_supply,
            Self::V2(e) => e.max_supply,
        }
    }
}

fn read_padded(buf: &mut &[u8]) -> Result<String, DecodeError> {
    let raw = String::deserialize(buf)?;
    Ok(raw.trim_end_matches('\0').to_string())
}

fn read_trailing<T: BorshDeserialize>(buf: &mut &[u8]) -> Result<Option<T>, DecodeError> {
    if buf.is_empty() {
        return Ok(None);
    }
    Ok(Option::<T>::deserialize(buf)?)
}

fn write_padded(
    out: &mut Vec<u8>,
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), DecodeError> {
    if value.len() > max {
        return Err(DecodeError::StringTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    let mut padded = value.to_string();
    padded.extend(std::iter::repeat('\0').take(max - value.len()));
    padded.serialize(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> MetadataRecord {
        MetadataRecord {
            update_authority: Pubkey::new_from_array([1; 32]),
            mint: Pubkey::new_from_array([2; 32]),
            name: "NAMO".into(),
            symbol: "SYMB".into(),
            uri: "https://someserver.com".into(),
            seller_fee_basis_points: 420,
            creators: Some(vec![
                Creator {
                    address: Pubkey::new_from_array([1; 32]),
                    verified: true,
                    share: 60,
                },
                Creator {
                    address: Pubkey::new_from_array([3; 32]),
                    verified: false,
                    share: 40,
                },
            ]),
            primary_sale_happened: true,
            is_mutable: true,
            edition_nonce: Some(254),
            token_standard: Some(TokenStandard::NonFungible),
            collection: Some(Collection {
                verified: false,
                key: Pubkey::new_from_array([4; 32]),
            }),
            uses: UsageLimit::Multiple {
                remaining: 3,
                total: 5,
            },
        }
    }

    #[test]
    fn metadata_decodes_what_it_encodes() {
        let record = sample_metadata();
        let bytes = record.encode().unwrap();
        assert_eq!(bytes.len(), MetadataRecord::LEN);
        assert_eq!(MetadataRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn metadata_strings_are_padded_to_capacity() {
        let bytes = sample_metadata().encode().unwrap();
        // key + update authority + mint, then the name length prefix
        let name_len = u32::from_le_bytes(bytes[65..69].try_into().unwrap());
        assert_eq!(name_len as usize, MAX_NAME_LENGTH);
        assert_eq!(&bytes[69..73], b"NAMO");
        assert!(bytes[73..69 + MAX_NAME_LENGTH].iter().all(|b| *b == 0));
    }

    #[test]
    fn metadata_padding_is_not_logical_identity() {
        let record = sample_metadata();
        let mut bytes = vec![AccountKey::MetadataV1 as u8];
        record.update_authority.serialize(&mut bytes).unwrap();
        record.mint.serialize(&mut bytes).unwrap();
        // unpadded strings decode to the same logical values
        "NAMO".to_string().serialize(&mut bytes).unwrap();
        "SYMB\0\0".to_string().serialize(&mut bytes).unwrap();
        "https://someserver.com".to_string().serialize(&mut bytes).unwrap();
        record.seller_fee_basis_points.serialize(&mut bytes).unwrap();
        record.creators.serialize(&mut bytes).unwrap();
        bytes.extend([1, 1]);

        let decoded = MetadataRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.name, record.name);
        assert_eq!(decoded.symbol, record.symbol);
        assert_eq!(decoded.uri, record.uri);
        // truncated account: trailing optionals are absent
        assert_eq!(decoded.edition_nonce, None);
        assert_eq!(decoded.token_standard, None);
        assert_eq!(decoded.collection, None);
        assert_eq!(decoded.uses, UsageLimit::None);
    }

    #[test]
    fn metadata_absent_flag_ignores_following_bytes() {
        let mut record = sample_metadata();
        record.collection = None;
        record.uses = UsageLimit::None;
        let mut bytes = record.encode().unwrap();
        // flip bytes inside the zero padding after the uses flag
        let tail = bytes.len() - 10;
        bytes[tail..].fill(0xff);
        assert_eq!(MetadataRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn metadata_rejects_empty_and_foreign_buffers() {
        assert_eq!(MetadataRecord::decode(&[]), Err(DecodeError::Empty));

        let edition = MasterEditionRecord::V2(MasterEditionV2 {
            supply: 0,
            max_supply: Some(0),
        })
        .encode()
        .unwrap();
        assert_eq!(
            MetadataRecord::decode(&edition),
            Err(DecodeError::UnexpectedKey {
                found: 6,
                expected: 4
            })
        );
    }

    #[test]
    fn metadata_rejects_truncated_buffer() {
        let bytes = sample_metadata().encode().unwrap();
        assert!(matches!(
            MetadataRecord::decode(&bytes[..100]),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn encode_rejects_oversized_strings() {
        let mut record = sample_metadata();
        record.symbol = "TOOLONGSYMBOL".into();
        assert_eq!(
            record.encode(),
            Err(DecodeError::StringTooLong {
                field: "symbol",
                len: 13,
                max: MAX_SYMBOL_LENGTH
            })
        );
    }

    #[test]
    fn encode_rejects_more_creators_than_fit() {
        let mut record = sample_metadata();
        record.creators = Some(
            (0..=MAX_CREATOR_LIMIT as u8)
                .map(|i| Creator {
                    address: Pubkey::new_from_array([10 + i; 32]),
                    verified: false,
                    share: 10,
                })
                .collect(),
        );
        assert_eq!(
            record.encode(),
            Err(DecodeError::TooManyCreators {
                count: MAX_CREATOR_LIMIT + 1,
                max: MAX_CREATOR_LIMIT
            })
        );

        record.creators.as_mut().unwrap().truncate(MAX_CREATOR_LIMIT);
        assert_eq!(record.encode().unwrap().len(), MetadataRecord::LEN);
    }

    #[test]
    fn metadata_reads_programmable_edition_standard() {
        let mut bytes = vec![AccountKey::MetadataV1 as u8];
        bytes.extend_from_slice(&[1; 32]);
        bytes.extend_from_slice(&[2; 32]);
        write_padded(&mut bytes, "name", "Print", MAX_NAME_LENGTH).unwrap();
        write_padded(&mut bytes, "symbol", "PRT", MAX_SYMBOL_LENGTH).unwrap();
        write_padded(&mut bytes, "uri", "https://someserver.com/1", MAX_URI_LENGTH).unwrap();
        bytes.extend_from_slice(&500u16.to_le_bytes());
        // no creators, primary sale happened, mutable
        bytes.extend_from_slice(&[0, 1, 1]);
        bytes.extend_from_slice(&[1, 254]);
        bytes.extend_from_slice(&[1, 5]);
        bytes.resize(MAX_METADATA_LEN, 0);

        let record = MetadataRecord::decode(&bytes).unwrap();
        assert_eq!(record.name, "Print");
        assert_eq!(record.edition_nonce, Some(254));
        assert_eq!(
            record.token_standard,
            Some(TokenStandard::ProgrammableNonFungibleEdition)
        );
        assert_eq!(record.collection, None);
        assert_eq!(record.uses, UsageLimit::None);
        assert_eq!(record.encode().unwrap(), bytes);
    }

    #[test]
    fn usage_limit_wire_mapping() {
        assert_eq!(UsageLimit::from_uses(None), UsageLimit::None);
        assert_eq!(UsageLimit::None.to_uses(), None);

        let single = UsageLimit::Single {
            remaining: 1,
            total: 1,
        };
        assert_eq!(UsageLimit::from_uses(single.to_uses()), single);

        let burn = Uses {
            use_method: UseMethod::Burn,
            remaining: 7,
            total: 9,
        };
        assert_eq!(UsageLimit::from_uses(Some(burn)), UsageLimit::Burn);
    }

    #[test]
    fn master_edition_v1_carries_printing_mints() {
        let v1 = MasterEditionV1 {
            supply: 2,
            max_supply: Some(10),
            printing_mint: Pubkey::new_from_array([5; 32]),
            one_time_printing_authorization_mint: Pubkey::new_from_array([6; 32]),
        };
        let bytes = MasterEditionRecord::V1(v1.clone()).encode().unwrap();
        assert_eq!(bytes[0], AccountKey::MasterEditionV1 as u8);
        assert_eq!(bytes.len(), MasterEditionRecord::LEN);

        match MasterEditionRecord::decode(&bytes).unwrap() {
            MasterEditionRecord::V1(decoded) => assert_eq!(decoded, v1),
            other => panic!("expected V1, got {other:?}"),
        }
    }

    #[test]
    fn master_edition_v2_has_no_printing_mints() {
        let bytes = MasterEditionRecord::V2(MasterEditionV2 {
            supply: 0,
            max_supply: Some(0),
        })
        .encode()
        .unwrap();

        let decoded = MasterEditionRecord::decode(&bytes).unwrap();
        assert!(matches!(decoded, MasterEditionRecord::V2(_)));
        assert_eq!(decoded.max_supply(), Some(0));
        assert_eq!(decoded.supply(), 0);
    }

    #[test]
    fn master_edition_unlimited_supply_is_absent() {
        let mut bytes = vec![AccountKey::MasterEditionV2 as u8];
        bytes.extend(5u64.to_le_bytes());
        bytes.push(0);
        // garbage after an absent flag is ignored
        bytes.extend([9u8; 8]);
        let decoded = MasterEditionRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.max_supply(), None);
        assert_eq!(decoded.supply(), 5);
    }

    #[test]
    fn master_edition_rejects_unknown_tags() {
        assert_eq!(MasterEditionRecord::decode(&[]), Err(DecodeError::Empty));
        for tag in [0u8, 1, 4, 7, 42, 255] {
            let mut bytes = vec![0u8; MasterEditionRecord::LEN];
            bytes[0] = tag;
            assert_eq!(
                MasterEditionRecord::decode(&bytes),
                Err(DecodeError::UnrecognizedVersion(tag))
            );
        }
    }

    #[test]
    fn master_edition_rejects_truncated_buffer() {
        let bytes = [AccountKey::MasterEditionV2 as u8, 1, 2];
        assert!(matches!(
            MasterEditionRecord::decode(&bytes),
            Err(DecodeError::Malformed(_))
        ));
    }
}
