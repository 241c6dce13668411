//! Raw and user-friendly TON account address codec.
//!
//! An account is identified by a signed 8-bit workchain and a 32-byte hash.
//! Its raw text form is `"<workchain>:<64 hex chars>"`. Its user-friendly form
//! packs a tag byte (bounceable / test-only flags), the workchain, the hash
//! and a CRC16/XMODEM checksum into 36 bytes, rendered as 48 characters of
//! unpadded base64url:
//!
//! ```text
//! | tag (1) | workchain (1) | hash (32) | crc16 big-endian (2) |
//! ```
//!
//! This crate supports:
//! - Parsing and printing the raw form.
//! - Encoding to and decoding from the user-friendly form, with checksum
//!   verification.
//! - Normalizing an address of either form to a chosen flag combination.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

pub mod crc16;

pub use crc16::Crc16Table;

/// A user-friendly address is always 48 characters long.
pub const ADDRESS_LENGTH: usize = 48;

/// Decoded size of a user-friendly address.
pub const ENCODED_LENGTH: usize = 36;

/// Tag, workchain and hash; the part covered by the checksum.
pub const PAYLOAD_LENGTH: usize = 34;

/// Account hash length in bytes.
pub const HASH_LENGTH: usize = 32;

/// Tag byte of a bounceable address.
pub const TAG_BOUNCEABLE: u8 = 0x11;

/// Tag byte of a non-bounceable address.
pub const TAG_NON_BOUNCEABLE: u8 = 0x51;

/// Bit OR'd into the tag byte of a test-only address.
pub const TAG_TEST_ONLY: u8 = 0x80;

/// Codec used by the free functions of this crate.
const CODEC: AddressCodec = AddressCodec::new();

/// An account address in raw form.
///
/// Both invariants (workchain fits in a signed byte, hash is 32 bytes) are
/// carried by the field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawAddress {
    /// Workchain id.
    pub workchain: i8,
    /// Account hash.
    pub hash: [u8; HASH_LENGTH],
}

impl RawAddress {
    #[must_use]
    pub const fn new(workchain: i8, hash: [u8; HASH_LENGTH]) -> Self {
        RawAddress { workchain, hash }
    }

    /// The raw account hash bytes
    #[must_use]
    pub fn hash_bytes(&self) -> &[u8] {
        &self.hash
    }

    /// The lowercase hex representation of the account hash
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Display for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, self.hash_hex())
    }
}

/// Parses `"<workchain>:<64 hex chars>"`. Hex is case-insensitive.
impl FromStr for RawAddress {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separators = s.matches(':').count();
        let Some((workchain, hash)) = s.split_once(':').filter(|_| separators == 1) else {
            return Err(FormatError::SeparatorCount(separators));
        };

        let workchain = workchain
            .parse::<i8>()
            .map_err(|_| FormatError::InvalidWorkchain(workchain.to_string()))?;

        if hash.len() != 2 * HASH_LENGTH {
            return Err(FormatError::InvalidHash(hash.to_string()));
        }
        let mut bytes = [0u8; HASH_LENGTH];
        hex::decode_to_slice(hash, &mut bytes)
            .map_err(|_| FormatError::InvalidHash(hash.to_string()))?;

        Ok(RawAddress::new(workchain, bytes))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RawAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RawAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Flags carried in the tag byte of a user-friendly address.
///
/// The default is bounceable on the main network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressFlags {
    /// A failed message to this address bounces its funds back.
    pub bounceable: bool,
    /// The address is only valid on a test network.
    pub test_only: bool,
}

impl AddressFlags {
    #[must_use]
    pub const fn new(bounceable: bool, test_only: bool) -> Self {
        AddressFlags {
            bounceable,
            test_only,
        }
    }

    /// Tag byte to embed in the payload.
    ///
    /// `0x11` bounceable, `0x51` non-bounceable, plus `0x80` when test-only.
    #[must_use]
    pub const fn tag(self) -> u8 {
        let base = if self.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if self.test_only {
            base | TAG_TEST_ONLY
        } else {
            base
        }
    }

    /// Reverse lookup from tag byte to flags.
    ///
    /// Only the four literal tags are recognised; the bounceable bit is not
    /// re-derived from a mask, so `0xD1` is non-bounceable and test-only.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<AddressFlags> {
        let test_only = tag & TAG_TEST_ONLY != 0;
        match tag & !TAG_TEST_ONLY {
            TAG_BOUNCEABLE => Some(AddressFlags::new(true, test_only)),
            TAG_NON_BOUNCEABLE => Some(AddressFlags::new(false, test_only)),
            _ => None,
        }
    }
}

impl Default for AddressFlags {
    fn default() -> Self {
        AddressFlags::new(true, false)
    }
}

/// Malformed raw or user-friendly address text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Raw form needs exactly one `:`
    #[error("expected exactly one ':' in raw address, found {0}")]
    SeparatorCount(usize),

    #[error("invalid workchain {0:?}: must be an integer in -128..=127")]
    InvalidWorkchain(String),

    #[error("invalid account hash {0:?}: must be 64 hex characters")]
    InvalidHash(String),

    /// Not unpadded base64url
    #[error("base64url error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid decoded address length: got {got}, expected {expected}")]
    InvalidLength { got: usize, expected: usize },

    /// Tag byte isn't one of `0x11`, `0x51`, `0x91`, `0xD1`
    #[error("unknown address tag: 0x{0:02X}")]
    UnknownTag(u8),
}

/// Errors that can occur while decoding or normalizing an address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed address: {0}")]
    Format(#[from] FormatError),

    /// The text is well-formed but its payload was corrupted or tampered with.
    #[error("address checksum mismatch: stored 0x{stored:04X}, computed 0x{computed:04X}")]
    ChecksumMismatch { stored: u16, computed: u16 },
}

impl AddressError {
    #[must_use]
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, AddressError::ChecksumMismatch { .. })
    }
}

/// The decoded components of a user-friendly address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserFriendlyAddress {
    pub raw: RawAddress,
    pub flags: AddressFlags,
}

impl fmt::Display for UserFriendlyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&CODEC.encode_raw(&self.raw, self.flags))
    }
}

/// Converts between raw and user-friendly addresses.
///
/// Holds the CRC16/XMODEM table, built at compile time. The codec is `Copy`
/// and immutable, so one instance can serve any number of threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddressCodec {
    table: Crc16Table,
}

impl AddressCodec {
    #[must_use]
    pub const fn new() -> Self {
        AddressCodec {
            table: Crc16Table::XMODEM,
        }
    }

    /// CRC16/XMODEM of `data`.
    #[must_use]
    pub fn checksum(&self, data: &[u8]) -> u16 {
        self.table.checksum(data)
    }

    /// Encodes a raw address. Always yields [`ADDRESS_LENGTH`] characters.
    #[must_use]
    pub fn encode_raw(&self, raw: &RawAddress, flags: AddressFlags) -> String {
        let mut bytes = [0u8; ENCODED_LENGTH];
        bytes[0] = flags.tag();
        bytes[1] = raw.workchain.to_be_bytes()[0];
        bytes[2..PAYLOAD_LENGTH].copy_from_slice(&raw.hash);

        let crc = self.checksum(&bytes[..PAYLOAD_LENGTH]);
        bytes[PAYLOAD_LENGTH..].copy_from_slice(&crc.to_be_bytes());

        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Parses raw address text and encodes it.
    ///
    /// # Errors
    /// Returns `FormatError` if `raw` is not `"<workchain>:<64 hex chars>"`
    /// with a workchain in `-128..=127`.
    pub fn encode(&self, raw: &str, flags: AddressFlags) -> Result<String, FormatError> {
        let raw: RawAddress = raw.parse()?;
        Ok(self.encode_raw(&raw, flags))
    }

    /// Decodes a user-friendly address string back into its parts.
    ///
    /// # Errors
    /// - `FormatError` if the text is not unpadded base64url, does not decode
    ///   to 36 bytes, or carries an unknown tag byte.
    /// - `ChecksumMismatch` if the stored checksum disagrees with the payload.
    pub fn decode(&self, address: &str) -> Result<UserFriendlyAddress, AddressError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(address)
            .map_err(FormatError::from)?;
        let bytes: [u8; ENCODED_LENGTH] = decoded.as_slice().try_into().map_err(|_| {
            debug!(got = decoded.len(), "rejecting address with wrong decoded length");
            FormatError::InvalidLength {
                got: decoded.len(),
                expected: ENCODED_LENGTH,
            }
        })?;

        let (payload, crc) = bytes.split_at(PAYLOAD_LENGTH);
        let stored = u16::from_be_bytes([crc[0], crc[1]]);
        let computed = self.checksum(payload);
        if stored != computed {
            debug!(stored, computed, "rejecting address with checksum mismatch");
            return Err(AddressError::ChecksumMismatch { stored, computed });
        }

        let tag = payload[0];
        let flags = AddressFlags::from_tag(tag).ok_or_else(|| {
            debug!(tag, "rejecting address with unknown tag");
            FormatError::UnknownTag(tag)
        })?;

        let workchain = i8::from_be_bytes([payload[1]]);
        let mut hash = [0u8; HASH_LENGTH];
        hash.copy_from_slice(&payload[2..]);

        Ok(UserFriendlyAddress {
            raw: RawAddress::new(workchain, hash),
            flags,
        })
    }

    /// Re-encodes an address of either form with the requested bounceable flag.
    ///
    /// The form is decided by [`is_user_friendly_form`] alone: 48 characters
    /// without a `:` are decoded as user-friendly and keep their test-only
    /// bit. Anything else is parsed as raw text and encoded for the main
    /// network.
    ///
    /// # Errors
    /// Propagates the `FormatError` or `ChecksumMismatch` of the branch taken.
    pub fn normalize(&self, address: &str, target_bounceable: bool) -> Result<String, AddressError> {
        let (raw, test_only) = if is_user_friendly_form(address) {
            let decoded = self.decode(address)?;
            (decoded.raw, decoded.flags.test_only)
        } else {
            (address.parse::<RawAddress>()?, false)
        };
        let flags = AddressFlags::new(target_bounceable, test_only);
        trace!(%raw, ?flags, "normalized address");
        Ok(self.encode_raw(&raw, flags))
    }

    /// Bounceable user-friendly form, as used for contract interactions.
    ///
    /// # Errors
    /// See [`AddressCodec::normalize`].
    pub fn to_bounceable(&self, address: &str) -> Result<String, AddressError> {
        self.normalize(address, true)
    }

    /// Non-bounceable user-friendly form, as shown for wallets.
    ///
    /// # Errors
    /// See [`AddressCodec::normalize`].
    pub fn to_non_bounceable(&self, address: &str) -> Result<String, AddressError> {
        self.normalize(address, false)
    }

    /// Raw form of an address given in either form.
    ///
    /// Text containing `:` is parsed as raw; anything else is decoded as
    /// user-friendly and its flags dropped.
    ///
    /// # Errors
    /// Propagates the `FormatError` or `ChecksumMismatch` of the branch taken.
    pub fn to_raw(&self, address: &str) -> Result<RawAddress, AddressError> {
        if address.contains(':') {
            Ok(address.parse()?)
        } else {
            Ok(self.decode(address)?.raw)
        }
    }
}

/// Whether `address` has the shape of a user-friendly address: exactly
/// [`ADDRESS_LENGTH`] bytes and no `:`.
#[must_use]
pub fn is_user_friendly_form(address: &str) -> bool {
    address.len() == ADDRESS_LENGTH && !address.contains(':')
}

/// Parses raw address text.
///
/// # Errors
/// See [`RawAddress::from_str`].
pub fn parse_raw_address(s: &str) -> Result<RawAddress, FormatError> {
    s.parse()
}

/// Encodes raw address text into its user-friendly form.
///
/// # Errors
/// See [`AddressCodec::encode`].
pub fn encode_address(raw: &str, flags: AddressFlags) -> Result<String, FormatError> {
    CODEC.encode(raw, flags)
}

/// Decodes a user-friendly address.
///
/// # Errors
/// See [`AddressCodec::decode`].
pub fn decode_address(address: &str) -> Result<UserFriendlyAddress, AddressError> {
    CODEC.decode(address)
}

/// # Errors
/// See [`AddressCodec::normalize`].
pub fn to_bounceable(address: &str) -> Result<String, AddressError> {
    CODEC.to_bounceable(address)
}

/// # Errors
/// See [`AddressCodec::normalize`].
pub fn to_non_bounceable(address: &str) -> Result<String, AddressError> {
    CODEC.to_non_bounceable(address)
}

/// # Errors
/// See [`AddressCodec::to_raw`].
pub fn to_raw(address: &str) -> Result<RawAddress, AddressError> {
    CODEC.to_raw(address)
}
