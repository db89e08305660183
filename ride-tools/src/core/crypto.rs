// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Hashing, Curve25519 keys, signatures and addresses of the Waves protocol.
//!
//! Accounts use Curve25519 keys in their Montgomery form. Signatures are produced over the
//! birationally equivalent Edwards curve and carry the sign bit of the Edwards public key in the
//! top bit of the last byte, so that a verifier holding only the Montgomery key can recover it.

use std::{fmt, str::FromStr};

use blake2::{digest::consts::U32, Blake2b, Digest};
use curve25519_dalek::{edwards::EdwardsPoint, montgomery::MontgomeryPoint, scalar::Scalar};
use rand::RngCore;
use sha2::{Sha256, Sha512};
use tiny_keccak::{Hasher, Keccak};

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SECRET_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;
pub const ADDRESS_LENGTH: usize = 26;

const ADDRESS_VERSION: u8 = 1;
const ADDRESS_HASH_LENGTH: usize = 20;
const ADDRESS_CHECKSUM_LENGTH: usize = 4;

type Blake2b256 = Blake2b<U32>;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid base58 in {what}: {source}")]
    Base58 {
        what: &'static str,
        #[source]
        source: bs58::decode::Error,
    },
    #[error("invalid {what} length: expected {expected} bytes, found {found}")]
    Length {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("unsupported address version {0}")]
    AddressVersion(u8),
    #[error("address belongs to chain {found:?}, expected {expected:?}")]
    ChainIdMismatch { expected: char, found: char },
    #[error("address checksum mismatch")]
    Checksum,
}

pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// `keccak256(blake2b256(data))`, the hash used for addresses and account seeds.
pub fn secure_hash(data: &[u8]) -> [u8; 32] {
    keccak256(&blake2b256(data))
}

fn decode_base58<const N: usize>(what: &'static str, s: &str) -> Result<[u8; N], CryptoError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|source| CryptoError::Base58 { what, source })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| CryptoError::Length {
        what,
        expected: N,
        found: bytes.len(),
    })
}

fn clamp(mut bytes: [u8; 32]) -> [u8; 32] {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
    bytes
}

/// Reduces `sha512(parts...)` to a scalar.
fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sign = signature.0[63] >> 7;
        let Some(edwards) = MontgomeryPoint(self.0).to_edwards(sign) else {
            return false;
        };

        let mut s = [0u8; 32];
        s.copy_from_slice(&signature.0[32..]);
        s[31] &= 0x7f;
        let Some(s) = Option::<Scalar>::from(Scalar::from_canonical_bytes(s)) else {
            return false;
        };

        let r = &signature.0[..32];
        let h = hash_to_scalar(&[r, edwards.compress().as_bytes(), message]);
        let check = EdwardsPoint::vartime_double_scalar_mul_basepoint(&h, &(-edwards), &s);
        check.compress().as_bytes() == r
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58("public key", s).map(Self)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; SECRET_KEY_LENGTH]);

impl SecretKey {
    /// Wraps raw key bytes, clamping them as Curve25519 requires.
    pub fn from_bytes(bytes: [u8; SECRET_KEY_LENGTH]) -> Self {
        Self(clamp(bytes))
    }

    /// Base58 text form, as stored in the registry.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(EdwardsPoint::mul_base_clamped(self.0).to_montgomery().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let mut random = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut random);
        self.sign_with_randomness(message, &random)
    }

    pub fn sign_with_randomness(&self, message: &[u8], random: &[u8; 64]) -> Signature {
        let a = Scalar::from_bytes_mod_order(self.0);
        let public = EdwardsPoint::mul_base(&a).compress();
        let sign_bit = public.as_bytes()[31] & 0x80;

        let mut prefix = [0xffu8; 32];
        prefix[0] = 0xfe;
        let r = hash_to_scalar(&[&prefix, &self.0, message, random]);
        let big_r = EdwardsPoint::mul_base(&r).compress();

        let h = hash_to_scalar(&[big_r.as_bytes(), public.as_bytes(), message]);
        let s = r + h * a;

        let mut signature = [0u8; SIGNATURE_LENGTH];
        signature[..32].copy_from_slice(big_r.as_bytes());
        signature[32..].copy_from_slice(s.as_bytes());
        signature[63] = (signature[63] & 0x7f) | sign_bit;
        Signature(signature)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl FromStr for SecretKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_base58("secret key", s).map(Self::from_bytes)
    }
}

#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    /// Derives the account with index `nonce` from a seed phrase.
    pub fn from_seed(seed: &str, nonce: u32) -> Self {
        let mut input = nonce.to_be_bytes().to_vec();
        input.extend_from_slice(seed.as_bytes());
        let account_seed = secure_hash(&input);
        let secret = SecretKey::from_bytes(Sha256::digest(account_seed).into());
        Self::from(secret)
    }

    pub fn address(&self, chain_id: u8) -> Address {
        Address::from_public_key(chain_id, &self.public)
    }
}

impl From<SecretKey> for KeyPair {
    fn from(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn from_public_key(chain_id: u8, public_key: &PublicKey) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[0] = ADDRESS_VERSION;
        bytes[1] = chain_id;
        bytes[2..22].copy_from_slice(&secure_hash(public_key.as_bytes())[..ADDRESS_HASH_LENGTH]);
        let checksum = secure_hash(&bytes[..22]);
        bytes[22..].copy_from_slice(&checksum[..ADDRESS_CHECKSUM_LENGTH]);
        Self(bytes)
    }

    /// Parses a base58 address and checks it belongs to `chain_id`.
    pub fn parse(s: &str, chain_id: u8) -> Result<Self, CryptoError> {
        let address: Self = s.parse()?;
        if address.chain_id() != chain_id {
            return Err(CryptoError::ChainIdMismatch {
                expected: chain_id as char,
                found: address.chain_id() as char,
            });
        }
        Ok(address)
    }

    pub fn chain_id(&self) -> u8 {
        self.0[1]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; ADDRESS_LENGTH] = decode_base58("address", s)?;
        if bytes[0] != ADDRESS_VERSION {
            return Err(CryptoError::AddressVersion(bytes[0]));
        }
        let checksum = secure_hash(&bytes[..22]);
        if bytes[22..] != checksum[..ADDRESS_CHECKSUM_LENGTH] {
            return Err(CryptoError::Checksum);
        }
        Ok(Self(bytes))
    }
}
