//! Bitcoin payment addresses.
//!
//! One `Address` enum covers the four supported forms: Base58Check P2PKH
//! and P2SH, P2SH-wrapped P2WPKH, and native Bech32 P2WPKH. Every address
//! is built against a `Network`, whose version bytes and HRP it must match.

use std::fmt;

use btc_primitives::ec::PublicKey;
use btc_primitives::{base58, bech32, Network};

use crate::error::AddressError;
use crate::script::{RedeemScriptType, Script};

/// Behaviour shared by every address form.
pub trait PaymentAddress {
    /// The encoded address string.
    fn address(&self) -> &str;

    /// The locking script that pays to this address.
    fn script_pub_key(&self) -> Script;

    /// The committed hash: hash160 for Base58 forms, the witness program
    /// for Bech32.
    fn hash(&self) -> &[u8];
}

/// A payment address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    P2PKH {
        address: String,
        prefix: u8,
        hash: [u8; 20],
        public_key: Option<PublicKey>,
    },
    P2SH {
        address: String,
        prefix: u8,
        hash: [u8; 20],
        redeem_script: Option<Script>,
    },
    /// P2SH whose redeem script is `OP_0 <hash160(pubkey)>`.
    P2SHP2WPKH {
        address: String,
        prefix: u8,
        hash: [u8; 20],
        redeem_script: Script,
        public_key: PublicKey,
    },
    Bech32P2WPKH {
        address: String,
        witness_version: u8,
        program: [u8; 20],
        public_key: Option<PublicKey>,
    },
}

/// Discriminant of `Address`, used for display and matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    P2PKH,
    P2SH,
    P2SHP2WPKH,
    Bech32P2WPKH,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressKind::P2PKH => "P2PKH",
            AddressKind::P2SH => "P2SH",
            AddressKind::P2SHP2WPKH => "P2SH-P2WPKH",
            AddressKind::Bech32P2WPKH => "Bech32-P2WPKH",
        };
        f.write_str(name)
    }
}

impl Address {
    // -----------------------------------------------------------------------
    // Base58
    // -----------------------------------------------------------------------

    /// P2PKH address for a 20-byte public key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: &Network) -> Self {
        Address::P2PKH {
            address: encode_base58(network.p2pkh_prefix, hash),
            prefix: network.p2pkh_prefix,
            hash: *hash,
            public_key: None,
        }
    }

    /// P2PKH address of a public key, keeping the key for signing.
    pub fn from_public_key(public_key: &PublicKey, network: &Network) -> Self {
        let hash = public_key.hash160();
        Address::P2PKH {
            address: encode_base58(network.p2pkh_prefix, &hash),
            prefix: network.p2pkh_prefix,
            hash,
            public_key: Some(public_key.clone()),
        }
    }

    /// P2SH address for a 20-byte script hash.
    pub fn from_script_hash(hash: &[u8; 20], network: &Network) -> Self {
        Address::P2SH {
            address: encode_base58(network.p2sh_prefix, hash),
            prefix: network.p2sh_prefix,
            hash: *hash,
            redeem_script: None,
        }
    }

    /// P2SH address committing to `redeem_script`, which is kept on the
    /// address for building the spending scriptSig.
    pub fn from_redeem_script(redeem_script: &Script, network: &Network) -> Self {
        let hash = *redeem_script.hash160();
        Address::P2SH {
            address: encode_base58(network.p2sh_prefix, &hash),
            prefix: network.p2sh_prefix,
            hash,
            redeem_script: Some(redeem_script.clone()),
        }
    }

    /// Decode a Base58Check P2PKH address.
    ///
    /// # Returns
    /// `NetworkMismatch` if the version byte is not the network's P2PKH
    /// prefix, `HashLength` if the payload is not 160 bits.
    pub fn p2pkh_from_string(address: &str, network: &Network) -> Result<Self, AddressError> {
        let (prefix, hash) = decode_base58(address)?;
        if prefix != network.p2pkh_prefix {
            return Err(AddressError::NetworkMismatch {
                kind: "P2PKH",
                network: network.name.clone(),
            });
        }
        Ok(Address::P2PKH {
            address: address.to_string(),
            prefix,
            hash,
            public_key: None,
        })
    }

    /// Decode a Base58Check P2SH address.
    pub fn p2sh_from_string(address: &str, network: &Network) -> Result<Self, AddressError> {
        let (prefix, hash) = decode_base58(address)?;
        if prefix != network.p2sh_prefix {
            return Err(AddressError::NetworkMismatch {
                kind: "P2SH",
                network: network.name.clone(),
            });
        }
        Ok(Address::P2SH {
            address: address.to_string(),
            prefix,
            hash,
            redeem_script: None,
        })
    }

    // -----------------------------------------------------------------------
    // SegWit
    // -----------------------------------------------------------------------

    /// P2SH-wrapped P2WPKH address of a public key.
    pub fn p2sh_p2wpkh(public_key: &PublicKey, network: &Network) -> Result<Self, AddressError> {
        let redeem_script = Script::witness_program(0, &public_key.hash160())?;
        let hash = *redeem_script.hash160();
        Ok(Address::P2SHP2WPKH {
            address: encode_base58(network.p2sh_prefix, &hash),
            prefix: network.p2sh_prefix,
            hash,
            redeem_script,
            public_key: public_key.clone(),
        })
    }

    /// Native Bech32 P2WPKH address of a public key.
    pub fn bech32_p2wpkh(public_key: &PublicKey, network: &Network) -> Result<Self, AddressError> {
        let mut address = Self::from_witness_program(&public_key.hash160(), network)?;
        if let Address::Bech32P2WPKH { public_key: pk, .. } = &mut address {
            *pk = Some(public_key.clone());
        }
        Ok(address)
    }

    /// Bech32 P2WPKH address for a 20-byte witness program.
    pub fn from_witness_program(program: &[u8; 20], network: &Network) -> Result<Self, AddressError> {
        let address = bech32::encode(&network.bech32_hrp, network.bech32_witness_version, program)?;
        Ok(Address::Bech32P2WPKH {
            address,
            witness_version: network.bech32_witness_version,
            program: *program,
            public_key: None,
        })
    }

    /// Decode a Bech32 P2WPKH address.
    pub fn bech32_from_string(address: &str, network: &Network) -> Result<Self, AddressError> {
        let (witness_version, program) = bech32::decode(&network.bech32_hrp, address)?;
        if witness_version != network.bech32_witness_version {
            return Err(AddressError::NetworkMismatch {
                kind: "Bech32",
                network: network.name.clone(),
            });
        }
        let program: [u8; 20] = program
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::HashLength(program.len()))?;
        Ok(Address::Bech32P2WPKH {
            address: address.to_lowercase(),
            witness_version,
            program,
            public_key: None,
        })
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Decode any supported address string for `network`.
    ///
    /// Strings starting with the network's HRP and separator are treated as
    /// Bech32; everything else as Base58Check P2PKH or P2SH.
    pub fn from_string(address: &str, network: &Network) -> Result<Self, AddressError> {
        let hrp_prefix = format!("{}{}", network.bech32_hrp, bech32::SEPARATOR);
        if address.to_lowercase().starts_with(&hrp_prefix) {
            return Self::bech32_from_string(address, network);
        }
        let (prefix, _) = decode_base58(address)?;
        if prefix == network.p2pkh_prefix {
            Self::p2pkh_from_string(address, network)
        } else if prefix == network.p2sh_prefix {
            Self::p2sh_from_string(address, network)
        } else {
            Err(AddressError::NetworkMismatch {
                kind: "Base58",
                network: network.name.clone(),
            })
        }
    }

    /// Derive the address a scriptPubKey pays to.
    ///
    /// # Returns
    /// `UnrecognizedScript` unless the script is P2PKH, P2SH or a version 0
    /// key-hash witness program.
    pub fn from_script_pub_key(script: &Script, network: &Network) -> Result<Self, AddressError> {
        if let Some(hash) = script.p2pkh_hash() {
            return Ok(Self::from_public_key_hash(&hash, network));
        }
        if let Some(hash) = script.p2sh_hash() {
            return Ok(Self::from_script_hash(&hash, network));
        }
        if let Some(program) = script.p2wpkh_hash() {
            return Self::from_witness_program(&program, network);
        }
        Err(AddressError::UnrecognizedScript(script.to_hex()))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn kind(&self) -> AddressKind {
        match self {
            Address::P2PKH { .. } => AddressKind::P2PKH,
            Address::P2SH { .. } => AddressKind::P2SH,
            Address::P2SHP2WPKH { .. } => AddressKind::P2SHP2WPKH,
            Address::Bech32P2WPKH { .. } => AddressKind::Bech32P2WPKH,
        }
    }

    /// The redeem script, for the P2SH forms that carry one.
    pub fn redeem_script(&self) -> Option<&Script> {
        match self {
            Address::P2SH { redeem_script, .. } => redeem_script.as_ref(),
            Address::P2SHP2WPKH { redeem_script, .. } => Some(redeem_script),
            _ => None,
        }
    }

    /// The public key attached to the address, if any.
    pub fn public_key(&self) -> Option<&PublicKey> {
        match self {
            Address::P2PKH { public_key, .. } | Address::Bech32P2WPKH { public_key, .. } => {
                public_key.as_ref()
            }
            Address::P2SHP2WPKH { public_key, .. } => Some(public_key),
            Address::P2SH { .. } => None,
        }
    }

    /// Attach the public key behind a P2PKH or Bech32 address.
    ///
    /// Native P2WPKH spends need it to build the BIP143 scriptCode.
    ///
    /// # Returns
    /// `UnrecognizedScript` if the key does not hash to the address, or the
    /// address is a P2SH form.
    pub fn with_public_key(self, key: &PublicKey) -> Result<Self, AddressError> {
        let key_hash = key.hash160();
        match self {
            Address::P2PKH {
                address,
                prefix,
                hash,
                ..
            } if hash == key_hash => Ok(Address::P2PKH {
                address,
                prefix,
                hash,
                public_key: Some(key.clone()),
            }),
            Address::Bech32P2WPKH {
                address,
                witness_version,
                program,
                ..
            } if program == key_hash => Ok(Address::Bech32P2WPKH {
                address,
                witness_version,
                program,
                public_key: Some(key.clone()),
            }),
            other => Err(AddressError::UnrecognizedScript(format!(
                "public key {} does not match {} address {}",
                key,
                other.kind(),
                other.address()
            ))),
        }
    }

    /// Attach the redeem script behind a P2SH address.
    ///
    /// # Returns
    /// `UnrecognizedScript` if the script does not hash to the address.
    pub fn with_redeem_script(self, script: &Script) -> Result<Self, AddressError> {
        match self {
            Address::P2SH {
                address,
                prefix,
                hash,
                ..
            } if hash == *script.hash160() => Ok(Address::P2SH {
                address,
                prefix,
                hash,
                redeem_script: Some(script.clone()),
            }),
            other => Err(AddressError::UnrecognizedScript(format!(
                "redeem script does not match {} address {}",
                other.kind(),
                other.address()
            ))),
        }
    }

    /// Subtype of the attached redeem script, if any.
    pub fn redeem_script_type(&self) -> Option<RedeemScriptType> {
        self.redeem_script().and_then(RedeemScriptType::detect)
    }
}

impl PaymentAddress for Address {
    fn address(&self) -> &str {
        match self {
            Address::P2PKH { address, .. }
            | Address::P2SH { address, .. }
            | Address::P2SHP2WPKH { address, .. }
            | Address::Bech32P2WPKH { address, .. } => address,
        }
    }

    fn script_pub_key(&self) -> Script {
        match self {
            Address::P2PKH { hash, .. } => Script::p2pkh(hash),
            Address::P2SH { hash, .. } | Address::P2SHP2WPKH { hash, .. } => Script::p2sh(hash),
            Address::Bech32P2WPKH {
                witness_version,
                program,
                ..
            } => Script::witness_program(*witness_version, program)
                .unwrap_or_else(|_| Script::p2wpkh(program)),
        }
    }

    fn hash(&self) -> &[u8] {
        match self {
            Address::P2PKH { hash, .. }
            | Address::P2SH { hash, .. }
            | Address::P2SHP2WPKH { hash, .. } => hash,
            Address::Bech32P2WPKH { program, .. } => program,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address())
    }
}

fn encode_base58(prefix: u8, hash: &[u8; 20]) -> String {
    base58::check_encode_versioned(prefix, hash)
}

fn decode_base58(address: &str) -> Result<(u8, [u8; 20]), AddressError> {
    let (prefix, payload) = base58::check_decode_versioned(address)?;
    let hash: [u8; 20] = payload
        .as_slice()
        .try_into()
        .map_err(|_| AddressError::HashLength(payload.len()))?;
    Ok((prefix, hash))
}
