//! StrKey text encoding for ledger identifiers.
//!
//! A StrKey is `base32(version_byte || payload || crc16_xmodem_le)` with the
//! RFC 4648 alphabet and no padding. The version byte determines the leading
//! character (`G` accounts, `M` muxed accounts, `C` contracts, ...).

use crate::error::TypeError;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// StrKey version bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Version {
    AccountId = 6 << 3,
    MuxedAccount = 12 << 3,
    PreAuthTx = 19 << 3,
    HashX = 23 << 3,
    SignedPayload = 15 << 3,
    Contract = 2 << 3,
    LiquidityPool = 11 << 3,
    ClaimableBalance = 1 << 3,
}

/// Encode `payload` under the given version.
pub fn encode(version: Version, payload: &[u8]) -> String {
    let mut raw = Vec::with_capacity(payload.len() + 3);
    raw.push(version as u8);
    raw.extend_from_slice(payload);
    let checksum = crc16(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32_encode(&raw)
}

/// Decode a StrKey, verifying the checksum and version byte.
pub fn decode(version: Version, s: &str) -> Result<Vec<u8>, TypeError> {
    let raw = base32_decode(s)?;
    if raw.len() < 3 {
        return Err(TypeError::InvalidStrkey(format!("{s:?} is too short")));
    }
    let (body, checksum) = raw.split_at(raw.len() - 2);
    if checksum != crc16(body).to_le_bytes() {
        return Err(TypeError::ChecksumMismatch);
    }
    if body[0] != version as u8 {
        return Err(TypeError::UnexpectedVersion {
            expected: version as u8,
            actual: body[0],
        });
    }
    Ok(body[1..].to_vec())
}

/// Decode a fixed-size 32-byte payload (accounts, contracts, pools).
pub fn decode_32(version: Version, s: &str) -> Result<[u8; 32], TypeError> {
    let payload = decode(version, s)?;
    payload
        .as_slice()
        .try_into()
        .map_err(|_| TypeError::InvalidLength {
            expected: 32,
            actual: payload.len(),
        })
}

/// Returns `true` if `s` is a well-formed `G...` account address.
pub fn is_valid_account_id(s: &str) -> bool {
    decode_32(Version::AccountId, s).is_ok()
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>, TypeError> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in s.bytes() {
        let value = match c {
            b'A'..=b'Z' => c - b'A',
            b'2'..=b'7' => c - b'2' + 26,
            _ => {
                return Err(TypeError::InvalidStrkey(format!(
                    "invalid character {:?}",
                    c as char
                )))
            }
        };
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    // Trailing bits must be zero padding, otherwise two strings decode alike.
    if bits >= 5 || buffer != 0 {
        return Err(TypeError::InvalidStrkey(format!("{s:?} is not canonical")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn zero_account_encodes_to_known_address() {
        assert_eq!(encode(Version::AccountId, &[0u8; 32]), ZERO_ACCOUNT);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(
            encode(Version::AccountId, &[1u8; 32]),
            "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H"
        );
        assert_eq!(
            encode(Version::Contract, &[0u8; 32]),
            "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4"
        );
        assert_eq!(
            encode(Version::LiquidityPool, &[7u8; 32]),
            "LADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQPEA4"
        );
    }

    #[test]
    fn decode_roundtrip() {
        let encoded = encode(Version::AccountId, &[2u8; 32]);
        assert_eq!(decode_32(Version::AccountId, &encoded).unwrap(), [2u8; 32]);
    }

    #[test]
    fn decode_non_multiple_of_five_length() {
        let mut payload = vec![0u8; 32];
        payload.extend_from_slice(&1u64.to_be_bytes());
        let encoded = encode(Version::MuxedAccount, &payload);
        assert_eq!(
            encoded,
            "MAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAFNZG"
        );
        assert_eq!(decode(Version::MuxedAccount, &encoded).unwrap(), payload);
    }

    #[test]
    fn wrong_version_rejected() {
        let err = decode(Version::Contract, ZERO_ACCOUNT).unwrap_err();
        assert!(matches!(err, TypeError::UnexpectedVersion { .. }));
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let corrupted = ZERO_ACCOUNT.replace("WHF", "WHG");
        assert!(decode(Version::AccountId, &corrupted).is_err());
    }

    #[test]
    fn invalid_characters_rejected() {
        assert!(!is_valid_account_id("G0000"));
        assert!(!is_valid_account_id(""));
        assert!(is_valid_account_id(ZERO_ACCOUNT));
    }
}
