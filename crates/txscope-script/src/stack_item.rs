//! Recognition of cryptographic primitives inside raw stack items.
//!
//! Nothing here verifies a signature against a message. The checks recognize
//! well-formed *encodings* so that script fields can be named for display.

/// Context a stack item was found in, which disambiguates otherwise
/// identical byte lengths (a 64-byte push is a Schnorr signature on a
/// witness stack but plain data in a legacy script).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackItemContext {
    pub in_witness: bool,
    pub in_tapscript: bool,
}

impl StackItemContext {
    pub const WITNESS: Self = Self {
        in_witness: true,
        in_tapscript: false,
    };

    pub const TAPSCRIPT: Self = Self {
        in_witness: false,
        in_tapscript: true,
    };

    fn expects_schnorr(self) -> bool {
        self.in_witness || self.in_tapscript
    }
}

/// The SIGHASH suffixes that can trail a signature encoding.
pub fn is_sighash_byte(byte: u8) -> bool {
    matches!(byte, 0x01 | 0x02 | 0x03 | 0x81 | 0x82 | 0x83)
}

/// Checks for a canonical DER-encoded ECDSA signature followed by a SIGHASH
/// byte: `0x30 <len> 0x02 <rlen> R 0x02 <slen> S <sighash>`.
///
/// R and S must be positive and minimally padded (a single leading zero is
/// required, and only allowed, when the next byte has its high bit set).
pub fn is_ecdsa_signature(data: &[u8]) -> bool {
    // Shortest possible form is 8 DER bytes plus the SIGHASH suffix; the
    // longest is 72 + 1.
    if data.len() < 9 || data.len() > 73 {
        return false;
    }
    if !is_sighash_byte(data[data.len() - 1]) {
        return false;
    }

    // Compound tag, then an outer length covering everything but the tag,
    // the length byte itself and the SIGHASH suffix.
    if data[0] != 0x30 || data[1] as usize != data.len() - 3 {
        return false;
    }

    let r_len = data[3] as usize;
    if r_len + 5 >= data.len() {
        return false;
    }
    let s_len = data[r_len + 5] as usize;
    if r_len + s_len + 7 != data.len() {
        return false;
    }

    let r = &data[4..4 + r_len];
    let s = &data[r_len + 6..r_len + 6 + s_len];
    if data[2] != 0x02 || data[r_len + 4] != 0x02 {
        return false;
    }

    integer_is_canonical(r) && integer_is_canonical(s)
}

fn integer_is_canonical(int: &[u8]) -> bool {
    match int {
        [] => false,
        // Negative numbers are not valid R/S values.
        [first, ..] if first & 0x80 != 0 => false,
        // A padding zero must be followed by a byte with the high bit set.
        [0x00, second, ..] if second & 0x80 == 0 => false,
        _ => true,
    }
}

/// A BIP340 signature: 64 bytes, or 65 with a trailing SIGHASH byte.
pub fn is_schnorr_signature(data: &[u8]) -> bool {
    match data.len() {
        64 => true,
        65 => is_sighash_byte(data[64]),
        _ => false,
    }
}

/// A compressed SEC1 public key.
pub fn is_compressed_public_key(data: &[u8]) -> bool {
    data.len() == 33 && (data[0] == 0x02 || data[0] == 0x03)
}

/// An uncompressed SEC1 public key.
pub fn is_uncompressed_public_key(data: &[u8]) -> bool {
    data.len() == 65 && data[0] == 0x04
}

pub fn is_public_key(data: &[u8]) -> bool {
    is_compressed_public_key(data) || is_uncompressed_public_key(data)
}

/// An x-only public key as used by Taproot.
pub fn is_x_only_public_key(data: &[u8]) -> bool {
    data.len() == 32
}

/// Names a stack item from its bytes and the context it appeared in.
///
/// Falls through to `"N-Byte Data"` when no cryptographic encoding matches.
pub fn stack_item_type(data: &[u8], ctx: StackItemContext) -> String {
    if is_ecdsa_signature(data) {
        return "Signature".to_owned();
    }
    if ctx.expects_schnorr() && is_schnorr_signature(data) {
        return "Schnorr Signature".to_owned();
    }
    if is_public_key(data) {
        return "Public Key".to_owned();
    }
    if ctx.expects_schnorr() && is_x_only_public_key(data) {
        return "Schnorr Public Key".to_owned();
    }
    format!("{}-Byte Data", data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mainnet signature, ends with SIGHASH_ALL.
    const DER_SIG: &str = "3045022052ffc1929a2d8bd365c6a2a4e3421711b4b1e1b8781698ca9075807b4227abcb0221009984107ddb9e3813782b095d0d84361ed4c76e5edaf6561d252ae162c2341cfb01";

    #[test]
    fn recognizes_der_signature() {
        let sig = hex::decode(DER_SIG).unwrap();
        assert!(is_ecdsa_signature(&sig));
        assert_eq!(stack_item_type(&sig, StackItemContext::default()), "Signature");
    }

    #[test]
    fn rejects_malformed_der() {
        let mut sig = hex::decode(DER_SIG).unwrap();

        let mut bad_sighash = sig.clone();
        *bad_sighash.last_mut().unwrap() = 0x04;
        assert!(!is_ecdsa_signature(&bad_sighash));

        let mut bad_tag = sig.clone();
        bad_tag[0] = 0x31;
        assert!(!is_ecdsa_signature(&bad_tag));

        let mut bad_outer_len = sig.clone();
        bad_outer_len[1] ^= 0x01;
        assert!(!is_ecdsa_signature(&bad_outer_len));

        // Negative R.
        sig[4] |= 0x80;
        assert!(!is_ecdsa_signature(&sig));
    }

    #[test]
    fn schnorr_signature_lengths() {
        assert!(is_schnorr_signature(&[0xAB; 64]));
        let mut with_sighash = vec![0xAB; 65];
        with_sighash[64] = 0x81;
        assert!(is_schnorr_signature(&with_sighash));
        with_sighash[64] = 0x79;
        assert!(!is_schnorr_signature(&with_sighash));
        assert!(!is_schnorr_signature(&[0xAB; 63]));
    }

    #[test]
    fn public_key_prefixes() {
        let mut compressed = vec![0x02; 33];
        assert!(is_compressed_public_key(&compressed));
        compressed[0] = 0x03;
        assert!(is_compressed_public_key(&compressed));
        compressed[0] = 0x04;
        assert!(!is_compressed_public_key(&compressed));

        let uncompressed = vec![0x04; 65];
        assert!(is_uncompressed_public_key(&uncompressed));
    }

    #[test]
    fn schnorr_only_recognized_in_witness_contexts() {
        let sig = [0xAB; 64];
        assert_eq!(
            stack_item_type(&sig, StackItemContext::WITNESS),
            "Schnorr Signature"
        );
        assert_eq!(
            stack_item_type(&sig, StackItemContext::TAPSCRIPT),
            "Schnorr Signature"
        );
        assert_eq!(
            stack_item_type(&sig, StackItemContext::default()),
            "64-Byte Data"
        );

        let key = [0x55; 32];
        assert_eq!(
            stack_item_type(&key, StackItemContext::WITNESS),
            "Schnorr Public Key"
        );
        assert_eq!(
            stack_item_type(&key, StackItemContext::default()),
            "32-Byte Data"
        );
    }

    #[test]
    fn data_fallback_reports_length() {
        assert_eq!(
            stack_item_type(&[1, 2, 3], StackItemContext::default()),
            "3-Byte Data"
        );
        assert_eq!(stack_item_type(&[], StackItemContext::default()), "0-Byte Data");
    }
}
