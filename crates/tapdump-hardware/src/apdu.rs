//! PC/SC pseudo-APDUs for contactless storage cards.
//!
//! Readers speaking the PC/SC part 3 storage-card extension (ACR122U and
//! friends) accept these commands in place of raw Mifare frames. Building
//! and parsing them is pure so it stays testable without a reader attached.

use crate::{HardwareError, Result};
use tapdump_core::{KeySlot, MifareKey, constants::BLOCK_SIZE};

// ============================================================================
// Command bytes
// ============================================================================

/// Class byte for reader-handled pseudo-APDUs.
pub const CLA_READER: u8 = 0xFF;

/// INS: get data (UID when P1 = 0).
pub const INS_GET_DATA: u8 = 0xCA;

/// INS: load authentication key into volatile reader memory.
pub const INS_LOAD_KEY: u8 = 0x82;

/// INS: general authenticate.
pub const INS_GENERAL_AUTHENTICATE: u8 = 0x86;

/// INS: read binary.
pub const INS_READ_BINARY: u8 = 0xB0;

/// Volatile key slot used for every authentication.
pub const KEY_NUMBER: u8 = 0x00;

/// Key type byte for Key A.
pub const KEY_TYPE_A: u8 = 0x60;

/// Key type byte for Key B.
pub const KEY_TYPE_B: u8 = 0x61;

/// Status word: success.
pub const SW_SUCCESS: u16 = 0x9000;

/// Status word: authentication failed / command not executed.
pub const SW_AUTH_FAILED: u16 = 0x6300;

// ============================================================================
// Builders
// ============================================================================

/// `FF CA 00 00 00`: read the card UID.
pub fn get_uid() -> [u8; 5] {
    [CLA_READER, INS_GET_DATA, 0x00, 0x00, 0x00]
}

/// `FF 82 00 <slot> 06 <key>`: load `key` into the reader's volatile slot.
pub fn load_key(key: &MifareKey) -> [u8; 11] {
    let mut apdu = [0u8; 11];
    apdu[..5].copy_from_slice(&[CLA_READER, INS_LOAD_KEY, 0x00, KEY_NUMBER, 0x06]);
    apdu[5..].copy_from_slice(key.as_bytes());
    apdu
}

/// `FF 86 00 00 05 01 00 <block> <type> <slot>`: authenticate a block.
///
/// # Errors
///
/// Returns [`HardwareError::InvalidData`] if `block` does not fit the
/// single-byte address field.
pub fn general_authenticate(block: u16, slot: KeySlot) -> Result<[u8; 10]> {
    let block = block_address(block)?;
    let key_type = match slot {
        KeySlot::A => KEY_TYPE_A,
        KeySlot::B => KEY_TYPE_B,
    };
    Ok([
        CLA_READER,
        INS_GENERAL_AUTHENTICATE,
        0x00,
        0x00,
        0x05,
        0x01,
        0x00,
        block,
        key_type,
        KEY_NUMBER,
    ])
}

/// `FF B0 00 <block> 10`: read one 16-byte block.
///
/// # Errors
///
/// Returns [`HardwareError::InvalidData`] if `block` does not fit the
/// single-byte address field.
pub fn read_binary(block: u16) -> Result<[u8; 5]> {
    let block = block_address(block)?;
    Ok([CLA_READER, INS_READ_BINARY, 0x00, block, BLOCK_SIZE as u8])
}

fn block_address(block: u16) -> Result<u8> {
    u8::try_from(block)
        .map_err(|_| HardwareError::invalid_data(format!("block {block} out of addressable range")))
}

// ============================================================================
// Responses
// ============================================================================

/// Split a response into its data and trailing status word.
///
/// # Errors
///
/// Returns [`HardwareError::InvalidData`] if the response is shorter than a
/// status word.
///
/// # Examples
///
/// ```
/// use tapdump_hardware::apdu::{split_response, SW_SUCCESS};
///
/// let (data, sw) = split_response(&[0x04, 0xA2, 0x90, 0x00]).unwrap();
/// assert_eq!(data, &[0x04, 0xA2]);
/// assert_eq!(sw, SW_SUCCESS);
/// ```
pub fn split_response(response: &[u8]) -> Result<(&[u8], u16)> {
    if response.len() < 2 {
        return Err(HardwareError::invalid_data(format!(
            "response too short: {} bytes",
            response.len()
        )));
    }
    let (data, sw) = response.split_at(response.len() - 2);
    Ok((data, u16::from_be_bytes([sw[0], sw[1]])))
}

/// Data of a response that must end in `90 00`.
///
/// # Errors
///
/// Returns [`HardwareError::CommunicationError`] carrying the status word
/// otherwise.
pub fn expect_success(response: &[u8]) -> Result<&[u8]> {
    let (data, sw) = split_response(response)?;
    if sw != SW_SUCCESS {
        return Err(HardwareError::communication(format!("SW {sw:04X}")));
    }
    Ok(data)
}

/// Interpret the response to a general authenticate command.
///
/// `90 00` means accepted and `63 00` means the key was refused; any other
/// status word is a fault.
///
/// # Errors
///
/// Returns [`HardwareError::CommunicationError`] for unexpected status words.
pub fn authentication_outcome(response: &[u8]) -> Result<bool> {
    match split_response(response)? {
        (_, SW_SUCCESS) => Ok(true),
        (_, SW_AUTH_FAILED) => Ok(false),
        (_, sw) => Err(HardwareError::communication(format!(
            "authentication returned SW {sw:04X}"
        ))),
    }
}

/// Extract a full block from a read binary response.
///
/// # Errors
///
/// Returns an error on a non-success status word or a short payload.
pub fn block_data(response: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    let data = expect_success(response)?;
    <[u8; BLOCK_SIZE]>::try_from(data).map_err(|_| {
        HardwareError::invalid_data(format!(
            "expected {BLOCK_SIZE} data bytes, got {}",
            data.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_load_key_layout() {
        let key = MifareKey::new([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
        assert_eq!(
            load_key(&key),
            [0xFF, 0x82, 0x00, 0x00, 0x06, 0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]
        );
    }

    #[rstest]
    #[case(KeySlot::A, 0x60)]
    #[case(KeySlot::B, 0x61)]
    fn test_general_authenticate_key_type(#[case] slot: KeySlot, #[case] key_type: u8) {
        let apdu = general_authenticate(7, slot).unwrap();
        assert_eq!(&apdu[..7], &[0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00]);
        assert_eq!(apdu[7], 7);
        assert_eq!(apdu[8], key_type);
    }

    #[test]
    fn test_block_address_range() {
        assert_eq!(read_binary(255).unwrap(), [0xFF, 0xB0, 0x00, 0xFF, 0x10]);
        assert!(read_binary(256).is_err());
        assert!(general_authenticate(300, KeySlot::A).is_err());
    }

    #[rstest]
    #[case(&[0x90, 0x00], Some(true))]
    #[case(&[0x63, 0x00], Some(false))]
    #[case(&[0x69, 0x82], None)]
    #[case(&[0x90], None)]
    fn test_authentication_outcome(#[case] response: &[u8], #[case] expected: Option<bool>) {
        assert_eq!(authentication_outcome(response).ok(), expected);
    }

    #[test]
    fn test_block_data() {
        let mut response = vec![0xAB; BLOCK_SIZE];
        response.extend_from_slice(&[0x90, 0x00]);
        assert_eq!(block_data(&response).unwrap(), [0xAB; BLOCK_SIZE]);

        assert!(block_data(&[0x01, 0x02, 0x90, 0x00]).is_err());
        assert!(block_data(&[0x6A, 0x82]).is_err());
    }

    #[test]
    fn test_expect_success_reports_status_word() {
        let err = expect_success(&[0x6A, 0x81]).unwrap_err();
        assert_eq!(err.to_string(), "Communication error: SW 6A81");
    }
}
