/* ASCII hex digits, one nibble at a time */

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/*
 * decode_nibble - Value of one ASCII hex digit
 *
 * Accepts both cases. Returns None for anything else.
 */
pub const fn decode_nibble(byte: u8) -> Option<u8> {
	match byte {
		b'0'..=b'9' => Some(byte - b'0'),
		b'A'..=b'F' => Some(byte - b'A' + 10),
		b'a'..=b'f' => Some(byte - b'a' + 10),
		_ => None,
	}
}

//Low four bits only
pub const fn encode_nibble(nibble: u8) -> u8 {
	DIGITS[(nibble & 0xF) as usize]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn digits_in_both_cases() {
		assert_eq!(decode_nibble(b'0'), Some(0));
		assert_eq!(decode_nibble(b'9'), Some(9));
		assert_eq!(decode_nibble(b'A'), Some(10));
		assert_eq!(decode_nibble(b'f'), Some(15));
		assert_eq!(decode_nibble(b'G'), None);
		assert_eq!(decode_nibble(b'>'), None);
		assert_eq!(decode_nibble(b' '), None);
	}

	#[test]
	fn encode_masks_to_a_nibble() {
		assert_eq!(encode_nibble(0x0), b'0');
		assert_eq!(encode_nibble(0xB), b'B');
		assert_eq!(encode_nibble(0xFA), b'A');
		for n in 0..16 {
			assert_eq!(decode_nibble(encode_nibble(n)), Some(n));
		}
	}
}
