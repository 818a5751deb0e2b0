use std::fmt;

use sha2::{Digest, Sha256};

/// Digest positions that select the three buttons.
const BUTTON_POSITIONS: [usize; 3] = [0, 15, 31];

/// The three-button code the user enters on the device to approve a sign or
/// decrypt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeCode {
    pub buttons: [u8; 3],
}

impl fmt::Display for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [b1, b2, b3] = self.buttons;
        write!(f, "{b1} {b2} {b3}")
    }
}

pub fn button_for(byte: u8) -> u8 {
    if byte < 6 {
        1
    } else {
        byte % 5 + 1
    }
}

pub fn derive_buttons(payload: &[u8]) -> ChallengeCode {
    let digest = Sha256::digest(payload);
    ChallengeCode {
        buttons: BUTTON_POSITIONS.map(|i| button_for(digest[i])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mapping() {
        assert_eq!(button_for(0), 1);
        assert_eq!(button_for(3), 1);
        assert_eq!(button_for(5), 1);
        assert_eq!(button_for(6), 2);
        assert_eq!(button_for(97), 3);
        assert_eq!(button_for(255), 1);
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc"): byte 0 = 0xba, byte 15 = 0x23, byte 31 = 0xad
        let code = derive_buttons(b"abc");
        assert_eq!(code.buttons, [button_for(0xba), button_for(0x23), button_for(0xad)]);
        assert_eq!(code.to_string(), "2 1 4");
    }

    #[test]
    fn test_deterministic_and_in_range() {
        for len in 0..64usize {
            let payload: Vec<u8> = (0..len as u8).collect();
            let code = derive_buttons(&payload);
            assert_eq!(code, derive_buttons(&payload));
            assert!(code.buttons.iter().all(|b| (1..=5).contains(b)));
        }
    }
}
