//! Random password generation.

use rand::Rng;
use rand::seq::SliceRandom;

/// Length of every generated password.
pub const PASSWORD_LEN: usize = 20;

// Look-alikes (i l o I L O 1) are left out.
const LOWER: &[u8] = b"abcdefghjkmnpqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"234567890";

/// Generate a password with at least one lowercase letter, one uppercase
/// letter and one digit, in random order.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let mixed: Vec<u8> = [LOWER, UPPER, DIGITS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LEN);
    for class in [LOWER, UPPER, DIGITS] {
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    while chars.len() < PASSWORD_LEN {
        chars.push(mixed[rng.gen_range(0..mixed.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
