use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::policy::SPECIAL_CHARS;
use super::strength::WeakPatterns;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = SPECIAL_CHARS.as_bytes();

pub const MIN_GENERATED_LENGTH: usize = 4;
pub const DEFAULT_GENERATED_LENGTH: usize = 16;
const MAX_ATTEMPTS: usize = 32;

fn pick(rng: &mut impl Rng, charset: &[u8]) -> char {
    charset[rng.gen_range(0..charset.len())] as char
}

fn candidate(rng: &mut impl Rng, length: usize) -> String {
    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL].concat();

    let mut chars = vec![
        pick(rng, UPPERCASE),
        pick(rng, LOWERCASE),
        pick(rng, DIGITS),
        pick(rng, SPECIAL),
    ];
    while chars.len() < length {
        chars.push(pick(rng, &all));
    }
    chars.shuffle(rng);

    chars.into_iter().collect()
}

/// Random password with at least one character of every class.
///
/// Lengths below four are raised to four. Candidates with sequential runs,
/// repeats or dictionary words are redrawn a bounded number of times.
pub fn generate_strong_password(length: usize) -> String {
    let length = length.max(MIN_GENERATED_LENGTH);
    let mut rng = OsRng;

    let mut password = candidate(&mut rng, length);
    for _ in 1..MAX_ATTEMPTS {
        if !WeakPatterns::detect(&password).any() {
            break;
        }
        password = candidate(&mut rng, length);
    }

    password
}
