//! Minimal-style bytewords (BCR-2020-012).
//!
//! Each byte maps to a four-letter word; the minimal style keeps only the
//! first and last letter, which are unique across the word list. The encoded
//! body is the payload followed by its big-endian CRC-32.

use std::sync::OnceLock;

use crate::error::BytewordsError;
use crate::fountain;

/// The canonical 256-word list.
const WORDS: [&str; 256] = [
    "able", "acid", "also", "apex", "aqua", "arch", "atom", "aunt",
    "away", "axis", "back", "bald", "barn", "belt", "beta", "bias",
    "blue", "body", "brag", "brew", "bulb", "buzz", "calm", "cash",
    "cats", "chef", "city", "claw", "code", "cola", "cook", "cost",
    "crux", "curl", "cusp", "cyan", "dark", "data", "days", "deli",
    "dice", "diet", "door", "down", "draw", "drop", "drum", "dull",
    "duty", "each", "easy", "echo", "edge", "epic", "even", "exam",
    "exit", "eyes", "fact", "fair", "fern", "figs", "film", "fish",
    "fizz", "flap", "flew", "flux", "foxy", "free", "frog", "fuel",
    "fund", "gala", "game", "gear", "gems", "gift", "girl", "glow",
    "good", "gray", "grim", "guru", "gush", "gyro", "half", "hang",
    "hard", "hawk", "heat", "help", "high", "hill", "holy", "hope",
    "horn", "huts", "iced", "idea", "idle", "inch", "inky", "into",
    "iris", "iron", "item", "jade", "jazz", "join", "jolt", "jowl",
    "judo", "jugs", "jump", "junk", "jury", "keep", "keno", "kept",
    "keys", "kick", "kiln", "king", "kite", "kiwi", "knob", "lamb",
    "lava", "lazy", "leaf", "legs", "liar", "limp", "lion", "list",
    "logo", "loud", "love", "luau", "luck", "lung", "main", "many",
    "math", "maze", "memo", "menu", "meow", "mild", "mint", "miss",
    "monk", "nail", "navy", "need", "news", "next", "noon", "note",
    "numb", "obey", "oboe", "omit", "onyx", "open", "oval", "owls",
    "paid", "part", "peck", "play", "plus", "poem", "pool", "pose",
    "puff", "puma", "purr", "quad", "quiz", "race", "ramp", "real",
    "redo", "rich", "road", "rock", "roof", "ruby", "ruin", "runs",
    "rust", "safe", "saga", "scar", "sets", "silk", "skew", "slot",
    "soap", "solo", "song", "stub", "surf", "swan", "taco", "task",
    "taxi", "tent", "tied", "time", "tiny", "toil", "tomb", "toys",
    "trip", "tuna", "twin", "ugly", "undo", "unit", "urge", "user",
    "vast", "very", "veto", "vial", "vibe", "view", "visa", "void",
    "vows", "wall", "wand", "warm", "wasp", "wave", "waxy", "webs",
    "what", "when", "whiz", "wolf", "work", "yank", "yawn", "yell",
    "yoga", "yurt", "zaps", "zero", "zest", "zinc", "zone", "zoom",
];

const CHECKSUM_LEN: usize = 4;

fn digram_index(first: u8, last: u8) -> usize {
    usize::from(first - b'a') * 26 + usize::from(last - b'a')
}

fn lookup() -> &'static [Option<u8>; 26 * 26] {
    static TABLE: OnceLock<[Option<u8>; 26 * 26]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [None; 26 * 26];
        for (byte, word) in WORDS.iter().enumerate() {
            let letters = word.as_bytes();
            #[allow(clippy::cast_possible_truncation)]
            let byte = byte as u8;
            table[digram_index(letters[0], letters[3])] = Some(byte);
        }
        table
    })
}

/// Encode `data` as minimal bytewords with a trailing CRC-32.
#[must_use]
pub fn encode(data: &[u8]) -> String {
    let checksum = fountain::checksum(data);
    let mut out = String::with_capacity((data.len() + CHECKSUM_LEN) * 2);
    for &byte in data.iter().chain(&checksum.to_be_bytes()) {
        let letters = WORDS[usize::from(byte)].as_bytes();
        out.push(char::from(letters[0]));
        out.push(char::from(letters[3]));
    }
    out
}

/// Decode minimal bytewords, verifying the trailing CRC-32.
///
/// Decoding is case-insensitive.
///
/// # Errors
///
/// Returns [`BytewordsError`] on odd input length, unknown digrams, a body
/// shorter than the checksum, or a checksum mismatch.
pub fn decode(encoded: &str) -> Result<Vec<u8>, BytewordsError> {
    let text = encoded.to_ascii_lowercase();
    let letters = text.as_bytes();
    if letters.len() % 2 != 0 {
        return Err(BytewordsError::OddLength(letters.len()));
    }
    let mut body = Vec::with_capacity(letters.len() / 2);
    for digram in letters.chunks_exact(2) {
        let known = digram.iter().all(u8::is_ascii_lowercase);
        let byte = if known {
            lookup()[digram_index(digram[0], digram[1])]
        } else {
            None
        };
        match byte {
            Some(byte) => body.push(byte),
            None => {
                return Err(BytewordsError::UnknownDigram(
                    String::from_utf8_lossy(digram).into_owned(),
                ));
            }
        }
    }
    if body.len() < CHECKSUM_LEN {
        return Err(BytewordsError::MissingChecksum);
    }
    let trailer = body.split_off(body.len() - CHECKSUM_LEN);
    let data = body;
    let mut expected_bytes = [0u8; CHECKSUM_LEN];
    expected_bytes.copy_from_slice(&trailer);
    let expected = u32::from_be_bytes(expected_bytes);
    let got = fountain::checksum(&data);
    if got != expected {
        return Err(BytewordsError::ChecksumMismatch { expected, got });
    }
    Ok(data)
}
