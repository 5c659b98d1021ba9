use rand::RngExt;

use crate::validate::{MAX_CODE_LEN, MIN_CODE_LEN};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Source of candidate short codes.
///
/// Candidates are not checked against the store; the registry handles collisions.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws codes from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_candidate()
    }
}

/// Pick a length in 6..=8, then that many characters uniformly from `[A-Za-z0-9]`.
pub fn generate_candidate() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(MIN_CODE_LEN..=MAX_CODE_LEN);
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
