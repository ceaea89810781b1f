//! Record identifier generation

use rand::Rng;

/// Length of generated document record ids
pub const RECORD_ID_LENGTH: usize = 20;

const RECORD_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random 20-character record id from `A-Z0-9`
pub fn generate_record_id() -> String {
    let mut rng = rand::thread_rng();
    (0..RECORD_ID_LENGTH)
        .map(|_| RECORD_ID_CHARSET[rng.gen_range(0..RECORD_ID_CHARSET.len())] as char)
        .collect()
}
