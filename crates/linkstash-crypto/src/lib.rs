/// Linkstash Crypto Library
///
/// Password hashing with a small closed set of schemes. Records carry the
/// scheme they were hashed with so old hashes keep verifying and can be
/// upgraded to the preferred scheme on the next successful login.
///
/// Also generates the per-user `userHash` bucket key.

pub mod password;
pub mod user_hash;

pub use password::{HashError, HashScheme, Hasher};
pub use user_hash::{USER_HASH_LEN, generate_user_hash};
