//! `assetsync keygen` – print a fresh wrapping key.

use assetsync_core::WrappingKey;

pub fn run_keygen() {
    println!("{}", WrappingKey::generate().to_base64());
}
