//! Hash functions for stable parameter addresses.
//!
//! Parameter addresses must survive rebuilds of the plugin binary and
//! save/load round-trips, so they are derived from the parameter's string
//! identifier with a hash whose output never depends on the platform, the
//! compiler version or the process.

/// FNV-1a 32-bit hash of a string.
///
/// Non-cryptographic, byte-by-byte, usable in `const` context.
///
/// ```
/// use splice_utils::fnv1a_32;
///
/// const GAIN: u32 = fnv1a_32("gain");
/// assert_eq!(GAIN, fnv1a_32("gain"));
/// ```
#[inline]
pub const fn fnv1a_32(s: &str) -> u32 {
    const FNV_OFFSET: u32 = 2166136261;
    const FNV_PRIME: u32 = 16777619;

    let bytes = s.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Stable parameter address for a string identifier.
///
/// The address is the 32-bit FNV-1a hash widened to `u64`. Hosts that keep
/// parameter addresses in 32-bit storage (several AU hosts truncate the
/// address when recording automation) see the same value.
#[inline]
pub const fn address_from_identifier(identifier: &str) -> u64 {
    fnv1a_32(identifier) as u64
}
