//! From-scratch BLAKE2b (RFC 7693), unkeyed, no salt or personalization.
//!
//! Only the sequential, single-call variant is implemented: the sole consumer
//! is address derivation, which hashes a 34-byte key encoding. Output length
//! is caller-chosen in `1..=64`; the RFC test vectors are the ground truth
//! (see `tests/hash_vectors.rs`).

/// Maximum digest length in bytes.
pub const MAX_OUTPUT_LEN: usize = 64;

/// Compression block size in bytes.
pub const BLOCK_LEN: usize = 128;

// BLAKE2b initialization vector (RFC 7693 §2.6).
const IV: [u64; 8] = [
    0x6a09_e667_f3bc_c908,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
    0x1f83_d9ab_fb41_bd6b,
    0x5be0_cd19_137e_2179,
];

// Message word schedule (RFC 7693 §2.7). Rounds 10 and 11 reuse rows 0 and 1.
const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// Compute an unkeyed BLAKE2b digest of `input` with exactly `output_len`
/// bytes of output.
///
/// # Panics
///
/// Panics if `output_len` is outside `1..=64`. An invalid length can only
/// come from a coding mistake, never from untrusted input, so it is a
/// contract violation rather than a recoverable error.
#[must_use]
pub fn hash(input: &[u8], output_len: usize) -> Vec<u8> {
    assert!(
        (1..=MAX_OUTPUT_LEN).contains(&output_len),
        "BLAKE2b output length must be in 1..=64, got {output_len}"
    );

    // h[0] absorbs the parameter block: fanout = depth = 1, digest length.
    let mut h = IV;
    h[0] ^= 0x0101_0000 ^ output_len as u64;

    // 128-bit byte counter; low word then high word are XORed into v[12..14].
    let mut t: u128 = 0;
    let mut offset = 0usize;

    // Every block except the last is compressed with the "not final" flag.
    // An input that is an exact multiple of 128 bytes ends with a final full
    // block; only shorter tails are zero-padded.
    while input.len() - offset > BLOCK_LEN {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&input[offset..offset + BLOCK_LEN]);
        t += BLOCK_LEN as u128;
        compress(&mut h, &block, t, false);
        offset += BLOCK_LEN;
    }

    // Final block: zero-padded tail. Empty input still compresses one
    // all-zero block with t = 0.
    let remaining = input.len() - offset;
    let mut block = [0u8; BLOCK_LEN];
    block[..remaining].copy_from_slice(&input[offset..]);
    t += remaining as u128;
    compress(&mut h, &block, t, true);

    let mut out = vec![0u8; output_len];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = (h[i / 8] >> (8 * (i % 8))) as u8;
    }
    out
}

/// BLAKE2b-256 convenience wrapper for fixed 32-byte digests.
#[must_use]
pub fn hash256(input: &[u8]) -> [u8; 32] {
    let digest = hash(input, 32);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

fn compress(h: &mut [u64; 8], block: &[u8; BLOCK_LEN], t: u128, last: bool) {
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);

    v[12] ^= t as u64;
    v[13] ^= (t >> 64) as u64;
    if last {
        v[14] ^= u64::MAX;
    }

    // Sixteen little-endian 64-bit message words.
    let mut m = [0u64; 16];
    for (i, word) in m.iter_mut().enumerate() {
        let mut w = 0u64;
        for j in 0..8 {
            w |= u64::from(block[i * 8 + j]) << (8 * j);
        }
        *word = w;
    }

    for round in 0..12 {
        let s = &SIGMA[round % 10];
        // Columns.
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        // Diagonals.
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

#[inline]
#[allow(clippy::many_single_char_names)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}
