//! Namespace digest appended to generic contract names
//!
//! The block routine below reproduces the historical digest of the reference
//! serializer bit for bit: an MD5 compression over the UTF-8 bytes, with the
//! message length stored in four bytes only. The first six bytes of the hash
//! are rendered in base64 with `/` and `+` substituted.

const DIGEST_LEN: usize = 6;

const SHIFTS: [u32; 16] = [7, 12, 17, 22, 5, 9, 14, 20, 4, 11, 16, 23, 6, 10, 15, 21];

const SINES: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed, 0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

const BASE64_ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Digest of a space-separated namespace list, e.g. `" 1 http://..."`.
pub fn namespaces_digest(namespaces: &str) -> String {
    let hash = compute_hash(namespaces.as_bytes());
    let mut digest = String::with_capacity(12);
    for c in base64(&hash[..DIGEST_LEN]).chars() {
        match c {
            '=' => {}
            '/' => digest.push_str("_S"),
            '+' => digest.push_str("_P"),
            _ => digest.push(c),
        }
    }
    digest
}

fn compute_hash(bytes: &[u8]) -> [u8; 16] {
    let len = bytes.len();
    let blocks = (len + 8) / 64 + 1;

    let mut aa: u32 = 0x67452301;
    let mut bb: u32 = 0xefcdab89;
    let mut cc: u32 = 0x98badcfe;
    let mut dd: u32 = 0x10325476;

    for i in 0..blocks {
        let offset = i * 64;
        let mut tail = [0u8; 64];
        let block: &[u8] = if offset + 64 > len {
            if offset < len {
                tail[..len - offset].copy_from_slice(&bytes[offset..]);
            }
            if offset <= len {
                tail[len - offset] = 0x80;
            }
            if i == blocks - 1 {
                tail[56] = (len << 3) as u8;
                tail[57] = (len >> 5) as u8;
                tail[58] = (len >> 13) as u8;
                tail[59] = (len >> 21) as u8;
            }
            &tail
        } else {
            &bytes[offset..offset + 64]
        };

        let (mut a, mut b, mut c, mut d) = (aa, bb, cc, dd);
        for j in 0..64 {
            let (f, g) = match j {
                0..=15 => ((b & c) | (!b & d), j),
                16..=31 => ((b & d) | (c & !d), 5 * j + 1),
                32..=47 => (b ^ c ^ d, 3 * j + 5),
                _ => (c ^ (b | !d), 7 * j),
            };
            let g = (g & 15) * 4;
            let word = u32::from_le_bytes([block[g], block[g + 1], block[g + 2], block[g + 3]]);

            let hold = d;
            d = c;
            c = b;
            b = a.wrapping_add(f).wrapping_add(SINES[j]).wrapping_add(word);
            b = b.rotate_left(SHIFTS[(j & 3) | ((j >> 2) & !3)]);
            b = b.wrapping_add(c);
            a = hold;
        }

        aa = aa.wrapping_add(a);
        bb = bb.wrapping_add(b);
        cc = cc.wrapping_add(c);
        dd = dd.wrapping_add(d);
    }

    let mut hash = [0u8; 16];
    hash[0..4].copy_from_slice(&aa.to_le_bytes());
    hash[4..8].copy_from_slice(&bb.to_le_bytes());
    hash[8..12].copy_from_slice(&cc.to_le_bytes());
    hash[12..16].copy_from_slice(&dd.to_le_bytes());
    hash
}

fn base64(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let n = (chunk[0] as u32) << 16
            | (*chunk.get(1).unwrap_or(&0) as u32) << 8
            | *chunk.get(2).unwrap_or(&0) as u32;
        let sextets = [(n >> 18) & 63, (n >> 12) & 63, (n >> 6) & 63, n & 63];
        for (k, &s) in sextets.iter().enumerate() {
            if k <= chunk.len() {
                out.push(BASE64_ALPHABET[s as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_hash_matches_md5() {
        assert_eq!(hex(&compute_hash(b"")), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hex(&compute_hash(&[b'a'; 56])), "3b0c8ac703f828b04c6c197006d17218");
        assert_eq!(hex(&compute_hash(&[b'a'; 64])), "014842d480b571495a4a0363793f7367");
        assert_eq!(hex(&compute_hash(&[b'a'; 120])), "5f61c0ccad4cac44c75ff505e1f1e537");
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(namespaces_digest(""), "1B2M2Y8A");
        assert_eq!(namespaces_digest("abc"), "kAFQmDzS");
        assert_eq!(namespaces_digest(" 1 http://schemas.datacontract.org/2004/07/Zoo"), "XnRlto51");
        assert_eq!(namespaces_digest(" 0 1 http://www.w3.org/2001/XMLSchema"), "k9wYX3t0");
    }

    #[test]
    fn test_slash_substitution() {
        let digest = namespaces_digest(&"a".repeat(55));
        assert_eq!(digest, "7xdytt_S5");
    }

    #[test]
    fn test_base64_padding() {
        assert_eq!(base64(b"f"), "Zg==");
        assert_eq!(base64(b"fo"), "Zm8=");
        assert_eq!(base64(b"foobar"), "Zm9vYmFy");
    }
}
