use crate::KeySource;

/// The 4-byte key that a client XORs over the payload of every frame it sends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mask([u8; 4]);

impl Mask {
    /// Draws a fresh mask key from `keys`.
    pub fn generate<K: KeySource + ?Sized>(keys: &mut K) -> Self {
        let mut key = [0; 4];
        keys.fill_bytes(&mut key);
        Mask(key)
    }

    /// Returns the key bytes in wire order.
    pub fn key(self) -> [u8; 4] {
        self.0
    }

    /// XORs `data` with the key in place, starting `cursor` bytes into the key, and returns the cursor to resume
    /// from for the next chunk of the same frame.
    ///
    /// Masking is its own inverse, so the same call unmasks.
    pub fn apply(self, data: &mut [u8], cursor: usize) -> usize {
        let mask = u32::from_le_bytes(self.0).rotate_right(8 * (cursor % 4) as u32);

        let mut chunks = data.chunks_exact_mut(4);
        for chunk in &mut chunks {
            let mut word = [0; 4];
            word.copy_from_slice(chunk);
            let word = u32::from_le_bytes(word) ^ mask;
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        mask_u8_in_place(chunks.into_remainder(), mask);
        (cursor + data.len()) % 4
    }
}

impl From<[u8; 4]> for Mask {
    fn from(key: [u8; 4]) -> Self {
        Mask(key)
    }
}

impl From<Mask> for [u8; 4] {
    fn from(mask: Mask) -> Self {
        mask.0
    }
}

fn mask_u8_in_place(data: &mut [u8], mut mask: u32) {
    for b in data {
        *b ^= mask as u8;
        mask = mask.rotate_right(8);
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::Mask;

    // Test data chosen so that it's not a multiple of 4, ie masking of the trailing section works.
    //
    // Mask chosen so that, per block of four bytes:
    //  - First byte has all its bits flipped, so it appears in text as an \x sequence higher than \x80
    //  - Second and third bytes are unchanged
    //  - Fourth byte has its bottom bit flipped, so in text it's still a recognisable letter

    static DATA: &[u8] = b"abcdefghijklmnopqrstuvwxyz123456789";

    static MASKED_DATA: &[u8] = b"\
        \x9ebce\
        \x9afgi\
        \x96jkm\
        \x92noq\
        \x8ersu\
        \x8avwy\
        \x86z13\
        \xcc457\
        \xc889";

    #[test]
    fn can_mask() {
        let mask = Mask::from([0xff, 0x00, 0x00, 0x01]);
        let mut data = DATA.to_vec();
        let cursor = mask.apply(&mut data, 0);

        assert_eq!(b'a' ^ 0xff, data[0]);
        assert_eq!(b'd' ^ 0x01, data[3]);
        assert_eq!(MASKED_DATA, &data[..]);
        assert_eq!(DATA.len() % 4, cursor);

        mask.apply(&mut data, 0);
        assert_eq!(DATA, &data[..]);
    }

    #[test]
    fn resumes_from_cursor() {
        let mask = Mask::from([0xff, 0x00, 0x00, 0x01]);
        let mut data = DATA.to_vec();
        let (head, tail) = data.split_at_mut(6);
        let cursor = mask.apply(head, 0);
        assert_eq!(2, cursor);
        mask.apply(tail, cursor);
        assert_eq!(MASKED_DATA, &data[..]);
    }

    #[quickcheck]
    fn chunked_unmask_matches_whole(key: (u8, u8, u8, u8), data: Vec<u8>, chunk: usize) -> bool {
        let mask = Mask::from([key.0, key.1, key.2, key.3]);
        let chunk = chunk % 7 + 1;

        let mut whole = data.clone();
        mask.apply(&mut whole, 0);

        let mut cursor = 0;
        for piece in whole.chunks_mut(chunk) {
            cursor = mask.apply(piece, cursor);
        }

        whole == data
    }
}
