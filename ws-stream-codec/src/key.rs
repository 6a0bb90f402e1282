use rand::RngCore;

/// Supplies the random bytes used for frame mask keys and the handshake nonce.
///
/// Neither use needs cryptographic strength: the mask exists to stop intermediaries from caching payload, and the
/// nonce only has to differ between connections. Tests substitute a fixed sequence to make the bytes on the wire
/// predictable.
pub trait KeySource {
    /// Fills `dest` with random bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Draws bytes from the thread-local generator in the `rand` crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadRngSource;

impl KeySource for ThreadRngSource {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::thread_rng().fill_bytes(dest);
    }
}

/// Repeats the same four bytes forever.
///
/// Every frame mask and handshake nonce becomes predictable, which suits tests and reproducible captures but nothing
/// facing a real network.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedKeys(pub [u8; 4]);

impl KeySource for FixedKeys {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for (dest, &src) in dest.iter_mut().zip(self.0.iter().cycle()) {
            *dest = src;
        }
    }
}

impl<'a, K: KeySource + ?Sized> KeySource for &'a mut K {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        (**self).fill_bytes(dest)
    }
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        (**self).fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use crate::{FixedKeys, KeySource, ThreadRngSource};

    #[test]
    fn fixed_keys_cycle() {
        let mut buf = [0; 6];
        FixedKeys([1, 2, 3, 4]).fill_bytes(&mut buf);
        assert_eq!([1, 2, 3, 4, 1, 2], buf);
    }

    #[test]
    fn thread_rng_fills() {
        let mut a = [0; 16];
        let mut b = [0; 16];
        ThreadRngSource.fill_bytes(&mut a);
        ThreadRngSource.fill_bytes(&mut b);
        assert_ne!(a, b);
    }
}
