/// XORs `payload` in place with the repeating 4 byte `mask`.
///
/// Masking and unmasking are the same operation.
#[inline]
pub fn unmask(payload: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask[i & 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn involution() {
        let mask = [0x12, 0x34, 0x56, 0x78];
        let mut payload = *b"Hello, world!";

        unmask(&mut payload, mask);
        assert_ne!(&payload, b"Hello, world!");

        unmask(&mut payload, mask);
        assert_eq!(&payload, b"Hello, world!");
    }

    #[test]
    fn cycles_every_four_bytes() {
        let mut payload = [0u8; 6];

        unmask(&mut payload, [1, 2, 3, 4]);

        assert_eq!(payload, [1, 2, 3, 4, 1, 2]);
    }
}
