use crate::error::ResourceError;

/// Bounded receive accumulator.
///
/// Bytes enter only through [`RecvBuffer::append`] and leave only through
/// [`RecvBuffer::compact`]. The length never exceeds the capacity.
#[derive(Debug)]
pub struct RecvBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl RecvBuffer {
    pub const fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Appends `bytes`, or fails without appending anything if they do not fit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ResourceError> {
        if bytes.len() > self.remaining() {
            return Err(ResourceError::BufferOverflow {
                len: self.buf.len(),
                additional: bytes.len(),
                capacity: self.capacity,
            });
        }

        self.buf.extend_from_slice(bytes);

        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Drops the first `consumed` bytes and moves the residue to the front.
    pub fn compact(&mut self, consumed: usize) {
        if consumed >= self.buf.len() {
            self.buf.clear();
        } else if consumed > 0 {
            self.buf.drain(..consumed);
        }
    }
}

/// Growable payload buffer. Capacity doubles whenever an append would not fit.
#[derive(Debug)]
pub struct PayloadBuffer {
    buf: Vec<u8>,
}

impl PayloadBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        let needed = self.buf.len() + bytes.len();

        if needed > self.buf.capacity() {
            let mut capacity = self.buf.capacity().max(1);

            while capacity < needed {
                capacity *= 2;
            }

            self.buf.reserve_exact(capacity - self.buf.len());
        }

        self.buf.extend_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod recv {
        use super::*;

        #[test]
        fn append_up_to_capacity() {
            let mut buf = RecvBuffer::new(4);

            buf.append(b"ab").unwrap();
            buf.append(b"cd").unwrap();

            assert_eq!(buf.as_slice(), b"abcd");
            assert_eq!(buf.remaining(), 0);
        }

        #[test]
        fn overflow_leaves_contents_untouched() {
            let mut buf = RecvBuffer::new(4);

            buf.append(b"abc").unwrap();
            let error = buf.append(b"de").unwrap_err();

            assert!(matches!(
                error,
                ResourceError::BufferOverflow {
                    len: 3,
                    additional: 2,
                    capacity: 4
                }
            ));
            assert_eq!(buf.as_slice(), b"abc");
        }

        #[test]
        fn compact_moves_residue_to_front() {
            let mut buf = RecvBuffer::new(8);

            buf.append(b"abcdef").unwrap();
            buf.compact(4);

            assert_eq!(buf.as_slice(), b"ef");

            buf.compact(2);

            assert!(buf.is_empty());
        }

        #[test]
        fn compact_nothing() {
            let mut buf = RecvBuffer::new(8);

            buf.append(b"ab").unwrap();
            buf.compact(0);

            assert_eq!(buf.as_slice(), b"ab");
        }
    }

    mod payload {
        use super::*;

        #[test]
        fn capacity_doubles() {
            let mut buf = PayloadBuffer::with_capacity(4);

            buf.push(b"abc");
            buf.push(b"de");

            assert_eq!(buf.as_slice(), b"abcde");
            assert!(buf.capacity() >= 8);
        }

        #[test]
        fn grows_from_zero() {
            let mut buf = PayloadBuffer::with_capacity(0);

            buf.push(b"hello");

            assert_eq!(buf.as_slice(), b"hello");
            assert!(buf.capacity() >= 8);
        }
    }
}
