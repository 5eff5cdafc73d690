/*!
Byte alphabet compression.

A DFA transition table indexed by all 256 byte values is mostly redundant:
a pattern like `a[ct]g` only ever distinguishes a handful of bytes. This
module partitions the byte alphabet into equivalence classes, where two
bytes are in the same class when no transition in the automaton can tell
them apart. The DFA then stores one column per class instead of one per
byte, which shrinks its table by an order of magnitude on typical patterns.
*/

/// A partition of the 256 byte values into equivalence classes.
#[derive(Clone)]
pub struct ByteClasses([u8; 256]);

impl ByteClasses {
    /// The partition where every byte is its own class.
    pub fn singletons() -> ByteClasses {
        let mut classes = [0; 256];
        for (b, class) in classes.iter_mut().enumerate() {
            *class = b as u8;
        }
        ByteClasses(classes)
    }

    /// The class of the given byte.
    #[inline]
    pub fn get(&self, byte: u8) -> u8 {
        self.0[byte as usize]
    }

    /// Total number of classes. Classes are numbered contiguously from zero,
    /// so this is one more than the largest class.
    #[inline]
    pub fn alphabet_len(&self) -> usize {
        self.0[255] as usize + 1
    }

    /// One representative byte per class, in class order.
    pub fn representatives(&self) -> impl Iterator<Item = u8> + '_ {
        let mut prev: Option<u8> = None;
        (0..=255u8).filter(move |&b| {
            let class = self.get(b);
            if prev == Some(class) {
                false
            } else {
                prev = Some(class);
                true
            }
        })
    }
}

impl core::fmt::Debug for ByteClasses {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ByteClasses(len={})", self.alphabet_len())
    }
}

/// A builder for [`ByteClasses`], fed with the byte ranges used by an
/// automaton's transitions.
///
/// Marking a range `[start, end]` records class boundaries just before
/// `start` and at `end`. Once all ranges are in, bytes between two adjacent
/// boundaries are equivalent by construction.
#[derive(Clone, Debug)]
pub struct ByteClassSet([bool; 256]);

impl ByteClassSet {
    pub fn empty() -> ByteClassSet {
        ByteClassSet([false; 256])
    }

    /// Mark `[start, end]` (inclusive) as a byte range used by a transition.
    pub fn set_range(&mut self, start: u8, end: u8) {
        debug_assert!(start <= end);
        if start > 0 {
            self.0[start as usize - 1] = true;
        }
        self.0[end as usize] = true;
    }

    /// Convert the accumulated boundaries into equivalence classes.
    pub fn byte_classes(&self) -> ByteClasses {
        let mut classes = [0; 256];
        let mut class = 0u8;
        for b in 0..=255usize {
            classes[b] = class;
            if b < 255 && self.0[b] {
                class = class.checked_add(1).unwrap_or(255);
            }
        }
        ByteClasses(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons() {
        let classes = ByteClasses::singletons();
        assert_eq!(classes.alphabet_len(), 256);
        assert_eq!(classes.get(b'a'), b'a');
    }

    #[test]
    fn ranges_partition() {
        let mut set = ByteClassSet::empty();
        set.set_range(b'a', b'z');
        let classes = set.byte_classes();
        // [0, 'a'), ['a', 'z'], ('z', 255]
        assert_eq!(classes.alphabet_len(), 3);
        assert_eq!(classes.get(b'a'), classes.get(b'z'));
        assert_eq!(classes.get(b'a'), classes.get(b'm'));
        assert_ne!(classes.get(b'a'), classes.get(b'A'));
        assert_ne!(classes.get(b'z'), classes.get(b'{'));
    }

    #[test]
    fn overlapping_ranges() {
        let mut set = ByteClassSet::empty();
        set.set_range(b'a', b'c');
        set.set_range(b'b', b'd');
        let classes = set.byte_classes();
        // 'a', 'b'..='c' and 'd' must all be distinguishable.
        assert_ne!(classes.get(b'a'), classes.get(b'b'));
        assert_eq!(classes.get(b'b'), classes.get(b'c'));
        assert_ne!(classes.get(b'c'), classes.get(b'd'));
    }

    #[test]
    fn representatives_cover_all_classes() {
        let mut set = ByteClassSet::empty();
        set.set_range(b'a', b'a');
        set.set_range(b'c', b't');
        let classes = set.byte_classes();
        let reps: Vec<u8> = classes.representatives().collect();
        assert_eq!(reps.len(), classes.alphabet_len());
    }
}
