/// Fixed-size circular buffer. The slot at `current_index` is the next to
/// be overwritten, so it is also the oldest.
#[derive(Clone, Debug, PartialEq)]
pub struct RingStack<T> {
    slots: Vec<T>,
    current: usize,
}

impl<T: Clone> RingStack<T> {
    /// `len` copies of `value`. A zero length is raised to one.
    pub fn filled(len: usize, value: T) -> Self {
        Self {
            slots: vec![value; len.max(1)],
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Slots in storage order.
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Overwrite the oldest slot and advance.
    pub fn push(&mut self, value: T) {
        self.slots[self.current] = value;
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Overwrite every slot and rewind.
    pub fn fill(&mut self, value: &T) {
        for slot in &mut self.slots {
            *slot = value.clone();
        }
        self.current = 0;
    }

    /// Slots from oldest to newest.
    pub fn chronological(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots[self.current..]
            .iter()
            .chain(self.slots[..self.current].iter())
    }

    /// Change the capacity, keeping the newest entries. Growth inserts
    /// copies of `pad` as the oldest entries. Afterwards slot 0 is the
    /// oldest.
    pub fn resize(&mut self, len: usize, pad: &T) {
        let len = len.max(1);
        let old = self.slots.len();
        let mut ordered: Vec<T> = self.chronological().cloned().collect();
        if len < old {
            ordered.drain(..old - len);
        } else {
            let mut padded = vec![pad.clone(); len - old];
            padded.append(&mut ordered);
            ordered = padded;
        }
        self.slots = ordered;
        self.current = 0;
    }
}
