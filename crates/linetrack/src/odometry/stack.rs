//! Bounded slot stack holding one frame's features.

/// Failure of a [`BoundedStack`] operation. The stack is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Push on a full stack.
    CapacityExceeded { capacity: usize },
    /// Pop on an empty stack.
    Empty,
    /// Slot index past the current length.
    IndexOutOfBounds { index: usize, len: usize },
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded { capacity } => {
                write!(f, "stack is full (capacity {})", capacity)
            }
            Self::Empty => write!(f, "stack is empty"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "slot {} out of bounds (len {})", index, len)
            }
        }
    }
}

impl std::error::Error for StackError {}

/// Fixed-capacity LIFO of owned values with direct slot access.
///
/// A slot may be emptied in place (`take`, `set(i, None)`) without shifting
/// the other indices; `len` counts slots, `live` counts occupied ones.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    slots: Vec<Option<T>>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value` on top.
    pub fn push(&mut self, value: T) -> Result<(), StackError> {
        if self.is_full() {
            return Err(StackError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.slots.push(Some(value));
        Ok(())
    }

    /// Remove the top slot. `Ok(None)` if that slot was already emptied.
    pub fn pop(&mut self) -> Result<Option<T>, StackError> {
        self.slots.pop().ok_or(StackError::Empty)
    }

    pub fn get(&self, index: usize) -> Result<Option<&T>, StackError> {
        self.slot(index).map(Option::as_ref)
    }

    /// Empty slot `index` in place and return what it held.
    pub fn take(&mut self, index: usize) -> Result<Option<T>, StackError> {
        Ok(self.slot_mut(index)?.take())
    }

    /// Overwrite slot `index`. Returns the previous content.
    pub fn set(&mut self, index: usize, value: Option<T>) -> Result<Option<T>, StackError> {
        Ok(std::mem::replace(self.slot_mut(index)?, value))
    }

    /// Number of slots, emptied ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Occupied slots with their indices, bottom to top.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    /// Drop every slot. Returns how many were still occupied.
    pub fn retire_all(&mut self) -> usize {
        let live = self.live();
        self.slots.clear();
        live
    }

    fn slot(&self, index: usize) -> Result<&Option<T>, StackError> {
        let len = self.slots.len();
        self.slots
            .get(index)
            .ok_or(StackError::IndexOutOfBounds { index, len })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Option<T>, StackError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(StackError::IndexOutOfBounds { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_past_capacity_fails_without_mutation() {
        let mut s = BoundedStack::with_capacity(4);
        for i in 0..4 {
            s.push(i).unwrap();
        }
        assert!(s.is_full());
        assert_eq!(
            s.push(99),
            Err(StackError::CapacityExceeded { capacity: 4 })
        );
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(3), Ok(Some(&3)));
    }

    #[test]
    fn pop_is_lifo() {
        let mut s = BoundedStack::with_capacity(3);
        s.push("a").unwrap();
        s.push("b").unwrap();
        assert_eq!(s.pop(), Ok(Some("b")));
        assert_eq!(s.pop(), Ok(Some("a")));
        assert_eq!(s.pop(), Err(StackError::Empty));
    }

    #[test]
    fn take_empties_slot_in_place() {
        let mut s = BoundedStack::with_capacity(3);
        for v in [10, 20, 30] {
            s.push(v).unwrap();
        }
        assert_eq!(s.take(1), Ok(Some(20)));
        assert_eq!(s.take(1), Ok(None));
        assert_eq!(s.len(), 3);
        assert_eq!(s.live(), 2);
        assert_eq!(s.get(2), Ok(Some(&30)));
        let live: Vec<_> = s.iter_live().collect();
        assert_eq!(live, vec![(0, &10), (2, &30)]);
        // Emptied top slot pops as None.
        s.set(2, None).unwrap();
        assert_eq!(s.pop(), Ok(None));
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut s = BoundedStack::with_capacity(2);
        s.push(1u8).unwrap();
        let err = StackError::IndexOutOfBounds { index: 1, len: 1 };
        assert_eq!(s.get(1), Err(err));
        assert_eq!(s.take(1), Err(err));
        assert_eq!(s.set(1, Some(5)), Err(err));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(0), Ok(Some(&1)));
    }

    #[test]
    fn retire_all_counts_live_slots() {
        let mut s = BoundedStack::with_capacity(5);
        for v in 0..5 {
            s.push(v).unwrap();
        }
        s.take(0).unwrap();
        s.take(4).unwrap();
        assert_eq!(s.retire_all(), 3);
        assert!(s.is_empty());
        assert_eq!(s.capacity(), 5);
    }

    #[test]
    fn zero_capacity_rejects_every_push() {
        let mut s: BoundedStack<u32> = BoundedStack::with_capacity(0);
        assert!(s.push(1).is_err());
        assert_eq!(s.len(), 0);
    }
}
