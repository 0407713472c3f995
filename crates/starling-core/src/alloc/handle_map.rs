use crate::profiling::profile_function;
use std::num::NonZeroU64;

/// A generational handle into a [`HandleMap`].
///
/// Packs a 32-bit generation and a 32-bit index into a single non-zero
/// word, so `Option<Handle>` is pointer-sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroU64);

impl Handle {
    fn new(generation: u32, idx: u32) -> Self {
        // idx + 1 keeps the low word non-zero even at generation 0
        Self(NonZeroU64::new(((generation as u64) << 32) | (idx as u64 + 1)).unwrap())
    }

    pub fn generation(&self) -> u32 {
        (self.0.get() >> 32) as u32
    }

    pub fn index(&self) -> u32 {
        (self.0.get() & u32::MAX as u64) as u32 - 1
    }
}

struct Entry<T> {
    generation: u32,
    data: Option<T>,
}

/// A slot map handing out generational handles.
///
/// Removing an entry bumps its slot's generation, so handles to removed
/// entries are detectably stale: `get`/`get_mut`/`remove` return `None`
/// for them instead of aliasing whatever reused the slot.
pub struct HandleMap<T> {
    vec: Vec<Entry<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> HandleMap<T> {
    pub const fn new() -> Self {
        Self {
            vec: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, data: T) -> Handle {
        profile_function!();
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let entry = &mut self.vec[idx as usize];
            entry.data = Some(data);
            Handle::new(entry.generation, idx)
        } else {
            let idx = self.vec.len();
            self.vec.push(Entry {
                generation: 0,
                data: Some(data),
            });
            Handle::new(0, idx as u32)
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let entry = self.vec.get(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.data.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let entry = self.vec.get_mut(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.data.as_mut()
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        profile_function!();
        let index = handle.index();
        let entry = self.vec.get_mut(index as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        let data = entry.data.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
        Some(data)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.vec.iter().enumerate().filter_map(|(idx, entry)| {
            entry
                .data
                .as_ref()
                .map(|data| (Handle::new(entry.generation, idx as u32), data))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.vec.iter().filter_map(|entry| entry.data.as_ref())
    }
}

impl<T> Default for HandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_eq_size!(Handle, Option<Handle>);
