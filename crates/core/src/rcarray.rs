//! RcArray - Reference-Counted Copy-on-Write Associative Array
//!
//! The language's only container: an insertion-ordered map from integer or
//! string keys to values. Cloning shares the underlying map; the first
//! mutation through a shared (or constant) handle copies it out.
//!
//! Keys follow the language's normalization rule: a string key that spells a
//! canonical decimal integer (`"7"`, `"-3"`, but not `"07"` or `" 7"`) is the
//! same key as that integer.
//!
//! `next_index` tracks where `push` appends: one past the largest integer key
//! ever inserted, starting at 0.

use crate::numeric::parse_canonical_int;
use crate::rcstring::{CONST_REF_COUNT, RcString};
use indexmap::IndexMap;
use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Normalized array key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayKey {
    Int(i64),
    Str(RcString),
}

impl Hash for ArrayKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Discriminant keeps Int(1) and Str("1")-shaped bytes apart
        std::mem::discriminant(self).hash(state);
        match self {
            ArrayKey::Int(n) => n.hash(state),
            ArrayKey::Str(s) => s.as_bytes().hash(state),
        }
    }
}

impl ArrayKey {
    /// Build a key from raw bytes, folding canonical integers to `Int`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match parse_canonical_int(bytes) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(RcString::from(bytes)),
        }
    }

    /// Build a key from a string handle without copying non-integer bytes
    pub fn from_string(s: &RcString) -> Self {
        match s.try_to_int() {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(s.clone()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArrayKey::Int(n) => Some(*n),
            ArrayKey::Str(_) => None,
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{}", n),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(n: i64) -> Self {
        ArrayKey::Int(n)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_bytes(s.as_bytes())
    }
}

impl From<&RcString> for ArrayKey {
    fn from(s: &RcString) -> Self {
        ArrayKey::from_string(s)
    }
}

impl From<RcString> for ArrayKey {
    fn from(s: RcString) -> Self {
        ArrayKey::from_string(&s)
    }
}

type ArrayMap<T> = IndexMap<ArrayKey, T, ahash::RandomState>;

#[derive(Debug)]
struct ArrayData<T> {
    map: ArrayMap<T>,
    next_index: i64,
    constant: Cell<bool>,
}

impl<T> ArrayData<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: IndexMap::with_capacity_and_hasher(capacity, ahash::RandomState::new()),
            next_index: 0,
            constant: Cell::new(false),
        }
    }

    fn note_key(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(n) = key
            && *n >= self.next_index
        {
            self.next_index = n.saturating_add(1);
        }
    }
}

// A copied-out map is always private and mutable
impl<T: Clone> Clone for ArrayData<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            next_index: self.next_index,
            constant: Cell::new(false),
        }
    }
}

/// Copy-on-write ordered map
pub struct RcArray<T> {
    data: Rc<ArrayData<T>>,
}

impl<T> Clone for RcArray<T> {
    fn clone(&self) -> Self {
        RcArray {
            data: Rc::clone(&self.data),
        }
    }
}

impl<T> RcArray<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RcArray {
            data: Rc::new(ArrayData::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.map.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&T> {
        self.data.map.get(key)
    }

    pub fn contains(&self, key: &ArrayKey) -> bool {
        self.data.map.contains_key(key)
    }

    /// Key that the next `push` will use
    pub fn next_index(&self) -> i64 {
        self.data.next_index
    }

    /// Iterate `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &T)> {
        self.data.map.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.data.map.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.map.values()
    }

    // Scalar views used by the coercion rules: an array converts as its count

    pub fn to_int(&self) -> i64 {
        i64::try_from(self.len()).unwrap_or(i64::MAX)
    }

    pub fn to_float(&self) -> f64 {
        self.len() as f64
    }

    pub fn to_bool(&self) -> bool {
        !self.is_empty()
    }

    /// Number of handles sharing the map, or `CONST_REF_COUNT` for constants
    pub fn reference_count(&self) -> i32 {
        if self.data.constant.get() {
            CONST_REF_COUNT
        } else {
            i32::try_from(Rc::strong_count(&self.data)).unwrap_or(i32::MAX)
        }
    }

    pub fn mark_constant(&self) {
        self.data.constant.set(true);
    }

    pub fn is_constant(&self) -> bool {
        self.data.constant.get()
    }

    /// Approximate heap footprint of the map itself (elements not followed)
    pub fn estimate_memory_usage(&self) -> usize {
        let slot = std::mem::size_of::<ArrayKey>() + std::mem::size_of::<T>() + 8;
        std::mem::size_of::<ArrayData<T>>() + self.data.map.capacity() * slot
    }

    pub fn ptr_eq(&self, other: &RcArray<T>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Clone> RcArray<T> {
    fn make_mut(&mut self) -> &mut ArrayData<T> {
        if self.data.constant.get() {
            self.data = Rc::new((*self.data).clone());
        }
        Rc::make_mut(&mut self.data)
    }

    pub fn get_mut(&mut self, key: &ArrayKey) -> Option<&mut T> {
        if !self.contains(key) {
            return None;
        }
        self.make_mut().map.get_mut(key)
    }

    /// Insert or overwrite; an existing key keeps its position
    pub fn set(&mut self, key: ArrayKey, value: T) {
        let data = self.make_mut();
        data.note_key(&key);
        data.map.insert(key, value);
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &ArrayKey) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        self.make_mut().map.shift_remove(key)
    }

    /// Append at `next_index` and return the new slot
    ///
    /// Returns `None` and leaves the array untouched when that index is
    /// already taken, which happens once `i64::MAX` is a key.
    pub fn push(&mut self, value: T) -> Option<&mut T> {
        let key = ArrayKey::Int(self.data.next_index);
        if self.data.map.contains_key(&key) {
            return None;
        }
        let data = self.make_mut();
        data.note_key(&key);
        let (index, _) = data.map.insert_full(key, value);
        Some(&mut data.map[index])
    }

    /// Merge by addition: keys already present win, missing keys of `other`
    /// are appended in `other`'s order
    pub fn union_with(&mut self, other: &RcArray<T>) {
        if other.is_empty() || self.ptr_eq(other) {
            return;
        }
        if self.is_empty() && !other.is_constant() {
            *self = other.clone();
            return;
        }
        let data = self.make_mut();
        for (key, value) in other.iter() {
            if !data.map.contains_key(key) {
                data.note_key(key);
                data.map.insert(key.clone(), value.clone());
            }
        }
    }

    /// Mutable iteration; detaches a shared map first
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ArrayKey, &mut T)> {
        self.make_mut().map.iter_mut()
    }
}

impl<T: Clone + Default> RcArray<T> {
    /// Slot for `key`, inserting `T::default()` when absent
    pub fn entry_or_default(&mut self, key: ArrayKey) -> &mut T {
        let data = self.make_mut();
        data.note_key(&key);
        data.map.entry(key).or_default()
    }
}

impl<T> Default for RcArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Order-insensitive content equality, as with the underlying map
impl<T: PartialEq> PartialEq for RcArray<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data) || self.data.map == other.data.map
    }
}

impl<T: fmt::Debug> fmt::Debug for RcArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.data.map.iter()).finish()
    }
}

impl<T: Clone> FromIterator<T> for RcArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = RcArray::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl<T: Clone> FromIterator<(ArrayKey, T)> for RcArray<T> {
    fn from_iter<I: IntoIterator<Item = (ArrayKey, T)>>(iter: I) -> Self {
        let mut array = RcArray::new();
        for (key, value) in iter {
            array.set(key, value);
        }
        array
    }
}
