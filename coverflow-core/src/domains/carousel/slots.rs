//! Per-item slots mirroring the item source.

use crate::domains::images::ImageHandle;
use crate::error::{CarouselError, Result};

/// One logical item position. `image == None` draws the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSlot<K> {
    pub index: usize,
    pub key: Option<K>,
    pub image: Option<ImageHandle>,
    pub is_loading: bool,
}

impl<K> ItemSlot<K> {
    fn new(index: usize, key: Option<K>) -> Self {
        Self {
            index,
            key,
            image: None,
            is_loading: false,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SlotTable<K> {
    slots: Vec<ItemSlot<K>>,
}

impl<K> Default for SlotTable<K> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<K: Clone + PartialEq> SlotTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ItemSlot<K>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemSlot<K>> {
        self.slots.iter()
    }

    /// Rebuild every slot from `keys`, dropping images.
    pub fn reset(&mut self, keys: impl IntoIterator<Item = Option<K>>) {
        self.slots = keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| ItemSlot::new(index, key))
            .collect();
    }

    /// Insert fresh slots at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, keys: impl IntoIterator<Item = Option<K>>) {
        let at = index.min(self.slots.len());
        let fresh: Vec<_> = keys.into_iter().map(|key| ItemSlot::new(0, key)).collect();
        self.slots.splice(at..at, fresh);
        self.reindex(at);
    }

    /// Remove up to `count` slots starting at `index`, returning them.
    pub fn remove(&mut self, index: usize, count: usize) -> Vec<ItemSlot<K>> {
        if index >= self.slots.len() {
            return Vec::new();
        }
        let end = index.saturating_add(count).min(self.slots.len());
        let removed = self.slots.drain(index..end).collect();
        self.reindex(index);
        removed
    }

    /// Move the slot at `from` so it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.slots.len();
        if from >= len {
            return Err(CarouselError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(CarouselError::IndexOutOfRange { index: to, len });
        }
        if from == to {
            return Ok(());
        }
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        self.reindex(from.min(to));
        Ok(())
    }

    /// Replace the key of a slot. The image is dropped when the key changes.
    pub fn set_key(&mut self, index: usize, key: Option<K>) {
        if let Some(slot) = self.slots.get_mut(index)
            && slot.key != key
        {
            slot.key = key;
            slot.image = None;
            slot.is_loading = false;
        }
    }

    pub fn set_loading(&mut self, index: usize, loading: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.is_loading = loading;
        }
    }

    /// Returns false when `index` is out of range.
    pub fn set_image(&mut self, index: usize, image: ImageHandle) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.image = Some(image);
                slot.is_loading = false;
                true
            }
            None => false,
        }
    }

    /// Back to the placeholder. Returns whether an image was dropped.
    pub fn clear_image(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.is_loading = false;
                slot.image.take().is_some()
            }
            None => false,
        }
    }

    /// Every index currently showing `key`.
    pub fn indices_of(&self, key: &K) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| slot.key.as_ref() == Some(key))
            .map(|slot| slot.index)
            .collect()
    }

    fn reindex(&mut self, from: usize) {
        for (index, slot) in self.slots.iter_mut().enumerate().skip(from) {
            slot.index = index;
        }
    }
}
