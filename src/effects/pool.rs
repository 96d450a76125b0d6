//! Generic object pool for high-churn entities
//!
//! Instances live in pre-allocated slots and are addressed by a
//! [`PoolHandle`] (slot index + generation). Acquiring bumps the slot's
//! generation, so a handle kept after its release can never reach the
//! slot's next occupant.
//!
//! The pool takes `&mut self` for acquire/release; share it between
//! threads behind a `Mutex` (factory and reset closures are `Send`).

use std::fmt;

/// Handle to a checked-out pool instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// What happens when every slot is checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolGrowth {
    /// `acquire` fails with [`PoolError::Exhausted`]
    Fixed,
    /// A new slot is allocated
    Growable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No free slot and growth is disabled
    Exhausted { capacity: usize },
    /// The handle's instance is not checked out
    DoubleRelease(PoolHandle),
    /// The handle points at a slot that has since been reused, or at no slot
    StaleHandle(PoolHandle),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Exhausted { capacity } => {
                write!(f, "pool exhausted ({capacity} instances checked out)")
            }
            PoolError::DoubleRelease(handle) => {
                write!(f, "instance in slot {} released twice", handle.index)
            }
            PoolError::StaleHandle(handle) => write!(
                f,
                "stale handle for slot {} (generation {})",
                handle.index, handle.generation
            ),
        }
    }
}

impl std::error::Error for PoolError {}

struct Slot<T> {
    value: T,
    generation: u32,
    checked_out: bool,
}

pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    /// Indices of available slots (LIFO)
    free: Vec<u32>,
    factory: Box<dyn Fn() -> T + Send>,
    reset: Box<dyn Fn(&mut T) + Send>,
    growth: PoolGrowth,
    checked_out: usize,
}

impl<T> ObjectPool<T> {
    /// Create a pool with `capacity` instances built up front by `factory`.
    /// `reset` returns a released instance to its clean state.
    pub fn new(
        capacity: usize,
        growth: PoolGrowth,
        factory: impl Fn() -> T + Send + 'static,
        reset: impl Fn(&mut T) + Send + 'static,
    ) -> Self {
        let slots: Vec<Slot<T>> = (0..capacity)
            .map(|_| Slot {
                value: factory(),
                generation: 0,
                checked_out: false,
            })
            .collect();
        Self {
            slots,
            free: (0..capacity as u32).rev().collect(),
            factory: Box::new(factory),
            reset: Box::new(reset),
            growth,
            checked_out: 0,
        }
    }

    /// Check out an instance in its reset state
    pub fn acquire(&mut self) -> Result<PoolHandle, PoolError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => match self.growth {
                PoolGrowth::Fixed => {
                    return Err(PoolError::Exhausted {
                        capacity: self.slots.len(),
                    });
                }
                PoolGrowth::Growable => {
                    self.slots.push(Slot {
                        value: (self.factory)(),
                        generation: 0,
                        checked_out: false,
                    });
                    log::debug!("Pool grew to {} slots", self.slots.len());
                    (self.slots.len() - 1) as u32
                }
            },
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.checked_out, "free list held a checked-out slot");
        slot.generation = slot.generation.wrapping_add(1);
        slot.checked_out = true;
        self.checked_out += 1;
        Ok(PoolHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Return an instance. It is reset immediately and the handle becomes invalid.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(PoolError::StaleHandle(handle))?;
        if slot.generation != handle.generation {
            return Err(PoolError::StaleHandle(handle));
        }
        if !slot.checked_out {
            return Err(PoolError::DoubleRelease(handle));
        }

        (self.reset)(&mut slot.value);
        slot.checked_out = false;
        self.checked_out -= 1;
        self.free.push(handle.index);
        Ok(())
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.checked_out && slot.generation == handle.generation)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.checked_out && slot.generation == handle.generation)
            .map(|slot| &mut slot.value)
    }

    pub fn is_checked_out(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Instances currently checked out
    pub fn checked_out(&self) -> usize {
        self.checked_out
    }

    /// Instances ready to be acquired without growing
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total slots allocated
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn growth(&self) -> PoolGrowth {
        self.growth
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.slots.len())
            .field("checked_out", &self.checked_out)
            .field("growth", &self.growth)
            .finish()
    }
}
