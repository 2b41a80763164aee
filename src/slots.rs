use crate::driver::SOCKET_COUNT;
use heapless::Vec;

/// Errors when reserving a slot
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlotError {
    /// Slot id is not covered by the table
    OutOfRange,

    /// Slot is already owned by another socket
    AlreadyReserved,
}

/// Driver slot ids currently in use, together with the owning socket record.
///
/// Slot ids are assigned by the module, so the free list is not used for allocation. It mirrors
/// the owner table and makes the available slot count explicit.
pub(crate) struct SlotTable {
    /// Index of the owning socket record, array index = slot id
    owners: [Option<usize>; SOCKET_COUNT],

    /// Slot ids not reserved by any socket
    free: Vec<u8, SOCKET_COUNT>,
}

impl SlotTable {
    pub fn new() -> Self {
        let mut free = Vec::new();
        for id in (0..SOCKET_COUNT as u8).rev() {
            // Capacity matches the loop range
            let _ = free.push(id);
        }

        Self {
            owners: [None; SOCKET_COUNT],
            free,
        }
    }

    /// Marks the given slot as owned by the given socket record
    pub fn reserve(&mut self, id: u8, owner: usize) -> Result<(), SlotError> {
        let index = id as usize;
        if index >= SOCKET_COUNT {
            return Err(SlotError::OutOfRange);
        }

        if self.owners[index].is_some() {
            return Err(SlotError::AlreadyReserved);
        }

        if let Some(position) = self.free.iter().position(|free_id| *free_id == id) {
            self.free.swap_remove(position);
        }

        self.owners[index] = Some(owner);
        Ok(())
    }

    /// Releases the given slot and returns the previous owner
    pub fn release(&mut self, id: u8) -> Option<usize> {
        let index = id as usize;
        if index >= SOCKET_COUNT {
            return None;
        }

        let owner = self.owners[index].take()?;
        // Not full, as the slot was reserved
        let _ = self.free.push(id);
        Some(owner)
    }

    /// Returns true if the given slot is reserved
    pub fn is_reserved(&self, id: u8) -> bool {
        self.owner(id).is_some()
    }

    /// Returns the socket record owning the given slot
    pub fn owner(&self, id: u8) -> Option<usize> {
        self.owners.get(id as usize).copied().flatten()
    }

    /// Number of slots not reserved
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of reserved slots
    pub fn reserved(&self) -> usize {
        self.owners.iter().filter(|owner| owner.is_some()).count()
    }
}
