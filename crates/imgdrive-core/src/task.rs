//! Request generations.
//!
//! Each request a model starts gets a fresh `RequestId`. A completion is only
//! applied while its id is still the active one for that slot, so a slow
//! response for a superseded request is dropped instead of overwriting newer
//! state.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Default)]
pub struct RequestSeq {
    next: u64,
}

impl RequestSeq {
    pub fn next_id(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// In-flight tracking for one kind of request.
#[derive(Debug, Default, Clone)]
pub struct RequestSlot {
    active: Option<RequestId>,
}

impl RequestSlot {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Marks `id` as the current request, superseding any previous one.
    pub fn start(&mut self, id: RequestId) {
        self.active = Some(id);
    }

    /// Ends the request if `id` is still current. Returns false for stale ids.
    pub fn finish_if_active(&mut self, id: RequestId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }

    /// Drops the current request; its completion will be ignored.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
