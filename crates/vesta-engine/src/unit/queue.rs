use std::rc::Rc;

use glam::Mat4;

use crate::error::{EngineError, Result};
use crate::render::Drawable;

use super::UnitId;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum QueueKind {
    /// Regular scene geometry; writes every attachment.
    Primary,
    /// Overlays (billboards, handles): pickable, never composited in color.
    Marker,
}

#[derive(Clone)]
pub struct QueueEntry {
    pub drawable: Rc<dyn Drawable>,
    pub transform: Mat4,
    pub identity: UnitId,
}

/// Per-frame primary and marker queues.
///
/// Entries are tagged with the unit whose response is running. A response
/// that fails has its submissions for the frame rolled back.
#[derive(Default)]
pub struct RenderQueues {
    primary: Vec<QueueEntry>,
    marker: Vec<QueueEntry>,
    active: Option<UnitId>,
    rollback: (usize, usize),
}

impl RenderQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_unit(&mut self, id: UnitId) {
        self.active = Some(id);
        self.rollback = (self.primary.len(), self.marker.len());
    }

    /// Closes the active unit's window; `keep = false` drops what it submitted.
    pub(crate) fn end_unit(&mut self, keep: bool) {
        if !keep {
            self.primary.truncate(self.rollback.0);
            self.marker.truncate(self.rollback.1);
        }
        self.active = None;
    }

    pub fn active(&self) -> Option<UnitId> {
        self.active
    }

    pub fn submit(
        &mut self,
        kind: QueueKind,
        drawable: Rc<dyn Drawable>,
        transform: Mat4,
    ) -> Result<()> {
        let identity = self.active.ok_or(EngineError::NoActiveUnit)?;
        let entry = QueueEntry {
            drawable,
            transform,
            identity,
        };
        match kind {
            QueueKind::Primary => self.primary.push(entry),
            QueueKind::Marker => self.marker.push(entry),
        }
        Ok(())
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        match kind {
            QueueKind::Primary => self.primary.len(),
            QueueKind::Marker => self.marker.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.marker.is_empty()
    }

    /// Empties both queues, returning `(primary, marker)`.
    pub(crate) fn take(&mut self) -> (Vec<QueueEntry>, Vec<QueueEntry>) {
        (
            std::mem::take(&mut self.primary),
            std::mem::take(&mut self.marker),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawPass;

    struct Dummy;

    impl Drawable for Dummy {
        fn draw(&self, _pass: &mut DrawPass<'_, '_>) -> Result<()> {
            Ok(())
        }
    }

    fn dummy() -> Rc<dyn Drawable> {
        Rc::new(Dummy)
    }

    #[test]
    fn submission_outside_a_response_is_rejected() {
        let mut queues = RenderQueues::new();
        let err = queues
            .submit(QueueKind::Primary, dummy(), Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoActiveUnit));
        assert!(queues.is_empty());
    }

    #[test]
    fn entries_carry_the_active_identity() {
        let mut queues = RenderQueues::new();
        queues.begin_unit(UnitId::new(4));
        queues.submit(QueueKind::Primary, dummy(), Mat4::IDENTITY).unwrap();
        queues.submit(QueueKind::Marker, dummy(), Mat4::IDENTITY).unwrap();
        queues.end_unit(true);

        queues.begin_unit(UnitId::new(9));
        queues.submit(QueueKind::Primary, dummy(), Mat4::IDENTITY).unwrap();
        queues.end_unit(true);

        let (primary, marker) = queues.take();
        let ids: Vec<_> = primary.iter().map(|e| e.identity.get()).collect();
        assert_eq!(ids, [4, 9]);
        assert_eq!(marker[0].identity, UnitId::new(4));
        assert!(queues.is_empty());
    }

    #[test]
    fn failed_response_rolls_back_its_submissions() {
        let mut queues = RenderQueues::new();
        queues.begin_unit(UnitId::new(1));
        queues.submit(QueueKind::Primary, dummy(), Mat4::IDENTITY).unwrap();
        queues.end_unit(true);

        queues.begin_unit(UnitId::new(2));
        queues.submit(QueueKind::Primary, dummy(), Mat4::IDENTITY).unwrap();
        queues.submit(QueueKind::Marker, dummy(), Mat4::IDENTITY).unwrap();
        queues.end_unit(false);

        assert_eq!(queues.len(QueueKind::Primary), 1);
        assert_eq!(queues.len(QueueKind::Marker), 0);
        assert_eq!(queues.active(), None);
    }

    #[test]
    fn closing_a_unit_ends_its_submission_window() {
        let mut queues = RenderQueues::new();
        queues.begin_unit(UnitId::new(1));
        queues.end_unit(true);
        assert!(queues
            .submit(QueueKind::Marker, dummy(), Mat4::IDENTITY)
            .is_err());
    }
}
