use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::error::Result;
use crate::unit::{Unit, UnitId, UnitRegistry};

use super::setup::UnitSetup;

pub(crate) type UnitFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Unit>>>>>;

/// Builds the registration future: factory, then `init`.
pub(crate) fn registration<F, Fut, U>(setup: UnitSetup, factory: F) -> UnitFuture
where
    F: FnOnce(UnitSetup) -> Fut + 'static,
    Fut: Future<Output = Result<U>> + 'static,
    U: Unit,
{
    Box::pin(async move {
        let mut unit = factory(setup.clone()).await?;
        unit.init(&setup).await?;
        Ok(Box::new(unit) as Box<dyn Unit>)
    })
}

struct PendingUnit {
    id: UnitId,
    future: UnitFuture,
}

/// Registrations started with `spawn_unit`, admitted at frame boundaries.
pub(crate) struct Spawner {
    setup: UnitSetup,
    pending: Vec<PendingUnit>,
}

impl Spawner {
    pub(crate) fn new(setup: UnitSetup) -> Self {
        Self {
            setup,
            pending: Vec::new(),
        }
    }

    pub(crate) fn setup(&self) -> &UnitSetup {
        &self.setup
    }

    pub(crate) fn setup_for(&self, id: UnitId) -> UnitSetup {
        self.setup.for_unit(id)
    }

    pub(crate) fn spawn<F, Fut, U>(&mut self, registry: &UnitRegistry, factory: F) -> UnitId
    where
        F: FnOnce(UnitSetup) -> Fut + 'static,
        Fut: Future<Output = Result<U>> + 'static,
        U: Unit,
    {
        let id = registry.reserve_id();
        let future = registration(self.setup_for(id), factory);
        self.pending.push(PendingUnit { id, future });
        log::trace!("unit {id} pending");
        id
    }

    pub(crate) fn is_pending(&self, id: UnitId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Polls every pending registration once and inserts the finished ones.
    ///
    /// Returns how many units were admitted. Failed registrations are logged
    /// and dropped; their ids stay burned.
    pub(crate) fn admit(&mut self, registry: &mut UnitRegistry) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut cx = Context::from_waker(Waker::noop());
        let mut admitted = 0;

        self.pending
            .retain_mut(|pending| match pending.future.as_mut().poll(&mut cx) {
                Poll::Pending => true,
                Poll::Ready(Ok(unit)) => {
                    registry.insert(pending.id, unit);
                    admitted += 1;
                    false
                }
                Poll::Ready(Err(e)) => {
                    log::error!("unit {} failed to register: {e}", pending.id);
                    false
                }
            });

        admitted
    }
}
