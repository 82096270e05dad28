use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PayoutCompletedEvent, PayoutFailedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payout_completed_producer: Vec<EventProducer<PayoutCompletedEvent>>,
    pub payout_failed_producer: Vec<EventProducer<PayoutFailedEvent>>,
}

pub struct EventHandlers {
    pub on_payout_completed: Option<EventHandler<PayoutCompletedEvent>>,
    pub on_payout_failed: Option<EventHandler<PayoutFailedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payout_completed = hooks.on_payout_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_payout_failed = hooks.on_payout_failed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payout_completed, on_payout_failed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payout_completed {
            result.payout_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payout_failed {
            result.payout_failed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook. Each task ends once all producers for it have been dropped.
    pub fn start_handlers(self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(2);
        if let Some(handler) = self.on_payout_completed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_payout_failed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payout_completed: Option<Handler<PayoutCompletedEvent>>,
    pub on_payout_failed: Option<Handler<PayoutFailedEvent>>,
}

impl EventHooks {
    pub fn on_payout_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout_completed = Some(Arc::new(f));
        self
    }

    pub fn on_payout_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PayoutFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payout_failed = Some(Arc::new(f));
        self
    }
}
