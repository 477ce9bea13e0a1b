//! Fault notification registry.

use crate::error::{Error, Result};
use crate::fault::FaultChannel;
use crate::sync::Mutex;

/// Callback invoked with the fault channel and its value (1 raised, 0 cleared).
pub type FaultCallback = Box<dyn Fn(FaultChannel, u8) + Send + Sync>;

/// Which fault channels a notifier wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelFilter {
    #[default]
    All,
    Only(FaultChannel),
}

impl ChannelFilter {
    pub fn admits(self, channel: FaultChannel) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == channel,
        }
    }
}

/// A subscriber to charger fault events.
pub struct Notifier {
    name: &'static str,
    callback: Option<FaultCallback>,
    filter: ChannelFilter,
}

impl Notifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            callback: None,
            filter: ChannelFilter::All,
        }
    }

    pub fn on_fault<F>(mut self, callback: F) -> Self
    where
        F: Fn(FaultChannel, u8) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn channels(mut self, filter: ChannelFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered list of notifiers. There is no unregister path.
pub struct NotifierRegistry {
    notifiers: Mutex<Vec<Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self {
            notifiers: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, notifier: Notifier) -> Result<()> {
        if notifier.name.is_empty() {
            return Err(Error::InvalidArgument("notifier has no name"));
        }
        if notifier.callback.is_none() {
            return Err(Error::InvalidArgument("notifier has no callback"));
        }
        log::debug!("registered fault notifier {}", notifier.name);
        self.notifiers.lock().push(notifier);
        Ok(())
    }

    /// Calls every admitting notifier in registration order.
    ///
    /// The registry lock is held for the whole fan-out; a callback that calls
    /// back into the registry deadlocks.
    pub fn notify(&self, channel: FaultChannel, value: u8) {
        let notifiers = self.notifiers.lock();
        for notifier in notifiers.iter().filter(|n| n.filter.admits(channel)) {
            if let Some(callback) = &notifier.callback {
                callback(channel, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notifiers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
