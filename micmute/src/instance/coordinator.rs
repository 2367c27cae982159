//! Single-instance enforcement.

use super::signal::{NamedEventProvider, SignalError, WaitableEvent};
use crate::args::LaunchArgs;
use tracing::{debug, info, warn};

/// Outcome of claiming the instance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// This process created the event and is the primary instance.
    Owner,
    /// Another live process already holds it.
    NotOwner,
}

/// Holds the claim on the instance event for the life of the process.
///
/// Dropping the coordinator closes this process's handle; the OS destroys
/// the event once the last holder is gone.
pub struct SingletonCoordinator<E: WaitableEvent> {
    event: E,
    ownership: Ownership,
}

impl<E: WaitableEvent> SingletonCoordinator<E> {
    /// Create or open the named event and record whether we got there first.
    ///
    /// An error means the primitive could not be created or opened at all;
    /// the caller treats that as fatal.
    pub fn acquire<P>(provider: &P, name: &str) -> Result<Self, SignalError>
    where
        P: NamedEventProvider<Event = E>,
    {
        let (event, created_new) = provider.create(name)?;
        let ownership = if created_new {
            Ownership::Owner
        } else {
            Ownership::NotOwner
        };

        info!(?ownership, "Instance ownership resolved");
        Ok(Self { event, ownership })
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_owner(&self) -> bool {
        self.ownership == Ownership::Owner
    }

    /// Ask the primary instance to show its window. Fire-and-forget: one
    /// signal, no acknowledgment, no retry.
    pub fn request_show(&self) -> bool {
        match self.event.signal() {
            Ok(()) => {
                debug!("Show request sent to primary instance");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to signal primary instance");
                false
            }
        }
    }
}

/// Decide what a launch does when the instance event is already taken.
///
/// Returns true when this process must exit. A second instance forwards one
/// show request if `--show` was given and otherwise stays silent.
pub fn forward_to_primary<E: WaitableEvent>(
    coordinator: &SingletonCoordinator<E>,
    args: &LaunchArgs,
) -> bool {
    if coordinator.is_owner() {
        return false;
    }

    if args.show {
        coordinator.request_show();
    }
    info!(show = args.show, "Another instance is running, exiting");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryEvents;
    use std::time::Duration;

    const NAME: &str = "test-instance";

    #[test]
    fn first_acquire_owns() {
        let events = MemoryEvents::new();

        let primary = SingletonCoordinator::acquire(&events, NAME).unwrap();

        assert_eq!(primary.ownership(), Ownership::Owner);
        assert!(primary.is_owner());
    }

    #[test]
    fn second_acquire_does_not_own() {
        let events = MemoryEvents::new();
        let _primary = SingletonCoordinator::acquire(&events, NAME).unwrap();

        let second = SingletonCoordinator::acquire(&events, NAME).unwrap();

        assert_eq!(second.ownership(), Ownership::NotOwner);
    }

    #[test]
    fn ownership_is_released_with_the_last_holder() {
        let events = MemoryEvents::new();
        let primary = SingletonCoordinator::acquire(&events, NAME).unwrap();
        drop(primary);

        let next = SingletonCoordinator::acquire(&events, NAME).unwrap();

        assert!(next.is_owner());
    }

    #[test]
    fn different_names_are_independent() {
        let events = MemoryEvents::new();
        let _a = SingletonCoordinator::acquire(&events, "a").unwrap();

        let b = SingletonCoordinator::acquire(&events, "b").unwrap();

        assert!(b.is_owner());
    }

    #[test]
    fn non_owner_can_signal_primary() {
        let events = MemoryEvents::new();
        let primary = events.create(NAME).unwrap().0;
        let second = SingletonCoordinator::acquire(&events, NAME).unwrap();

        assert!(second.request_show());

        assert!(primary.wait(Duration::from_millis(100)).unwrap());
    }

    #[test]
    fn not_owner_without_show_sends_nothing() {
        let events = MemoryEvents::new();
        let primary = events.create(NAME).unwrap().0;
        let second = SingletonCoordinator::acquire(&events, NAME).unwrap();

        drop(second);

        assert!(!primary.wait(Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn owner_keeps_running() {
        let events = MemoryEvents::new();
        let primary = SingletonCoordinator::acquire(&events, NAME).unwrap();

        let args = LaunchArgs::parse(["--show"]);

        assert!(!forward_to_primary(&primary, &args));
    }

    #[test]
    fn second_launch_without_show_exits_silently() {
        let events = MemoryEvents::new();
        let primary = events.create(NAME).unwrap().0;
        let second = SingletonCoordinator::acquire(&events, NAME).unwrap();

        let args = LaunchArgs::parse(Vec::<String>::new());

        assert!(forward_to_primary(&second, &args));
        assert!(!primary.wait(Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn second_launch_with_show_wakes_the_primary() {
        let events = MemoryEvents::new();
        let primary = events.create(NAME).unwrap().0;
        let second = SingletonCoordinator::acquire(&events, NAME).unwrap();

        let args = LaunchArgs::parse(["--show"]);

        assert!(forward_to_primary(&second, &args));
        assert!(primary.wait(Duration::from_millis(100)).unwrap());
    }

    #[test]
    fn creation_failure_is_reported() {
        let events = MemoryEvents::new();
        events.fail_creation();

        assert!(SingletonCoordinator::acquire(&events, NAME).is_err());
    }
}
