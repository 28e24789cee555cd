//! Application layer: the coordinator actor and the ports around it.
//!
//! # How the pieces fit (for beginners)
//!
//! Commands from the consumer and callbacks from the radio arrive from
//! unrelated threads and tasks.  Instead of sharing the peer list and the
//! connection state behind locks, a single [`coordinator::Coordinator`] task
//! owns all of it and everything else talks to that task through messages:
//!
//! ```text
//!  consumer ──► CommandDispatcher ──► CoordinatorHandle ─┐
//!                                                        ├─► mailbox ─► Coordinator ─► EventBus ─► consumer
//!  radio ────────────────────────────► RadioEventSink ───┘                  │
//!                                                                           └─► RadioSubsystem (requests)
//! ```
//!
//! # Sub-modules
//!
//! - **`radio`** – The Radio Subsystem port: the trait a radio driver
//!   implements, the events it reports and the subscription it hands back.
//!
//! - **`coordinator`** – The actor that serialises commands and radio
//!   callbacks and owns the three domain state objects.
//!
//! - **`event_bus`** – Bounded, drop-oldest delivery of events to the single
//!   consumer.
//!
//! - **`dispatcher`** – Maps decoded method-channel commands onto the
//!   coordinator handle and builds the replies.

pub mod coordinator;
pub mod dispatcher;
pub mod event_bus;
pub mod radio;
