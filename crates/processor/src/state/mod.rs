//! Cross-message state for login enrichment
//!
//! The state store holds every accumulator the enrichment engine consults:
//!
//! - **IP history**: distinct IPs ever seen per user
//! - **Device history**: distinct users ever seen per device
//! - **Category counters**: accepted logins per app version, locale and device type,
//!   each with a running leader for mode selection
//!
//! Nothing is ever evicted. Memory grows with the number of distinct users,
//! devices and category values for the lifetime of the process.
//!
//! ## Example Usage
//!
//! ```rust
//! use login_processor::state::{Category, InMemoryLoginState, LoginStateStore};
//!
//! let mut state = InMemoryLoginState::new();
//!
//! let first = state.record_login("u1", "10.0.0.1").unwrap();
//! assert!(!first.repeat_ip);
//!
//! let again = state.record_login("u1", "10.0.0.1").unwrap();
//! assert!(again.repeat_ip);
//!
//! state.increment_and_get(Category::DeviceType, "ios").unwrap();
//! assert_eq!(state.most_frequent(Category::DeviceType).as_deref(), Some("ios"));
//! ```

pub mod memory;
pub mod shared;
pub mod store;

pub use memory::InMemoryLoginState;
pub use shared::SharedLoginState;
pub use store::{Category, IpSighting, LoginStateStore, StateStats};

pub use crate::error::StateResult;
