//! # Events Module
//!
//! Progress reporting for the race.
//!
//! ## Design
//! The core publishes events through a channel so the CLI (or anything
//! else) can show progress without the race loop knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = event_channel();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::NewBest { hash, .. } = event {
//!             println!("{hash}");
//!         }
//!     }
//! });
//!
//! race.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{event_channel, null_sender, EventReceiver, EventSender};
pub use types::*;
