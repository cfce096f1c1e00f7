//! Section lifecycle test suite.
//!
//! End-to-end coverage of one section through the public facade: gate
//! flips, entry management, nested collections, field writes, and
//! validation, driven by string paths the way a UI or API layer would.
//!
//! ```bash
//! cargo test --test section_lifecycle
//! ```

mod fixtures;

mod scenarios;
mod validation;
