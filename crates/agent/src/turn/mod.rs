//! The policies a turn is made of, one module per stage.
//!
//! - [`admission`]: backlog ceiling and message-burst checks
//! - [`recall`]: what is remembered about the user
//! - [`welcome`]: the welcome thought for joins
//! - [`addressee`]: is the user talking to the soul?
//! - [`drafting`]: the internal reply thought, with or without retrieval
//! - [`reaction`]: the optional emoji reaction
//! - [`emission`]: streamed multi-part speech

pub mod addressee;
pub mod admission;
pub mod drafting;
pub mod emission;
pub mod reaction;
pub mod recall;
pub mod welcome;
