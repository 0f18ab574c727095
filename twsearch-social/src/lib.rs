//! Social network search clients used by twsearch.
//!
//! Only the Twitter/X v1.1 standard search pipeline is implemented.
pub mod twitter;
