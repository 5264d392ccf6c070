//! Output generation for the published adjustment document.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── adjustments-data.json
//! ```
//!
//! The JSON file is the contract with the site that displays the data; each
//! run overwrites the previous document in place.

pub mod json;
