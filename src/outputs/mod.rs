//! Output generation.
//!
//! # Submodules
//!
//! - [`markdown`]: renders accepted articles into the run's report
//! - [`retention`]: deletes generated reports past the retention period
//! - [`json`]: writes the optional run summary
//!
//! # Output Structure
//!
//! ```text
//! ./
//! ├── US_News_20251103-0900.md   # one report per run
//! ├── US_News_20251103-1230.md
//! └── scraper.log                # appended across runs
//! ```

pub mod json;
pub mod markdown;
pub mod retention;
