/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod config;
pub mod errors;
pub mod feed;
pub mod json;
pub mod prefix_set;
pub mod ranges;
pub mod sync;
pub mod utils;
