/*-------------------------------------------------------------------------------------------------
  Firewall Alias Modules
-------------------------------------------------------------------------------------------------*/

pub mod api;
pub mod json;
pub mod reconcile;
